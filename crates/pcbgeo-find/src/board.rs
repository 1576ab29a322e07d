use pcbgeo_core::boolean::{boolean, BoolOp};
use pcbgeo_core::shapes;
use pcbgeo_core::{dice_no_holes, BBox, Contour, Coord, Point, Polyarea, RTree};

use crate::config::FindConfig;
use crate::dispatch;
use crate::error::FindError;
use crate::layer::{Layer, LayerId, Slots};
use crate::object::{Arc, Line, ObjKind, ObjRef, Object, Padstack, Polygon, Text};

/// Result of [`Board::intersects`]: the answer plus whether a polygon's
/// clipped islands had to be rebuilt to get it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsectOutcome {
    pub hit: bool,
    pub recomputed: bool,
}

/// All copper objects of a board, indexed per layer and per kind.
///
/// Every edit keeps the R-trees in step with the objects and drops the
/// clipped islands of polygons the edit may affect.
#[derive(Debug)]
pub struct Board {
    layers: Vec<Layer>,
    padstacks: Slots<Padstack>,
    padstack_tree: RTree<usize>,
    pub config: FindConfig,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(FindConfig::default())
    }
}

/// Move one slot entry and re-index it. Returns the new box.
fn reindex<T>(
    slots: &mut Slots<T>,
    tree: &mut RTree<usize>,
    index: usize,
    old: BBox,
    shift: impl FnOnce(&mut T) -> BBox,
) -> Option<BBox> {
    let item = slots.get_mut(index)?;
    let new = shift(item);
    if !tree.delete(&old, &index) {
        log::warn!("tree entry for slot {} was missing on move", index);
    }
    tree.insert(new, index);
    Some(new)
}

impl Board {
    pub fn new(config: FindConfig) -> Self {
        Self {
            layers: Vec::new(),
            padstacks: Slots::default(),
            padstack_tree: RTree::new(),
            config,
        }
    }

    // ── Layers ───────────────────────────────────────────────────────

    pub fn add_layer(&mut self, name: &str) -> LayerId {
        let id = self.layers.len() as LayerId;
        self.layers.push(Layer::new(id, name));
        log::debug!("added layer {} '{}'", id, name);
        id
    }

    pub fn layer(&self, id: LayerId) -> Result<&Layer, FindError> {
        self.layers
            .get(id as usize)
            .ok_or(FindError::NoSuchLayer(id))
    }

    fn layer_mut(&mut self, id: LayerId) -> Result<&mut Layer, FindError> {
        self.layers
            .get_mut(id as usize)
            .ok_or(FindError::NoSuchLayer(id))
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.layers.iter()
    }

    pub fn padstack(&self, index: usize) -> Option<&Padstack> {
        self.padstacks.get(index)
    }

    pub fn padstacks(&self) -> impl Iterator<Item = (usize, &Padstack)> + '_ {
        self.padstacks.iter()
    }

    // ── Adding objects ───────────────────────────────────────────────

    pub fn add_line(&mut self, layer: LayerId, line: Line) -> Result<ObjRef, FindError> {
        let bbox = checked_box(line.bbox())?;
        let l = self.layer_mut(layer)?;
        let index = l.lines.insert(line);
        l.line_tree.insert(bbox, index);
        self.invalidate_around(Some(layer), &bbox);
        Ok(ObjRef {
            kind: ObjKind::Line,
            layer: Some(layer),
            index,
        })
    }

    pub fn add_arc(&mut self, layer: LayerId, arc: Arc) -> Result<ObjRef, FindError> {
        let bbox = checked_box(arc.bbox())?;
        let l = self.layer_mut(layer)?;
        let index = l.arcs.insert(arc);
        l.arc_tree.insert(bbox, index);
        self.invalidate_around(Some(layer), &bbox);
        Ok(ObjRef {
            kind: ObjKind::Arc,
            layer: Some(layer),
            index,
        })
    }

    pub fn add_text(&mut self, layer: LayerId, text: Text) -> Result<ObjRef, FindError> {
        let bbox = checked_box(text.bbox())?;
        let l = self.layer_mut(layer)?;
        let index = l.texts.insert(text);
        l.text_tree.insert(bbox, index);
        self.invalidate_around(Some(layer), &bbox);
        Ok(ObjRef {
            kind: ObjKind::Text,
            layer: Some(layer),
            index,
        })
    }

    pub fn add_polygon(&mut self, layer: LayerId, poly: Polygon) -> Result<ObjRef, FindError> {
        if poly.raw_poly().is_none() {
            return Err(FindError::DegeneratePolygon);
        }
        let bbox = checked_box(poly.bbox())?;
        let l = self.layer_mut(layer)?;
        let index = l.polys.insert(poly);
        l.poly_tree.insert(bbox, index);
        self.invalidate_around(Some(layer), &bbox);
        Ok(ObjRef {
            kind: ObjKind::Poly,
            layer: Some(layer),
            index,
        })
    }

    /// Padstacks go through every layer.
    pub fn add_padstack(&mut self, pstk: Padstack) -> Result<ObjRef, FindError> {
        let bbox = checked_box(pstk.bbox())?;
        let index = self.padstacks.insert(pstk);
        self.padstack_tree.insert(bbox, index);
        self.invalidate_around(None, &bbox);
        Ok(ObjRef {
            kind: ObjKind::Pstk,
            layer: None,
            index,
        })
    }

    // ── Lookup ───────────────────────────────────────────────────────

    /// Borrow the object behind `r`. A `Void` handle yields [`Object::Void`].
    pub fn object(&self, r: ObjRef) -> Result<Object<'_>, FindError> {
        let stale = FindError::StaleHandle(r);
        match r.kind {
            ObjKind::Void => return Ok(Object::Void),
            ObjKind::Pstk => return self.padstacks.get(r.index).map(Object::Pstk).ok_or(stale),
            _ => {}
        }
        let layer = self.layer(r.layer.ok_or(FindError::StaleHandle(r))?)?;
        let obj = match r.kind {
            ObjKind::Line => layer.lines.get(r.index).map(Object::Line),
            ObjKind::Arc => layer.arcs.get(r.index).map(Object::Arc),
            ObjKind::Text => layer.texts.get(r.index).map(Object::Text),
            ObjKind::Poly => layer.polys.get(r.index).map(Object::Poly),
            ObjKind::Pstk | ObjKind::Void => None,
        };
        obj.ok_or(stale)
    }

    pub fn polygon(&self, r: ObjRef) -> Result<&Polygon, FindError> {
        match self.object(r)? {
            Object::Poly(p) => Ok(p),
            other => Err(FindError::WrongKind {
                expected: ObjKind::Poly,
                found: other.kind(),
            }),
        }
    }

    fn polygon_mut(&mut self, r: ObjRef) -> Result<&mut Polygon, FindError> {
        if r.kind != ObjKind::Poly {
            return Err(FindError::WrongKind {
                expected: ObjKind::Poly,
                found: r.kind,
            });
        }
        let layer = self.layer_mut(r.layer.ok_or(FindError::StaleHandle(r))?)?;
        layer.polys.get_mut(r.index).ok_or(FindError::StaleHandle(r))
    }

    /// Box of a live, non-void object.
    fn live_bbox(&self, r: ObjRef) -> Result<BBox, FindError> {
        if r.kind == ObjKind::Void {
            return Err(FindError::StaleHandle(r));
        }
        Ok(self.object(r)?.bbox())
    }

    // ── Editing ──────────────────────────────────────────────────────

    /// Remove an object and its tree entry.
    pub fn remove(&mut self, r: ObjRef) -> Result<(), FindError> {
        let bbox = self.live_bbox(r)?;
        if r.kind == ObjKind::Pstk {
            self.padstacks.remove(r.index);
            self.padstack_tree.delete(&bbox, &r.index);
        } else {
            let layer = self.layer_mut(r.layer.ok_or(FindError::StaleHandle(r))?)?;
            let removed = match r.kind {
                ObjKind::Line => layer.lines.remove(r.index).is_some() && layer.line_tree.delete(&bbox, &r.index),
                ObjKind::Arc => layer.arcs.remove(r.index).is_some() && layer.arc_tree.delete(&bbox, &r.index),
                ObjKind::Text => layer.texts.remove(r.index).is_some() && layer.text_tree.delete(&bbox, &r.index),
                ObjKind::Poly => layer.polys.remove(r.index).is_some() && layer.poly_tree.delete(&bbox, &r.index),
                ObjKind::Pstk | ObjKind::Void => false,
            };
            if !removed {
                log::warn!("tree entry for {:?} was missing on removal", r);
            }
        }
        self.invalidate_around(r.layer, &bbox);
        log::debug!("removed {:?}", r);
        Ok(())
    }

    /// Translate an object, moving its tree entry from the old box to the new.
    pub fn move_object(&mut self, r: ObjRef, dx: Coord, dy: Coord) -> Result<BBox, FindError> {
        let old = self.live_bbox(r)?;
        let moved = if r.kind == ObjKind::Pstk {
            reindex(&mut self.padstacks, &mut self.padstack_tree, r.index, old, |s| {
                s.translate(dx, dy);
                s.bbox()
            })
        } else {
            let layer = self.layer_mut(r.layer.ok_or(FindError::StaleHandle(r))?)?;
            match r.kind {
                ObjKind::Line => reindex(&mut layer.lines, &mut layer.line_tree, r.index, old, |o| {
                    o.translate(dx, dy);
                    o.bbox()
                }),
                ObjKind::Arc => reindex(&mut layer.arcs, &mut layer.arc_tree, r.index, old, |o| {
                    o.translate(dx, dy);
                    o.bbox()
                }),
                ObjKind::Text => reindex(&mut layer.texts, &mut layer.text_tree, r.index, old, |o| {
                    o.translate(dx, dy);
                    o.bbox()
                }),
                ObjKind::Poly => reindex(&mut layer.polys, &mut layer.poly_tree, r.index, old, |o| {
                    o.translate(dx, dy);
                    o.bbox()
                }),
                ObjKind::Pstk | ObjKind::Void => None,
            }
        };
        let new = moved.ok_or(FindError::StaleHandle(r))?;
        self.invalidate_around(r.layer, &old);
        self.invalidate_around(r.layer, &new);
        Ok(new)
    }

    /// Replace a polygon's corners. Its clipped islands go stale.
    pub fn set_polygon_points(
        &mut self,
        r: ObjRef,
        points: Vec<Point>,
        hole_starts: Vec<usize>,
    ) -> Result<(), FindError> {
        let old = self.live_bbox(r)?;
        if shapes::from_points(&points, &hole_starts).is_none() {
            return Err(FindError::DegeneratePolygon);
        }
        let poly = self.polygon_mut(r)?;
        poly.set_points(points, hole_starts);
        let new = poly.bbox();
        let layer = self.layer_mut(r.layer.ok_or(FindError::StaleHandle(r))?)?;
        if !layer.poly_tree.delete(&old, &r.index) {
            log::warn!("tree entry for {:?} was missing on reshape", r);
        }
        layer.poly_tree.insert(new, r.index);
        self.invalidate_around(r.layer, &old);
        self.invalidate_around(r.layer, &new);
        Ok(())
    }

    /// Drop the clipped islands of polygons near `bbox`, on one layer or on
    /// all of them.
    fn invalidate_around(&mut self, layer: Option<LayerId>, bbox: &BBox) {
        let region = bbox.bloat(1);
        let mut n = 0;
        for l in &mut self.layers {
            if layer.is_none() || layer == Some(l.id) {
                n += l.invalidate_polys_in(&region);
            }
        }
        if n > 0 {
            log::trace!("invalidated {} clipped polygon(s) near {:?}", n, bbox);
        }
    }

    // ── Clipped polygons ─────────────────────────────────────────────

    /// Build the clipped islands of a polygon if they are stale. Returns
    /// whether anything was computed.
    ///
    /// On failure the cache stays stale and the error is returned.
    pub fn ensure_clipped(&mut self, r: ObjRef) -> Result<bool, FindError> {
        if !self.polygon(r)?.is_clip_stale() {
            return Ok(false);
        }
        let islands = match self.compute_clip(r) {
            Ok(islands) => islands,
            Err(e) => {
                log::error!("clipping polygon {:?} failed: {}", r, e);
                return Err(e);
            }
        };
        if islands.is_empty() {
            let c = self.polygon(r)?.bbox().center();
            log::warn!("Polygon cleared out of existence near ({}, {})", c.x, c.y);
        } else {
            log::debug!("clipped polygon {:?} into {} island(s)", r, islands.len());
            for island in &islands {
                log::trace!("island of {:?}: {}", r, island.to_json());
            }
        }
        self.polygon_mut(r)?.set_clip(islands);
        Ok(true)
    }

    fn compute_clip(&self, r: ObjRef) -> Result<Vec<Polyarea>, FindError> {
        let poly = self.polygon(r)?;
        let raw = poly.raw_poly().ok_or(FindError::DegeneratePolygon)?;
        let mut islands = vec![raw];
        if !poly.flags.clear_poly {
            return Ok(islands);
        }
        let layer = self.layer(r.layer.ok_or(FindError::StaleHandle(r))?)?;
        let region = poly.bbox();
        let batch_size = self.config.clear_batch_size.max(1);

        // the batch is united by the non-zero fill of the subtraction
        let mut batch: Vec<Polyarea> = Vec::new();
        let cut = |batch: &mut Vec<Polyarea>, islands: Vec<Polyarea>, force: bool| {
            if batch.is_empty() || (!force && batch.len() < batch_size) {
                return Ok(islands);
            }
            boolean(islands, std::mem::take(batch), BoolOp::Sub)
        };

        for i in layer.line_tree.search_collect(&region) {
            let Some(line) = layer.lines.get(i) else {
                continue;
            };
            if line.flags.clear_line && line.clearance > 0 {
                batch.push(line.clearance_poly());
                islands = cut(&mut batch, islands, false)?;
            }
        }
        islands = cut(&mut batch, islands, true)?;

        for i in layer.arc_tree.search_collect(&region) {
            let Some(arc) = layer.arcs.get(i) else {
                continue;
            };
            if arc.flags.clear_line && arc.clearance > 0 {
                batch.push(arc.clearance_poly()?);
            }
        }
        for i in layer.text_tree.search_collect(&region) {
            let Some(text) = layer.texts.get(i) else {
                continue;
            };
            if text.flags.clear_line {
                batch.extend(text.clearance_poly());
            }
        }
        for i in self.padstack_tree.search_collect(&region) {
            let Some(pstk) = self.padstacks.get(i) else {
                continue;
            };
            if pstk.clearance > 0 {
                batch.extend(pstk.clearance_poly());
            }
        }
        islands = cut(&mut batch, islands, true)?;
        Ok(islands)
    }

    /// Clipped islands of a polygon, biggest first, built on demand.
    pub fn clipped(&mut self, r: ObjRef) -> Result<&[Polyarea], FindError> {
        self.ensure_clipped(r)?;
        self.polygon(r)?.clipped().ok_or(FindError::StaleClip)
    }

    /// Hole-free pieces of a polygon's clipped islands, each inside `clip`
    /// unless `clip` is the all-zero box.
    pub fn no_holes(&mut self, r: ObjRef, clip: BBox) -> Result<Vec<Contour>, FindError> {
        let islands = self.clipped(r)?.to_vec();
        let mut out = Vec::new();
        dice_no_holes(islands, clip, |c| out.push(c))?;
        Ok(out)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Objects whose boxes come within the configured bloat of `r`: on its
    /// own layer, or on every layer for a padstack. Padstacks are always
    /// included. `r` itself is not.
    pub fn candidates(&self, r: ObjRef) -> Result<Vec<ObjRef>, FindError> {
        let region = self.live_bbox(r)?.bloat(self.config.bloat.max(0) + 1);
        let layers: Vec<&Layer> = match r.layer {
            Some(id) => vec![self.layer(id)?],
            None => self.layers.iter().collect(),
        };
        let mut out = Vec::new();
        for layer in layers {
            let id = Some(layer.id);
            for (kind, tree) in [
                (ObjKind::Line, &layer.line_tree),
                (ObjKind::Arc, &layer.arc_tree),
                (ObjKind::Text, &layer.text_tree),
                (ObjKind::Poly, &layer.poly_tree),
            ] {
                out.extend(
                    tree.search_collect(&region)
                        .into_iter()
                        .map(|index| ObjRef { kind, layer: id, index }),
                );
            }
        }
        out.extend(
            self.padstack_tree
                .search_collect(&region)
                .into_iter()
                .map(|index| ObjRef {
                    kind: ObjKind::Pstk,
                    layer: None,
                    index,
                }),
        );
        out.retain(|c| *c != r);
        Ok(out)
    }

    /// Whether two objects intersect under the configured bloat.
    ///
    /// Polygon operands get their clipped islands built first;
    /// `recomputed` reports whether that happened. Objects on different
    /// layers never intersect.
    ///
    /// # Panics
    ///
    /// On a `Void` handle.
    pub fn intersects(&mut self, a: ObjRef, b: ObjRef) -> Result<IsectOutcome, FindError> {
        dispatch::check_kinds(a.kind, b.kind);
        if let (Some(la), Some(lb)) = (a.layer, b.layer) {
            if la != lb {
                return Ok(IsectOutcome {
                    hit: false,
                    recomputed: false,
                });
            }
        }
        let mut recomputed = false;
        for r in [a, b] {
            if r.kind == ObjKind::Poly {
                recomputed |= self.ensure_clipped(r)?;
            }
        }
        let (oa, ob) = (self.object(a)?, self.object(b)?);
        let hit = dispatch::intersects(&oa, &ob, self.config.bloat)?;
        Ok(IsectOutcome { hit, recomputed })
    }

    /// Check every tree against its objects.
    pub fn check(&self) -> Result<(), FindError> {
        fn same<T>(what: String, tree: &RTree<usize>, slots: &Slots<T>) -> Result<(), FindError> {
            let err = if let Err(source) = tree.check() {
                FindError::Tree { what, source }
            } else if tree.len() != slots.len() {
                FindError::IndexOutOfStep {
                    what,
                    entries: tree.len(),
                    objects: slots.len(),
                }
            } else {
                return Ok(());
            };
            log::trace!("{}\n{}", err, tree.dump());
            Err(err)
        }
        for l in &self.layers {
            same(format!("layer {} lines", l.id), &l.line_tree, &l.lines)?;
            same(format!("layer {} arcs", l.id), &l.arc_tree, &l.arcs)?;
            same(format!("layer {} texts", l.id), &l.text_tree, &l.texts)?;
            same(format!("layer {} polygons", l.id), &l.poly_tree, &l.polys)?;
        }
        same("padstacks".to_string(), &self.padstack_tree, &self.padstacks)
    }
}

fn checked_box(bbox: BBox) -> Result<BBox, FindError> {
    if bbox.is_valid() {
        Ok(bbox)
    } else {
        Err(FindError::EmptyBox(bbox))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Flags, PadShape};
    use pcbgeo_core::ArcGeom;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn rect_points(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Vec<Point> {
        vec![
            Point::new(x1, y1),
            Point::new(x2, y1),
            Point::new(x2, y2),
            Point::new(x1, y2),
        ]
    }

    fn clearing() -> Flags {
        Flags {
            clear_poly: true,
            ..Flags::default()
        }
    }

    fn clear_line() -> Flags {
        Flags {
            clear_line: true,
            ..Flags::default()
        }
    }

    #[test]
    fn test_board_create() {
        let mut board = Board::default();
        let top = board.add_layer("top");
        let bottom = board.add_layer("bottom");
        assert_eq!((top, bottom), (0, 1));
        assert_eq!(board.layer(bottom).unwrap().name, "bottom");
        assert!(matches!(board.layer(7), Err(FindError::NoSuchLayer(7))));
    }

    #[test]
    fn test_clip_cache_hit_then_recompute_after_edit() {
        init();
        let mut board = Board::default();
        let top = board.add_layer("top");
        let poly = board
            .add_polygon(top, Polygon::new(rect_points(0, 0, 1_000, 1_000), vec![], Flags::default()))
            .unwrap();

        assert!(board.ensure_clipped(poly).unwrap());
        let first = board.clipped(poly).unwrap().as_ptr();
        assert!(!board.ensure_clipped(poly).unwrap());
        let second = board.clipped(poly).unwrap().as_ptr();
        assert_eq!(first, second);

        board
            .set_polygon_points(poly, rect_points(0, 0, 500, 500), vec![])
            .unwrap();
        assert!(board.polygon(poly).unwrap().is_clip_stale());
        assert!(board.ensure_clipped(poly).unwrap());
        let third = board.clipped(poly).unwrap();
        assert_eq!(third[0].area(), 250_000.0);
    }

    #[test]
    fn test_polygon_edits_invalidate_overlapping_polygons() {
        init();
        let mut board = Board::default();
        let top = board.add_layer("top");
        let pour = board
            .add_polygon(top, Polygon::new(rect_points(0, 0, 1_000, 1_000), vec![], Flags::default()))
            .unwrap();
        board.ensure_clipped(pour).unwrap();

        let island = board
            .add_polygon(top, Polygon::new(rect_points(900, 900, 1_200, 1_200), vec![], Flags::default()))
            .unwrap();
        assert!(board.polygon(pour).unwrap().is_clip_stale());

        board.ensure_clipped(pour).unwrap();
        board.ensure_clipped(island).unwrap();
        board
            .set_polygon_points(island, rect_points(2_000, 2_000, 2_500, 2_500), vec![])
            .unwrap();
        assert!(board.polygon(pour).unwrap().is_clip_stale());
        assert!(board.polygon(island).unwrap().is_clip_stale());

        board.ensure_clipped(pour).unwrap();
        board
            .set_polygon_points(island, rect_points(3_000, 3_000, 3_500, 3_500), vec![])
            .unwrap();
        assert!(!board.polygon(pour).unwrap().is_clip_stale());
        board.check().unwrap();
    }

    #[test]
    fn test_intersects_reports_recompute() {
        let mut board = Board::default();
        let top = board.add_layer("top");
        let poly = board
            .add_polygon(top, Polygon::new(rect_points(0, 0, 100, 100), vec![], Flags::default()))
            .unwrap();
        let line = board
            .add_line(top, Line::new(Point::new(50, 50), Point::new(300, 50), 10, 0, Flags::default()))
            .unwrap();

        let first = board.intersects(line, poly).unwrap();
        assert!(first.hit && first.recomputed);
        let second = board.intersects(poly, line).unwrap();
        assert!(second.hit && !second.recomputed);

        board.move_object(line, 0, 500).unwrap();
        let third = board.intersects(line, poly).unwrap();
        assert!(!third.hit);
        assert!(third.recomputed);
    }

    #[test]
    fn test_clearing_line_splits_polygon() {
        init();
        let mut board = Board::default();
        let top = board.add_layer("top");
        let poly = board
            .add_polygon(top, Polygon::new(rect_points(0, 0, 1_000, 1_000), vec![], clearing()))
            .unwrap();
        let cutter = board
            .add_line(top, Line::new(Point::new(500, -100), Point::new(500, 1_100), 100, 100, clear_line()))
            .unwrap();

        let islands = board.clipped(poly).unwrap();
        assert_eq!(islands.len(), 2);
        let total: f64 = islands.iter().map(Polyarea::area).sum();
        assert!((total - (1_000_000.0 - 200.0 * 1_000.0)).abs() < 1.0);

        // a clearing line never connects to the polygon it clears
        assert!(!board.intersects(cutter, poly).unwrap().hit);

        board.remove(cutter).unwrap();
        assert_eq!(board.clipped(poly).unwrap().len(), 1);
    }

    #[test]
    fn test_full_poly_counts_every_island() {
        let mut board = Board::default();
        let top = board.add_layer("top");
        let flags = Flags {
            clear_poly: true,
            full_poly: true,
            ..Flags::default()
        };
        let poly = board
            .add_polygon(top, Polygon::new(rect_points(0, 0, 1_000, 400), vec![], flags))
            .unwrap();
        // cut off a thin strip on the right
        board
            .add_line(top, Line::new(Point::new(900, -100), Point::new(900, 500), 20, 20, clear_line()))
            .unwrap();
        let probe = board
            .add_line(top, Line::new(Point::new(950, 100), Point::new(950, 300), 10, 0, Flags::default()))
            .unwrap();
        assert!(board.intersects(probe, poly).unwrap().hit);

        let mut flags = flags;
        flags.full_poly = false;
        let partial = board
            .add_polygon(top, Polygon::new(rect_points(0, 0, 1_000, 400), vec![], flags))
            .unwrap();
        assert!(!board.intersects(probe, partial).unwrap().hit);
    }

    #[test]
    fn test_padstack_clearance_and_cleared_out_polygon() {
        init();
        let mut board = Board::default();
        let top = board.add_layer("top");
        let bottom = board.add_layer("bottom");
        let small = board
            .add_polygon(bottom, Polygon::new(rect_points(0, 0, 20, 20), vec![], clearing()))
            .unwrap();
        board
            .add_padstack(Padstack::new(Point::new(10, 10), PadShape::Circle { diameter: 40 }, 20, Flags::default()))
            .unwrap();
        assert!(board.clipped(small).unwrap().is_empty());

        let big = board
            .add_polygon(top, Polygon::new(rect_points(-500, -500, 500, 500), vec![], clearing()))
            .unwrap();
        let islands = board.clipped(big).unwrap();
        assert_eq!(islands.len(), 1);
        assert!(islands[0].has_holes());
        let diced = board.no_holes(big, BBox::ZERO).unwrap();
        assert!(diced.len() >= 2);
    }

    #[test]
    fn test_layers_do_not_mix() {
        let mut board = Board::default();
        let top = board.add_layer("top");
        let bottom = board.add_layer("bottom");
        let a = board
            .add_line(top, Line::new(Point::new(0, 0), Point::new(100, 0), 10, 0, Flags::default()))
            .unwrap();
        let b = board
            .add_line(bottom, Line::new(Point::new(0, 0), Point::new(100, 0), 10, 0, Flags::default()))
            .unwrap();
        assert!(!board.intersects(a, b).unwrap().hit);
        assert!(board.candidates(a).unwrap().is_empty());

        let via = board
            .add_padstack(Padstack::new(Point::new(100, 0), PadShape::Circle { diameter: 30 }, 0, Flags::default()))
            .unwrap();
        assert!(board.intersects(a, via).unwrap().hit);
        assert!(board.intersects(via, b).unwrap().hit);
        let around_via = board.candidates(via).unwrap();
        assert!(around_via.contains(&a) && around_via.contains(&b));
    }

    #[test]
    fn test_move_and_remove_keep_trees_in_sync() {
        let mut board = Board::default();
        let top = board.add_layer("top");
        let mut refs = Vec::new();
        for i in 0..30 {
            let x = i * 100;
            refs.push(
                board
                    .add_line(top, Line::new(Point::new(x, 0), Point::new(x + 50, 0), 10, 0, Flags::default()))
                    .unwrap(),
            );
        }
        let arc = board
            .add_arc(top, Arc::new(ArcGeom::new(Point::new(0, 500), 50, 0.0, 90.0), 10, 0, Flags::default()))
            .unwrap();
        board.check().unwrap();

        for r in refs.iter().step_by(3) {
            board.move_object(*r, 0, 1_000).unwrap();
        }
        board.move_object(arc, 5_000, 0).unwrap();
        for r in refs.iter().skip(1).step_by(3) {
            board.remove(*r).unwrap();
        }
        board.check().unwrap();

        let moved = board.layer(top).unwrap().line_tree.search_collect(&BBox::new(-100, 900, 5_000, 1_100));
        assert_eq!(moved.len(), 10);
        assert!(matches!(board.remove(refs[1]), Err(FindError::StaleHandle(_))));
        assert_eq!(board.layer(top).unwrap().object_count(), 21);
    }

    #[test]
    fn test_move_with_lost_tree_entry_leaves_one_entry() {
        init();
        let mut board = Board::default();
        let top = board.add_layer("top");
        let line = board
            .add_line(top, Line::new(Point::new(0, 0), Point::new(100, 0), 10, 0, Flags::default()))
            .unwrap();
        let old = board.object(line).unwrap().bbox();
        assert!(board.layer_mut(top).unwrap().line_tree.delete(&old, &line.index));
        assert!(matches!(board.check(), Err(FindError::IndexOutOfStep { entries: 0, objects: 1, .. })));

        let new = board.move_object(line, 0, 500).unwrap();
        board.check().unwrap();
        let tree = &board.layer(top).unwrap().line_tree;
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.search_collect(&new), vec![line.index]);
        assert!(tree.search_collect(&old).is_empty());
    }

    #[test]
    fn test_degenerate_inputs_rejected() {
        let mut board = Board::default();
        let top = board.add_layer("top");
        let flat = Polygon::new(
            vec![Point::new(0, 0), Point::new(10, 0), Point::new(20, 0)],
            vec![],
            Flags::default(),
        );
        assert!(matches!(board.add_polygon(top, flat), Err(FindError::DegeneratePolygon)));
        let text = Text::new(Point::new(0, 0), "X", BBox::new(10, 10, 0, 0), 0, Flags::default());
        assert!(matches!(board.add_text(top, text), Err(FindError::EmptyBox(_))));
        let line = board
            .add_line(top, Line::new(Point::new(0, 0), Point::new(10, 0), 10, 0, Flags::default()))
            .unwrap();
        assert!(matches!(board.polygon(line), Err(FindError::WrongKind { .. })));
    }

    #[test]
    #[should_panic(expected = "don't know how to check intersection of these object types")]
    fn test_void_handle_panics() {
        let mut board = Board::default();
        let top = board.add_layer("top");
        let line = board
            .add_line(top, Line::new(Point::new(0, 0), Point::new(10, 0), 10, 0, Flags::default()))
            .unwrap();
        let void = ObjRef {
            kind: ObjKind::Void,
            layer: None,
            index: 0,
        };
        let _ = board.intersects(line, void);
    }
}
