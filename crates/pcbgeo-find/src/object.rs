//! Board objects and their geometric footprints.

use pcbgeo_core::offset::offset;
use pcbgeo_core::shapes;
use pcbgeo_core::{ArcGeom, BBox, BoolError, Coord, Point, Polyarea};
use serde::{Deserialize, Serialize};

use crate::layer::LayerId;

/// Closed set of object kinds. `Void` stands for "no object" and is never a
/// valid intersection operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjKind {
    Line,
    Text,
    Poly,
    Arc,
    Pstk,
    Void,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    /// Square line ends instead of round caps.
    pub square: bool,
    /// The object cuts its clearance out of polygons that allow it.
    pub clear_line: bool,
    /// The polygon is cut by clearing objects.
    pub clear_poly: bool,
    /// Every island of the polygon counts, not just the biggest.
    pub full_poly: bool,
}

/// Handle to an object on a [`Board`](crate::Board). Padstacks live on every
/// layer and carry no layer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjRef {
    pub kind: ObjKind,
    pub layer: Option<LayerId>,
    pub index: usize,
}

fn half(width: Coord) -> Coord {
    (width + 1) / 2
}

// ── Line ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub p1: Point,
    pub p2: Point,
    pub thickness: Coord,
    /// Total clearance across both sides.
    pub clearance: Coord,
    pub flags: Flags,
}

impl Line {
    pub fn new(p1: Point, p2: Point, thickness: Coord, clearance: Coord, flags: Flags) -> Self {
        Self {
            p1,
            p2,
            thickness,
            clearance,
            flags,
        }
    }

    /// Box of the line including its clearance.
    pub fn bbox(&self) -> BBox {
        let mut w = half(self.thickness + self.clearance);
        if self.flags.square {
            w = (w as f64 * std::f64::consts::SQRT_2).ceil() as Coord;
        }
        BBox::from_corners(self.p1, self.p2).bloat(w)
    }

    /// Outline with the pen widened by `extra`.
    pub fn poly(&self, extra: Coord) -> Polyarea {
        shapes::line(self.p1, self.p2, self.thickness + extra, self.flags.square)
    }

    pub fn clearance_poly(&self) -> Polyarea {
        self.poly(self.clearance)
    }

    pub fn translate(&mut self, dx: Coord, dy: Coord) {
        self.p1 = self.p1.translate(dx, dy);
        self.p2 = self.p2.translate(dx, dy);
    }
}

// ── Arc ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub geom: ArcGeom,
    pub thickness: Coord,
    /// Total clearance across both sides.
    pub clearance: Coord,
    pub flags: Flags,
}

impl Arc {
    pub fn new(geom: ArcGeom, thickness: Coord, clearance: Coord, flags: Flags) -> Self {
        Self {
            geom,
            thickness,
            clearance,
            flags,
        }
    }

    pub fn bbox(&self) -> BBox {
        self.geom.bbox(half(self.thickness + self.clearance))
    }

    pub fn poly(&self, extra: Coord) -> Result<Polyarea, BoolError> {
        shapes::arc(&self.geom, self.thickness + extra)
    }

    pub fn clearance_poly(&self) -> Result<Polyarea, BoolError> {
        self.poly(self.clearance)
    }

    pub fn translate(&mut self, dx: Coord, dy: Coord) {
        self.geom = self.geom.translate(dx, dy);
    }
}

// ── Text ─────────────────────────────────────────────────────────────

/// Text object. Glyph geometry is not modelled; the caller supplies the
/// rendered box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub anchor: Point,
    pub string: String,
    pub bbox: BBox,
    pub clearance: Coord,
    pub flags: Flags,
}

impl Text {
    pub fn new(anchor: Point, string: &str, bbox: BBox, clearance: Coord, flags: Flags) -> Self {
        Self {
            anchor,
            string: string.to_string(),
            bbox,
            clearance,
            flags,
        }
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    /// Rounded box cut out of clearing polygons.
    pub fn clearance_poly(&self) -> Option<Polyarea> {
        let b = self.bbox;
        shapes::round_rect(b.x1, b.x2, b.y1, b.y2, self.clearance / 2)
    }

    pub fn translate(&mut self, dx: Coord, dy: Coord) {
        self.anchor = self.anchor.translate(dx, dy);
        self.bbox = self.bbox.translate(dx, dy);
    }
}

// ── Polygon ──────────────────────────────────────────────────────────

/// Derived, hole-resolved islands of a polygon after clearance cuts.
#[derive(Debug, Clone, Default)]
pub enum ClipCache {
    #[default]
    Stale,
    Clipped(Vec<Polyarea>),
}

/// Filled polygon given by a flat corner list; `hole_starts` holds the
/// indices where hole contours begin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
    hole_starts: Vec<usize>,
    pub flags: Flags,
    #[serde(skip)]
    clip: ClipCache,
}

impl Polygon {
    pub fn new(points: Vec<Point>, hole_starts: Vec<usize>, flags: Flags) -> Self {
        Self {
            points,
            hole_starts,
            flags,
            clip: ClipCache::Stale,
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn hole_starts(&self) -> &[usize] {
        &self.hole_starts
    }

    pub fn bbox(&self) -> BBox {
        BBox::from_points(&self.points).unwrap_or(BBox::EMPTY)
    }

    /// The polygon before any clearance cuts.
    pub fn raw_poly(&self) -> Option<Polyarea> {
        shapes::from_points(&self.points, &self.hole_starts)
    }

    /// Cached islands, `None` while stale.
    pub fn clipped(&self) -> Option<&[Polyarea]> {
        match &self.clip {
            ClipCache::Clipped(islands) => Some(islands),
            ClipCache::Stale => None,
        }
    }

    /// Islands that count for intersection tests: the biggest one, or all of
    /// them with `full_poly`.
    pub fn live_islands(&self) -> Option<&[Polyarea]> {
        let islands = self.clipped()?;
        if self.flags.full_poly || islands.is_empty() {
            Some(islands)
        } else {
            Some(&islands[..1])
        }
    }

    pub fn is_clip_stale(&self) -> bool {
        matches!(self.clip, ClipCache::Stale)
    }

    pub fn invalidate_clip(&mut self) {
        self.clip = ClipCache::Stale;
    }

    pub(crate) fn set_clip(&mut self, islands: Vec<Polyarea>) {
        self.clip = ClipCache::Clipped(islands);
    }

    /// Replace the corner list. The clipped islands go stale.
    pub fn set_points(&mut self, points: Vec<Point>, hole_starts: Vec<usize>) {
        self.points = points;
        self.hole_starts = hole_starts;
        self.invalidate_clip();
    }

    pub fn translate(&mut self, dx: Coord, dy: Coord) {
        for p in &mut self.points {
            *p = p.translate(dx, dy);
        }
        self.invalidate_clip();
    }
}

// ── Padstack ─────────────────────────────────────────────────────────

/// Copper shape of a padstack, relative to its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PadShape {
    Circle {
        diameter: Coord,
    },
    Line {
        p1: Point,
        p2: Point,
        thickness: Coord,
        square: bool,
    },
    Poly {
        points: Vec<Point>,
    },
}

/// Via or pad present on every layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Padstack {
    pub pos: Point,
    pub shape: PadShape,
    /// Gap kept to clearing polygons, per side.
    pub clearance: Coord,
    pub flags: Flags,
}

impl Padstack {
    pub fn new(pos: Point, shape: PadShape, clearance: Coord, flags: Flags) -> Self {
        Self {
            pos,
            shape,
            clearance,
            flags,
        }
    }

    fn abs(&self, p: Point) -> Point {
        p.translate(self.pos.x, self.pos.y)
    }

    /// Box of the shape grown by `extra` on every side.
    fn extent(&self, extra: Coord) -> BBox {
        match &self.shape {
            PadShape::Circle { diameter } => {
                BBox::from_point(self.pos).bloat(half(*diameter) + extra)
            }
            PadShape::Line {
                p1, p2, thickness, ..
            } => {
                let w = (half(*thickness) as f64 * std::f64::consts::SQRT_2).ceil() as Coord;
                BBox::from_corners(self.abs(*p1), self.abs(*p2)).bloat(w + extra)
            }
            PadShape::Poly { points } => {
                let abs: Vec<Point> = points.iter().map(|p| self.abs(*p)).collect();
                BBox::from_points(&abs)
                    .map(|b| b.bloat(extra))
                    .unwrap_or(BBox::EMPTY)
            }
        }
    }

    /// Box including the clearance ring.
    pub fn bbox(&self) -> BBox {
        self.extent(self.clearance.max(0))
    }

    /// Copper outline grown by `extra` on every side. `None` for a
    /// degenerate shape.
    pub fn shape_poly(&self, extra: Coord) -> Option<Polyarea> {
        match &self.shape {
            PadShape::Circle { diameter } => shapes::circle(self.pos, diameter / 2 + extra),
            PadShape::Line {
                p1,
                p2,
                thickness,
                square,
            } => Some(shapes::line(
                self.abs(*p1),
                self.abs(*p2),
                thickness + 2 * extra,
                *square,
            )),
            PadShape::Poly { points } => {
                let abs: Vec<Point> = points.iter().map(|p| self.abs(*p)).collect();
                let poly = shapes::from_points(&abs, &[])?;
                if extra == 0 {
                    return Some(poly);
                }
                Some(Polyarea::new(offset(poly.outer(), -(extra as f64))))
            }
        }
    }

    /// Copper plus the clearance ring. Square line pads keep a rounded ring
    /// around their sharp corners.
    pub fn clearance_poly(&self) -> Option<Polyarea> {
        match &self.shape {
            PadShape::Line {
                p1,
                p2,
                thickness,
                square: true,
            } if self.clearance > 0 => Some(shapes::square_pad(
                self.abs(*p1),
                self.abs(*p2),
                *thickness,
                thickness + 2 * self.clearance,
            )),
            _ => self.shape_poly(self.clearance),
        }
    }

    pub fn translate(&mut self, dx: Coord, dy: Coord) {
        self.pos = self.pos.translate(dx, dy);
    }
}

// ── Borrowed view ────────────────────────────────────────────────────

/// Borrowed object of any kind, the operand type of intersection dispatch.
#[derive(Debug, Clone, Copy)]
pub enum Object<'a> {
    Line(&'a Line),
    Text(&'a Text),
    Poly(&'a Polygon),
    Arc(&'a Arc),
    Pstk(&'a Padstack),
    Void,
}

impl Object<'_> {
    pub fn kind(&self) -> ObjKind {
        match self {
            Object::Line(_) => ObjKind::Line,
            Object::Text(_) => ObjKind::Text,
            Object::Poly(_) => ObjKind::Poly,
            Object::Arc(_) => ObjKind::Arc,
            Object::Pstk(_) => ObjKind::Pstk,
            Object::Void => ObjKind::Void,
        }
    }

    pub fn bbox(&self) -> BBox {
        match self {
            Object::Line(l) => l.bbox(),
            Object::Text(t) => t.bbox(),
            Object::Poly(p) => p.bbox(),
            Object::Arc(a) => a.bbox(),
            Object::Pstk(s) => s.bbox(),
            Object::Void => BBox::EMPTY,
        }
    }
}
