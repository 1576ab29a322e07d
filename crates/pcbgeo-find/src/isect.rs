//! Primitive intersection tests, one per unordered pair of object kinds.
//!
//! Every test treats `bloat` as extra distance between the two objects: two
//! objects whose copper is closer than `bloat` intersect. Polygon operands
//! use their clipped islands and fail with [`FindError::StaleClip`] when the
//! cache has not been built.

use pcbgeo_core::geometry::{point_segment_distance, segments_intersect};
use pcbgeo_core::offset::offset;
use pcbgeo_core::polyarea::touching_any;
use pcbgeo_core::{touching, ArcGeom, Coord, Orientation, Point, Polyarea};

use crate::error::FindError;
use crate::object::{Arc, Line, PadShape, Padstack, Polygon, Text};

// ── Distance helpers ─────────────────────────────────────────────────

fn dist(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Shortest distance between two closed segments.
pub fn segment_distance(a1: Point, a2: Point, b1: Point, b2: Point) -> f64 {
    if segments_intersect(a1, a2, b1, b2) {
        return 0.0;
    }
    let (fa1, fa2, fb1, fb2) = (a1.to_f64(), a2.to_f64(), b1.to_f64(), b2.to_f64());
    point_segment_distance(fa1, fb1, fb2)
        .min(point_segment_distance(fa2, fb1, fb2))
        .min(point_segment_distance(fb1, fa1, fa2))
        .min(point_segment_distance(fb2, fa1, fa2))
}

fn is_circular(g: &ArcGeom) -> bool {
    g.width == g.height
}

fn arc_ends(g: &ArcGeom) -> ((f64, f64), (f64, f64)) {
    (g.point_at(g.start_angle), g.point_at(g.start_angle + g.delta))
}

/// Distance from a point to a circular arc centreline.
pub fn point_arc_distance(p: (f64, f64), g: &ArcGeom) -> f64 {
    let c = g.center.to_f64();
    let r = g.width as f64;
    let d = dist(p, c);
    if d == 0.0 {
        return r;
    }
    if g.sweeps_angle_of(p.0, p.1) {
        return (d - r).abs();
    }
    let (s, e) = arc_ends(g);
    dist(p, s).min(dist(p, e))
}

/// Points where the segment `a`–`b` crosses the full circle of `g`.
fn segment_circle_hits(a: (f64, f64), b: (f64, f64), g: &ArcGeom) -> Vec<(f64, f64)> {
    let c = g.center.to_f64();
    let r = g.width as f64;
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (fx, fy) = (a.0 - c.0, a.1 - c.1);
    let qa = dx * dx + dy * dy;
    if qa == 0.0 {
        return Vec::new();
    }
    let qb = 2.0 * (fx * dx + fy * dy);
    let qc = fx * fx + fy * fy - r * r;
    let disc = qb * qb - 4.0 * qa * qc;
    if disc < 0.0 {
        return Vec::new();
    }
    let root = disc.sqrt();
    [(-qb - root) / (2.0 * qa), (-qb + root) / (2.0 * qa)]
        .into_iter()
        .filter(|t| (0.0..=1.0).contains(t))
        .map(|t| (a.0 + t * dx, a.1 + t * dy))
        .collect()
}

/// Shortest distance between a segment and a circular arc centreline.
pub fn segment_arc_distance(a: Point, b: Point, g: &ArcGeom) -> f64 {
    let (fa, fb) = (a.to_f64(), b.to_f64());
    if segment_circle_hits(fa, fb, g)
        .iter()
        .any(|p| g.sweeps_angle_of(p.0, p.1))
    {
        return 0.0;
    }
    let (s, e) = arc_ends(g);
    let mut best = point_arc_distance(fa, g)
        .min(point_arc_distance(fb, g))
        .min(point_segment_distance(s, fa, fb))
        .min(point_segment_distance(e, fa, fb));

    // segment point nearest the centre
    let c = g.center.to_f64();
    let (dx, dy) = (fb.0 - fa.0, fb.1 - fa.1);
    let len2 = dx * dx + dy * dy;
    if len2 > 0.0 {
        let t = ((c.0 - fa.0) * dx + (c.1 - fa.1) * dy) / len2;
        if (0.0..=1.0).contains(&t) {
            let foot = (fa.0 + t * dx, fa.1 + t * dy);
            best = best.min(point_arc_distance(foot, g));
        }
    }
    best
}

/// Shortest distance between two circular arc centrelines.
pub fn arc_arc_distance(a: &ArcGeom, b: &ArcGeom) -> f64 {
    let (ca, cb) = (a.center.to_f64(), b.center.to_f64());
    let (ra, rb) = (a.width as f64, b.width as f64);

    let (as_, ae) = arc_ends(a);
    let (bs, be) = arc_ends(b);
    let mut best = point_arc_distance(as_, b)
        .min(point_arc_distance(ae, b))
        .min(point_arc_distance(bs, a))
        .min(point_arc_distance(be, a));

    let d = dist(ca, cb);
    if d == 0.0 {
        // concentric: the end points already cover every closest pair
        return best;
    }
    let (ux, uy) = ((cb.0 - ca.0) / d, (cb.1 - ca.1) / d);

    // circle crossings inside both sweeps
    if d <= ra + rb && d >= (ra - rb).abs() {
        let along = (d * d + ra * ra - rb * rb) / (2.0 * d);
        let h = (ra * ra - along * along).max(0.0).sqrt();
        let (mx, my) = (ca.0 + along * ux, ca.1 + along * uy);
        for s in [-1.0, 1.0] {
            let p = (mx - s * h * uy, my + s * h * ux);
            if a.sweeps_angle_of(p.0, p.1) && b.sweeps_angle_of(p.0, p.1) {
                return 0.0;
            }
        }
    }

    // points on the line through both centres
    for s in [-1.0, 1.0] {
        let pa = (ca.0 + s * ra * ux, ca.1 + s * ra * uy);
        if a.sweeps_angle_of(pa.0, pa.1) {
            best = best.min(point_arc_distance(pa, b));
        }
        let pb = (cb.0 + s * rb * ux, cb.1 + s * rb * uy);
        if b.sweeps_angle_of(pb.0, pb.1) {
            best = best.min(point_arc_distance(pb, a));
        }
    }
    best
}

fn within(distance: f64, widths: Coord, bloat: Coord) -> bool {
    distance <= widths as f64 / 2.0 + bloat as f64
}

fn islands(p: &Polygon) -> Result<&[Polyarea], FindError> {
    p.live_islands().ok_or(FindError::StaleClip)
}

/// Islands grown by `grow` on every side.
fn grown(islands: &[Polyarea], grow: f64) -> Vec<Polyarea> {
    if grow == 0.0 {
        return islands.to_vec();
    }
    islands
        .iter()
        .map(|pa| {
            let mut out = Polyarea::new(offset(pa.outer(), -grow));
            for hole in pa.holes() {
                let shrunk = offset(hole, -grow);
                if shrunk.orientation() == Orientation::Clockwise && shrunk.count() >= 3 {
                    out.add_hole(shrunk);
                }
            }
            out
        })
        .collect()
}

// ── Line / arc ───────────────────────────────────────────────────────

pub fn line_line(a: &Line, b: &Line, bloat: Coord) -> bool {
    if a.flags.square || b.flags.square {
        return touching(&a.poly(bloat), &b.poly(bloat));
    }
    let d = segment_distance(a.p1, a.p2, b.p1, b.p2);
    within(d, a.thickness + b.thickness, bloat)
}

pub fn line_arc(l: &Line, a: &Arc, bloat: Coord) -> Result<bool, FindError> {
    if l.flags.square || !is_circular(&a.geom) {
        return Ok(touching(&l.poly(bloat), &a.poly(bloat)?));
    }
    let d = segment_arc_distance(l.p1, l.p2, &a.geom);
    Ok(within(d, l.thickness + a.thickness, bloat))
}

pub fn arc_arc(a: &Arc, b: &Arc, bloat: Coord) -> Result<bool, FindError> {
    if !is_circular(&a.geom) || !is_circular(&b.geom) {
        return Ok(touching(&a.poly(bloat)?, &b.poly(bloat)?));
    }
    let d = arc_arc_distance(&a.geom, &b.geom);
    Ok(within(d, a.thickness + b.thickness, bloat))
}

// ── Polygon ──────────────────────────────────────────────────────────

/// A clearing line cut its own hole in a clearing polygon and never
/// touches it.
pub fn line_poly(l: &Line, p: &Polygon, bloat: Coord) -> Result<bool, FindError> {
    if l.flags.clear_line && p.flags.clear_poly {
        return Ok(false);
    }
    let islands = islands(p)?;
    if !l.bbox().bloat(bloat.max(0)).touches(&p.bbox()) {
        return Ok(false);
    }
    Ok(touching_any(&l.poly(2 * bloat), islands))
}

pub fn arc_poly(a: &Arc, p: &Polygon, bloat: Coord) -> Result<bool, FindError> {
    if a.flags.clear_line && p.flags.clear_poly {
        return Ok(false);
    }
    let islands = islands(p)?;
    if !a.bbox().bloat(bloat.max(0)).touches(&p.bbox()) {
        return Ok(false);
    }
    Ok(touching_any(&a.poly(2 * bloat)?, islands))
}

pub fn poly_poly(a: &Polygon, b: &Polygon, bloat: Coord) -> Result<bool, FindError> {
    let (ia, ib) = (islands(a)?, islands(b)?);
    if !a.bbox().bloat(bloat.max(0)).touches(&b.bbox()) {
        return Ok(false);
    }
    let grow = bloat as f64 / 2.0;
    let (ga, gb) = (grown(ia, grow), grown(ib, grow));
    Ok(ga.iter().any(|x| touching_any(x, &gb)))
}

// ── Padstack ─────────────────────────────────────────────────────────

fn pad_circle(s: &Padstack) -> Option<Coord> {
    match s.shape {
        PadShape::Circle { diameter } => Some(diameter),
        _ => None,
    }
}

/// Pad outline grown by `extra`; a degenerate pad touches nothing.
fn pad_poly(s: &Padstack, extra: Coord) -> Option<Polyarea> {
    let poly = s.shape_poly(extra);
    if poly.is_none() {
        log::debug!("padstack at ({}, {}) has no usable shape", s.pos.x, s.pos.y);
    }
    poly
}

pub fn pstk_line(s: &Padstack, l: &Line, bloat: Coord) -> bool {
    if let (Some(diameter), false) = (pad_circle(s), l.flags.square) {
        let d = point_segment_distance(s.pos.to_f64(), l.p1.to_f64(), l.p2.to_f64());
        return within(d, diameter + l.thickness, bloat);
    }
    let pad_grow = bloat / 2;
    let Some(pad) = pad_poly(s, pad_grow) else {
        return false;
    };
    touching(&pad, &l.poly(2 * (bloat - pad_grow)))
}

pub fn pstk_arc(s: &Padstack, a: &Arc, bloat: Coord) -> Result<bool, FindError> {
    if let (Some(diameter), true) = (pad_circle(s), is_circular(&a.geom)) {
        let d = point_arc_distance(s.pos.to_f64(), &a.geom);
        return Ok(within(d, diameter + a.thickness, bloat));
    }
    let pad_grow = bloat / 2;
    let Some(pad) = pad_poly(s, pad_grow) else {
        return Ok(false);
    };
    Ok(touching(&pad, &a.poly(2 * (bloat - pad_grow))?))
}

pub fn pstk_pstk(a: &Padstack, b: &Padstack, bloat: Coord) -> bool {
    if let (Some(da), Some(db)) = (pad_circle(a), pad_circle(b)) {
        let d = dist(a.pos.to_f64(), b.pos.to_f64());
        return within(d, da + db, bloat);
    }
    let grow = bloat / 2;
    match (pad_poly(a, grow), pad_poly(b, grow)) {
        (Some(pa), Some(pb)) => touching(&pa, &pb),
        _ => false,
    }
}

/// A padstack with clearance sits in its own hole in a clearing polygon.
pub fn pstk_poly(s: &Padstack, p: &Polygon, bloat: Coord) -> Result<bool, FindError> {
    if s.clearance > 0 && p.flags.clear_poly {
        return Ok(false);
    }
    let islands = islands(p)?;
    let Some(pad) = pad_poly(s, bloat) else {
        return Ok(false);
    };
    Ok(touching_any(&pad, islands))
}

// ── Text ─────────────────────────────────────────────────────────────

// TODO: implement text intersections
fn text_stub() -> bool {
    false
}

pub fn text_line(_t: &Text, _l: &Line, _bloat: Coord) -> bool {
    text_stub()
}

pub fn text_arc(_t: &Text, _a: &Arc, _bloat: Coord) -> bool {
    text_stub()
}

pub fn text_text(_a: &Text, _b: &Text, _bloat: Coord) -> bool {
    text_stub()
}

pub fn text_poly(_t: &Text, _p: &Polygon, _bloat: Coord) -> bool {
    text_stub()
}

pub fn text_pstk(_t: &Text, _s: &Padstack, _bloat: Coord) -> bool {
    text_stub()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Flags;
    use pcbgeo_core::BBox;

    fn round_line(x1: Coord, y1: Coord, x2: Coord, y2: Coord, t: Coord) -> Line {
        Line::new(Point::new(x1, y1), Point::new(x2, y2), t, 0, Flags::default())
    }

    fn clipped_rect(x1: Coord, y1: Coord, x2: Coord, y2: Coord, flags: Flags) -> Polygon {
        let mut p = Polygon::new(
            vec![
                Point::new(x1, y1),
                Point::new(x2, y1),
                Point::new(x2, y2),
                Point::new(x1, y2),
            ],
            vec![],
            flags,
        );
        let raw = p.raw_poly().unwrap();
        p.set_clip(vec![raw]);
        p
    }

    #[test]
    fn test_segment_distance() {
        let d = segment_distance(
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(50, 30),
            Point::new(50, 80),
        );
        assert!((d - 30.0).abs() < 1e-9);
        let crossing = segment_distance(
            Point::new(0, 0),
            Point::new(100, 100),
            Point::new(0, 100),
            Point::new(100, 0),
        );
        assert_eq!(crossing, 0.0);
    }

    #[test]
    fn test_line_line_gap_and_bloat() {
        let a = round_line(0, 0, 100, 0, 10);
        let b = round_line(0, 30, 100, 30, 10);
        assert!(!line_line(&a, &b, 0));
        assert!(line_line(&a, &b, 20));
        assert!(!line_line(&a, &b, 19));

        let c = round_line(0, 10, 100, 10, 10);
        assert!(line_line(&a, &c, 0));
        assert!(!line_line(&a, &c, -1));
    }

    #[test]
    fn test_square_lines_use_outlines() {
        let mut a = round_line(0, 0, 100, 0, 20);
        a.flags.square = true;
        // square cap reaches x = 110
        let b = round_line(115, -50, 115, 50, 10);
        assert!(line_line(&a, &b, 0));
        assert!(line_line(&b, &a, 0));
        let far = round_line(125, -50, 125, 50, 10);
        assert!(!line_line(&a, &far, 0));
    }

    #[test]
    fn test_point_arc_distance() {
        // half circle of radius 100 over the top: angles 0..180 from -x through +y
        let g = ArcGeom::new(Point::new(0, 0), 100, 0.0, 180.0);
        assert!((point_arc_distance((0.0, 150.0), &g) - 50.0).abs() < 1e-9);
        assert!((point_arc_distance((0.0, 0.0), &g) - 100.0).abs() < 1e-9);
        // below the sweep: nearest is an end point
        let below = point_arc_distance((0.0, -100.0), &g);
        assert!((below - (100.0f64 * 2.0f64.sqrt())).abs() < 1e-6);
    }

    #[test]
    fn test_line_arc() {
        let a = Arc::new(ArcGeom::new(Point::new(0, 0), 100, 0.0, 180.0), 10, 0, Flags::default());
        let crossing = round_line(-200, 100, 200, 100, 10);
        assert!(line_arc(&crossing, &a, 0).unwrap());
        let above = round_line(-200, 120, 200, 120, 10);
        assert!(!line_arc(&above, &a, 0).unwrap());
        assert!(line_arc(&above, &a, 10).unwrap());
        // below the centre the half circle is absent
        let below = round_line(-50, -100, 50, -100, 10);
        assert!(!line_arc(&below, &a, 0).unwrap());
    }

    #[test]
    fn test_arc_arc() {
        let a = Arc::new(ArcGeom::new(Point::new(0, 0), 100, 0.0, 180.0), 10, 0, Flags::default());
        let b = Arc::new(ArcGeom::new(Point::new(150, 0), 100, 0.0, 180.0), 10, 0, Flags::default());
        assert!(arc_arc(&a, &b, 0).unwrap());
        assert!(arc_arc(&b, &a, 0).unwrap());
        let far = Arc::new(ArcGeom::new(Point::new(500, 0), 100, 0.0, 180.0), 10, 0, Flags::default());
        assert!(!arc_arc(&a, &far, 0).unwrap());
        let inner = Arc::new(ArcGeom::new(Point::new(0, 0), 80, 0.0, 90.0), 10, 0, Flags::default());
        assert!(!arc_arc(&a, &inner, 0).unwrap());
        assert!(arc_arc(&a, &inner, 10).unwrap());
    }

    #[test]
    fn test_line_poly_and_clearance() {
        let poly = clipped_rect(0, 0, 100, 100, Flags::default());
        let inside = round_line(10, 10, 90, 10, 10);
        assert!(line_poly(&inside, &poly, 0).unwrap());
        let outside = round_line(120, 0, 120, 100, 10);
        assert!(!line_poly(&outside, &poly, 0).unwrap());
        assert!(line_poly(&outside, &poly, 20).unwrap());

        let clearing_poly = clipped_rect(
            0,
            0,
            100,
            100,
            Flags {
                clear_poly: true,
                ..Flags::default()
            },
        );
        let mut clearing_line = inside.clone();
        clearing_line.flags.clear_line = true;
        assert!(!line_poly(&clearing_line, &clearing_poly, 0).unwrap());
    }

    #[test]
    fn test_stale_polygon_is_an_error() {
        let p = Polygon::new(
            vec![Point::new(0, 0), Point::new(10, 0), Point::new(0, 10)],
            vec![],
            Flags::default(),
        );
        let l = round_line(0, 0, 10, 10, 1);
        assert!(matches!(line_poly(&l, &p, 0), Err(FindError::StaleClip)));
    }

    #[test]
    fn test_poly_poly_with_bloat() {
        let a = clipped_rect(0, 0, 100, 100, Flags::default());
        let b = clipped_rect(110, 0, 200, 100, Flags::default());
        assert!(!poly_poly(&a, &b, 0).unwrap());
        assert!(poly_poly(&a, &b, 10).unwrap());
        assert!(poly_poly(&b, &a, 10).unwrap());
        let c = clipped_rect(100, 0, 200, 100, Flags::default());
        assert!(poly_poly(&a, &c, 0).unwrap());
    }

    #[test]
    fn test_padstacks() {
        let via = |x, y| Padstack::new(Point::new(x, y), PadShape::Circle { diameter: 40 }, 0, Flags::default());
        assert!(pstk_pstk(&via(0, 0), &via(40, 0), 0));
        assert!(!pstk_pstk(&via(0, 0), &via(41, 0), 0));
        assert!(pstk_pstk(&via(0, 0), &via(41, 0), 1));

        let pad = Padstack::new(
            Point::new(0, 0),
            PadShape::Poly {
                points: vec![
                    Point::new(-20, -20),
                    Point::new(20, -20),
                    Point::new(20, 20),
                    Point::new(-20, 20),
                ],
            },
            0,
            Flags::default(),
        );
        assert!(pstk_pstk(&pad, &via(35, 0), 0));
        assert!(pstk_pstk(&via(35, 0), &pad, 0));
        assert!(!pstk_pstk(&pad, &via(70, 0), 0));

        let trace = round_line(30, -100, 30, 100, 20);
        assert!(pstk_line(&via(0, 0), &trace, 0));
        assert!(pstk_line(&pad, &trace, 0));
        let far = round_line(60, -100, 60, 100, 20);
        assert!(!pstk_line(&pad, &far, 0));
    }

    #[test]
    fn test_pstk_poly_clearance() {
        let poly = clipped_rect(0, 0, 100, 100, Flags::default());
        let via = Padstack::new(Point::new(50, 50), PadShape::Circle { diameter: 20 }, 0, Flags::default());
        assert!(pstk_poly(&via, &poly, 0).unwrap());

        let clearing = clipped_rect(
            0,
            0,
            100,
            100,
            Flags {
                clear_poly: true,
                ..Flags::default()
            },
        );
        let cleared = Padstack::new(Point::new(50, 50), PadShape::Circle { diameter: 20 }, 10, Flags::default());
        assert!(!pstk_poly(&cleared, &clearing, 0).unwrap());
    }

    #[test]
    fn test_text_hooks_never_intersect() {
        let t = Text::new(Point::new(0, 0), "R1", BBox::new(0, 0, 100, 100), 0, Flags::default());
        let l = round_line(0, 0, 100, 100, 10);
        assert!(!text_line(&t, &l, 0));
        assert!(!text_text(&t, &t, 1_000));
        let via = Padstack::new(Point::new(50, 50), PadShape::Circle { diameter: 20 }, 0, Flags::default());
        assert!(!text_pstk(&t, &via, 0));
    }
}
