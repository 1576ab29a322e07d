//! Polygon approximations of board primitives.
//!
//! Curves are tessellated into straight edges. Every constructor returns a
//! freshly owned [`Polyarea`] with a counter-clockwise outer contour.

use std::f64::consts::PI;

use crate::boolean::{unite_pair, BoolError};
use crate::contour::{Contour, RoundInfo};
use crate::geometry::{ArcGeom, BBox, Coord, Point};
use crate::polyarea::Polyarea;

/// Segments in a full circle.
pub const CIRC_SEGS: u32 = 40;

/// Scale applied to circle radii so the 40-gon circumscribes the circle.
pub const CIRC_RADIUS_ADJ: f64 = 1.0 + PI * PI / (2.0 * CIRC_SEGS as f64 * CIRC_SEGS as f64);

/// Allowed deviation of a tessellated arc edge, relative to the band width.
pub const ARC_MAX_DEVIATION: f64 = 0.02;

/// Largest angle (degrees) covered by one arc segment.
pub const ARC_ANGLE: f64 = 5.0;

/// Arcs whose gap between the two ends falls below this are built in halves.
pub const MIN_CLEARANCE_BEFORE_BISECT: f64 = 10.0;

/// `tan(22.5°) / 2`, the half side of a unit-diameter octagon.
pub const TAN_22_5_DEGREE_2: f64 = 0.207106781;

fn round(v: f64) -> Coord {
    v.round() as Coord
}

fn circle_step() -> (f64, f64) {
    let a = 2.0 * PI / CIRC_SEGS as f64;
    (a.cos(), a.sin())
}

fn frac_circle_inner(c: &mut Contour, center: Point, v: Point, range: u32, add_last: bool) {
    let (cos, sin) = circle_step();
    c.push(v);

    let (ox, oy) = ((v.x - center.x) as f64, (v.y - center.y) as f64);
    let (mut ex, mut ey) = (ox * CIRC_RADIUS_ADJ, oy * CIRC_RADIUS_ADJ);
    let steps = CIRC_SEGS / range.max(1);
    for _ in 0..steps.saturating_sub(1) {
        (ex, ey) = (cos * ex - sin * ey, sin * ex + cos * ey);
        c.push(Point::new(center.x + round(ex), center.y + round(ey)));
    }

    if add_last {
        // exact end of the swept fraction, without the radius adjustment
        let (lx, ly) = match range {
            4 => (-oy, ox),
            2 => (-ox, -oy),
            _ => (ox, oy),
        };
        c.push(Point::new(center.x + round(lx), center.y + round(ly)));
    }
}

/// Append `v` and then the vertices of a counter-clockwise circle fraction
/// around `center` (`range` 1, 2 or 4 for a full, half or quarter turn).
/// The final vertex of the fraction is left to the caller.
pub fn frac_circle(c: &mut Contour, center: Point, v: Point, range: u32) {
    frac_circle_inner(c, center, v, range, false);
}

/// Like [`frac_circle`] but also appends the closing vertex of the fraction.
pub fn frac_circle_end(c: &mut Contour, center: Point, v: Point, range: u32) {
    frac_circle_inner(c, center, v, range, true);
}

fn circle_contour(center: Point, radius: Coord) -> Contour {
    let start = Point::new(center.x + radius, center.y);
    let mut c = Contour::new(start);
    frac_circle(&mut c, center, start, 1);
    c.set_round(RoundInfo { center, radius });
    c
}

/// 40-gon circumscribing the circle. `None` for a non-positive radius.
pub fn circle(center: Point, radius: Coord) -> Option<Polyarea> {
    (radius > 0).then(|| Polyarea::new(circle_contour(center, radius)))
}

/// X and Y multipliers for the eight octagon corners, from the legacy
/// square-pin style number (bits of `style - 1` stretch one side each).
pub fn square_pin_factors(style: u32) -> ([f64; 8], [f64; 8]) {
    const FACTOR: f64 = 2.0;
    let mut xm = [1.0; 8];
    let mut ym = [1.0; 8];
    let style = style.saturating_sub(1);
    if style & 1 != 0 {
        for i in [0, 1, 6, 7] {
            xm[i] = FACTOR;
        }
    }
    if style & 2 != 0 {
        for i in [2, 3, 4, 5] {
            xm[i] = FACTOR;
        }
    }
    if style & 4 != 0 {
        for i in [4, 5, 6, 7] {
            ym[i] = FACTOR;
        }
    }
    if style & 8 != 0 {
        for i in [0, 1, 2, 3] {
            ym[i] = FACTOR;
        }
    }
    (xm, ym)
}

/// Octagon of the given across-flats size centred on `center`.
pub fn octagon(center: Point, size: Coord, style: u32) -> Option<Polyarea> {
    if size <= 0 {
        return None;
    }
    let (xm, ym) = square_pin_factors(style);
    let half = (size as f64 * 0.5).round();
    let side = (size as f64 * TAN_22_5_DEGREE_2).round();
    let at = |dx: f64, dy: f64| Point::new(center.x + round(dx), center.y + round(dy));

    let corners = [
        at(half * xm[7], side * ym[7]),
        at(side * xm[6], half * ym[6]),
        at(-side * xm[5], half * ym[5]),
        at(-half * xm[4], side * ym[4]),
        at(-half * xm[3], -side * ym[3]),
        at(-side * xm[2], -half * ym[2]),
        at(side * xm[1], -half * ym[1]),
        at(half * xm[0], -side * ym[0]),
    ];
    Contour::from_points(&corners).map(Polyarea::new)
}

/// Axis-aligned rectangle. `None` for zero or negative extents.
pub fn rect(x1: Coord, x2: Coord, y1: Coord, y2: Coord) -> Option<Polyarea> {
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Contour::from_points(&[
        Point::new(x1, y1),
        Point::new(x2, y1),
        Point::new(x2, y2),
        Point::new(x1, y2),
    ])
    .map(Polyarea::new)
}

/// Rectangle for `b` grown by `d` on every side.
pub fn box_bloated(b: &BBox, d: Coord) -> Option<Polyarea> {
    rect(b.x1 - d, b.x2 + d, b.y1 - d, b.y2 + d)
}

/// Rectangle `x1..x2 × y1..y2` grown by `t` with quarter-circle corners.
pub fn round_rect(x1: Coord, x2: Coord, y1: Coord, y2: Coord, t: Coord) -> Option<Polyarea> {
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    let mut v = Point::new(x1 - t, y1);
    let mut c = Contour::new(v);
    frac_circle_end(&mut c, Point::new(x1, y1), v, 4);
    v = Point::new(x2, y1 - t);
    c.push(v);
    frac_circle_end(&mut c, Point::new(x2, y1), v, 4);
    v = Point::new(x2 + t, y2);
    c.push(v);
    frac_circle_end(&mut c, Point::new(x2, y2), v, 4);
    v = Point::new(x1, y2 + t);
    c.push(v);
    frac_circle_end(&mut c, Point::new(x1, y2), v, 4);
    Some(Polyarea::new(c))
}

/// Centreline-only shape for zero-width primitives: zero area, never `None`.
fn centreline(points: &[Point]) -> Polyarea {
    let (first, rest) = match points.split_first() {
        Some(split) => split,
        None => return Polyarea::from_raw(Contour::new(Point::default())),
    };
    let mut c = Contour::new(*first);
    for p in rest {
        if c.point(c.prev(c.head())) != *p {
            c.push_forced(*p);
        }
    }
    c.pre(false);
    Polyarea::from_raw(c)
}

/// Area swept by a pen of `thickness` along `p1 → p2`, with square or
/// round caps. A zero thickness yields the bare centreline.
pub fn line(p1: Point, p2: Point, thickness: Coord, square: bool) -> Polyarea {
    if thickness <= 0 {
        return centreline(&[p1, p2]);
    }
    let half = (thickness + 1) / 2;
    let d = p1.distance_to(&p2);
    if !square && d == 0.0 {
        return Polyarea::new(circle_contour(p1, half));
    }
    let (dx, dy) = if d != 0.0 {
        let k = half as f64 / d;
        ((p1.y - p2.y) as f64 * k, (p2.x - p1.x) as f64 * k)
    } else {
        (half as f64, 0.0)
    };
    let (mut x1, mut y1) = p1.to_f64();
    let (mut x2, mut y2) = p2.to_f64();
    if square {
        x1 -= dy;
        y1 += dx;
        x2 += dy;
        y2 -= dx;
    }
    let (cap1, cap2) = (Point::from_f64(x1, y1), Point::from_f64(x2, y2));

    let mut c = Contour::new(Point::from_f64(x1 - dx, y1 - dy));
    let v = Point::from_f64(x2 - dx, y2 - dy);
    if square {
        c.push(v);
    } else {
        frac_circle(&mut c, cap2, v, 2);
    }
    c.push(Point::from_f64(x2 + dx, y2 + dy));
    let v = Point::from_f64(x1 + dx, y1 + dy);
    if square {
        c.push(v);
    } else {
        frac_circle(&mut c, cap1, v, 2);
    }
    Polyarea::new(c)
}

/// Square pad body of `thickness` along `p1 → p2` whose outline is pushed out
/// to `clear` (total width) with rounded corners.
pub fn square_pad(p1: Point, p2: Point, thickness: Coord, clear: Coord) -> Polyarea {
    let half_thick = ((thickness + 1) / 2) as f64;
    let half_clear = ((clear + 1) / 2) as f64;
    let (mut t1, mut t2) = (p1.to_f64(), p2.to_f64());
    let (mut c1, mut c2) = (t1, t2);

    let d = p1.distance_to(&p2);
    let (tx, ty, cx, cy);
    if d != 0.0 {
        let a = half_thick / d;
        tx = (p1.y - p2.y) as f64 * a;
        ty = (p2.x - p1.x) as f64 * a;
        let a = half_clear / d;
        cx = (p1.y - p2.y) as f64 * a;
        cy = (p2.x - p1.x) as f64 * a;
        t1 = (t1.0 - ty, t1.1 + tx);
        t2 = (t2.0 + ty, t2.1 - tx);
        c1 = (c1.0 - cy, c1.1 + cx);
        c2 = (c2.0 + cy, c2.1 - cx);
    } else {
        (tx, ty, cx, cy) = (half_thick, 0.0, half_clear, 0.0);
        t1.1 += tx;
        t2.1 -= tx;
        c1.1 += cx;
        c2.1 -= cx;
    }

    let at = |x: f64, y: f64| Point::from_f64(x, y);
    let mut v = at(c1.0 - tx, c1.1 - ty);
    let mut c = Contour::new(v);
    frac_circle(&mut c, at(t1.0 - tx, t1.1 - ty), v, 4);
    v = at(t2.0 - cx, t2.1 - cy);
    c.push(v);
    frac_circle(&mut c, at(t2.0 - tx, t2.1 - ty), v, 4);
    v = at(c2.0 + tx, c2.1 + ty);
    c.push(v);
    frac_circle(&mut c, at(t2.0 + tx, t2.1 + ty), v, 4);
    v = at(t1.0 + cx, t1.1 + cy);
    c.push(v);
    frac_circle(&mut c, at(t1.0 + tx, t1.1 + ty), v, 4);
    Polyarea::new(c)
}

fn arc_point(geom: &ArcGeom, rx: f64, ry: f64, angle: f64, scale: f64) -> Point {
    let a = angle.to_radians();
    Point::from_f64(
        geom.center.x as f64 - rx * a.cos() * scale,
        geom.center.y as f64 + ry * a.sin() * scale,
    )
}

/// Band around an arc that does not wrap onto itself.
fn arc_band(geom: &ArcGeom, thickness: Coord, end_caps: bool) -> Polyarea {
    let (start, delta) = geom.normalized();
    let half = (thickness + 1) / 2;
    let (end1, end2) = ArcGeom {
        start_angle: start,
        delta,
        ..*geom
    }
    .ends();

    let rx = (geom.width - half).max(0) as f64;
    let ry = (geom.height - half).max(0) as f64;
    let deviation = (rx.hypot(ry) / ARC_MAX_DEVIATION / 2.0 / thickness as f64).sqrt();
    let segs = ((delta * PI / 360.0 * deviation) as i64)
        .max((delta / ARC_ANGLE) as i64)
        .max(1);

    let da = delta / segs as f64;
    let radius_adj = (PI * da / 360.0).powi(2) / 2.0;

    // inner edge, start to end
    let mut ang = start;
    let mut c = Contour::new(arc_point(geom, rx, ry, ang, 1.0));
    for _ in 0..segs - 1 {
        ang += da;
        c.push(arc_point(geom, rx, ry, ang, 1.0));
    }
    ang = start + delta;
    let inner_end = arc_point(geom, rx, ry, ang, 1.0 - radius_adj);
    if end_caps {
        frac_circle(&mut c, end2, inner_end, 2);
    }

    // outer edge, end back to start
    let rx = (geom.width + half) as f64 * (1.0 + radius_adj);
    let ry = (geom.height + half) as f64 * (1.0 + radius_adj);
    for _ in 0..segs {
        c.push(arc_point(geom, rx, ry, ang, 1.0));
        ang -= da;
    }
    let outer_start = arc_point(geom, rx, ry, start, 1.0 - radius_adj);
    c.push(outer_start);
    if end_caps {
        frac_circle(&mut c, end1, outer_start, 2);
    }
    Polyarea::new(c)
}

/// Area swept by a round pen of `thickness` along an arc. Zero thickness
/// yields the tessellated centreline; arcs that would overlap themselves
/// are built as the union of two halves.
pub fn arc(geom: &ArcGeom, thickness: Coord) -> Result<Polyarea, BoolError> {
    let (start, delta) = geom.normalized();
    if thickness <= 0 {
        let segs = ((delta / ARC_ANGLE) as i64).max(1);
        let r = (geom.width as f64, geom.height as f64);
        let forward: Vec<Point> = (0..=segs)
            .map(|i| arc_point(geom, r.0, r.1, start + delta * i as f64 / segs as f64, 1.0))
            .collect();
        let back = forward.iter().rev().skip(1).take(forward.len().saturating_sub(2));
        let ring: Vec<Point> = forward.iter().chain(back).copied().collect();
        return Ok(centreline(&ring));
    }

    let half = (thickness + 1) / 2;
    if geom.width - half <= 0 || geom.height - half <= 0 {
        let (e1, e2) = geom.ends();
        let band = arc_band(geom, thickness, false);
        let ends = unite_pair(line(e1, e1, thickness, false), line(e2, e2, thickness, false))?;
        return unite_pair(ends, band);
    }

    if 2.0 * PI * geom.width as f64 * (1.0 - delta / 360.0) - (thickness as f64)
        < MIN_CLEARANCE_BEFORE_BISECT
    {
        let half_delta = (delta / 2.0).trunc();
        let first = ArcGeom {
            start_angle: start,
            delta: half_delta,
            ..*geom
        };
        let second = ArcGeom {
            start_angle: start + half_delta,
            delta: delta - half_delta,
            ..*geom
        };
        return unite_pair(
            arc_band(&first, thickness, true),
            arc_band(&second, thickness, true),
        );
    }

    Ok(arc_band(geom, thickness, true))
}

/// Islands from a flat point list where `hole_starts` holds the indices at
/// which hole contours begin. Returns `None` when the outer contour is
/// degenerate.
pub fn from_points(points: &[Point], hole_starts: &[usize]) -> Option<Polyarea> {
    let mut bounds: Vec<usize> = hole_starts
        .iter()
        .copied()
        .filter(|&i| i > 0 && i < points.len())
        .collect();
    bounds.sort_unstable();
    bounds.dedup();
    bounds.push(points.len());

    let mut from = 0;
    let mut poly: Option<Polyarea> = None;
    for to in bounds {
        let contour = Contour::from_points(&points[from..to]);
        from = to;
        let Some(contour) = contour else {
            continue;
        };
        match &mut poly {
            None => {
                let outer = Polyarea::new(contour);
                if outer.outer().count() < 3 || outer.area() == 0.0 {
                    return None;
                }
                poly = Some(outer);
            }
            Some(p) => {
                if contour.count() >= 3 {
                    p.add_hole(contour);
                }
            }
        }
    }
    poly
}
