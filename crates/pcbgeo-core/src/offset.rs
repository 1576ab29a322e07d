//! Parallel offset of a contour.

use crate::contour::Contour;
use crate::geometry::{line_intersection, Point};

/// Unit normal `(-dy/len, dx/len)` of the edge `a → b`; zero for a
/// zero-length edge.
pub fn edge_normal(a: Point, b: Point) -> (f64, f64) {
    let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
    let len = dx.hypot(dy);
    if len == 0.0 {
        return (0.0, 0.0);
    }
    (-dy / len, dx / len)
}

/// New contour whose edges run parallel to those of `src` at `distance`.
///
/// Each edge moves along its normal by `distance`, which is to the left of
/// the direction of travel: inwards for a counter-clockwise outer contour.
/// The new vertex at `v` is where the shifted line `p → v` meets the shifted
/// line `v → n`. When those lines are parallel the shifted `p → v` line's
/// end point is used instead. Vertices are rounded to board units.
pub fn offset(src: &Contour, distance: f64) -> Contour {
    let points = src.to_vec();
    let n = points.len();
    let normals: Vec<(f64, f64)> = (0..n)
        .map(|i| edge_normal(points[i], points[(i + 1) % n]))
        .collect();

    let shift = |p: Point, nrm: (f64, f64)| {
        (
            p.x as f64 + nrm.0 * distance,
            p.y as f64 + nrm.1 * distance,
        )
    };

    let mut out: Option<Contour> = None;
    for i in 0..n {
        let prev = (i + n - 1) % n;
        let (p, v, next) = (points[prev], points[i], points[(i + 1) % n]);
        let (np, nn) = (normals[prev], normals[i]);

        let a1 = shift(p, np);
        let a2 = shift(v, np);
        let b1 = shift(v, nn);
        let b2 = shift(next, nn);
        let (x, y) = line_intersection(b1, b2, a1, a2).unwrap_or(a2);
        let q = Point::from_f64(x, y);

        match &mut out {
            Some(c) => {
                c.push_forced(q);
            }
            None => out = Some(Contour::new(q)),
        }
    }

    let mut c = out.unwrap_or_else(|| Contour::new(Point::default()));
    c.pre(false);
    c
}
