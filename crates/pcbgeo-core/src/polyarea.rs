//! Polygons with holes.

use serde::Serialize;

use crate::contour::{Contour, Orientation, RoundInfo};
use crate::geometry::{segments_intersect, BBox, Coord, Point};

/// One outer contour (counter-clockwise) plus zero or more holes
/// (clockwise). A multi-island set is a `Vec<Polyarea>`.
///
/// Holes are assumed to lie inside the outer contour; that is not checked.
#[derive(Debug, Clone)]
pub struct Polyarea {
    contours: Vec<Contour>,
}

impl Polyarea {
    /// Wrap `outer`, simplifying it and fixing it to counter-clockwise.
    pub fn new(mut outer: Contour) -> Self {
        outer.pre(true);
        if outer.orientation() == Orientation::Clockwise {
            outer.invert();
        }
        Self {
            contours: vec![outer],
        }
    }

    /// Wrap `outer` as-is, without simplification or reorientation.
    /// Used for degenerate zero-area shapes.
    pub fn from_raw(outer: Contour) -> Self {
        Self {
            contours: vec![outer],
        }
    }

    /// Add a hole, fixing it to clockwise.
    pub fn add_hole(&mut self, mut hole: Contour) {
        hole.pre(true);
        if hole.orientation() == Orientation::CounterClockwise {
            hole.invert();
        }
        self.contours.push(hole);
    }

    pub fn outer(&self) -> &Contour {
        &self.contours[0]
    }

    pub fn holes(&self) -> &[Contour] {
        &self.contours[1..]
    }

    pub fn has_holes(&self) -> bool {
        self.contours.len() > 1
    }

    /// Outer first, then holes.
    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn into_outer(mut self) -> Contour {
        self.contours.swap_remove(0)
    }

    pub fn into_contours(self) -> Vec<Contour> {
        self.contours
    }

    /// Outer area minus the hole areas.
    pub fn area(&self) -> f64 {
        self.contours.iter().map(Contour::area).sum()
    }

    pub fn bbox(&self) -> BBox {
        self.outer().bbox()
    }

    /// Inside the outer contour and not strictly inside any hole.
    pub fn contains_point(&self, p: Point) -> bool {
        self.outer().contains_point(p)
            && !self
                .holes()
                .iter()
                .any(|h| h.contains_point(p) && !on_boundary(h, p))
    }

    pub fn translate(&mut self, dx: Coord, dy: Coord) {
        for c in &mut self.contours {
            c.translate(dx, dy);
        }
    }

    /// JSON rendering for debug logs.
    pub fn to_json(&self) -> String {
        let dump = PolyareaDump {
            area: self.area(),
            contours: self
                .contours
                .iter()
                .map(|c| ContourDump {
                    bbox: c.bbox(),
                    area: c.area(),
                    round: c.round(),
                    points: c.to_vec(),
                })
                .collect(),
        };
        serde_json::to_string(&dump).unwrap_or_default()
    }
}

#[derive(Serialize)]
struct ContourDump {
    bbox: BBox,
    area: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    round: Option<RoundInfo>,
    points: Vec<Point>,
}

#[derive(Serialize)]
struct PolyareaDump {
    area: f64,
    contours: Vec<ContourDump>,
}

fn on_boundary(c: &Contour, p: Point) -> bool {
    c.edges().any(|(a, b)| segments_intersect(a, b, p, p))
}

/// True when the two filled regions share at least one point: a boundary
/// contact, a crossing, or one lying inside the other. Holes are respected.
pub fn touching(a: &Polyarea, b: &Polyarea) -> bool {
    if !a.bbox().touches(&b.bbox()) {
        return false;
    }
    for ca in a.contours() {
        for cb in b.contours() {
            if !ca.bbox().touches(&cb.bbox()) {
                continue;
            }
            for (a1, a2) in ca.edges() {
                if !BBox::from_corners(a1, a2).touches(&cb.bbox()) {
                    continue;
                }
                if cb.edges().any(|(b1, b2)| segments_intersect(a1, a2, b1, b2)) {
                    return true;
                }
            }
        }
    }
    // no boundary contact: either nested or disjoint
    let pa = a.outer().point(a.outer().head());
    let pb = b.outer().point(b.outer().head());
    b.contains_point(pa) || a.contains_point(pb)
}

/// True when `a` touches any island of `islands`.
pub fn touching_any(a: &Polyarea, islands: &[Polyarea]) -> bool {
    islands.iter().any(|b| touching(a, b))
}

/// Move the island with the largest area to the front.
pub fn biggest_first(islands: &mut [Polyarea]) {
    let biggest = islands
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.area().total_cmp(&b.area()))
        .map(|(i, _)| i);
    if let Some(i) = biggest {
        islands.swap(0, i);
    }
}

pub fn total_area(islands: &[Polyarea]) -> f64 {
    islands.iter().map(Polyarea::area).sum()
}
