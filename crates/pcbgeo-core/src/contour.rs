//! Closed vertex rings.
//!
//! A [`Contour`] stores its vertices in an index arena linked into a circular
//! doubly-linked ring, so inserting after or unlinking a vertex is O(1) and
//! no pointer cycles exist. The cached bounding box and signed area are
//! refreshed by [`Contour::pre`]; every constructor in this crate calls it
//! before handing a contour out.

use serde::{Deserialize, Serialize};

use crate::geometry::{orient, BBox, Coord, Point};

/// Handle to one vertex of a specific contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexId(usize);

/// Winding direction, derived from the sign of the area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Positive area: an outer boundary.
    CounterClockwise,
    /// Negative area: a hole.
    Clockwise,
}

/// Centre and radius recorded for contours built as circles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundInfo {
    pub center: Point,
    pub radius: Coord,
}

#[derive(Debug, Clone)]
struct VNode {
    point: Point,
    next: usize,
    prev: usize,
}

/// One closed polygon boundary.
#[derive(Debug, Clone)]
pub struct Contour {
    nodes: Vec<VNode>,
    free: Vec<usize>,
    head: usize,
    count: usize,
    bbox: BBox,
    area: f64,
    round: Option<RoundInfo>,
}

fn collinear(a: Point, b: Point, c: Point) -> bool {
    orient(a, b, c) == 0
}

impl Contour {
    /// A single-vertex ring.
    pub fn new(first: Point) -> Self {
        Self {
            nodes: vec![VNode {
                point: first,
                next: 0,
                prev: 0,
            }],
            free: Vec::new(),
            head: 0,
            count: 1,
            bbox: BBox::from_point(first),
            area: 0.0,
            round: None,
        }
    }

    /// Ring through `points` in order, dropping duplicate and collinear
    /// vertices as they are appended. `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut c = Self::new(*first);
        for p in rest {
            c.push(*p);
        }
        c.pre(false);
        Some(c)
    }

    // ── Ring navigation ──────────────────────────────────────────────

    pub fn head(&self) -> VertexId {
        VertexId(self.head)
    }

    pub fn next(&self, v: VertexId) -> VertexId {
        VertexId(self.nodes[v.0].next)
    }

    pub fn prev(&self, v: VertexId) -> VertexId {
        VertexId(self.nodes[v.0].prev)
    }

    pub fn point(&self, v: VertexId) -> Point {
        self.nodes[v.0].point
    }

    /// Number of vertices in the ring (at least one).
    pub fn count(&self) -> usize {
        self.count
    }

    /// Vertex handles from the head around the ring.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        let mut at = self.head;
        (0..self.count).map(move |_| {
            let v = VertexId(at);
            at = self.nodes[at].next;
            v
        })
    }

    /// Points from the head around the ring.
    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        self.vertices().map(|v| self.point(v))
    }

    /// Directed edges `(p[i], p[i + 1])`, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.vertices()
            .map(|v| (self.point(v), self.point(self.next(v))))
    }

    pub fn to_vec(&self) -> Vec<Point> {
        self.iter().collect()
    }

    // ── Editing ──────────────────────────────────────────────────────

    /// Insert `p` after `after`. If the vertex at `after` then lies on the
    /// straight line from its predecessor to `p`, it is removed; a repeated
    /// point is dropped the same way.
    pub fn include_after(&mut self, after: VertexId, p: Point) -> VertexId {
        let node = self.include_after_forced(after, p);
        if self.count < 3 {
            return node;
        }
        let mid = self.prev(node);
        let before = self.prev(mid);
        if collinear(self.point(before), self.point(mid), p) {
            self.unlink(mid.0);
        }
        node
    }

    /// Insert `p` after `after` without any simplification.
    pub fn include_after_forced(&mut self, after: VertexId, p: Point) -> VertexId {
        let next = self.nodes[after.0].next;
        let id = self.alloc(VNode {
            point: p,
            next,
            prev: after.0,
        });
        self.nodes[after.0].next = id;
        self.nodes[next].prev = id;
        self.count += 1;
        VertexId(id)
    }

    /// Append `p` as the last vertex (just before the head).
    pub fn push(&mut self, p: Point) -> VertexId {
        let last = self.prev(self.head());
        self.include_after(last, p)
    }

    pub fn push_forced(&mut self, p: Point) -> VertexId {
        let last = self.prev(self.head());
        self.include_after_forced(last, p)
    }

    /// Unlink `v`. Refuses (returns `false`) to remove the last vertex.
    pub fn exclude(&mut self, v: VertexId) -> bool {
        if self.count <= 1 {
            return false;
        }
        self.unlink(v.0);
        true
    }

    fn unlink(&mut self, id: usize) {
        let VNode { next, prev, .. } = self.nodes[id];
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        if self.head == id {
            self.head = next;
        }
        self.free.push(id);
        self.count -= 1;
    }

    fn alloc(&mut self, node: VNode) -> usize {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Refresh the cached bounding box and signed area. With `optimize`,
    /// first strip vertices lying on the line between their neighbours
    /// (repeated points included) until none remain or two vertices are left.
    pub fn pre(&mut self, optimize: bool) {
        if optimize {
            let mut changed = true;
            while changed && self.count > 2 {
                changed = false;
                let ring: Vec<VertexId> = self.vertices().collect();
                for v in ring {
                    if self.count <= 2 {
                        break;
                    }
                    if self.free.contains(&v.0) {
                        continue;
                    }
                    let (p, n) = (self.prev(v), self.next(v));
                    if collinear(self.point(p), self.point(v), self.point(n)) {
                        self.unlink(v.0);
                        changed = true;
                    }
                }
            }
        }

        let mut bbox = BBox::EMPTY;
        let mut twice: i128 = 0;
        for (a, b) in self.edges() {
            bbox = bbox.union(&BBox::from_point(a));
            twice += a.x as i128 * b.y as i128 - b.x as i128 * a.y as i128;
        }
        self.bbox = bbox;
        self.area = twice as f64 / 2.0;
    }

    /// Reverse the ring direction, negating the area.
    pub fn invert(&mut self) {
        let ring: Vec<usize> = self.vertices().map(|v| v.0).collect();
        for id in ring {
            let n = &mut self.nodes[id];
            std::mem::swap(&mut n.next, &mut n.prev);
        }
        self.area = -self.area;
    }

    // ── Cached properties ────────────────────────────────────────────

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    /// Signed area: positive for counter-clockwise rings.
    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn orientation(&self) -> Orientation {
        if self.area < 0.0 {
            Orientation::Clockwise
        } else {
            Orientation::CounterClockwise
        }
    }

    pub fn is_round(&self) -> bool {
        self.round.is_some()
    }

    pub fn round(&self) -> Option<RoundInfo> {
        self.round
    }

    pub(crate) fn set_round(&mut self, info: RoundInfo) {
        self.round = Some(info);
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Crossing-number test; points on the boundary count as inside.
    pub fn contains_point(&self, p: Point) -> bool {
        if !self.bbox.contains_point(&p) {
            return false;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            let o = orient(a, b, p);
            if o == 0 && BBox::from_corners(a, b).contains_point(&p) {
                return true;
            }
            if (a.y > p.y) != (b.y > p.y) && ((b.y > a.y && o > 0) || (b.y < a.y && o < 0)) {
                inside = !inside;
            }
        }
        inside
    }

    pub fn translate(&mut self, dx: Coord, dy: Coord) {
        let ring: Vec<usize> = self.vertices().map(|v| v.0).collect();
        for id in ring {
            self.nodes[id].point = self.nodes[id].point.translate(dx, dy);
        }
        if self.bbox.is_valid() {
            self.bbox = self.bbox.translate(dx, dy);
        }
        if let Some(r) = &mut self.round {
            r.center = r.center.translate(dx, dy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: Coord) -> Contour {
        Contour::from_points(&[
            Point::new(0, 0),
            Point::new(size, 0),
            Point::new(size, size),
            Point::new(0, size),
        ])
        .unwrap()
    }

    #[test]
    fn test_square_area_and_bbox() {
        let c = square(10);
        assert_eq!(c.count(), 4);
        assert_eq!(c.area(), 100.0);
        assert_eq!(c.orientation(), Orientation::CounterClockwise);
        assert_eq!(c.bbox(), BBox::new(0, 0, 10, 10));
    }

    #[test]
    fn test_ring_is_circular() {
        let c = square(10);
        let h = c.head();
        assert_eq!(c.next(c.prev(h)), h);
        let mut v = h;
        for _ in 0..c.count() {
            v = c.next(v);
        }
        assert_eq!(v, h);
        let edges: Vec<_> = c.edges().collect();
        assert_eq!(edges.last().unwrap().1, Point::new(0, 0));
    }

    #[test]
    fn test_include_drops_collinear_and_repeated_points() {
        let c = Contour::from_points(&[
            Point::new(0, 0),
            Point::new(5, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(10, 10),
            Point::new(0, 10),
        ])
        .unwrap();
        assert_eq!(
            c.to_vec(),
            vec![
                Point::new(0, 0),
                Point::new(10, 0),
                Point::new(10, 10),
                Point::new(0, 10)
            ]
        );
    }

    #[test]
    fn test_forced_include_keeps_everything() {
        let mut c = Contour::new(Point::new(0, 0));
        c.push_forced(Point::new(5, 0));
        c.push_forced(Point::new(10, 0));
        c.push_forced(Point::new(5, 0));
        c.pre(false);
        assert_eq!(c.count(), 4);
        assert_eq!(c.area(), 0.0);
    }

    #[test]
    fn test_pre_optimize_strips_collinear() {
        let mut c = Contour::new(Point::new(0, 0));
        for p in [(5, 0), (10, 0), (10, 5), (10, 10), (0, 10), (0, 5)] {
            c.push_forced(Point::new(p.0, p.1));
        }
        c.pre(true);
        assert_eq!(c.count(), 4);
        assert_eq!(c.area(), 100.0);
    }

    #[test]
    fn test_invert_flips_orientation() {
        let mut c = square(10);
        c.invert();
        assert_eq!(c.orientation(), Orientation::Clockwise);
        assert_eq!(c.area(), -100.0);
        c.pre(false);
        assert_eq!(c.area(), -100.0);
        assert_eq!(c.point(c.head()), Point::new(0, 0));
        assert_eq!(c.point(c.next(c.head())), Point::new(0, 10));
    }

    #[test]
    fn test_exclude() {
        let mut c = square(10);
        let second = c.next(c.head());
        assert!(c.exclude(second));
        c.pre(false);
        assert_eq!(c.count(), 3);
        assert_eq!(c.area(), 50.0);

        let mut single = Contour::new(Point::new(1, 1));
        assert!(!single.exclude(single.head()));
    }

    #[test]
    fn test_exclude_head_moves_head() {
        let mut c = square(10);
        let h = c.head();
        assert!(c.exclude(h));
        assert_eq!(c.point(c.head()), Point::new(10, 0));
    }

    #[test]
    fn test_contains_point_boundary_inside() {
        let c = square(10);
        assert!(c.contains_point(Point::new(5, 5)));
        assert!(c.contains_point(Point::new(0, 5)));
        assert!(c.contains_point(Point::new(10, 10)));
        assert!(!c.contains_point(Point::new(11, 5)));
        assert!(!c.contains_point(Point::new(-1, -1)));

        let mut cw = square(10);
        cw.invert();
        assert!(cw.contains_point(Point::new(3, 7)));
    }

    #[test]
    fn test_contains_point_concave() {
        // U shape open at the top
        let c = Contour::from_points(&[
            Point::new(0, 0),
            Point::new(30, 0),
            Point::new(30, 30),
            Point::new(20, 30),
            Point::new(20, 10),
            Point::new(10, 10),
            Point::new(10, 30),
            Point::new(0, 30),
        ])
        .unwrap();
        assert!(c.contains_point(Point::new(5, 20)));
        assert!(!c.contains_point(Point::new(15, 20)));
        assert!(c.contains_point(Point::new(15, 5)));
    }

    #[test]
    fn test_translate() {
        let mut c = square(10);
        c.translate(5, -5);
        assert_eq!(c.bbox(), BBox::new(5, -5, 15, 5));
        assert_eq!(c.point(c.head()), Point::new(5, -5));
        assert_eq!(c.area(), 100.0);
    }
}
