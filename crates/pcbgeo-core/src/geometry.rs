use serde::{Deserialize, Serialize};

/// Integer board unit.
pub type Coord = i64;

/// A 2D point in board units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }

    pub fn translate(&self, dx: Coord, dy: Coord) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn to_f64(self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }

    /// Round a floating point position to the nearest board unit.
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self {
            x: x.round() as Coord,
            y: y.round() as Coord,
        }
    }
}

/// An axis-aligned box with `x1 <= x2` and `y1 <= y2`.
///
/// Boxes violating that ordering are empty. They are legal values (for example
/// [`BBox::EMPTY`], the identity of [`BBox::union`]) but must never be stored
/// in an [`RTree`](crate::rtree::RTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BBox {
    pub x1: Coord,
    pub y1: Coord,
    pub x2: Coord,
    pub y2: Coord,
}

impl Default for BBox {
    fn default() -> Self {
        Self::ZERO
    }
}

impl BBox {
    /// All-zero box. Used by dicing to mean "no clipping window".
    pub const ZERO: BBox = BBox::new(0, 0, 0, 0);

    /// Inverted box that intersects nothing and is absorbed by `union`.
    pub const EMPTY: BBox = BBox::new(Coord::MAX, Coord::MAX, Coord::MIN, Coord::MIN);

    /// Box covering the whole coordinate space.
    pub const EVERYTHING: BBox = BBox::new(Coord::MIN, Coord::MIN, Coord::MAX, Coord::MAX);

    pub const fn new(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box spanning two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x1: a.x.min(b.x),
            y1: a.y.min(b.y),
            x2: a.x.max(b.x),
            y2: a.y.max(b.y),
        }
    }

    pub fn from_point(p: Point) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(
            rest.iter()
                .fold(Self::from_point(*first), |b, p| b.union(&Self::from_point(*p))),
        )
    }

    pub fn is_valid(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    pub fn is_all_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn width(&self) -> Coord {
        self.x2 - self.x1
    }

    pub fn height(&self) -> Coord {
        self.y2 - self.y1
    }

    /// Area as `f64`; zero for empty boxes.
    pub fn area(&self) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        self.width() as f64 * self.height() as f64
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x1 + (self.x2 - self.x1) / 2,
            self.y1 + (self.y2 - self.y1) / 2,
        )
    }

    /// Closed containment: points on the edge are inside.
    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.y1 && p.y <= self.y2
    }

    pub fn contains_box(&self, other: &BBox) -> bool {
        other.x1 >= self.x1 && other.x2 <= self.x2 && other.y1 >= self.y1 && other.y2 <= self.y2
    }

    /// Strict overlap test used by every tree query: boxes that only share an
    /// edge or a corner do not intersect.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.x1 < other.x2 && self.x2 > other.x1 && self.y1 < other.y2 && self.y2 > other.y1
    }

    /// Closed overlap test: shared edges count.
    pub fn touches(&self, other: &BBox) -> bool {
        self.x1 <= other.x2 && self.x2 >= other.x1 && self.y1 <= other.y2 && self.y2 >= other.y1
    }

    pub fn union(&self, other: &BBox) -> Self {
        Self {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Intersection of two boxes; empty (invalid) when they are disjoint.
    pub fn clip(&self, other: &BBox) -> Self {
        Self {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        }
    }

    pub fn bloat(&self, d: Coord) -> Self {
        Self::new(self.x1 - d, self.y1 - d, self.x2 + d, self.y2 + d)
    }

    pub fn shrink(&self, d: Coord) -> Self {
        self.bloat(-d)
    }

    pub fn translate(&self, dx: Coord, dy: Coord) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    /// Rotate by `steps` quarter turns about `(cx, cy)`, keeping the corners
    /// ordered.
    pub fn rotate90(&self, cx: Coord, cy: Coord, steps: u32) -> Self {
        let rot = |p: Point| -> Point {
            let mut q = p;
            for _ in 0..steps % 4 {
                q = Point::new(cx + (q.y - cy), cy - (q.x - cx));
            }
            q
        };
        Self::from_corners(
            rot(Point::new(self.x1, self.y1)),
            rot(Point::new(self.x2, self.y2)),
        )
    }

    /// Grow by `width * xf / 2` horizontally and `height * yf / 2` vertically
    /// on every side.
    pub fn enlarge(&self, xf: f64, yf: f64) -> Self {
        let w = (self.width() as f64 * xf / 2.0).round() as Coord;
        let h = (self.height() as f64 * yf / 2.0).round() as Coord;
        Self::new(self.x1 - w, self.y1 - h, self.x2 + w, self.y2 + h)
    }
}

/// Circular (or elliptic) arc centreline.
///
/// Angles are in degrees. Angle 0 points towards negative x and angles grow
/// towards positive y, so the point at angle `a` is
/// `(cx - width * cos a, cy + height * sin a)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcGeom {
    pub center: Point,
    pub width: Coord,
    pub height: Coord,
    pub start_angle: f64,
    pub delta: f64,
}

impl ArcGeom {
    pub fn new(center: Point, radius: Coord, start_angle: f64, delta: f64) -> Self {
        Self {
            center,
            width: radius,
            height: radius,
            start_angle,
            delta,
        }
    }

    pub fn point_at(&self, angle: f64) -> (f64, f64) {
        let a = angle.to_radians();
        (
            self.center.x as f64 - self.width as f64 * a.cos(),
            self.center.y as f64 + self.height as f64 * a.sin(),
        )
    }

    /// Start angle in `[0, 360)` and a non-negative sweep of at most 360.
    pub fn normalized(&self) -> (f64, f64) {
        let (mut start, mut delta) = (self.start_angle, self.delta);
        if delta < 0.0 {
            start += delta;
            delta = -delta;
        }
        (start.rem_euclid(360.0), delta.min(360.0))
    }

    pub fn ends(&self) -> (Point, Point) {
        let (sx, sy) = self.point_at(self.start_angle);
        let (ex, ey) = self.point_at(self.start_angle + self.delta);
        (Point::from_f64(sx, sy), Point::from_f64(ex, ey))
    }

    /// Angle of a point as seen from the centre, in `[0, 360)`.
    pub fn angle_of(&self, x: f64, y: f64) -> f64 {
        let alpha = (y - self.center.y as f64)
            .atan2(self.center.x as f64 - x)
            .to_degrees();
        alpha.rem_euclid(360.0)
    }

    /// Whether the ray from the centre through `(x, y)` crosses the sweep.
    pub fn sweeps_angle_of(&self, x: f64, y: f64) -> bool {
        let alpha = self.angle_of(x, y);
        let (sa, d) = self.normalized();
        if sa <= alpha {
            sa + d >= alpha
        } else {
            sa + d - 360.0 >= alpha
        }
    }

    /// Box of the centreline, bloated by `half_width` on every side.
    pub fn bbox(&self, half_width: Coord) -> BBox {
        let (s, e) = self.ends();
        let mut b = BBox::from_corners(s, e);
        let (sa, d) = self.normalized();
        for quadrant in 0..8 {
            let a = quadrant as f64 * 90.0;
            if a >= sa && a <= sa + d {
                let (x, y) = self.point_at(a);
                b = b.union(&BBox::from_point(Point::from_f64(x, y)));
            }
        }
        b.bloat(half_width)
    }

    pub fn translate(&self, dx: Coord, dy: Coord) -> Self {
        Self {
            center: self.center.translate(dx, dy),
            ..*self
        }
    }
}

/// Intersection of the infinite lines through `a1, a2` and `b1, b2`.
///
/// Returns `None` when the lines are parallel (zero determinant).
pub fn line_intersection(
    a1: (f64, f64),
    a2: (f64, f64),
    b1: (f64, f64),
    b2: (f64, f64),
) -> Option<(f64, f64)> {
    let den = (b2.1 - b1.1) * (a2.0 - a1.0) - (b2.0 - b1.0) * (a2.1 - a1.1);
    if den == 0.0 {
        return None;
    }
    let ua = ((b2.0 - b1.0) * (a1.1 - b1.1) - (b2.1 - b1.1) * (a1.0 - b1.0)) / den;
    Some((a1.0 + ua * (a2.0 - a1.0), a1.1 + ua * (a2.1 - a1.1)))
}

/// Distance from `p` to the closed segment `a`–`b`.
pub fn point_segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return (p.0 - a.0).hypot(p.1 - a.1);
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0);
    (p.0 - (a.0 + t * dx)).hypot(p.1 - (a.1 + t * dy))
}

/// Orientation of `c` relative to the directed line `a -> b`, computed exactly.
pub fn orient(a: Point, b: Point, c: Point) -> i128 {
    (b.x - a.x) as i128 * (c.y - a.y) as i128 - (b.y - a.y) as i128 * (c.x - a.x) as i128
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Exact closed-segment intersection test, collinear overlap included.
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let d1 = orient(b1, b2, a1);
    let d2 = orient(b1, b2, a2);
    let d3 = orient(a1, a2, b1);
    let d4 = orient(a1, a2, b2);
    if ((d1 > 0 && d2 < 0) || (d1 < 0 && d2 > 0)) && ((d3 > 0 && d4 < 0) || (d3 < 0 && d4 > 0)) {
        return true;
    }
    (d1 == 0 && on_segment(b1, b2, a1))
        || (d2 == 0 && on_segment(b1, b2, a2))
        || (d3 == 0 && on_segment(a1, a2, b1))
        || (d4 == 0 && on_segment(a1, a2, b2))
}
