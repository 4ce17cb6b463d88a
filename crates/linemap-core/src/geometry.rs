//! Geometry kernel.
//!
//! Pure functions over kurbo points and vectors. Degenerate input (zero-length
//! segments, parallel lines) yields `None` instead of NaN.

use kurbo::{Point, Rect, Vec2};

/// Determinant below which two directions are treated as parallel.
const PARALLEL_EPSILON: f64 = 1e-12;

/// Squared distance between two points minus the squared reference radius.
///
/// Negative or zero means `a` lies within `radius` of `b`.
pub fn compare_distance(a: Point, b: Point, radius: f64) -> f64 {
    (a - b).hypot2() - radius * radius
}

/// Length of `v` and the unit vector along it, or `None` for a zero vector.
pub fn length_and_unit(v: Vec2) -> Option<(f64, Vec2)> {
    let length = v.hypot();
    if length < f64::EPSILON {
        return None;
    }
    Some((length, v / length))
}

/// The vector rotated by 90 degrees.
pub fn normal(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Distance from `p` to the segment `a`-`b`.
///
/// When the projection of `p` falls outside the segment the result is `None`,
/// unless `allow_outside` is set, in which case the distance to the nearer
/// endpoint is returned. A zero-length segment measures to its single point.
pub fn distance_to_segment(p: Point, a: Point, b: Point, allow_outside: bool) -> Option<f64> {
    let Some((length, u)) = length_and_unit(b - a) else {
        return Some((p - a).hypot());
    };
    let rel = p - a;
    let along = u.dot(rel);
    let across = normal(u).dot(rel);

    if (0.0..=length).contains(&along) {
        Some(across.abs())
    } else if allow_outside {
        if along < 0.0 {
            Some(rel.hypot())
        } else {
            Some((p - b).hypot())
        }
    } else {
        None
    }
}

/// Projection of `p` onto the infinite line through `a`-`b`.
///
/// Returns the projected point and its parameter along the segment
/// (0 at `a`, 1 at `b`).
pub fn project_onto_line(p: Point, a: Point, b: Point) -> Option<(Point, f64)> {
    let (length, u) = length_and_unit(b - a)?;
    let along = u.dot(p - a);
    Some((a + u * along, along / length))
}

/// Point at parameter `t` along `a`-`b`.
pub fn lerp_along(a: Point, b: Point, t: f64) -> Point {
    match length_and_unit(b - a) {
        Some((length, u)) => a + u * (length * t),
        None => a,
    }
}

/// Intersection of the line through `p1` with direction `d1` and the line
/// through `p2` with direction `d2`.
pub fn line_intersection(p1: Point, d1: Vec2, p2: Point, d2: Vec2) -> Option<Point> {
    let det = d1.x * d2.y - d2.x * d1.y;
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = ((p2.x - p1.x) * d2.y - (p2.y - p1.y) * d2.x) / det;
    Some(p1 + d1 * t)
}

/// Box spanned by two arbitrary corners.
pub fn box_from_corners(a: Point, b: Point) -> Rect {
    Rect::from_points(a, b)
}

/// Inclusive containment. kurbo's `Rect::contains` excludes the far edges.
pub fn box_contains(rect: Rect, p: Point) -> bool {
    rect.x0 <= p.x && p.x <= rect.x1 && rect.y0 <= p.y && p.y <= rect.y1
}

/// Inclusive overlap of two boxes. Touching edges count.
pub fn boxes_intersect(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

fn orientation(p: Point, q: Point, r: Point) -> Orientation {
    let val = (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y);
    if val == 0.0 {
        Orientation::Collinear
    } else if val > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

fn on_segment(p: Point, q: Point, r: Point) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// Whether segments `p1`-`p2` and `q1`-`q2` touch or cross.
pub fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let o1 = orientation(p1, p2, q1);
    let o2 = orientation(p1, p2, q2);
    let o3 = orientation(q1, q2, p1);
    let o4 = orientation(q1, q2, p2);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == Orientation::Collinear && on_segment(p1, q1, p2))
        || (o2 == Orientation::Collinear && on_segment(p1, q2, p2))
        || (o3 == Orientation::Collinear && on_segment(q1, p1, q2))
        || (o4 == Orientation::Collinear && on_segment(q1, p2, q2))
}

fn box_edges(rect: Rect) -> [(Point, Point); 4] {
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    [
        (corners[0], corners[1]),
        (corners[1], corners[2]),
        (corners[2], corners[3]),
        (corners[3], corners[0]),
    ]
}

/// Segment/box test: the segment crosses one of the four box edges or has an
/// endpoint inside the box.
pub fn segment_intersects_box(a: Point, b: Point, rect: Rect) -> bool {
    if box_edges(rect)
        .iter()
        .any(|&(c, d)| segments_intersect(a, b, c, d))
    {
        return true;
    }
    box_contains(rect, a) || box_contains(rect, b)
}

/// Even-odd point-in-polygon test. The polygon is implicitly closed.
pub fn polygon_contains(polygon: &[Point], p: Point) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Whether a closed polygon and a box share any area or boundary.
pub fn polygon_intersects_box(polygon: &[Point], rect: Rect) -> bool {
    if polygon.iter().any(|&p| box_contains(rect, p)) {
        return true;
    }
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    if corners.iter().any(|&c| polygon_contains(polygon, c)) {
        return true;
    }
    polygon_edges(polygon).any(|(a, b)| segment_intersects_box(a, b, rect))
}

/// Edges of a closed polygon, including the closing edge.
pub fn polygon_edges(polygon: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = polygon.len();
    (0..n).map(move |i| (polygon[i], polygon[(i + 1) % n]))
}
