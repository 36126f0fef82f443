//! Plane geometry used by the composite elements.
//!
//! Everything here is pure: points, segments, polygons and affine transforms,
//! plus the handful of predicates the angle and polygon elements depend on.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{GeoAnimError, Result};

/// Tolerance used when checking whether a point lies on a segment.
const ON_SEGMENT_TOLERANCE: f64 = 1e-9;

/// Precision (in degrees) applied by [`round_degrees`].
const DEGREE_PRECISION: f64 = 1e6;

/// A point in data coordinates. Serialised as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Point at fraction `t` of the way from `self` to `other`.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Point at `distance` from `self` in the direction of `degrees`.
    pub fn polar(self, distance: f64, degrees: f64) -> Point {
        let radians = degrees.to_radians();
        Point::new(
            self.x + distance * radians.cos(),
            self.y + distance * radians.sin(),
        )
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<Point> for [f64; 2] {
    fn from(point: Point) -> Self {
        [point.x, point.y]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A directed line segment from `a` to `b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
}

impl Segment {
    pub fn new(a: impl Into<Point>, b: impl Into<Point>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }

    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }

    /// Inclination in degrees, normalised into `[0, 360)`.
    pub fn angle(&self) -> f64 {
        angle_of(self)
    }

    pub fn reversed(&self) -> Segment {
        Segment {
            a: self.b,
            b: self.a,
        }
    }

    /// Whether `point` lies on the segment, up to a small tolerance.
    pub fn contains(&self, point: Point) -> bool {
        let dx = self.b.x - self.a.x;
        let dy = self.b.y - self.a.y;
        let scale = self.length().max(1.0);
        let cross = dx * (point.y - self.a.y) - dy * (point.x - self.a.x);
        if cross.abs() > ON_SEGMENT_TOLERANCE * scale * scale {
            return false;
        }

        let (x_min, x_max) = sorted(self.a.x, self.b.x);
        let (y_min, y_max) = sorted(self.a.y, self.b.y);
        let tol = ON_SEGMENT_TOLERANCE * scale;
        x_min - tol <= point.x
            && point.x <= x_max + tol
            && y_min - tol <= point.y
            && point.y <= y_max + tol
    }
}

impl From<((f64, f64), (f64, f64))> for Segment {
    fn from((a, b): ((f64, f64), (f64, f64))) -> Self {
        Segment::new(a, b)
    }
}

/// A closed polygon with at least three vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(GeoAnimError::config(format!(
                "polygon must have 3 or more vertices, got {}",
                vertices.len()
            )));
        }
        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Boundary sides in vertex order, ending with the closing side from the
    /// last vertex back to the first.
    pub fn sides(&self) -> Vec<Segment> {
        let n = self.vertices.len();
        (0..n)
            .map(|i| Segment {
                a: self.vertices[i],
                b: self.vertices[(i + 1) % n],
            })
            .collect()
    }
}

impl TryFrom<Vec<Point>> for Polygon {
    type Error = GeoAnimError;

    fn try_from(vertices: Vec<Point>) -> Result<Self> {
        Polygon::new(vertices)
    }
}

impl From<Polygon> for Vec<Point> {
    fn from(polygon: Polygon) -> Self {
        polygon.vertices
    }
}

/// 2-D affine transform mapping `(x, y)` to
/// `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn scale(factor: f64) -> Self {
        Affine {
            a: factor,
            d: factor,
            ..Self::IDENTITY
        }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Affine {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// Counter-clockwise rotation about the origin.
    pub fn rotate_degrees(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Affine {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Scale by `factor` and then translate by `anchor * (1 - factor)`, which
    /// keeps `anchor` fixed.
    pub fn scale_about(anchor: Point, factor: f64) -> Self {
        Affine::scale(factor).then(Affine::translate(
            anchor.x * (1.0 - factor),
            anchor.y * (1.0 - factor),
        ))
    }

    /// Transform that applies `self` first and `next` afterwards.
    pub fn then(self, next: Affine) -> Affine {
        Affine {
            a: next.a * self.a + next.c * self.b,
            b: next.b * self.a + next.d * self.b,
            c: next.a * self.c + next.c * self.d,
            d: next.b * self.c + next.d * self.d,
            e: next.a * self.e + next.c * self.f + next.e,
            f: next.b * self.e + next.d * self.f + next.f,
        }
    }

    pub fn apply(&self, point: Point) -> Point {
        Point::new(
            self.a * point.x + self.c * point.y + self.e,
            self.b * point.x + self.d * point.y + self.f,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// Inclusive containment of `point` in the axis-aligned bounding box of `seg`.
pub fn in_bounding_box(point: Point, seg: &Segment) -> bool {
    let (x_min, x_max) = sorted(seg.a.x, seg.b.x);
    let (y_min, y_max) = sorted(seg.a.y, seg.b.y);
    x_min <= point.x && point.x <= x_max && y_min <= point.y && point.y <= y_max
}

/// Intersection of the lines through `seg1` and `seg2`.
///
/// Returns `None` for parallel or coincident lines. Unless `extend` is set,
/// the point must also fall inside both segments' bounding boxes.
pub fn intersect(seg1: &Segment, seg2: &Segment, extend: bool) -> Option<Point> {
    let (a1, b1, c1) = line_coefficients(seg1);
    let (a2, b2, c2) = line_coefficients(seg2);

    let det = a1 * b2 - a2 * b1;
    if det == 0.0 || !det.is_finite() {
        return None;
    }

    let point = Point::new((c1 * b2 - c2 * b1) / det, (a1 * c2 - a2 * c1) / det);

    if extend || (in_bounding_box(point, seg1) && in_bounding_box(point, seg2)) {
        Some(point)
    } else {
        None
    }
}

/// Inclination of `seg` in degrees, in `[0, 360)`.
pub fn angle_of(seg: &Segment) -> f64 {
    let dx = seg.b.x - seg.a.x;
    let dy = seg.b.y - seg.a.y;

    if dx == 0.0 {
        if dy > 0.0 {
            return 90.0;
        }
        if dy < 0.0 {
            return 270.0;
        }
    }

    let mut degrees = dy.atan2(dx).to_degrees();
    if degrees < 0.0 {
        degrees += 360.0;
    }
    if degrees >= 360.0 {
        degrees = 0.0;
    }
    degrees
}

/// Whether `theta2` sits exactly 90 degrees counter-clockwise of `theta1`.
///
/// No tolerance is applied; round with [`round_degrees`] first when the
/// inputs come out of trigonometry.
pub fn is_right_angle(theta1: f64, theta2: f64) -> bool {
    if theta1 >= 270.0 {
        theta2 == theta1 + 90.0 - 360.0
    } else {
        theta2 == theta1 + 90.0
    }
}

/// Rounds an angle to a micro-degree, folding 360 back onto 0.
pub fn round_degrees(degrees: f64) -> f64 {
    let rounded = (degrees * DEGREE_PRECISION).round() / DEGREE_PRECISION;
    if rounded >= 360.0 {
        rounded - 360.0
    } else {
        rounded
    }
}

fn line_coefficients(seg: &Segment) -> (f64, f64, f64) {
    let a = seg.b.y - seg.a.y;
    let b = -(seg.b.x - seg.a.x);
    (a, b, a * seg.a.x + b * seg.a.y)
}

fn sorted(p: f64, q: f64) -> (f64, f64) {
    if p > q {
        (q, p)
    } else {
        (p, q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(p: Point, q: Point) -> bool {
        (p.x - q.x).abs() < 1e-9 && (p.y - q.y).abs() < 1e-9
    }

    #[test]
    fn diagonals_cross_at_center() {
        let s1 = Segment::new((0.0, 0.0), (2.0, 2.0));
        let s2 = Segment::new((0.0, 2.0), (2.0, 0.0));
        let point = intersect(&s1, &s2, false).expect("diagonals intersect");
        assert!(close(point, Point::new(1.0, 1.0)));
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        let s1 = Segment::new((0.0, 0.0), (2.0, 0.0));
        let s2 = Segment::new((0.0, 1.0), (2.0, 1.0));
        assert_eq!(intersect(&s1, &s2, false), None);
        assert_eq!(intersect(&s1, &s2, true), None);
    }

    #[test]
    fn extension_finds_points_outside_segments() {
        let s1 = Segment::new((0.0, 0.0), (1.0, 0.0));
        let s2 = Segment::new((3.0, 1.0), (3.0, 2.0));
        assert_eq!(intersect(&s1, &s2, false), None);
        let point = intersect(&s1, &s2, true).unwrap();
        assert!(close(point, Point::new(3.0, 0.0)));
    }

    #[test]
    fn bounding_box_is_inclusive() {
        let seg = Segment::new((2.0, 3.0), (0.0, 1.0));
        assert!(in_bounding_box(Point::new(0.0, 1.0), &seg));
        assert!(in_bounding_box(Point::new(2.0, 3.0), &seg));
        assert!(in_bounding_box(Point::new(1.0, 2.5), &seg));
        assert!(!in_bounding_box(Point::new(2.1, 2.0), &seg));
    }

    #[test]
    fn vertical_segments_resolve_directly() {
        assert_eq!(angle_of(&Segment::new((1.0, 0.0), (1.0, 4.0))), 90.0);
        assert_eq!(angle_of(&Segment::new((1.0, 4.0), (1.0, 0.0))), 270.0);
    }

    #[test]
    fn angles_stay_in_range() {
        let targets = [
            (1.0, 0.0),
            (1.0, 1.0),
            (-1.0, 1.0),
            (-1.0, 0.0),
            (-1.0, -1.0),
            (1.0, -1.0),
            (1.0, -1e-17),
        ];
        for (x, y) in targets {
            let theta = angle_of(&Segment::new((0.0, 0.0), (x, y)));
            assert!((0.0..360.0).contains(&theta), "{theta} out of range");
        }
        assert!((angle_of(&Segment::new((0.0, 0.0), (1.0, -1.0))) - 315.0).abs() < 1e-9);
        assert!((angle_of(&Segment::new((0.0, 0.0), (-1.0, 0.0))) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn right_angles_including_wraparound() {
        assert!(is_right_angle(90.0, 180.0));
        assert!(is_right_angle(350.0, 80.0));
        assert!(is_right_angle(270.0, 0.0));
        assert!(!is_right_angle(10.0, 90.0));
        assert!(!is_right_angle(180.0, 90.0));
    }

    #[test]
    fn rounding_folds_full_turn() {
        assert_eq!(round_degrees(359.999_999_9), 0.0);
        assert_eq!(round_degrees(89.999_999_999), 90.0);
    }

    #[test]
    fn polygon_needs_three_vertices() {
        let err = Polygon::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]).unwrap_err();
        assert!(matches!(err, GeoAnimError::Config(_)));
    }

    #[test]
    fn polygon_sides_close_the_cycle() {
        let triangle = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 3.0),
        ])
        .unwrap();
        let sides = triangle.sides();
        assert_eq!(sides.len(), 3);
        assert_eq!(sides[2], Segment::new((0.0, 3.0), (0.0, 0.0)));
        let perimeter: f64 = sides.iter().map(Segment::length).sum();
        assert!((perimeter - 12.0).abs() < 1e-12);
    }

    #[test]
    fn scale_about_keeps_anchor_fixed() {
        let anchor = Point::new(2.0, 1.0);
        let transform = Affine::scale_about(anchor, 0.25);
        assert!(close(transform.apply(anchor), anchor));
        assert!(close(transform.apply(Point::new(6.0, 5.0)), Point::new(3.0, 2.0)));
    }

    #[test]
    fn rotation_then_translation() {
        let transform = Affine::rotate_degrees(90.0).then(Affine::translate(1.0, 1.0));
        assert!(close(transform.apply(Point::new(1.0, 0.0)), Point::new(1.0, 2.0)));
    }

    #[test]
    fn contains_accepts_endpoints_and_interior() {
        let seg = Segment::new((0.0, 0.0), (4.0, 2.0));
        assert!(seg.contains(Point::new(0.0, 0.0)));
        assert!(seg.contains(Point::new(2.0, 1.0)));
        assert!(!seg.contains(Point::new(2.0, 1.5)));
        assert!(!seg.contains(Point::new(6.0, 3.0)));
    }
}
