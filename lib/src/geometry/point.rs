//! Point types.
//!
//! [`Point`] stores scaled integer coordinates, [`PointF`] stores unscaled
//! millimetre coordinates used at the I/O boundary.

use crate::{scale, unscale, Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Neg, Sub};

/// A 2D point with integer (scaled) coordinates.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

/// A list of points.
pub type Points = Vec<Point>;

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// The origin.
    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0, y: 0 }
    }

    /// Create a point from millimetre coordinates.
    #[inline]
    pub fn new_scale(x: CoordF, y: CoordF) -> Self {
        Self::new(scale(x), scale(y))
    }

    /// Squared Euclidean distance to another point.
    #[inline]
    pub fn distance_squared(&self, other: &Point) -> i128 {
        let dx = (self.x - other.x) as i128;
        let dy = (self.y - other.y) as i128;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point (scaled units).
    #[inline]
    pub fn distance(&self, other: &Point) -> CoordF {
        let dx = (self.x - other.x) as CoordF;
        let dy = (self.y - other.y) as CoordF;
        dx.hypot(dy)
    }

    /// Check whether two points lie within `tolerance` of each other on both axes.
    #[inline]
    pub fn coincides_with(&self, other: &Point, tolerance: Coord) -> bool {
        (self.x - other.x).abs() < tolerance && (self.y - other.y).abs() < tolerance
    }

    /// Rotate about the origin by `angle` radians.
    #[inline]
    pub fn rotate(&self, angle: CoordF) -> Point {
        let (sin_a, cos_a) = angle.sin_cos();
        self.rotate_cs(cos_a, sin_a)
    }

    /// Rotate about the origin given a precomputed cosine and sine.
    #[inline]
    pub fn rotate_cs(&self, cos_a: CoordF, sin_a: CoordF) -> Point {
        let x = self.x as CoordF;
        let y = self.y as CoordF;
        Point::new(
            (x * cos_a - y * sin_a).round() as Coord,
            (x * sin_a + y * cos_a).round() as Coord,
        )
    }

    /// Midpoint between two points.
    #[inline]
    pub fn midpoint(&self, other: &Point) -> Point {
        (*self + *other) / 2
    }

    /// Convert to millimetres.
    #[inline]
    pub fn to_f(&self) -> PointF {
        PointF::new(unscale(self.x), unscale(self.y))
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;

    #[inline]
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Div<Coord> for Point {
    type Output = Point;

    #[inline]
    fn div(self, rhs: Coord) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", unscale(self.x), unscale(self.y))
    }
}

impl From<(Coord, Coord)> for Point {
    #[inline]
    fn from((x, y): (Coord, Coord)) -> Self {
        Point::new(x, y)
    }
}

/// A 2D point with floating-point (unscaled, mm) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointF {
    pub x: CoordF,
    pub y: CoordF,
}

impl PointF {
    #[inline]
    pub const fn new(x: CoordF, y: CoordF) -> Self {
        Self { x, y }
    }

    /// Convert to scaled integer coordinates.
    #[inline]
    pub fn to_scaled(&self) -> Point {
        Point::new_scale(self.x, self.y)
    }

    #[inline]
    pub fn distance(&self, other: &PointF) -> CoordF {
        (self.x - other.x).hypot(self.y - other.y)
    }
}
