//! Polyline type for open paths.
//!
//! Infill paths are emitted as polylines: a sequence of points joined by
//! extrusion moves, not implicitly closed.

use super::{BoundingBox, Point, PointF};
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut, Index, IndexMut};

/// An open polyline defined by a sequence of points.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    /// Create a new empty polyline.
    #[inline]
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a polyline from a vector of points.
    #[inline]
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Create a polyline starting at `p`.
    #[inline]
    pub fn starting_at(p: Point) -> Self {
        Self { points: vec![p] }
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn points_mut(&mut self) -> &mut Vec<Point> {
        &mut self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Point> {
        self.points.pop()
    }

    /// Get the first point, if any.
    #[inline]
    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    /// Get the last point, if any.
    #[inline]
    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    /// Replace the last point. Pushes `p` if the polyline is empty.
    #[inline]
    pub fn set_last(&mut self, p: Point) {
        match self.points.last_mut() {
            Some(last) => *last = p,
            None => self.points.push(p),
        }
    }

    /// Total length in scaled units.
    pub fn length(&self) -> CoordF {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }

    #[inline]
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Rotate all points about the origin.
    pub fn rotate(&mut self, angle: CoordF) {
        let (sin_a, cos_a) = angle.sin_cos();
        for p in &mut self.points {
            *p = p.rotate_cs(cos_a, sin_a);
        }
    }

    /// Remove consecutive duplicate points. Returns true if any was removed.
    pub fn remove_duplicate_points(&mut self) -> bool {
        let len = self.points.len();
        self.points.dedup();
        self.points.len() != len
    }

    /// A polyline too small to extrude: a single point, or two points
    /// within `tolerance` of each other on both axes.
    pub fn is_degenerate(&self, tolerance: Coord) -> bool {
        match self.points.len() {
            0 | 1 => true,
            2 => self.points[0].coincides_with(&self.points[1], tolerance),
            _ => false,
        }
    }

    /// Points converted to millimetres.
    pub fn to_mm(&self) -> Vec<PointF> {
        self.points.iter().map(Point::to_f).collect()
    }
}

impl fmt::Debug for Polyline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polyline({:?})", self.points)
    }
}

impl fmt::Display for Polyline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polyline[")?;
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, "]")
    }
}

impl Deref for Polyline {
    type Target = [Point];

    fn deref(&self) -> &Self::Target {
        &self.points
    }
}

impl DerefMut for Polyline {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.points
    }
}

impl Index<usize> for Polyline {
    type Output = Point;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl IndexMut<usize> for Polyline {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.points[index]
    }
}

impl FromIterator<Point> for Polyline {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl Extend<Point> for Polyline {
    fn extend<I: IntoIterator<Item = Point>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}

impl IntoIterator for Polyline {
    type Item = Point;
    type IntoIter = std::vec::IntoIter<Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a> IntoIterator for &'a Polyline {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl From<Vec<Point>> for Polyline {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(points)
    }
}

impl From<Polyline> for Vec<Point> {
    fn from(polyline: Polyline) -> Self {
        polyline.points
    }
}

/// Type alias for a collection of polylines.
pub type Polylines = Vec<Polyline>;
