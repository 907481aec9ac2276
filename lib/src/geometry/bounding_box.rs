//! Axis-aligned bounding boxes.

use super::Point;
use crate::Coord;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in scaled coordinates.
///
/// An empty box (no points merged yet) is marked by `defined == false`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
    pub defined: bool,
}

impl BoundingBox {
    /// Create an empty bounding box.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bounding box from its corners.
    #[inline]
    pub fn from_min_max(min: Point, max: Point) -> Self {
        Self {
            min,
            max,
            defined: true,
        }
    }

    /// Bounding box of a set of points.
    pub fn from_points(points: &[Point]) -> Self {
        let mut bbox = Self::new();
        for p in points {
            bbox.merge_point(*p);
        }
        bbox
    }

    /// Grow the box to contain `p`.
    pub fn merge_point(&mut self, p: Point) {
        if self.defined {
            self.min.x = self.min.x.min(p.x);
            self.min.y = self.min.y.min(p.y);
            self.max.x = self.max.x.max(p.x);
            self.max.y = self.max.y.max(p.y);
        } else {
            self.min = p;
            self.max = p;
            self.defined = true;
        }
    }

    /// Grow the box to contain another box.
    pub fn merge(&mut self, other: &BoundingBox) {
        if other.defined {
            self.merge_point(other.min);
            self.merge_point(other.max);
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.defined
    }

    #[inline]
    pub fn width(&self) -> Coord {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> Coord {
        self.max.y - self.min.y
    }

    /// Center point of the box.
    #[inline]
    pub fn center(&self) -> Point {
        self.min.midpoint(&self.max)
    }

    /// Check whether `p` lies inside the box (boundary included).
    #[inline]
    pub fn contains(&self, p: &Point) -> bool {
        self.defined && p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Grow the box by `delta` on every side.
    pub fn offset(&mut self, delta: Coord) {
        if self.defined {
            self.min = self.min - Point::new(delta, delta);
            self.max = self.max + Point::new(delta, delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_from_points() {
        let bbox = BoundingBox::from_points(&[
            Point::new(5, -3),
            Point::new(-2, 7),
            Point::new(1, 1),
        ]);
        assert!(!bbox.is_empty());
        assert_eq!(bbox.min, Point::new(-2, -3));
        assert_eq!(bbox.max, Point::new(5, 7));
        assert_eq!(bbox.width(), 7);
        assert_eq!(bbox.height(), 10);
        assert_eq!(bbox.center(), Point::new(1, 2));
    }

    #[test]
    fn test_bounding_box_merge_and_offset() {
        let mut bbox = BoundingBox::new();
        assert!(bbox.is_empty());
        bbox.merge(&BoundingBox::from_min_max(Point::new(0, 0), Point::new(10, 10)));
        bbox.merge_point(Point::new(-5, 3));
        assert_eq!(bbox.min, Point::new(-5, 0));
        bbox.offset(1);
        assert!(bbox.contains(&Point::new(11, 11)));
        assert!(!bbox.contains(&Point::new(12, 0)));
    }
}
