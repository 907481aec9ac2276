//! Closed polygon type.

use super::{cross2, dot2, BoundingBox, Point};
use crate::{CoordF, EPSILON};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, Index};

/// A closed polygon. The closing edge from the last point back to the first
/// is implicit, the first point is not repeated.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

/// A list of polygons.
pub type Polygons = Vec<Polygon>;

impl Polygon {
    #[inline]
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    #[inline]
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Axis-aligned rectangle, counter-clockwise.
    pub fn rectangle(min: Point, max: Point) -> Self {
        Self::from_points(vec![
            min,
            Point::new(max.x, min.y),
            max,
            Point::new(min.x, max.y),
        ])
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

    /// Index of the point preceding `idx` on the loop.
    #[inline]
    pub fn prev_index(&self, idx: usize) -> usize {
        if idx == 0 {
            self.points.len() - 1
        } else {
            idx - 1
        }
    }

    /// Signed area in scaled units squared, positive for counter-clockwise.
    pub fn signed_area(&self) -> CoordF {
        if self.points.len() < 3 {
            return 0.0;
        }
        let mut twice: i128 = 0;
        let mut prev = self.points[self.points.len() - 1];
        for p in &self.points {
            twice += cross2(prev, *p);
            prev = *p;
        }
        twice as CoordF * 0.5
    }

    /// Absolute area in scaled units squared.
    #[inline]
    pub fn area(&self) -> CoordF {
        self.signed_area().abs()
    }

    #[inline]
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Make the polygon counter-clockwise. Returns true if it was reversed.
    pub fn make_ccw(&mut self) -> bool {
        if self.signed_area() < 0.0 {
            self.reverse();
            true
        } else {
            false
        }
    }

    /// Make the polygon clockwise. Returns true if it was reversed.
    pub fn make_cw(&mut self) -> bool {
        if self.signed_area() > 0.0 {
            self.reverse();
            true
        } else {
            false
        }
    }

    /// Rotate about the origin.
    pub fn rotate(&mut self, angle: CoordF) {
        let (sin_a, cos_a) = angle.sin_cos();
        for p in &mut self.points {
            *p = p.rotate_cs(cos_a, sin_a);
        }
    }

    /// Remove consecutive duplicate points, including a last point repeating the first.
    /// Returns true if any point was removed.
    pub fn remove_duplicate_points(&mut self) -> bool {
        let len = self.points.len();
        self.points.dedup();
        while self.points.len() > 1 && self.points.first() == self.points.last() {
            self.points.pop();
        }
        self.points.len() != len
    }

    /// Remove spikes, where the contour runs forth and back along the same line.
    /// Returns true if the polygon was modified.
    pub fn remove_sticks(&mut self) -> bool {
        let pts = &mut self.points;
        let mut modified = false;
        if pts.len() >= 3 {
            let mut j = 1;
            for i in 1..pts.len() - 1 {
                if !is_stick(pts[j - 1], pts[i], pts[i + 1]) {
                    pts[j] = pts[i];
                    j += 1;
                }
            }
            j += 1;
            if j < pts.len() {
                pts[j - 1] = pts[pts.len() - 1];
                pts.truncate(j);
                modified = true;
            }
        }
        while pts.len() >= 3 && is_stick(pts[pts.len() - 2], pts[pts.len() - 1], pts[0]) {
            pts.pop();
            modified = true;
        }
        while pts.len() >= 3 && is_stick(pts[pts.len() - 1], pts[0], pts[1]) {
            pts.remove(0);
            modified = true;
        }
        modified
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Point-in-polygon test using the crossing number rule.
    /// Points on the boundary may report either side.
    pub fn contains_point(&self, p: &Point) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let pi = self.points[i];
            let pj = self.points[j];
            if (pi.y > p.y) != (pj.y > p.y) {
                let x_cross = pj.x as CoordF
                    + (p.y - pj.y) as CoordF * (pi.x - pj.x) as CoordF / (pi.y - pj.y) as CoordF;
                if (p.x as CoordF) < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Distance from `p` to the closest edge of the polygon.
    pub fn distance_to_point(&self, p: &Point) -> CoordF {
        let n = self.points.len();
        let mut best = CoordF::MAX;
        for i in 0..n {
            let a = self.points[self.prev_index(i)];
            let b = self.points[i];
            best = best.min(distance_to_segment(p, a, b));
        }
        best
    }
}

/// `p2` is a stick if `p1 -> p2 -> p3` turns back on itself along a line,
/// or if `p2` coincides with one of its neighbors.
fn is_stick(p1: Point, p2: Point, p3: Point) -> bool {
    let v1 = p2 - p1;
    let v2 = p3 - p2;
    let dir = dot2(v1, v2);
    if dir > 0 {
        return false;
    }
    let l2_1 = v1.x as CoordF * v1.x as CoordF + v1.y as CoordF * v1.y as CoordF;
    let l2_2 = v2.x as CoordF * v2.x as CoordF + v2.y as CoordF * v2.y as CoordF;
    if dir == 0 {
        return l2_1 == 0.0 || l2_2 == 0.0;
    }
    let cross = cross2(v1, v2) as CoordF;
    let dist2 = cross * cross / l2_1.max(l2_2);
    dist2 < EPSILON * EPSILON
}

fn distance_to_segment(p: &Point, a: Point, b: Point) -> CoordF {
    let ab = b - a;
    let len2 = dot2(ab, ab);
    if len2 == 0 {
        return p.distance(&a);
    }
    let t = (dot2(*p - a, ab) as CoordF / len2 as CoordF).clamp(0.0, 1.0);
    let px = a.x as CoordF + t * ab.x as CoordF;
    let py = a.y as CoordF + t * ab.y as CoordF;
    (p.x as CoordF - px).hypot(p.y as CoordF - py)
}

impl fmt::Debug for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polygon({} points)", self.points.len())
    }
}

impl Deref for Polygon {
    type Target = [Point];

    fn deref(&self) -> &Self::Target {
        &self.points
    }
}

impl Index<usize> for Polygon {
    type Output = Point;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Coord;

    fn square(size: Coord) -> Polygon {
        Polygon::rectangle(Point::new(0, 0), Point::new(size, size))
    }

    #[test]
    fn test_polygon_area_and_orientation() {
        let mut poly = square(100);
        assert!((poly.signed_area() - 10_000.0).abs() < 1e-9);
        assert!(poly.is_ccw());
        assert!(poly.make_cw());
        assert!(!poly.is_ccw());
        assert!((poly.area() - 10_000.0).abs() < 1e-9);
        assert!(poly.make_ccw());
        assert!(!poly.make_ccw());
    }

    #[test]
    fn test_polygon_remove_duplicate_points() {
        let mut poly = Polygon::from_points(vec![
            Point::new(0, 0),
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(10, 10),
            Point::new(0, 0),
        ]);
        assert!(poly.remove_duplicate_points());
        assert_eq!(poly.len(), 3);
        assert!(!poly.remove_duplicate_points());
    }

    #[test]
    fn test_polygon_remove_sticks() {
        // A square with a spike poking out of its right edge.
        let mut poly = Polygon::from_points(vec![
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(100, 50),
            Point::new(200, 50),
            Point::new(100, 50),
            Point::new(100, 100),
            Point::new(0, 100),
        ]);
        assert!(poly.remove_sticks());
        assert!(!poly.points().contains(&Point::new(200, 50)));
        assert!((poly.area() - 10_000.0).abs() < 1e-9);

        let mut clean = square(100);
        assert!(!clean.remove_sticks());
        assert_eq!(clean.len(), 4);
    }

    #[test]
    fn test_polygon_contains_point() {
        let poly = square(100);
        assert!(poly.contains_point(&Point::new(50, 50)));
        assert!(!poly.contains_point(&Point::new(150, 50)));
        assert!(!poly.contains_point(&Point::new(-1, 50)));
        assert!((poly.distance_to_point(&Point::new(150, 50)) - 50.0).abs() < 1e-9);
    }
}
