//! Polygon with holes.

use super::{BoundingBox, Point, Polygon, Polygons};
use crate::CoordF;
use serde::{Deserialize, Serialize};

/// An outer contour with zero or more holes.
///
/// After [`ExPolygon::normalize`] the contour is counter-clockwise and the
/// holes are clockwise.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExPolygon {
    pub contour: Polygon,
    #[serde(default)]
    pub holes: Polygons,
}

/// A list of polygons with holes.
pub type ExPolygons = Vec<ExPolygon>;

impl ExPolygon {
    #[inline]
    pub fn new(contour: Polygon) -> Self {
        Self {
            contour,
            holes: Vec::new(),
        }
    }

    #[inline]
    pub fn with_holes(contour: Polygon, holes: Polygons) -> Self {
        Self { contour, holes }
    }

    pub fn is_empty(&self) -> bool {
        self.contour.len() < 3
    }

    /// Orient the contour counter-clockwise and the holes clockwise.
    pub fn normalize(&mut self) {
        self.contour.make_ccw();
        for hole in &mut self.holes {
            hole.make_cw();
        }
    }

    /// Area of the contour minus the area of the holes.
    pub fn area(&self) -> CoordF {
        self.contour.area() - self.holes.iter().map(Polygon::area).sum::<CoordF>()
    }

    pub fn rotate(&mut self, angle: CoordF) {
        self.contour.rotate(angle);
        for hole in &mut self.holes {
            hole.rotate(angle);
        }
    }

    /// Remove spikes from the contour and the holes. Holes collapsing below
    /// three points are dropped.
    pub fn remove_sticks(&mut self) {
        self.contour.remove_sticks();
        for hole in &mut self.holes {
            hole.remove_sticks();
        }
        self.holes.retain(|h| h.len() >= 3);
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.contour.bounding_box()
    }

    /// Inside the contour and outside every hole.
    pub fn contains_point(&self, p: &Point) -> bool {
        self.contour.contains_point(p) && !self.holes.iter().any(|h| h.contains_point(p))
    }

    /// Contour followed by the holes.
    pub fn to_polygons(&self) -> Polygons {
        let mut out = Vec::with_capacity(1 + self.holes.len());
        out.push(self.contour.clone());
        out.extend(self.holes.iter().cloned());
        out
    }
}

impl From<Polygon> for ExPolygon {
    fn from(contour: Polygon) -> Self {
        Self::new(contour)
    }
}

/// Flatten a list of polygons with holes into contours followed by their holes.
pub fn to_polygons(expolygons: &[ExPolygon]) -> Polygons {
    expolygons.iter().flat_map(ExPolygon::to_polygons).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_with_hole() -> ExPolygon {
        let contour = Polygon::rectangle(Point::new(0, 0), Point::new(100, 100));
        let hole = Polygon::rectangle(Point::new(25, 25), Point::new(75, 75));
        let mut ex = ExPolygon::with_holes(contour, vec![hole]);
        ex.normalize();
        ex
    }

    #[test]
    fn test_expolygon_normalize_and_area() {
        let ex = square_with_hole();
        assert!(ex.contour.is_ccw());
        assert!(!ex.holes[0].is_ccw());
        assert!((ex.area() - 7_500.0).abs() < 1e-9);
    }

    #[test]
    fn test_expolygon_contains_point() {
        let ex = square_with_hole();
        assert!(ex.contains_point(&Point::new(10, 10)));
        assert!(!ex.contains_point(&Point::new(50, 50)));
        assert!(!ex.contains_point(&Point::new(150, 50)));
    }

    #[test]
    fn test_expolygon_flatten() {
        let polys = to_polygons(&[square_with_hole(), square_with_hole()]);
        assert_eq!(polys.len(), 4);
        assert!(polys[0].is_ccw());
        assert!(!polys[1].is_ccw());
    }
}
