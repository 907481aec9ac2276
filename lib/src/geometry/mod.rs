//! Geometry primitives for the infill engine.
//!
//! This module provides the geometric types the infill generator works on:
//! - [`Point`] - 2D point with integer coordinates (scaled)
//! - [`PointF`] - 2D point with floating-point coordinates (unscaled)
//! - [`Polygon`] - Closed polygon (boundary)
//! - [`Polyline`] - Open polyline (path)
//! - [`ExPolygon`] - Polygon with holes (exterior + interior contours)
//! - [`BoundingBox`] - Axis-aligned bounding box
//!
//! ## Coordinate System
//!
//! Coordinates are scaled integers to keep the scan-line arithmetic exact.
//! Coordinates are scaled by `SCALING_FACTOR` (1,000,000), so 1 unit = 1 nanometer.
//!
//! - Use `scale()` to convert from mm to internal units
//! - Use `unscale()` to convert from internal units to mm

mod bounding_box;
mod expolygon;
mod point;
mod polygon;
mod polyline;

pub use bounding_box::BoundingBox;
pub use expolygon::{to_polygons, ExPolygon, ExPolygons};
pub use point::{Point, PointF, Points};
pub use polygon::{Polygon, Polygons};
pub use polyline::{Polyline, Polylines};

use crate::Coord;

/// Calculate the cross product of two 2D vectors (returns a scalar).
/// This is useful for determining the orientation of three points.
#[inline]
pub fn cross2(v1: Point, v2: Point) -> i128 {
    v1.x as i128 * v2.y as i128 - v1.y as i128 * v2.x as i128
}

/// Calculate the dot product of two 2D vectors.
#[inline]
pub fn dot2(v1: Point, v2: Point) -> i128 {
    v1.x as i128 * v2.x as i128 + v1.y as i128 * v2.y as i128
}

/// Round `coord` down onto the grid of pitch `spacing` anchored at `base`.
/// Offsets below the base round toward negative infinity.
pub fn align_to_grid(coord: Coord, spacing: Coord, base: Coord) -> Coord {
    let rel = coord - base;
    let aligned = if rel < 0 {
        ((rel - spacing + 1) / spacing) * spacing
    } else {
        (rel / spacing) * spacing
    };
    base + aligned
}

/// [`align_to_grid`] applied to both axes.
pub fn align_point_to_grid(p: Point, spacing: Coord, base: Point) -> Point {
    Point::new(
        align_to_grid(p.x, spacing, base.x),
        align_to_grid(p.y, spacing, base.y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross2() {
        let v1 = Point::new(1, 0);
        let v2 = Point::new(0, 1);
        assert_eq!(cross2(v1, v2), 1); // Counter-clockwise

        let v3 = Point::new(0, -1);
        assert_eq!(cross2(v1, v3), -1); // Clockwise
    }

    #[test]
    fn test_dot2() {
        assert_eq!(dot2(Point::new(2, 3), Point::new(4, -1)), 5);
        assert_eq!(dot2(Point::new(1, 0), Point::new(0, 7)), 0);
    }

    #[test]
    fn test_align_to_grid() {
        assert_eq!(align_to_grid(17, 5, 0), 15);
        assert_eq!(align_to_grid(15, 5, 0), 15);
        assert_eq!(align_to_grid(-1, 5, 0), -5);
        assert_eq!(align_to_grid(-5, 5, 0), -5);
        assert_eq!(align_to_grid(8, 5, 2), 7);
        assert_eq!(align_to_grid(1, 5, 2), -3);
        assert_eq!(
            align_point_to_grid(Point::new(17, -1), 5, Point::new(0, 0)),
            Point::new(15, -5)
        );
    }
}
