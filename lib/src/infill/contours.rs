//! Offset contours of a region and walks along them.
//!
//! The outer contour set bounds the scan lines, the inner one carries the
//! connecting perimeter segments. Both are stored rotated so that the scan
//! lines are vertical, and are addressed through a single index space:
//! outer contours first, inner contours after them.
//!
//! A segment index `seg` names the edge ending at `points[seg]`, that is the
//! edge from `points[seg - 1]` (wrapping) to `points[seg]`.

use crate::clipper::{offset_expolygon, shrink, OffsetJoinType};
use crate::geometry::{to_polygons, BoundingBox, ExPolygon, Point, Polygon, Polygons};
use crate::{unscale, Coord, CoordF};

/// A source region with its two offset contour sets.
#[derive(Debug, Clone)]
pub struct OffsetContours {
    /// The rotated source region.
    pub source: ExPolygon,
    pub outer: Polygons,
    pub inner: Polygons,
    ccw: Vec<bool>,
}

impl OffsetContours {
    /// Rotate `expolygon` by `angle` and offset it by `offset_outer` and
    /// `offset_inner` (scaled, negative shrinks).
    ///
    /// A non-negative `offset_inner` produces no inner contours.
    pub fn new(expolygon: &ExPolygon, angle: CoordF, offset_outer: Coord, offset_inner: Coord) -> Self {
        let mut source = expolygon.clone();
        if angle != 0.0 {
            source.rotate(angle);
        }
        source.remove_sticks();

        let outer_ex = if offset_outer == 0 {
            vec![source.clone()]
        } else {
            offset_expolygon(&source, unscale(offset_outer), OffsetJoinType::Miter)
        };
        let inner_ex = if offset_outer > offset_inner {
            shrink(&outer_ex, unscale(offset_outer - offset_inner), OffsetJoinType::Miter)
        } else {
            outer_ex.clone()
        };

        // Contours with zero or tiny area, or with two points only, are dropped.
        let min_area = 0.01 * (offset_inner as CoordF) * (offset_inner as CoordF);
        let mut outer = prepare(to_polygons(&outer_ex), min_area);
        let mut inner = prepare(to_polygons(&inner_ex), min_area);
        outer.retain(|p| p.len() >= 3);
        inner.retain(|p| p.len() >= 3);

        let ccw = outer.iter().chain(inner.iter()).map(Polygon::is_ccw).collect();
        Self {
            source,
            outer,
            inner,
            ccw,
        }
    }

    #[inline]
    pub fn n_contours_outer(&self) -> usize {
        self.outer.len()
    }

    #[inline]
    pub fn n_contours_inner(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn n_contours(&self) -> usize {
        self.outer.len() + self.inner.len()
    }

    #[inline]
    pub fn is_contour_outer(&self, idx: usize) -> bool {
        idx < self.outer.len()
    }

    #[inline]
    pub fn is_contour_inner(&self, idx: usize) -> bool {
        idx >= self.outer.len()
    }

    /// Contour by global index.
    #[inline]
    pub fn contour(&self, idx: usize) -> &Polygon {
        if idx < self.outer.len() {
            &self.outer[idx]
        } else {
            &self.inner[idx - self.outer.len()]
        }
    }

    #[inline]
    pub fn is_contour_ccw(&self, idx: usize) -> bool {
        self.ccw[idx]
    }

    pub fn bounding_box_source(&self) -> BoundingBox {
        self.source.bounding_box()
    }

    pub fn bounding_box_outer(&self) -> BoundingBox {
        let mut bbox = BoundingBox::new();
        for p in &self.outer {
            bbox.merge(&p.bounding_box());
        }
        bbox
    }
}

fn prepare(polygons: Polygons, min_area: CoordF) -> Polygons {
    polygons
        .into_iter()
        .filter(|p| p.len() >= 3 && p.area() >= min_area)
        .map(|mut p| {
            p.remove_sticks();
            p.remove_duplicate_points();
            p
        })
        .collect()
}

/// Number of segments from `seg1` to `seg2` walking the contour forward, or
/// backward if `forward` is false.
#[inline]
pub fn distance_of_segments(poly: &Polygon, seg1: usize, seg2: usize, forward: bool) -> usize {
    let n = poly.len() as isize;
    let mut d = seg2 as isize - seg1 as isize;
    if !forward {
        d = -d;
    }
    if d < 0 {
        d += n;
    }
    d as usize
}

/// Length of the contour path from `p1` on segment `seg1` forward to `p2` on
/// segment `seg2`.
pub fn segment_length(poly: &Polygon, seg1: usize, p1: Point, seg2: usize, p2: Point) -> CoordF {
    let pts = poly.points();
    let mut prev = p1;
    let mut len = 0.0;
    let mut step = |p: Point| {
        len += prev.distance(&p);
        prev = p;
    };
    if seg1 <= seg2 {
        pts[seg1..seg2].iter().for_each(|p| step(*p));
    } else {
        pts[seg1..].iter().chain(&pts[..seg2]).for_each(|p| step(*p));
    }
    step(p2);
    len
}

/// Append the contour vertices strictly between segments `seg1` and `seg2`,
/// walking forward. Nothing is appended when the segments coincide.
pub fn polygon_segment_append(out: &mut Vec<Point>, poly: &Polygon, seg1: usize, seg2: usize) {
    let pts = poly.points();
    if seg1 < seg2 {
        out.extend_from_slice(&pts[seg1..seg2]);
    } else if seg1 > seg2 {
        out.extend_from_slice(&pts[seg1..]);
        out.extend_from_slice(&pts[..seg2]);
    }
}

/// Append the contour vertices strictly between segments `seg1` and `seg2`,
/// walking backward. Coinciding segments append the whole loop.
pub fn polygon_segment_append_reversed(out: &mut Vec<Point>, poly: &Polygon, seg1: usize, seg2: usize) {
    let pts = poly.points();
    if seg1 >= seg2 {
        out.extend(pts[seg2..seg1].iter().rev());
    } else {
        out.extend(pts[..seg1].iter().rev());
        out.extend(pts[seg2..].iter().rev());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale;

    fn square_mm(size: f64) -> Polygon {
        Polygon::rectangle(Point::new(0, 0), Point::new(scale(size), scale(size)))
    }

    #[test]
    fn test_offset_contours_square() {
        let region = ExPolygon::new(square_mm(10.0));
        let contours = OffsetContours::new(&region, 0.0, -scale(0.05), -scale(0.5));
        assert_eq!(contours.n_contours_outer(), 1);
        assert_eq!(contours.n_contours_inner(), 1);
        assert!(contours.is_contour_outer(0));
        assert!(contours.is_contour_inner(1));
        assert!(contours.is_contour_ccw(0));
        assert!(contours.is_contour_ccw(1));

        let outer = contours.bounding_box_outer();
        assert!(outer.min.coincides_with(&Point::new(scale(0.05), scale(0.05)), 3));
        assert!(outer.max.coincides_with(&Point::new(scale(9.95), scale(9.95)), 3));
        let inner = contours.contour(1).bounding_box();
        assert!(inner.min.coincides_with(&Point::new(scale(0.5), scale(0.5)), 3));
    }

    #[test]
    fn test_offset_contours_with_hole() {
        let hole = Polygon::rectangle(Point::new(scale(4.0), scale(4.0)), Point::new(scale(6.0), scale(6.0)));
        let mut region = ExPolygon::with_holes(square_mm(10.0), vec![hole]);
        region.normalize();
        let contours = OffsetContours::new(&region, 0.0, -scale(0.05), -scale(0.5));
        assert_eq!(contours.n_contours_outer(), 2);
        assert_eq!(contours.n_contours_inner(), 2);
        // One outward and one inward oriented loop per set.
        let ccw: Vec<bool> = (0..4).map(|i| contours.is_contour_ccw(i)).collect();
        assert_eq!(ccw.iter().filter(|c| **c).count(), 2);
    }

    #[test]
    fn test_offset_contours_collapse() {
        let region = ExPolygon::new(square_mm(0.8));
        let contours = OffsetContours::new(&region, 0.0, -scale(0.05), -scale(0.5));
        assert_eq!(contours.n_contours_inner(), 0);
    }

    #[test]
    fn test_offset_contours_rotation() {
        let region = ExPolygon::new(square_mm(10.0));
        let contours = OffsetContours::new(&region, std::f64::consts::FRAC_PI_2, 0, -scale(0.5));
        let bbox = contours.bounding_box_source();
        assert_eq!(bbox.min, Point::new(-scale(10.0), 0));
        assert_eq!(bbox.max, Point::new(0, scale(10.0)));
        assert_eq!(contours.n_contours_outer(), 1);
    }

    #[test]
    fn test_segment_walks() {
        // Counter-clockwise square: 0 (0,0), 1 (10,0), 2 (10,10), 3 (0,10).
        let poly = Polygon::rectangle(Point::new(0, 0), Point::new(10, 10));
        assert_eq!(distance_of_segments(&poly, 1, 3, true), 2);
        assert_eq!(distance_of_segments(&poly, 3, 1, true), 2);
        assert_eq!(distance_of_segments(&poly, 1, 2, false), 3);

        // From the middle of the bottom edge (segment 1) to the middle of the top edge (segment 3).
        let len = segment_length(&poly, 1, Point::new(5, 0), 3, Point::new(5, 10));
        assert!((len - 20.0).abs() < 1e-9);
        // Wrapping around the start of the loop.
        let len = segment_length(&poly, 3, Point::new(5, 10), 1, Point::new(5, 0));
        assert!((len - 20.0).abs() < 1e-9);

        let mut out = Vec::new();
        polygon_segment_append(&mut out, &poly, 1, 3);
        assert_eq!(out, vec![Point::new(10, 0), Point::new(10, 10)]);
        out.clear();
        polygon_segment_append(&mut out, &poly, 3, 1);
        assert_eq!(out, vec![Point::new(0, 10), Point::new(0, 0)]);
        out.clear();
        polygon_segment_append(&mut out, &poly, 2, 2);
        assert!(out.is_empty());

        out.clear();
        polygon_segment_append_reversed(&mut out, &poly, 3, 1);
        assert_eq!(out, vec![Point::new(10, 10), Point::new(10, 0)]);
        out.clear();
        polygon_segment_append_reversed(&mut out, &poly, 1, 3);
        assert_eq!(out, vec![Point::new(0, 0), Point::new(0, 10)]);
    }
}
