//! Polygon offsetting.
//!
//! This module wraps the offset operations of the geo-clipper library. The
//! infill engine uses them to derive the contour that bounds its lines and
//! the deeper inset that carries the perimeter connectors.
//!
//! Offsets take distances in mm. The clipper integer grid matches the crate's
//! scaled coordinates so no precision is lost on the round trip.

use crate::geometry::{ExPolygon, ExPolygons, Point, Polygon};
use crate::{scale, unscale, CoordF, SCALING_FACTOR};
use geo::{Coord as GeoCoord, LineString, MultiPolygon, Polygon as GeoPolygon};
use geo_clipper::{Clipper, EndType, JoinType};

/// Clipper works on integers, one clipper unit per scaled unit.
const CLIPPER_FACTOR: f64 = SCALING_FACTOR;

/// Miter limit used for mitered joins.
pub const DEFAULT_MITER_LIMIT: f64 = 3.0;

/// Join type for offset corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetJoinType {
    /// Square corners
    Square,
    /// Round corners
    Round,
    /// Mitered corners, clipped at [`DEFAULT_MITER_LIMIT`]
    #[default]
    Miter,
}

impl From<OffsetJoinType> for JoinType {
    fn from(jt: OffsetJoinType) -> Self {
        match jt {
            OffsetJoinType::Square => JoinType::Square,
            OffsetJoinType::Round => JoinType::Round(0.005), // arc tolerance, mm
            OffsetJoinType::Miter => JoinType::Miter(DEFAULT_MITER_LIMIT),
        }
    }
}

fn ring_to_geo(points: &[Point]) -> LineString<f64> {
    let mut ring: Vec<GeoCoord<f64>> = points
        .iter()
        .map(|p| GeoCoord {
            x: unscale(p.x),
            y: unscale(p.y),
        })
        .collect();

    // Close the ring if needed
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            ring.push(*first);
        }
    }
    LineString::new(ring)
}

fn ring_from_geo(ring: &LineString<f64>) -> Polygon {
    let mut points: Vec<Point> = ring
        .coords()
        .map(|c| Point::new(scale(c.x), scale(c.y)))
        .collect();

    // Remove the closing point if present (our Polygon doesn't store it)
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    Polygon::from_points(points)
}

/// Convert our ExPolygon to geo's Polygon type (with holes).
fn expolygon_to_geo(expoly: &ExPolygon) -> GeoPolygon<f64> {
    let holes = expoly.holes.iter().map(|h| ring_to_geo(h.points())).collect();
    GeoPolygon::new(ring_to_geo(expoly.contour.points()), holes)
}

/// Convert geo's Polygon to our ExPolygon type, normalizing orientation.
fn geo_to_expolygon(geo_poly: &GeoPolygon<f64>) -> ExPolygon {
    let contour = ring_from_geo(geo_poly.exterior());
    let holes = geo_poly.interiors().iter().map(ring_from_geo).collect();
    let mut expoly = ExPolygon::with_holes(contour, holes);
    expoly.normalize();
    expoly
}

fn geo_multi_to_expolygons(multi: &MultiPolygon<f64>) -> ExPolygons {
    multi
        .0
        .iter()
        .map(geo_to_expolygon)
        .filter(|ex| !ex.is_empty())
        .collect()
}

fn expolygons_to_geo_multi(expolys: &[ExPolygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(expolys.iter().map(expolygon_to_geo).collect())
}

/// Offset an ExPolygon by a given distance.
///
/// Positive delta inflates (grows) the polygon, negative delta deflates (shrinks) it.
/// The result is normalized: contours counter-clockwise, holes clockwise.
pub fn offset_expolygon(
    expolygon: &ExPolygon,
    delta: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    if expolygon.is_empty() {
        return vec![];
    }
    let geo_poly = expolygon_to_geo(expolygon);
    let result = geo_poly.offset(delta, join_type.into(), EndType::ClosedPolygon, CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Offset multiple ExPolygons by a given distance.
///
/// Overlapping results are merged.
pub fn offset_expolygons(
    expolygons: &[ExPolygon],
    delta: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    if expolygons.is_empty() {
        return vec![];
    }
    let geo_multi = expolygons_to_geo_multi(expolygons);
    let result = geo_multi.offset(delta, join_type.into(), EndType::ClosedPolygon, CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Shrink (inset) ExPolygons by a given distance.
///
/// This is a convenience function that calls offset with a negative delta.
pub fn shrink(expolygons: &[ExPolygon], distance: CoordF, join_type: OffsetJoinType) -> ExPolygons {
    offset_expolygons(expolygons, -distance.abs(), join_type)
}
