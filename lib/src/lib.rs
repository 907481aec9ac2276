//! # Rectilinear Infill
//!
//! Rectilinear and monotonic infill path generation for FDM slicing.
//!
//! Given a region (an outer contour with optional holes) and a [`FillConfig`],
//! the engine produces polylines that raster-fill the region:
//! - Offset contours bound the scan lines and carry the perimeter connectors
//! - Scan-line intersections are computed with exact rational arithmetic
//! - Intersections are linked into a contour connectivity graph
//! - Paths are built either by a greedy zig-zag traversal or by decomposing
//!   the region into monotonic blocks chained with an ant-colony search
//!
//! ## Example
//!
//! ```rust,ignore
//! use rectilinear_infill::{ExPolygon, FillConfig, FillPattern, RectilinearInfill};
//!
//! let config = FillConfig::new().pattern(FillPattern::Monotonic).density(1.0);
//! let infill = RectilinearInfill::new(config);
//! let result = infill.generate(&regions);
//! for polyline in &result.polylines {
//!     println!("{} points", polyline.len());
//! }
//! ```

// Core modules
pub mod clipper;
pub mod config;
pub mod geometry;
pub mod infill;

// Re-export commonly used types
pub use config::{FillConfig, FillPattern, TooLongLinkPolicy};
pub use geometry::{BoundingBox, ExPolygon, ExPolygons, Point, Polygon, Polygons, Polyline, Polylines};
pub use infill::{fill_surface_by_lines, inspect_region, FillOutput, InfillResult, RectilinearInfill, RegionStats};

// Re-export clipper operations
pub use clipper::{offset_expolygon, offset_expolygons, shrink, OffsetJoinType};

/// Coordinate type used throughout the engine.
/// Using i64 for integer coordinates (scaled by SCALING_FACTOR) to avoid floating-point issues.
pub type Coord = i64;

/// Floating-point coordinate type for unscaled values.
pub type CoordF = f64;

/// Scaling factor: coordinates are stored as integers scaled by this factor.
/// 1 unit = 1 nanometer, so 1mm = 1_000_000 units.
pub const SCALING_FACTOR: f64 = 1_000_000.0;

/// Tolerance used for comparisons of unscaled values (mm).
pub const EPSILON: CoordF = 1e-4;

/// [`EPSILON`] in scaled units.
pub const SCALED_EPSILON: Coord = 100;

/// Scale a floating-point coordinate to integer.
#[inline]
pub fn scale(v: CoordF) -> Coord {
    (v * SCALING_FACTOR).round() as Coord
}

/// Unscale an integer coordinate to floating-point.
#[inline]
pub fn unscale(v: Coord) -> CoordF {
    v as CoordF / SCALING_FACTOR
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for infill operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The scan-line structure of a region broke one of its invariants.
    /// Only the region being filled is affected.
    #[error("Infill failed at scan line {vline}: {reason}")]
    InfillFailed { vline: usize, reason: String },
}

impl Error {
    pub(crate) fn infill_failed(vline: usize, reason: impl Into<String>) -> Self {
        Error::InfillFailed {
            vline,
            reason: reason.into(),
        }
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
