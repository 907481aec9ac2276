//! Rectilinear infill generation.
//!
//! A region is rotated so that the infill lines are vertical, then:
//!
//! 1. The region is shrunk twice: the outer offset bounds the infill lines,
//!    the inner offset carries the perimeter connections between them
//!    ([`contours`]).
//! 2. Vertical scan lines are intersected with both offsets ([`scanline`]).
//! 3. Intersections are linked along their contours ([`connect`]).
//! 4. Polylines are generated, either by a greedy walk over the graph
//!    ([`traverse`]) or, for monotonic fills, by splitting the region into
//!    monotonic blocks ([`monotonic`]), ordering them ([`chain`]) and
//!    emitting each block as a zig-zag ([`emit`]).
//! 5. The polylines are rotated back.
//!
//! Regions are independent of each other; [`RectilinearInfill::generate`]
//! fills them in parallel.

pub mod chain;
pub mod connect;
pub mod contours;
pub mod emit;
pub mod monotonic;
pub mod rational;
pub mod scanline;
pub mod traverse;

use log::{debug, error, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::{FillConfig, FillPattern};
use crate::geometry::{align_point_to_grid, ExPolygon, Point, Polylines};
use crate::{scale, unscale, Coord, CoordF, Result, SCALED_EPSILON};

pub use chain::{chain_monotonic_regions, MonotonicRegionLink};
pub use connect::{connect_segment_intersections_by_contours, LinkParams};
pub use contours::OffsetContours;
pub use emit::polylines_from_paths;
pub use monotonic::{
    connect_monotonic_regions, generate_monotonic_regions, pinch_contours_insert_phony_outer_intersections,
    MonotonicRegion,
};
pub use scanline::{slice_region_by_vertical_lines, ScanLine};
pub use traverse::traverse_graph_generate_polylines;

/// Share of the line spacing by which the infill lines reach past the inner
/// offset towards the perimeters.
pub const INFILL_OVERLAP_OVER_SPACING: CoordF = 0.45;

/// Largest stretch of the line spacing of a solid fill.
const SOLID_SPACING_FACTOR_MAX: CoordF = 1.2;

/// Polylines filling a single region.
#[derive(Debug, Clone, Default)]
pub struct FillOutput {
    /// Polylines in the coordinates of the input region.
    pub polylines: Polylines,
    /// Line spacing actually used (mm). Solid fills may stretch it to fit
    /// the region width.
    pub spacing: CoordF,
}

/// Scan statistics of a single region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionStats {
    pub scan_lines: usize,
    pub intersections: usize,
    pub inner_contours: usize,
    /// Monotonic blocks the region decomposes into.
    pub monotonic_regions: usize,
}

/// Result of filling a set of regions.
#[derive(Debug, Clone, Default)]
pub struct InfillResult {
    /// Polylines of all regions, in region order.
    pub polylines: Polylines,
    /// Total polyline length in mm.
    pub total_length_mm: CoordF,
    /// Regions that produced at least one polyline.
    pub regions_filled: usize,
    /// Regions whose fill failed and were left empty.
    pub regions_failed: usize,
    pub pattern: FillPattern,
}

impl InfillResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if any infill was generated.
    pub fn has_infill(&self) -> bool {
        !self.polylines.is_empty()
    }

    pub fn path_count(&self) -> usize {
        self.polylines.len()
    }

    fn calculate_total_length(&mut self) {
        self.total_length_mm = self.polylines.iter().map(|p| p.length()).sum::<CoordF>() / crate::SCALING_FACTOR;
    }
}

/// Rectilinear infill generator.
#[derive(Debug, Clone, Default)]
pub struct RectilinearInfill {
    config: FillConfig,
}

impl RectilinearInfill {
    pub fn new(config: FillConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FillConfig::default())
    }

    pub fn config(&self) -> &FillConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut FillConfig {
        &mut self.config
    }

    /// Fill a single region with the configured pattern.
    pub fn fill_region<R: Rng + ?Sized>(&self, expolygon: &ExPolygon, rng: &mut R) -> Result<FillOutput> {
        let config = &self.config;
        match config.pattern {
            FillPattern::Grid => {
                let half = config
                    .clone()
                    .pattern(FillPattern::Rectilinear)
                    .density(config.density * 0.5);
                let mut out = fill_surface_by_lines(expolygon, &half, 0.0, config.pattern_shift, rng)?;
                let cross = fill_surface_by_lines(
                    expolygon,
                    &half,
                    std::f64::consts::FRAC_PI_2,
                    config.pattern_shift,
                    rng,
                )?;
                out.polylines.extend(cross.polylines);
                if config.layer_id.is_some_and(|id| id % 2 == 1) {
                    for polyline in &mut out.polylines {
                        polyline.reverse();
                    }
                }
                Ok(out)
            }
            _ => fill_surface_by_lines(expolygon, config, 0.0, config.pattern_shift, rng),
        }
    }

    /// Fill every region. Regions are processed in parallel, each with its
    /// own random source seeded from the configured seed and the region
    /// index. A region that fails is logged and left empty.
    pub fn generate(&self, regions: &[ExPolygon]) -> InfillResult {
        let outputs: Vec<Result<FillOutput>> = regions
            .par_iter()
            .enumerate()
            .map(|(idx, expolygon)| {
                let mut rng = StdRng::seed_from_u64(self.config.seed ^ idx as u64);
                self.fill_region(expolygon, &mut rng)
            })
            .collect();

        let mut result = InfillResult {
            pattern: self.config.pattern,
            ..Default::default()
        };
        for (idx, output) in outputs.into_iter().enumerate() {
            match output {
                Ok(output) => {
                    if !output.polylines.is_empty() {
                        result.regions_filled += 1;
                    }
                    result.polylines.extend(output.polylines);
                }
                Err(e) => {
                    error!("Failed to fill region {}: {}", idx, e);
                    result.regions_failed += 1;
                }
            }
        }
        result.calculate_total_length();
        debug!(
            "{} of {} regions filled, {} polylines, {:.2} mm",
            result.regions_filled,
            regions.len(),
            result.polylines.len(),
            result.total_length_mm
        );
        result
    }

    /// Scan statistics of every region, without generating polylines.
    pub fn inspect(&self, regions: &[ExPolygon]) -> Vec<Result<RegionStats>> {
        regions.iter().map(|r| inspect_region(r, &self.config)).collect()
    }
}

/// Stretch the line spacing of a solid fill so that a whole number of
/// intervals fits `width`, by at most 20%.
pub fn adjust_solid_spacing(width: Coord, distance: Coord) -> Coord {
    let number_of_intervals = (width - 1) / distance;
    let distance_new = if number_of_intervals <= 0 {
        distance
    } else {
        (width - 1) / number_of_intervals
    };
    let factor = distance_new as CoordF / distance as CoordF;
    if factor > SOLID_SPACING_FACTOR_MAX {
        (distance as CoordF * SOLID_SPACING_FACTOR_MAX + 0.5).floor() as Coord
    } else {
        distance_new
    }
}

/// Fill direction and the grid reference point.
fn infill_direction(expolygon: &ExPolygon, config: &FillConfig, angle_base: CoordF) -> (CoordF, Point) {
    let angle = config.angle + config.layer_angle() + std::f64::consts::FRAC_PI_2 + angle_base;
    let reference = match config.reference_point {
        Some(p) => p.to_scaled(),
        None => expolygon.contour.bounding_box().center(),
    };
    (angle, reference)
}

/// Scan lines of a region laid out and linked, in the rotated frame.
struct ScanLayout {
    contours: OffsetContours,
    lines: Vec<ScanLine>,
    angle: CoordF,
    spacing: CoordF,
    start: Point,
}

fn layout_scan_lines(
    expolygon: &ExPolygon,
    config: &FillConfig,
    angle_base: CoordF,
    pattern_shift: CoordF,
) -> Result<Option<ScanLayout>> {
    config.validate()?;
    if expolygon.contour.len() < 3 {
        warn!("Skipping region with a degenerate contour of {} points", expolygon.contour.len());
        return Ok(None);
    }
    let (angle, reference) = infill_direction(expolygon, config, angle_base);
    let mut line_spacing = (scale(config.spacing) as CoordF / config.density) as Coord;

    let contours = OffsetContours::new(
        expolygon,
        -angle,
        scale(config.overlap - (0.5 - INFILL_OVERLAP_OVER_SPACING) * config.spacing),
        scale(config.overlap - 0.5 * config.spacing),
    );
    if contours.n_contours_inner() == 0 {
        debug!("Region collapsed by the inner offset, no infill line fits");
        return Ok(None);
    }

    let mut bbox = contours.bounding_box_source();
    let mut spacing = config.spacing;
    if config.is_full() && !config.dont_adjust {
        line_spacing = adjust_solid_spacing(bbox.width(), line_spacing);
        spacing = unscale(line_spacing);
    } else {
        // Align the lines with the other layers.
        let mut reference = reference.rotate(-angle);
        let shift = scale(pattern_shift) % line_spacing;
        reference.x -= if shift >= 0 { shift } else { line_spacing + shift };
        bbox.merge_point(align_point_to_grid(bbox.min, line_spacing, reference));
    }

    let n_vlines = ((bbox.max.x - bbox.min.x + line_spacing - 1) / line_spacing).max(0) as usize;
    let mut x0 = bbox.min.x;
    if config.is_full() {
        x0 += (line_spacing + SCALED_EPSILON) / 2;
    }

    let mut lines = slice_region_by_vertical_lines(&contours, n_vlines, x0, line_spacing)?;
    let params = LinkParams {
        dont_connect: config.dont_connect(),
        link_max_length: scale(config.effective_link_max_length()) as CoordF,
        policy: config.too_long_links,
    };
    connect_segment_intersections_by_contours(&contours, &mut lines, &params)?;
    debug!(
        "{} scan lines, {} intersections, spacing {:.4} mm",
        lines.len(),
        lines.iter().map(ScanLine::len).sum::<usize>(),
        unscale(line_spacing)
    );

    Ok(Some(ScanLayout {
        contours,
        lines,
        angle,
        spacing,
        start: Point::new(x0, bbox.min.y),
    }))
}

/// Fill `expolygon` with lines rotated by `angle_base` on top of the
/// configured direction, the line grid shifted by `pattern_shift` (mm).
///
/// A region too small for a single line yields no polylines. An error is
/// returned only when the scan line structure turns out inconsistent.
pub fn fill_surface_by_lines<R: Rng + ?Sized>(
    expolygon: &ExPolygon,
    config: &FillConfig,
    angle_base: CoordF,
    pattern_shift: CoordF,
    rng: &mut R,
) -> Result<FillOutput> {
    let Some(layout) = layout_scan_lines(expolygon, config, angle_base, pattern_shift)? else {
        return Ok(FillOutput {
            polylines: Polylines::new(),
            spacing: config.spacing,
        });
    };
    let ScanLayout {
        contours,
        mut lines,
        angle,
        spacing,
        start,
    } = layout;

    let mut polylines = if config.pattern.is_monotonic() {
        pinch_contours_insert_phony_outer_intersections(&mut lines);
        let mut regions = generate_monotonic_regions(&mut lines);
        connect_monotonic_regions(&mut regions, &contours, &lines)?;
        debug!("{} monotonic regions", regions.len());
        if regions.is_empty() {
            Polylines::new()
        } else {
            let path = chain_monotonic_regions(&regions, &contours, &lines, rng)?;
            polylines_from_paths(&path, &regions, &contours, &lines)
        }
    } else {
        traverse_graph_generate_polylines(&contours, &mut lines, start)
    };

    for polyline in &mut polylines {
        polyline.rotate(angle);
        polyline.remove_duplicate_points();
    }
    Ok(FillOutput { polylines, spacing })
}

/// Scan statistics of a region filled with `config`.
pub fn inspect_region(expolygon: &ExPolygon, config: &FillConfig) -> Result<RegionStats> {
    let Some(mut layout) = layout_scan_lines(expolygon, config, 0.0, config.pattern_shift)? else {
        return Ok(RegionStats::default());
    };
    let mut stats = RegionStats {
        scan_lines: layout.lines.len(),
        intersections: layout.lines.iter().map(ScanLine::len).sum(),
        inner_contours: layout.contours.n_contours_inner(),
        monotonic_regions: 0,
    };
    pinch_contours_insert_phony_outer_intersections(&mut layout.lines);
    stats.monotonic_regions = generate_monotonic_regions(&mut layout.lines).len();
    Ok(stats)
}
