//! Fill configuration types.
//!
//! [`FillConfig`] carries every parameter that shapes the generated infill:
//! line spacing and density, direction, alignment, and the policy for
//! connecting neighboring lines along the region boundary.

use crate::geometry::PointF;
use crate::{CoordF, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Density above which a fill counts as solid.
pub const FULL_DENSITY: CoordF = 0.9999;

/// Anchors shorter than this (mm) disable perimeter connections altogether.
pub const MIN_ANCHOR_LENGTH: CoordF = 0.05;

/// Configuration of a rectilinear fill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    // === Pattern ===
    /// Path generation strategy.
    pub pattern: FillPattern,

    // === Line Layout ===
    /// Extrusion spacing (mm), the distance between lines at full density.
    pub spacing: CoordF,
    /// Fill density in (0, 1].
    pub density: CoordF,
    /// Fill direction (radians).
    pub angle: CoordF,
    /// Inward overlap of the fill with the perimeters (mm).
    pub overlap: CoordF,
    /// Reference point for aligning the line grid across layers (mm).
    /// Defaults to the center of the region.
    pub reference_point: Option<PointF>,
    /// Layer index. Odd layers are rotated by 90 degrees. `None` disables
    /// alternation.
    pub layer_id: Option<usize>,
    /// Shift of the line grid perpendicular to the lines (mm).
    pub pattern_shift: CoordF,
    /// Keep the nominal spacing for solid fills instead of stretching it to
    /// fit the region width.
    pub dont_adjust: bool,

    // === Connections ===
    /// Longest perimeter connector (mm), 0 = unlimited.
    pub link_max_length: CoordF,
    /// Longest perimeter anchor (mm). Below 0.05 the lines are not connected.
    pub anchor_length_max: CoordF,
    /// How connectors longer than `link_max_length` are treated.
    pub too_long_links: TooLongLinkPolicy,

    // === Optimization ===
    /// Seed for the randomized region chaining.
    pub seed: u64,
}

impl FillConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fill pattern.
    pub fn pattern(mut self, pattern: FillPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Set the line spacing (mm).
    pub fn spacing(mut self, spacing: CoordF) -> Self {
        self.spacing = spacing;
        self
    }

    /// Set the fill density (0..1].
    pub fn density(mut self, density: CoordF) -> Self {
        self.density = density;
        self
    }

    /// Set the fill angle (radians).
    pub fn angle(mut self, angle: CoordF) -> Self {
        self.angle = angle;
        self
    }

    /// Set the fill angle in degrees.
    pub fn angle_degrees(mut self, degrees: CoordF) -> Self {
        self.angle = degrees.to_radians();
        self
    }

    /// Set the inward overlap (mm).
    pub fn overlap(mut self, overlap: CoordF) -> Self {
        self.overlap = overlap;
        self
    }

    /// Set the grid reference point (mm).
    pub fn reference_point(mut self, x: CoordF, y: CoordF) -> Self {
        self.reference_point = Some(PointF::new(x, y));
        self
    }

    /// Set the layer index used for direction alternation.
    pub fn layer_id(mut self, layer_id: usize) -> Self {
        self.layer_id = Some(layer_id);
        self
    }

    pub fn pattern_shift(mut self, shift: CoordF) -> Self {
        self.pattern_shift = shift;
        self
    }

    pub fn dont_adjust(mut self, dont_adjust: bool) -> Self {
        self.dont_adjust = dont_adjust;
        self
    }

    /// Set the maximum connector length (mm), 0 = unlimited.
    pub fn link_max_length(mut self, length: CoordF) -> Self {
        self.link_max_length = length;
        self
    }

    /// Set the maximum anchor length (mm).
    pub fn anchor_length_max(mut self, length: CoordF) -> Self {
        self.anchor_length_max = length;
        self
    }

    pub fn too_long_links(mut self, policy: TooLongLinkPolicy) -> Self {
        self.too_long_links = policy;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Whether this is a solid fill.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.density > FULL_DENSITY
    }

    /// Lines are left unconnected.
    pub fn dont_connect(&self) -> bool {
        self.anchor_length_max < MIN_ANCHOR_LENGTH
            || self.pattern == FillPattern::MonotonicLine
    }

    /// Connector length limit (mm) after applying the dense fill default:
    /// unset limits become three line widths above 80% density.
    pub fn effective_link_max_length(&self) -> CoordF {
        if self.link_max_length > 0.0 {
            self.link_max_length
        } else if self.density > 0.8 {
            3.0 * self.spacing
        } else {
            0.0
        }
    }

    /// Rotation added for the given layer.
    pub fn layer_angle(&self) -> CoordF {
        match self.layer_id {
            Some(id) if id % 2 == 1 => std::f64::consts::FRAC_PI_2,
            _ => 0.0,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.spacing > 0.0) || !self.spacing.is_finite() {
            return Err(Error::Config("Spacing must be positive".into()));
        }
        if !(self.density > 0.0001 && self.density <= 1.0) {
            return Err(Error::Config(format!(
                "Density must be in (0.0001, 1], got {}",
                self.density
            )));
        }
        if !self.angle.is_finite() {
            return Err(Error::Config("Angle must be finite".into()));
        }
        if !self.overlap.is_finite() || !self.pattern_shift.is_finite() {
            return Err(Error::Config("Overlap and pattern shift must be finite".into()));
        }
        if self.link_max_length < 0.0 {
            return Err(Error::Config("Link max length must not be negative".into()));
        }
        if let Some(p) = self.reference_point {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(Error::Config("Reference point must be finite".into()));
            }
        }
        Ok(())
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: FillConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            pattern: FillPattern::default(),
            spacing: 0.45,
            density: 0.2,
            angle: std::f64::consts::FRAC_PI_4,
            overlap: 0.0,
            reference_point: None,
            layer_id: None,
            pattern_shift: 0.0,
            dont_adjust: false,
            link_max_length: 0.0,
            anchor_length_max: 1000.0,
            too_long_links: TooLongLinkPolicy::default(),
            seed: 0,
        }
    }
}

impl fmt::Display for FillConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FillConfig({}, spacing={:.3}mm, density={:.0}%, angle={:.1}°)",
            self.pattern.name(),
            self.spacing,
            self.density * 100.0,
            self.angle.to_degrees()
        )
    }
}

/// Infill path generation strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPattern {
    /// Zig-zag lines joined greedily along the boundary.
    #[default]
    Rectilinear,
    /// Lines printed in one direction, grouped into monotonic blocks.
    Monotonic,
    /// Monotonic without perimeter anchors.
    MonotonicLine,
    /// Two crossing rectilinear passes.
    Grid,
}

impl FillPattern {
    /// Returns true if this pattern uses the monotonic region optimizer.
    pub fn is_monotonic(&self) -> bool {
        matches!(self, FillPattern::Monotonic | FillPattern::MonotonicLine)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FillPattern::Rectilinear => "rectilinear",
            FillPattern::Monotonic => "monotonic",
            FillPattern::MonotonicLine => "monotonic_line",
            FillPattern::Grid => "grid",
        }
    }
}

impl std::str::FromStr for FillPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rectilinear" => Ok(FillPattern::Rectilinear),
            "monotonic" => Ok(FillPattern::Monotonic),
            "monotonic_line" | "monotonicline" | "monotonic-line" => Ok(FillPattern::MonotonicLine),
            "grid" => Ok(FillPattern::Grid),
            other => Err(Error::Config(format!("Unknown fill pattern: {}", other))),
        }
    }
}

/// Treatment of perimeter connectors that exceed the length limit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TooLongLinkPolicy {
    /// Not followed, but a vertical connector still lets the path jump to
    /// its far end, starting a new polyline there.
    #[default]
    Distinct,
    /// Treated exactly like an invalid connector.
    Invalidate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_config_default() {
        let config = FillConfig::default();
        assert_eq!(config.pattern, FillPattern::Rectilinear);
        assert!((config.spacing - 0.45).abs() < 1e-9);
        assert!((config.density - 0.2).abs() < 1e-9);
        assert!(!config.is_full());
        assert!(!config.dont_connect());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fill_config_builder() {
        let config = FillConfig::new()
            .pattern(FillPattern::Monotonic)
            .spacing(0.5)
            .density(1.0)
            .angle_degrees(90.0)
            .layer_id(3)
            .seed(42);
        assert!(config.is_full());
        assert!(config.pattern.is_monotonic());
        assert!((config.angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((config.layer_angle() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_fill_config_validation() {
        assert!(FillConfig::new().spacing(0.0).validate().is_err());
        assert!(FillConfig::new().density(0.0).validate().is_err());
        assert!(FillConfig::new().density(1.5).validate().is_err());
        assert!(FillConfig::new().angle(f64::NAN).validate().is_err());
        assert!(FillConfig::new().link_max_length(-1.0).validate().is_err());
        assert!(FillConfig::new().density(1.0).validate().is_ok());
    }

    #[test]
    fn test_connection_policy() {
        assert!(FillConfig::new().anchor_length_max(0.0).dont_connect());
        assert!(FillConfig::new().pattern(FillPattern::MonotonicLine).dont_connect());

        let sparse = FillConfig::new().density(0.5);
        assert_eq!(sparse.effective_link_max_length(), 0.0);
        let dense = FillConfig::new().density(0.9).spacing(0.4);
        assert!((dense.effective_link_max_length() - 1.2).abs() < 1e-9);
        let explicit = dense.link_max_length(2.0);
        assert!((explicit.effective_link_max_length() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_fill_config_json() {
        let config = FillConfig::new()
            .pattern(FillPattern::Grid)
            .reference_point(1.0, 2.0)
            .too_long_links(TooLongLinkPolicy::Invalidate);
        let json = config.to_json_string().unwrap();
        assert!(json.contains("\"grid\""));
        let back: FillConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        // Missing fields fall back to defaults.
        let partial: FillConfig = serde_json::from_str(r#"{"density": 0.5}"#).unwrap();
        assert!((partial.density - 0.5).abs() < 1e-12);
        assert!((partial.spacing - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_fill_pattern_from_str() {
        assert_eq!("Monotonic".parse::<FillPattern>().unwrap(), FillPattern::Monotonic);
        assert_eq!("monotonic-line".parse::<FillPattern>().unwrap(), FillPattern::MonotonicLine);
        assert!("gyroid".parse::<FillPattern>().is_err());
    }
}
