//! Engine tuning: drop threshold, grid, debounce, and stack geometry.
//!
//! One [`LayoutConfig`] is injected per workspace. Values can be built in
//! code, deserialized from JSON, or read from `CMESH_*` environment
//! variables; every path ends in [`LayoutConfig::validate`].

use std::time::Duration;

use cmesh_core::geometry::Point;
use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::stacking::StackAxis;

/// Default fraction of the dragged item that must overlap a zone to dock.
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.3;

/// Default grid spacing for floating placement, in pixels.
pub const DEFAULT_GRID_SIZE: f64 = 10.0;

/// Default thickness of a zone-stack boundary band, in pixels.
pub const DEFAULT_STACK_BOUNDARY_BAND: f64 = 16.0;

pub const ENV_OVERLAP_THRESHOLD: &str = "CMESH_OVERLAP_THRESHOLD";
pub const ENV_GRID_SIZE: &str = "CMESH_GRID_SIZE";
pub const ENV_RESIZE_DEBOUNCE_MS: &str = "CMESH_RESIZE_DEBOUNCE_MS";
pub const ENV_STACK_AXIS: &str = "CMESH_STACK_AXIS";
pub const ENV_STACK_BOUNDARY_BAND: &str = "CMESH_STACK_BOUNDARY_BAND";

/// Workspace-wide layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// A zone becomes the drop candidate only if the item's overlap fraction
    /// is strictly greater than this value.
    pub overlap_threshold: f64,
    /// Grid spacing for floating placement. `0` disables snapping.
    pub grid_size: f64,
    /// Idle window before resize results are published. `0` publishes on end.
    pub resize_debounce_ms: u64,
    /// Direction in which stacked zones are arranged.
    pub stack_axis: StackAxis,
    /// Thickness of the drop band centred on each stack seam.
    pub stack_boundary_band: f64,
    /// Position used when an item must float but has never had a floating
    /// position and no better anchor exists.
    pub fallback_position: Point,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            grid_size: DEFAULT_GRID_SIZE,
            resize_debounce_ms: 0,
            stack_axis: StackAxis::Vertical,
            stack_boundary_band: DEFAULT_STACK_BOUNDARY_BAND,
            fallback_position: Point::ORIGIN,
        }
    }
}

impl LayoutConfig {
    #[must_use]
    pub fn with_overlap_threshold(mut self, threshold: f64) -> Self {
        self.overlap_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_grid_size(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    #[must_use]
    pub fn with_resize_debounce(mut self, debounce: Duration) -> Self {
        self.resize_debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_stack_axis(mut self, axis: StackAxis) -> Self {
        self.stack_axis = axis;
        self
    }

    #[must_use]
    pub fn with_stack_boundary_band(mut self, band: f64) -> Self {
        self.stack_boundary_band = band;
        self
    }

    #[must_use]
    pub fn with_fallback_position(mut self, position: Point) -> Self {
        self.fallback_position = position;
        self
    }

    /// Debounce window, or `None` when publication is immediate.
    #[must_use]
    pub fn resize_debounce(&self) -> Option<Duration> {
        (self.resize_debounce_ms > 0).then(|| Duration::from_millis(self.resize_debounce_ms))
    }

    /// Check ranges. Called by every constructor path that reads external
    /// input, and by `LayoutWorkspace::new`.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.overlap_threshold) {
            return Err(invalid(
                "overlap_threshold",
                format!("must be in [0, 1), got {}", self.overlap_threshold),
            ));
        }
        if !self.grid_size.is_finite() || self.grid_size < 0.0 {
            return Err(invalid(
                "grid_size",
                format!("must be finite and >= 0, got {}", self.grid_size),
            ));
        }
        if !self.stack_boundary_band.is_finite() || self.stack_boundary_band <= 0.0 {
            return Err(invalid(
                "stack_boundary_band",
                format!("must be finite and > 0, got {}", self.stack_boundary_band),
            ));
        }
        if !self.fallback_position.is_finite() {
            return Err(invalid("fallback_position", "must be finite".to_string()));
        }
        Ok(())
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|err| LayoutError::InvalidConfig {
            field: "<json>",
            reason: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `CMESH_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`.
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_OVERLAP_THRESHOLD) {
            config.overlap_threshold = parse_field("overlap_threshold", &raw)?;
        }
        if let Some(raw) = lookup(ENV_GRID_SIZE) {
            config.grid_size = parse_field("grid_size", &raw)?;
        }
        if let Some(raw) = lookup(ENV_RESIZE_DEBOUNCE_MS) {
            config.resize_debounce_ms = parse_field("resize_debounce_ms", &raw)?;
        }
        if let Some(raw) = lookup(ENV_STACK_AXIS) {
            config.stack_axis = match raw.trim().to_ascii_lowercase().as_str() {
                "vertical" => StackAxis::Vertical,
                "horizontal" => StackAxis::Horizontal,
                other => {
                    return Err(invalid(
                        "stack_axis",
                        format!("expected `vertical` or `horizontal`, got `{other}`"),
                    ));
                }
            };
        }
        if let Some(raw) = lookup(ENV_STACK_BOUNDARY_BAND) {
            config.stack_boundary_band = parse_field("stack_boundary_band", &raw)?;
        }
        config.validate()?;
        Ok(config)
    }
}

fn invalid(field: &'static str, reason: String) -> LayoutError {
    LayoutError::InvalidConfig { field, reason }
}

fn parse_field<T>(field: &'static str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|err: T::Err| invalid(field, format!("cannot parse `{raw}`: {err}")))
}
