//! Run parameters and validation.

use serde::{Deserialize, Serialize};

use terrastack_print::{OverflowPolicy, PaperSize};

use crate::{PipelineError, Result};

/// How layer footprints are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStyleKind {
    /// Flat color from the terrain ramp by normalized elevation.
    Flat,
    /// Satellite imagery clipped to each layer's footprint.
    Satellite,
}

/// The full parameter surface of a run.
///
/// Deserializable from the YAML run config; unspecified fields take the
/// defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Title for the cover sheet and assembly guide.
    pub title: String,
    /// Elevation band thickness in meters. Must be > 0.
    pub interval_m: f64,
    /// Lowest band boundary in meters. Defaults to the grid minimum
    /// snapped down to an interval multiple, clamped to >= 0.
    pub floor_m: Option<f64>,
    /// Highest band boundary in meters. Defaults to the grid maximum.
    pub ceiling_m: Option<f64>,
    /// Gaussian smoothing sigma in cells. 0 disables smoothing exactly.
    pub smoothing_sigma: f64,
    /// Douglas-Peucker tolerance in grid units. 0 keeps every vertex.
    pub simplify_tolerance: f64,
    /// Resolution reduction applied to every source before merging,
    /// in (0, 1]. 1 keeps the native resolution.
    pub downsample: f64,
    /// Search radius in cells for filling residual no-data after the merge.
    pub gap_fill_radius: usize,
    /// Fill interior depressions so each sheet is a solid piece.
    pub fill_depressions: bool,
    /// Rings with fewer distinct points are discarded as noise.
    pub min_ring_points: usize,
    /// Target paper size.
    pub paper_size: PaperSize,
    /// Physical scale: millimeters of paper per grid cell. Must be > 0.
    pub scale_mm_per_unit: f64,
    /// Footprint fill style.
    pub fill_style: FillStyleKind,
    /// Fill the region two layers up in plain grey instead of printing
    /// color that higher sheets will hide.
    pub ink_saver: bool,
    /// What to do when a sheet exceeds the printable area.
    pub overflow_policy: OverflowPolicy,
    /// Cut-line stroke width in mm.
    pub stroke_width_mm: f64,
    /// Raster resolution for the fallback fill when a sheet exceeds the
    /// vector budget.
    pub raster_fallback_dpi: f64,
    /// Per-sheet vertex budget before the fill degrades to a raster image.
    pub max_vector_vertices: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            title: "Terrain model".to_string(),
            interval_m: 50.0,
            floor_m: None,
            ceiling_m: None,
            smoothing_sigma: 1.0,
            simplify_tolerance: 0.5,
            downsample: 1.0,
            gap_fill_radius: 8,
            fill_depressions: true,
            min_ring_points: 8,
            paper_size: PaperSize::A4,
            scale_mm_per_unit: 1.0,
            fill_style: FillStyleKind::Flat,
            ink_saver: false,
            overflow_policy: OverflowPolicy::Report,
            stroke_width_mm: 0.1,
            raster_fallback_dpi: 150.0,
            max_vector_vertices: 200_000,
        }
    }
}

impl Params {
    /// Validate the parameter set. Any violation is fatal and nothing is
    /// produced.
    pub fn validate(&self) -> Result<()> {
        if !(self.interval_m > 0.0) {
            return Err(invalid("interval_m", format!("{} must be > 0", self.interval_m)));
        }
        if let (Some(f), Some(c)) = (self.floor_m, self.ceiling_m) {
            if f >= c {
                return Err(invalid(
                    "floor_m",
                    format!("floor {f} must be below ceiling {c}"),
                ));
            }
        }
        if !(self.smoothing_sigma >= 0.0) {
            return Err(invalid(
                "smoothing_sigma",
                format!("{} must be >= 0", self.smoothing_sigma),
            ));
        }
        if !(self.simplify_tolerance >= 0.0) {
            return Err(invalid(
                "simplify_tolerance",
                format!("{} must be >= 0", self.simplify_tolerance),
            ));
        }
        if !(self.downsample > 0.0 && self.downsample <= 1.0) {
            return Err(invalid(
                "downsample",
                format!("{} must be in (0, 1]", self.downsample),
            ));
        }
        if !(self.scale_mm_per_unit > 0.0) {
            return Err(invalid(
                "scale_mm_per_unit",
                format!("{} must be > 0", self.scale_mm_per_unit),
            ));
        }
        if !(self.stroke_width_mm > 0.0) {
            return Err(invalid(
                "stroke_width_mm",
                format!("{} must be > 0", self.stroke_width_mm),
            ));
        }
        if !(self.raster_fallback_dpi > 0.0) {
            return Err(invalid(
                "raster_fallback_dpi",
                format!("{} must be > 0", self.raster_fallback_dpi),
            ));
        }
        if self.min_ring_points < 3 {
            return Err(invalid(
                "min_ring_points",
                format!("{} must be >= 3", self.min_ring_points),
            ));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: String) -> PipelineError {
    PipelineError::InvalidParameter { name, reason }
}
