//! # terrastack-grid
//!
//! Elevation grid model for the terrastack pipeline: GeoTIFF source
//! loading, priority merging of multi-resolution sources, gap filling,
//! Gaussian smoothing, and elevation banding.
//!
//! ## Overview
//!
//! A run starts from one or more [`Source`] rasters sharing a coordinate
//! reference. [`merge_sources`] resamples them onto a common target grid,
//! preferring higher-priority (usually higher-fidelity) sources per cell;
//! [`fill_gaps`] closes seams no source covered so contours do not break at
//! source boundaries. [`gaussian_smooth`] optionally softens the merged
//! grid, and [`bin_elevations`] partitions it into [`Band`]s with cumulative
//! [`Mask`]s, one physical sheet each.
//!
//! ```no_run
//! use terrastack_grid::{load_geotiff, merge_sources, Source, TargetSpec};
//!
//! let grid = load_geotiff("dem.tif", false)?;
//! let target = TargetSpec::from_grid(&grid);
//! let merged = merge_sources(&[Source::new(grid, 0)], target)?;
//! let bands = terrastack_grid::bin_elevations(&merged.grid, 10.0, None, None)?;
//! println!("{} layers", bands.len());
//! # Ok::<(), terrastack_grid::GridError>(())
//! ```

mod bands;
mod error;
mod geotiff;
mod grid;
mod merge;
mod smooth;

pub use bands::{bin_elevations, Band, BandedMask, Mask};
pub use error::GridError;
pub use geotiff::load_geotiff;
pub use grid::{ElevationGrid, GridTransform, NO_DATA_FLOOR};
pub use merge::{fill_gaps, merge_sources, MergeOutcome, Source, TargetSpec};
pub use smooth::gaussian_smooth;

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
