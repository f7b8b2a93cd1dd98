//! # terrastack-pipeline
//!
//! Drives the whole terrain layering run: merge elevation sources onto one
//! grid, bin it into cumulative bands, extract and simplify each band's
//! footprint in parallel, wire registration guides, render per-layer SVG
//! sheets, and assemble the combined print document. Output is staged in a
//! `<out>.partial` directory and committed by rename, so a failed or
//! cancelled run leaves nothing behind.

mod cancel;
mod error;
mod layers;
mod params;
mod run;
mod warning;

pub use cancel::CancelToken;
pub use error::PipelineError;
pub use layers::{attach_guides, compute_layers, Layer};
pub use params::{FillStyleKind, Params};
pub use run::{run, RunSummary};
pub use warning::Warning;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
