//! Error types for pipeline runs.

use thiserror::Error;

/// Errors that abort a pipeline run.
///
/// Recoverable conditions (coverage gaps, degenerate rings, rasterized
/// fallbacks, page overflows) are reported as [`crate::Warning`]s alongside
/// successful output instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A parameter failed validation. Nothing is produced.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The run was cancelled. Partial output has been discarded; this is a
    /// clean stop, not a failure.
    #[error("run cancelled")]
    Cancelled,

    /// Grid loading, merging or banding failed.
    #[error(transparent)]
    Grid(#[from] terrastack_grid::GridError),

    /// Layer rendering failed.
    #[error("render error: {0}")]
    Render(#[from] terrastack_render::RenderError),

    /// Print document assembly failed.
    #[error("print error: {0}")]
    Print(#[from] terrastack_print::PrintError),

    /// Filesystem error on output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Run report serialization failed.
    #[error("report serialization error: {0}")]
    Report(#[from] serde_json::Error),
}
