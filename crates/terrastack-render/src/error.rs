//! Error types for the render crate.

use thiserror::Error;

/// Errors that can occur while rendering layer documents.
#[derive(Debug, Error)]
pub enum RenderError {
    /// PNG encoding failed.
    #[error("PNG encode error: {0}")]
    PngEncode(#[from] png::EncodingError),

    /// Pixel buffer length does not match the stated dimensions.
    #[error("Image buffer length {got} does not match dimensions (expected {expected})")]
    BadImageDimensions {
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        got: usize,
    },
}
