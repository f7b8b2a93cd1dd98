//! Error types for document assembly.

use thiserror::Error;

/// Errors that can occur while assembling the print document.
#[derive(Debug, Error)]
pub enum PrintError {
    /// Filesystem error writing the document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF construction or serialization failed.
    #[error("PDF error: {0}")]
    Pdf(#[from] printpdf::Error),

    /// A built-in font could not be registered.
    #[error("font error: {0}")]
    Font(String),

    /// No sheets were supplied.
    #[error("document has no sheets")]
    EmptyDocument,
}
