//! # terrastack-print
//!
//! Assembles the rendered terrain layers into a single printable PDF:
//! a cover sheet with the run parameters and a layer legend, then one
//! page per layer at exact physical scale. Oversized layers are tiled
//! over overlapping pages with registration marks, or flagged,
//! depending on the overflow policy. The printed scale is never
//! silently reduced to make content fit.

mod assemble;
mod error;
mod paper;

pub use assemble::{AssembledDocument, DocumentAssembler, PrintConfig, SheetArt};
pub use error::PrintError;
pub use paper::{OverflowPolicy, PaperSize};

/// Result type for print operations.
pub type Result<T> = std::result::Result<T, PrintError>;
