//! Paper sizes and the policy for sheets that do not fit a page.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported paper sizes. Dimensions are the portrait orientation;
/// the assembler rotates pages to landscape when the content is wider
/// than it is tall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    /// ISO A4, 210 x 297 mm.
    A4,
    /// ISO A3, 297 x 420 mm.
    A3,
    /// JIS B4, 257 x 364 mm.
    B4,
}

impl PaperSize {
    /// Portrait dimensions in millimeters, `(width, height)`.
    pub fn dims_mm(self) -> (f64, f64) {
        match self {
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::B4 => (257.0, 364.0),
        }
    }
}

impl FromStr for PaperSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(PaperSize::A4),
            "a3" => Ok(PaperSize::A3),
            "b4" => Ok(PaperSize::B4),
            other => Err(format!("unknown paper size '{other}' (expected a4, a3 or b4)")),
        }
    }
}

/// What to do when a sheet's physical extent exceeds the usable page
/// area. The content is never silently scaled down; the printed scale
/// is part of the model's contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Split the sheet over several overlapping pages with corner
    /// registration marks for reassembly.
    Tile,
    /// Emit the sheet on a single page at true scale and report the
    /// overflow to the caller.
    Report,
}
