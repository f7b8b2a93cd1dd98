//! Recoverable conditions reported alongside successful output.

use std::fmt;

use serde::Serialize;

/// A non-fatal condition encountered during a run.
///
/// Warnings never abort the pipeline; they are collected into the run
/// summary and the machine-readable report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Cells no source covered and the bounded gap fill could not reach.
    SourceCoverageGap {
        /// Number of cells left as no-data.
        unfilled_cells: usize,
    },
    /// Rings that collapsed below 3 distinct vertices during
    /// simplification and were dropped.
    DegeneratePolygon {
        /// Layer index.
        layer: usize,
        /// Number of rings removed.
        dropped_rings: usize,
    },
    /// A sheet exceeded the vector budget and its fill was rasterized.
    RenderOverflow {
        /// Layer index.
        layer: usize,
    },
    /// A sheet exceeds the printable area at the requested scale and was
    /// emitted at true scale on a single page.
    PageOverflow {
        /// Layer index.
        layer: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SourceCoverageGap { unfilled_cells } => {
                write!(f, "source coverage gap: {unfilled_cells} cells left unfilled")
            }
            Warning::DegeneratePolygon { layer, dropped_rings } => {
                write!(
                    f,
                    "layer {layer}: {dropped_rings} rings collapsed during simplification and were dropped"
                )
            }
            Warning::RenderOverflow { layer } => {
                write!(f, "layer {layer}: vector budget exceeded, fill rasterized")
            }
            Warning::PageOverflow { layer } => {
                write!(
                    f,
                    "layer {layer} exceeds the printable area at the requested scale"
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let w = Warning::DegeneratePolygon {
            layer: 3,
            dropped_rings: 2,
        };
        assert!(w.to_string().contains("layer 3"));
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let w = Warning::SourceCoverageGap { unfilled_cells: 7 };
        let json = serde_json::to_string(&w).unwrap();
        assert!(json.contains("\"kind\":\"source_coverage_gap\""));
        assert!(json.contains("\"unfilled_cells\":7"));
    }
}
