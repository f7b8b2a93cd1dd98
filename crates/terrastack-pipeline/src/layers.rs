//! Per-layer computation: banding masks into simplified polygons and
//! wiring registration guides.

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::debug;

use terrastack_contour::{extract_polygons, simplify_ring, ExtractOptions, Polygon};
use terrastack_grid::{Band, BandedMask};

use crate::{CancelToken, Params, Result, Warning};

/// One sheet of the model: a band, its simplified footprint, and the index
/// of the layer whose outline serves as this sheet's placement guide.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Zero-based position in the stack, bottom first.
    pub index: usize,
    /// The elevation interval this sheet represents.
    pub band: Band,
    /// Simplified footprint polygons.
    pub polygons: Vec<Polygon>,
    /// Index of the layer directly above, whose outline is drawn on this
    /// sheet as the registration guide. `None` for the topmost sheet.
    pub guide: Option<usize>,
}

/// Extract and simplify every band's footprint in parallel.
///
/// Output order matches band order regardless of scheduling. Rings that
/// collapse during simplification are dropped and reported per layer.
pub fn compute_layers(
    bands: &[BandedMask],
    params: &Params,
    token: &CancelToken,
    warnings: &Mutex<Vec<Warning>>,
) -> Result<Vec<Layer>> {
    let options = ExtractOptions {
        min_ring_points: params.min_ring_points,
    };

    bands
        .par_iter()
        .enumerate()
        .map(|(index, banded)| {
            token.checkpoint()?;
            let mask = if params.fill_depressions {
                banded.mask.fill_enclosed()
            } else {
                banded.mask.clone()
            };
            let raw = extract_polygons(&mask, options);

            let mut dropped = 0usize;
            let mut polygons = Vec::with_capacity(raw.len());
            for poly in &raw {
                // A collapsed outer ring drops the whole polygon, holes
                // included; a collapsed hole just disappears.
                match simplify_ring(&poly.outer, params.simplify_tolerance) {
                    None => dropped += 1 + poly.holes.len(),
                    Some(outer) => {
                        let mut holes = Vec::with_capacity(poly.holes.len());
                        for hole in &poly.holes {
                            match simplify_ring(hole, params.simplify_tolerance) {
                                Some(h) => holes.push(h),
                                None => dropped += 1,
                            }
                        }
                        polygons.push(Polygon { outer, holes });
                    }
                }
            }
            if dropped > 0 {
                warnings.lock().push(Warning::DegeneratePolygon {
                    layer: index,
                    dropped_rings: dropped,
                });
            }
            debug!(
                layer = index,
                lower = banded.band.lower,
                polygons = polygons.len(),
                dropped,
                "computed layer footprint"
            );
            Ok(Layer {
                index,
                band: banded.band,
                polygons,
                guide: None,
            })
        })
        .collect()
}

/// Wire each layer to the one directly above it.
///
/// This runs after every layer's polygons exist and before any rendering
/// starts; it is the barrier between layer computation and output.
pub fn attach_guides(layers: &mut [Layer]) {
    let count = layers.len();
    for (i, layer) in layers.iter_mut().enumerate() {
        layer.guide = (i + 1 < count).then_some(i + 1);
    }
}
