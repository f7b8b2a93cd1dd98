//! Elevation banding: partition a merged grid into stacked bands with
//! cumulative masks.

use crate::{ElevationGrid, GridError, Result};

/// A half-open elevation interval `[lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    /// Inclusive lower bound in meters.
    pub lower: f64,
    /// Exclusive upper bound in meters.
    pub upper: f64,
}

/// Boolean grid aligned with a merged grid.
///
/// Masks are cumulative: a cell is set when its elevation is at or above the
/// band's lower bound. That gives the nested topology a laminated model
/// needs: every higher layer sits inside the one below.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    cells: Vec<bool>,
    width: usize,
    height: usize,
}

impl Mask {
    /// Build a mask from a flat boolean buffer.
    pub fn new(cells: Vec<bool>, width: usize, height: usize) -> Result<Self> {
        if cells.len() != width * height {
            return Err(GridError::DimensionMismatch {
                expected_w: width,
                expected_h: height,
                got_w: cells.len(),
                got_h: 1,
            });
        }
        Ok(Self {
            cells,
            width,
            height,
        })
    }

    /// Width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell value at (col, row).
    #[inline]
    pub fn get(&self, col: usize, row: usize) -> bool {
        self.cells[row * self.width + col]
    }

    /// Raw cell buffer (row-major).
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Number of set cells.
    pub fn count_set(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Fill enclosed false regions (depressions surrounded by land).
    ///
    /// Flood-fills false cells reachable from the grid border; anything not
    /// reached is an interior hole and becomes true. Water connected to the
    /// border stays water.
    pub fn fill_enclosed(&self) -> Mask {
        let (w, h) = (self.width, self.height);
        let mut outside = vec![false; w * h];
        let mut stack = Vec::new();

        let push = |stack: &mut Vec<(usize, usize)>, outside: &mut Vec<bool>, c: usize, r: usize| {
            let idx = r * w + c;
            if !outside[idx] && !self.cells[idx] {
                outside[idx] = true;
                stack.push((c, r));
            }
        };

        for c in 0..w {
            push(&mut stack, &mut outside, c, 0);
            push(&mut stack, &mut outside, c, h - 1);
        }
        for r in 0..h {
            push(&mut stack, &mut outside, 0, r);
            push(&mut stack, &mut outside, w - 1, r);
        }

        while let Some((c, r)) = stack.pop() {
            if c > 0 {
                push(&mut stack, &mut outside, c - 1, r);
            }
            if c + 1 < w {
                push(&mut stack, &mut outside, c + 1, r);
            }
            if r > 0 {
                push(&mut stack, &mut outside, c, r - 1);
            }
            if r + 1 < h {
                push(&mut stack, &mut outside, c, r + 1);
            }
        }

        let cells = self
            .cells
            .iter()
            .zip(&outside)
            .map(|(&set, &out)| set || !out)
            .collect();
        Mask {
            cells,
            width: w,
            height: h,
        }
    }
}

/// One band plus its cumulative mask.
#[derive(Debug, Clone)]
pub struct BandedMask {
    /// The elevation interval this layer represents.
    pub band: Band,
    /// Cells at or above `band.lower`.
    pub mask: Mask,
}

/// Partition `[floor, ceiling]` into bands of `interval` meters and compute
/// the cumulative mask for each.
///
/// Bands are ordered from lowest to highest. The band count is
/// `ceil((ceiling - floor) / interval)`; when the range does not divide
/// evenly the last band is narrower than `interval` rather than silently
/// extending past the ceiling.
///
/// When `floor` is `None` it defaults to the grid minimum snapped down to an
/// interval multiple and clamped to no less than zero (sea level is the
/// lowest sheet a land model needs). `ceiling` defaults to the grid maximum.
pub fn bin_elevations(
    grid: &ElevationGrid,
    interval: f64,
    floor: Option<f64>,
    ceiling: Option<f64>,
) -> Result<Vec<BandedMask>> {
    if !(interval > 0.0) {
        return Err(GridError::InvalidParameter {
            name: "interval",
            reason: format!("{interval} must be > 0"),
        });
    }
    if let (Some(f), Some(c)) = (floor, ceiling) {
        if f >= c {
            return Err(GridError::InvalidParameter {
                name: "floor",
                reason: format!("floor {f} must be below ceiling {c}"),
            });
        }
    }

    let (grid_min, grid_max) = grid.min_max().ok_or(GridError::EmptyCoverage)?;
    let floor = floor.unwrap_or_else(|| ((grid_min as f64 / interval).floor() * interval).max(0.0));
    let ceiling = ceiling.unwrap_or(grid_max as f64);
    if floor >= ceiling {
        return Err(GridError::InvalidParameter {
            name: "floor",
            reason: format!("derived floor {floor} is not below ceiling {ceiling}"),
        });
    }

    let count = ((ceiling - floor) / interval).ceil() as usize;
    let width = grid.width();
    let height = grid.height();

    let mut bands = Vec::with_capacity(count);
    for i in 0..count {
        let lower = floor + i as f64 * interval;
        let upper = (lower + interval).min(ceiling);
        let cells = grid
            .data()
            .iter()
            .map(|&v| !v.is_nan() && v as f64 >= lower)
            .collect();
        bands.push(BandedMask {
            band: Band { lower, upper },
            mask: Mask::new(cells, width, height)?,
        });
    }

    tracing::debug!(
        count,
        floor,
        ceiling,
        interval,
        "binned elevations into bands"
    );
    Ok(bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridTransform;
    use approx::assert_relative_eq;

    fn grid_with_range(w: usize, h: usize, min: f32, max: f32) -> ElevationGrid {
        let n = w * h;
        let data = (0..n)
            .map(|i| min + (max - min) * i as f32 / (n - 1) as f32)
            .collect();
        ElevationGrid::new(
            data,
            w,
            h,
            GridTransform {
                origin_x: 0.0,
                origin_y: 0.0,
                cell_size: 1.0,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_band_count_and_bounds() {
        // 100x100 grid, interval 50, floor 0, ceiling 200 -> exactly 4 bands.
        let grid = grid_with_range(100, 100, 0.0, 200.0);
        let bands = bin_elevations(&grid, 50.0, Some(0.0), Some(200.0)).unwrap();
        assert_eq!(bands.len(), 4);
        let expected = [(0.0, 50.0), (50.0, 100.0), (100.0, 150.0), (150.0, 200.0)];
        for (b, (lo, hi)) in bands.iter().zip(expected) {
            assert_relative_eq!(b.band.lower, lo);
            assert_relative_eq!(b.band.upper, hi);
        }
    }

    #[test]
    fn test_bands_contiguous_non_overlapping() {
        let grid = grid_with_range(10, 10, 12.0, 187.0);
        let bands = bin_elevations(&grid, 25.0, Some(10.0), Some(190.0)).unwrap();
        for pair in bands.windows(2) {
            assert_relative_eq!(pair[0].band.upper, pair[1].band.lower);
        }
        assert_relative_eq!(bands.first().unwrap().band.lower, 10.0);
        assert_relative_eq!(bands.last().unwrap().band.upper, 190.0);
    }

    #[test]
    fn test_last_band_narrower_when_range_uneven() {
        let grid = grid_with_range(10, 10, 0.0, 130.0);
        let bands = bin_elevations(&grid, 50.0, Some(0.0), Some(130.0)).unwrap();
        assert_eq!(bands.len(), 3);
        let last = bands.last().unwrap().band;
        assert_relative_eq!(last.lower, 100.0);
        assert_relative_eq!(last.upper, 130.0);
    }

    #[test]
    fn test_masks_are_cumulative_and_nested() {
        let grid = grid_with_range(20, 20, 0.0, 100.0);
        let bands = bin_elevations(&grid, 25.0, Some(0.0), Some(100.0)).unwrap();
        for pair in bands.windows(2) {
            let (lower, higher) = (&pair[0].mask, &pair[1].mask);
            assert!(higher.count_set() <= lower.count_set());
            for (lo, hi) in lower.cells().iter().zip(higher.cells()) {
                // Higher layer is a subset of the one below.
                assert!(!hi || *lo);
            }
        }
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let grid = grid_with_range(4, 4, 0.0, 10.0);
        assert!(bin_elevations(&grid, 0.0, None, None).is_err());
        assert!(bin_elevations(&grid, -5.0, None, None).is_err());
    }

    #[test]
    fn test_floor_above_ceiling_rejected() {
        let grid = grid_with_range(4, 4, 0.0, 10.0);
        assert!(bin_elevations(&grid, 5.0, Some(100.0), Some(50.0)).is_err());
    }

    #[test]
    fn test_default_floor_snaps_to_interval() {
        let grid = grid_with_range(10, 10, 37.0, 142.0);
        let bands = bin_elevations(&grid, 20.0, None, None).unwrap();
        // 37 snaps down to 20.
        assert_relative_eq!(bands[0].band.lower, 20.0);
    }

    #[test]
    fn test_fill_enclosed_closes_depression() {
        // Ring of land with a one-cell pit inside.
        let mut cells = vec![true; 25];
        cells[12] = false;
        let mask = Mask::new(cells, 5, 5).unwrap();
        let filled = mask.fill_enclosed();
        assert!(filled.get(2, 2));
    }

    #[test]
    fn test_fill_enclosed_keeps_border_water() {
        // Water column touching the border is not a hole.
        let mut cells = vec![true; 25];
        for r in 0..5 {
            cells[r * 5] = false;
        }
        let mask = Mask::new(cells, 5, 5).unwrap();
        let filled = mask.fill_enclosed();
        for r in 0..5 {
            assert!(!filled.get(0, r));
        }
    }
}
