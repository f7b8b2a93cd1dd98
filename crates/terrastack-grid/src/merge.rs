//! Priority merging of multiple elevation sources onto one target grid.

use crate::{ElevationGrid, GridError, GridTransform, Result};

/// One elevation source participating in a merge.
///
/// Lower `priority` wins where coverage overlaps. Sources sharing a priority
/// are tie-broken by their position in the input slice (scan order).
#[derive(Debug, Clone)]
pub struct Source {
    /// The source raster, already in the common coordinate reference.
    pub grid: ElevationGrid,
    /// Priority rank; lower is preferred.
    pub priority: u32,
}

impl Source {
    /// Wrap a grid with a priority rank.
    pub fn new(grid: ElevationGrid, priority: u32) -> Self {
        Self { grid, priority }
    }

    /// Native ground resolution of this source.
    pub fn resolution(&self) -> f64 {
        self.grid.transform().cell_size
    }
}

/// Target extent and resolution for a merge.
#[derive(Debug, Clone, Copy)]
pub struct TargetSpec {
    /// Output width in cells.
    pub width: usize,
    /// Output height in cells.
    pub height: usize,
    /// Output grid transform.
    pub transform: GridTransform,
}

impl TargetSpec {
    /// A target covering exactly one source's extent and resolution.
    pub fn from_grid(grid: &ElevationGrid) -> Self {
        Self {
            width: grid.width(),
            height: grid.height(),
            transform: grid.transform(),
        }
    }
}

/// Result of a merge: the combined grid plus the number of cells no source
/// could fill (before gap filling).
#[derive(Debug)]
pub struct MergeOutcome {
    /// The merged grid.
    pub grid: ElevationGrid,
    /// Cells left no-data because no source covered them.
    pub uncovered_cells: usize,
}

/// Merge sources onto the target grid.
///
/// Every source is resampled (bilinear) onto the target; each output cell
/// takes the value of the first source, in priority order, with a valid
/// sample there. Deterministic: priority sort is stable, so equal-priority
/// sources keep their input order.
pub fn merge_sources(sources: &[Source], target: TargetSpec) -> Result<MergeOutcome> {
    if sources.is_empty() {
        return Err(GridError::EmptyCoverage);
    }

    let mut order: Vec<&Source> = sources.iter().collect();
    order.sort_by_key(|s| s.priority);

    let mut grid = ElevationGrid::filled_no_data(target.width, target.height, target.transform);
    let mut uncovered = 0usize;

    for row in 0..target.height {
        for col in 0..target.width {
            let (wx, wy) = target.transform.cell_center(col, row);
            let mut value = f32::NAN;
            for source in &order {
                let (sc, sr) = source.grid.transform().world_to_grid(wx, wy);
                if let Some(v) = source.grid.sample_bilinear(sc, sr) {
                    value = v;
                    break;
                }
            }
            if value.is_nan() {
                uncovered += 1;
            }
            grid.set(col, row, value);
        }
    }

    tracing::debug!(
        sources = sources.len(),
        uncovered,
        "merged sources onto {}x{} target",
        target.width,
        target.height
    );

    Ok(MergeOutcome {
        grid,
        uncovered_cells: uncovered,
    })
}

/// Fill residual no-data cells from the nearest valid neighbor.
///
/// Searches outward in square rings up to `max_radius` cells; within a ring
/// the first valid cell in scan order wins, keeping the fill deterministic.
/// Returns the number of cells that remain unfilled.
pub fn fill_gaps(grid: &mut ElevationGrid, max_radius: usize) -> usize {
    let width = grid.width();
    let height = grid.height();
    let snapshot = grid.data().to_vec();

    let valid = |col: i64, row: i64| -> Option<f32> {
        if col < 0 || row < 0 || col >= width as i64 || row >= height as i64 {
            return None;
        }
        let v = snapshot[row as usize * width + col as usize];
        (!v.is_nan()).then_some(v)
    };

    let mut remaining = 0usize;
    for row in 0..height {
        for col in 0..width {
            if !grid.get(col, row).is_nan() {
                continue;
            }
            let mut filled = None;
            'rings: for r in 1..=max_radius as i64 {
                let (c0, r0) = (col as i64, row as i64);
                // Top and bottom edges of the ring, then left and right.
                for dc in -r..=r {
                    if let Some(v) = valid(c0 + dc, r0 - r) {
                        filled = Some(v);
                        break 'rings;
                    }
                    if let Some(v) = valid(c0 + dc, r0 + r) {
                        filled = Some(v);
                        break 'rings;
                    }
                }
                for dr in (-r + 1)..r {
                    if let Some(v) = valid(c0 - r, r0 + dr) {
                        filled = Some(v);
                        break 'rings;
                    }
                    if let Some(v) = valid(c0 + r, r0 + dr) {
                        filled = Some(v);
                        break 'rings;
                    }
                }
            }
            match filled {
                Some(v) => grid.set(col, row, v),
                None => remaining += 1,
            }
        }
    }
    remaining
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn transform(cell_size: f64) -> GridTransform {
        GridTransform {
            origin_x: 0.0,
            origin_y: 0.0,
            cell_size,
        }
    }

    fn grid_of(values: Vec<f32>, w: usize, h: usize, cell: f64) -> ElevationGrid {
        ElevationGrid::new(values, w, h, transform(cell)).unwrap()
    }

    #[test]
    fn test_single_full_source_is_identity() {
        let src = grid_of(vec![1.0, 2.0, 3.0, 4.0], 2, 2, 1.0);
        let target = TargetSpec::from_grid(&src);
        let out = merge_sources(&[Source::new(src.clone(), 0)], target).unwrap();
        assert_eq!(out.uncovered_cells, 0);
        assert_eq!(out.grid.data(), src.data());
    }

    #[test]
    fn test_priority_wins_on_overlap() {
        let fine = grid_of(vec![100.0; 4], 2, 2, 1.0);
        let coarse = grid_of(vec![200.0; 4], 2, 2, 1.0);
        let target = TargetSpec::from_grid(&fine);
        let out = merge_sources(
            &[Source::new(coarse, 1), Source::new(fine, 0)],
            target,
        )
        .unwrap();
        for &v in out.grid.data() {
            assert_relative_eq!(v, 100.0);
        }
    }

    #[test]
    fn test_lower_priority_fills_gaps() {
        let mut fine = grid_of(vec![100.0; 4], 2, 2, 1.0);
        fine.set(1, 1, f32::NAN);
        fine.set(0, 1, f32::NAN);
        fine.set(1, 0, f32::NAN);
        fine.set(0, 0, f32::NAN);
        // Entire fine source is a hole; coarse backs it up.
        let coarse = grid_of(vec![200.0; 4], 2, 2, 1.0);
        let target = TargetSpec::from_grid(&coarse);
        let out = merge_sources(
            &[Source::new(fine, 0), Source::new(coarse, 1)],
            target,
        )
        .unwrap();
        assert_eq!(out.uncovered_cells, 0);
        for &v in out.grid.data() {
            assert_relative_eq!(v, 200.0);
        }
    }

    #[test]
    fn test_uncovered_cells_reported() {
        // Source covers only the left half of a wider target.
        let src = grid_of(vec![5.0; 4], 2, 2, 1.0);
        let target = TargetSpec {
            width: 4,
            height: 2,
            transform: transform(1.0),
        };
        let out = merge_sources(&[Source::new(src, 0)], target).unwrap();
        assert!(out.uncovered_cells > 0);
        assert!(out.uncovered_cells < 8);
    }

    #[test]
    fn test_fill_gaps_nearest() {
        let mut grid = grid_of(vec![1.0, f32::NAN, f32::NAN, 9.0], 4, 1, 1.0);
        let remaining = fill_gaps(&mut grid, 8);
        assert_eq!(remaining, 0);
        // Nearest valid neighbors.
        assert_relative_eq!(grid.get(1, 0), 1.0);
        assert_relative_eq!(grid.get(2, 0), 9.0);
    }

    #[test]
    fn test_fill_gaps_bounded() {
        let mut data = vec![f32::NAN; 32];
        data[0] = 7.0;
        let mut grid = grid_of(data, 32, 1, 1.0);
        let remaining = fill_gaps(&mut grid, 4);
        // Cells beyond radius 4 of the lone valid cell stay empty.
        assert!(remaining > 0);
        assert_relative_eq!(grid.get(4, 0), 7.0);
        assert!(grid.get(6, 0).is_nan());
    }

    #[test]
    fn test_merge_no_sources_fails() {
        let target = TargetSpec {
            width: 2,
            height: 2,
            transform: transform(1.0),
        };
        assert!(merge_sources(&[], target).is_err());
    }
}
