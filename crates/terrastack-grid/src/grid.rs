//! Elevation grid representation.

use crate::{GridError, Result};

/// Elevation below this value is treated as no-data even when no nodata tag
/// is present. Common sentinels (-9999, -32768) fall below it.
pub const NO_DATA_FLOOR: f32 = -9000.0;

/// Affine transform mapping grid indices to world coordinates.
///
/// Row 0 is the northern edge; y decreases as rows increase. Cells are
/// square in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTransform {
    /// World x of the top-left corner of cell (0, 0).
    pub origin_x: f64,
    /// World y of the top-left corner of cell (0, 0).
    pub origin_y: f64,
    /// Ground distance per cell, in world units.
    pub cell_size: f64,
}

impl GridTransform {
    /// World coordinates of the center of cell (col, row).
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.cell_size,
            self.origin_y - (row as f64 + 0.5) * self.cell_size,
        )
    }

    /// Fractional grid coordinates (col, row) of a world point.
    pub fn world_to_grid(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.cell_size - 0.5,
            (self.origin_y - y) / self.cell_size - 0.5,
        )
    }
}

/// A single-band elevation raster.
///
/// Samples are stored row-major (north to south, west to east) in one flat
/// buffer. Missing samples are `f32::NAN`.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    data: Vec<f32>,
    width: usize,
    height: usize,
    transform: GridTransform,
}

impl ElevationGrid {
    /// Create a grid from a flat row-major buffer.
    pub fn new(
        data: Vec<f32>,
        width: usize,
        height: usize,
        transform: GridTransform,
    ) -> Result<Self> {
        if data.len() != width * height {
            return Err(GridError::DimensionMismatch {
                expected_w: width,
                expected_h: height,
                got_w: data.len(),
                got_h: 1,
            });
        }
        Ok(Self {
            data,
            width,
            height,
            transform,
        })
    }

    /// Create a grid filled entirely with no-data.
    pub fn filled_no_data(width: usize, height: usize, transform: GridTransform) -> Self {
        Self {
            data: vec![f32::NAN; width * height],
            width,
            height,
            transform,
        }
    }

    /// Width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Grid-to-world transform.
    pub fn transform(&self) -> GridTransform {
        self.transform
    }

    /// Raw sample buffer (row-major).
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable sample buffer (row-major).
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Sample at (col, row). Callers must stay in bounds.
    #[inline]
    pub fn get(&self, col: usize, row: usize) -> f32 {
        self.data[row * self.width + col]
    }

    /// Set the sample at (col, row).
    #[inline]
    pub fn set(&mut self, col: usize, row: usize, value: f32) {
        self.data[row * self.width + col] = value;
    }

    /// Whether the sample at (col, row) holds a valid elevation.
    #[inline]
    pub fn is_valid(&self, col: usize, row: usize) -> bool {
        !self.get(col, row).is_nan()
    }

    /// Number of no-data cells.
    pub fn no_data_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_nan()).count()
    }

    /// Minimum and maximum valid elevation, or `None` if every cell is
    /// no-data.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut any = false;
        for &v in &self.data {
            if v.is_nan() {
                continue;
            }
            any = true;
            min = min.min(v);
            max = max.max(v);
        }
        any.then_some((min, max))
    }

    /// Bilinear sample at fractional grid coordinates (col, row).
    ///
    /// Returns `None` outside the grid or when any contributing corner is
    /// no-data (falls back to the nearest valid corner so source seams do
    /// not erode coverage).
    pub fn sample_bilinear(&self, col: f64, row: f64) -> Option<f32> {
        if col < -0.5
            || row < -0.5
            || col > self.width as f64 - 0.5
            || row > self.height as f64 - 0.5
        {
            return None;
        }
        let cc = col.clamp(0.0, (self.width - 1) as f64);
        let rc = row.clamp(0.0, (self.height - 1) as f64);

        let c0 = cc.floor() as usize;
        let r0 = rc.floor() as usize;
        let c1 = (c0 + 1).min(self.width - 1);
        let r1 = (r0 + 1).min(self.height - 1);
        let fx = cc - c0 as f64;
        let fy = rc - r0 as f64;

        let corners = [
            (self.get(c0, r0), (1.0 - fx) * (1.0 - fy)),
            (self.get(c1, r0), fx * (1.0 - fy)),
            (self.get(c0, r1), (1.0 - fx) * fy),
            (self.get(c1, r1), fx * fy),
        ];

        if corners.iter().all(|(v, _)| !v.is_nan()) {
            let sum: f64 = corners.iter().map(|(v, w)| *v as f64 * w).sum();
            return Some(sum as f32);
        }

        // Nearest valid corner by weight, deterministic on ties (array order).
        corners
            .iter()
            .filter(|(v, _)| !v.is_nan())
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(v, _)| *v)
    }

    /// Normalize sentinel values to NaN: the tagged nodata value, anything
    /// at or below [`NO_DATA_FLOOR`], and (unless the caller set an explicit
    /// floor) negative elevations, which the model treats as open water.
    pub fn normalize_no_data(&mut self, tagged: Option<f32>, explicit_floor: bool) {
        for v in &mut self.data {
            if v.is_nan() {
                continue;
            }
            let is_tagged = tagged.is_some_and(|nd| (*v - nd).abs() < 0.001);
            if is_tagged || *v <= NO_DATA_FLOOR || (!explicit_floor && *v < 0.0) {
                *v = f32::NAN;
            }
        }
    }

    /// Downsample by a fractional factor in (0, 1] using bilinear
    /// sampling. Factor 1.0 returns a clone.
    pub fn downsample(&self, factor: f64) -> Result<Self> {
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(GridError::InvalidParameter {
                name: "downsample",
                reason: format!("{factor} not in (0, 1]"),
            });
        }
        if factor == 1.0 {
            return Ok(self.clone());
        }
        let new_w = ((self.width as f64 * factor).round() as usize).max(1);
        let new_h = ((self.height as f64 * factor).round() as usize).max(1);
        let sx = self.width as f64 / new_w as f64;
        let sy = self.height as f64 / new_h as f64;

        let mut data = Vec::with_capacity(new_w * new_h);
        for row in 0..new_h {
            for col in 0..new_w {
                let src_c = (col as f64 + 0.5) * sx - 0.5;
                let src_r = (row as f64 + 0.5) * sy - 0.5;
                data.push(self.sample_bilinear(src_c, src_r).unwrap_or(f32::NAN));
            }
        }
        let transform = GridTransform {
            origin_x: self.transform.origin_x,
            origin_y: self.transform.origin_y,
            cell_size: self.transform.cell_size * sx,
        };
        ElevationGrid::new(data, new_w, new_h, transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_transform() -> GridTransform {
        GridTransform {
            origin_x: 0.0,
            origin_y: 0.0,
            cell_size: 1.0,
        }
    }

    #[test]
    fn test_transform_round_trip() {
        let t = GridTransform {
            origin_x: 100.0,
            origin_y: 500.0,
            cell_size: 10.0,
        };
        let (x, y) = t.cell_center(3, 7);
        let (col, row) = t.world_to_grid(x, y);
        assert_relative_eq!(col, 3.0);
        assert_relative_eq!(row, 7.0);
    }

    #[test]
    fn test_bilinear_interior() {
        let grid = ElevationGrid::new(
            vec![0.0, 10.0, 20.0, 30.0],
            2,
            2,
            unit_transform(),
        )
        .unwrap();
        let v = grid.sample_bilinear(0.5, 0.5).unwrap();
        assert_relative_eq!(v, 15.0);
    }

    #[test]
    fn test_bilinear_skips_no_data_corner() {
        let grid = ElevationGrid::new(
            vec![f32::NAN, 10.0, 20.0, 30.0],
            2,
            2,
            unit_transform(),
        )
        .unwrap();
        // Falls back to the heaviest valid corner instead of poisoning the
        // sample with NaN.
        let v = grid.sample_bilinear(0.1, 0.1).unwrap();
        assert!(!v.is_nan());
    }

    #[test]
    fn test_bilinear_out_of_bounds() {
        let grid = ElevationGrid::new(vec![1.0; 4], 2, 2, unit_transform()).unwrap();
        assert!(grid.sample_bilinear(-2.0, 0.0).is_none());
        assert!(grid.sample_bilinear(0.0, 5.0).is_none());
    }

    #[test]
    fn test_normalize_no_data_sentinels() {
        let mut grid = ElevationGrid::new(
            vec![-9999.0, -32768.0, -5.0, 100.0],
            2,
            2,
            unit_transform(),
        )
        .unwrap();
        grid.normalize_no_data(Some(-9999.0), false);
        assert!(grid.get(0, 0).is_nan());
        assert!(grid.get(1, 0).is_nan());
        // Negative elevation is water when no explicit floor was given.
        assert!(grid.get(0, 1).is_nan());
        assert_relative_eq!(grid.get(1, 1), 100.0);
    }

    #[test]
    fn test_normalize_keeps_negative_with_explicit_floor() {
        let mut grid =
            ElevationGrid::new(vec![-5.0, 100.0], 2, 1, unit_transform()).unwrap();
        grid.normalize_no_data(None, true);
        assert_relative_eq!(grid.get(0, 0), -5.0);
    }

    #[test]
    fn test_downsample_identity() {
        let grid =
            ElevationGrid::new(vec![1.0, 2.0, 3.0, 4.0], 2, 2, unit_transform()).unwrap();
        let same = grid.downsample(1.0).unwrap();
        assert_eq!(grid, same);
    }

    #[test]
    fn test_downsample_half() {
        let grid = ElevationGrid::new(vec![8.0; 16], 4, 4, unit_transform()).unwrap();
        let half = grid.downsample(0.5).unwrap();
        assert_eq!(half.width(), 2);
        assert_eq!(half.height(), 2);
        assert_relative_eq!(half.get(0, 0), 8.0);
        assert_relative_eq!(half.transform().cell_size, 2.0);
    }
}
