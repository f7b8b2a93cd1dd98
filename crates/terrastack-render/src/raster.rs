//! Scanline rasterization and PNG encoding for the fallback path.

use crate::style::Rgb;
use crate::{RenderError, Result};
use terrastack_contour::Polygon;

/// A rasterized RGB8 canvas.
#[derive(Debug)]
pub struct Canvas {
    /// Interleaved RGB8 pixels, row-major.
    pub pixels: Vec<u8>,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

impl Canvas {
    /// Solid-color canvas.
    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        let mut pixels = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            pixels.extend_from_slice(&[color.r, color.g, color.b]);
        }
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Fill the polygons (even-odd rule, holes punch out) onto the canvas.
    ///
    /// Polygon coordinates are grid units; `px_per_unit` maps them to
    /// pixels.
    pub fn fill_polygons(&mut self, polygons: &[Polygon], px_per_unit: f64, color: Rgb) {
        let mut crossings: Vec<f64> = Vec::new();
        for py in 0..self.height {
            let y = (py as f64 + 0.5) / px_per_unit;
            crossings.clear();
            for poly in polygons {
                for ring in poly.rings() {
                    for seg in ring.points().windows(2) {
                        let (a, b) = (seg[0], seg[1]);
                        if (a.y > y) != (b.y > y) {
                            let t = (y - a.y) / (b.y - a.y);
                            crossings.push(a.x + t * (b.x - a.x));
                        }
                    }
                }
            }
            crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            for span in crossings.chunks_exact(2) {
                let x0 = ((span[0] * px_per_unit).round().max(0.0)) as usize;
                let x1 = ((span[1] * px_per_unit).round()) as usize;
                for px in x0..x1.min(self.width) {
                    let idx = (py * self.width + px) * 3;
                    self.pixels[idx] = color.r;
                    self.pixels[idx + 1] = color.g;
                    self.pixels[idx + 2] = color.b;
                }
            }
        }
    }

    /// Encode the canvas as a PNG byte stream.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        encode_png(&self.pixels, self.width, self.height)
    }
}

/// Encode interleaved RGB8 pixels as PNG bytes.
pub fn encode_png(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    if pixels.len() != width * height * 3 {
        return Err(RenderError::BadImageDimensions {
            expected: width * height * 3,
            got: pixels.len(),
        });
    }
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width as u32, height as u32);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(pixels)?;
    }
    Ok(out)
}
