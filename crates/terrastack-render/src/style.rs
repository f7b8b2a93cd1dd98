//! Layer fill styles and the terrain color ramp.

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Construct a color.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS hex form, e.g. `#2d6e2d`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Background for the lowest sheet (open water).
pub const BASE_LAYER_BACKGROUND: Rgb = Rgb::new(0x40, 0xcb, 0xc8);

/// A pre-cropped RGB8 image aligned with the layer's grid extent.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCrop {
    /// Interleaved RGB8 pixels, row-major.
    pub pixels: Vec<u8>,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

/// How a layer's footprint is filled.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerStyle {
    /// Flat fill with a single color (usually from [`topo_color`]).
    Flat(Rgb),
    /// Satellite imagery clipped to the layer footprint.
    Satellite(ImageCrop),
}

/// Terrain color ramp: dark green lowlands through yellow to dark brown
/// peaks. No blue band; water is the page background, not a fill.
const TOPO_STOPS: [(f64, Rgb); 5] = [
    (0.00, Rgb::new(0x2d, 0x6e, 0x2d)),
    (0.30, Rgb::new(0x7a, 0xb6, 0x48)),
    (0.55, Rgb::new(0xd4, 0xc8, 0x4a)),
    (0.75, Rgb::new(0xc4, 0x7a, 0x30)),
    (1.00, Rgb::new(0x5c, 0x2e, 0x0a)),
];

/// Sample the terrain ramp at `t` in [0, 1] (clamped).
pub fn topo_color(t: f64) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    for pair in TOPO_STOPS.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let f = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            return Rgb::new(
                lerp(c0.r, c1.r, f),
                lerp(c0.g, c1.g, f),
                lerp(c0.b, c1.b, f),
            );
        }
    }
    TOPO_STOPS[TOPO_STOPS.len() - 1].1
}

fn lerp(a: u8, b: u8, f: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * f).round() as u8
}
