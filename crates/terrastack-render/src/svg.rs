//! Per-layer SVG document rendering.

use crate::raster::{encode_png, Canvas};
use crate::style::{topo_color, LayerStyle, Rgb, BASE_LAYER_BACKGROUND};
use crate::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::fmt::Write as _;
use terrastack_contour::Polygon;

/// Rendering configuration shared by every layer of a run.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Physical scale: millimeters of output per grid cell.
    pub scale_mm_per_unit: f64,
    /// Contour stroke width in grid units.
    pub stroke_width: f64,
    /// Vertex budget above which the vector fill is replaced by a raster.
    pub max_vector_vertices: usize,
    /// Resolution of the rasterized fallback, in pixels per grid cell.
    pub fallback_px_per_unit: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale_mm_per_unit: 1.0,
            stroke_width: 0.1,
            max_vector_vertices: 200_000,
            fallback_px_per_unit: 4.0,
        }
    }
}

/// Everything needed to draw one layer sheet.
#[derive(Debug)]
pub struct LayerArt<'a> {
    /// Zero-based layer index (0 = bottom of the stack).
    pub index: usize,
    /// Human-readable label, e.g. `layer 0003 - 150m`.
    pub label: String,
    /// The layer's own simplified polygons.
    pub polygons: &'a [Polygon],
    /// Registration guide: the polygons of the layer directly above.
    /// Empty for the topmost layer.
    pub guide: &'a [Polygon],
    /// Ink-saver underlay: the footprint two layers up, filled plain grey
    /// because sheets above will cover it anyway. Usually empty.
    pub underlay: &'a [Polygon],
    /// Grid width in cells (drawing coordinate space).
    pub grid_width: usize,
    /// Grid height in cells.
    pub grid_height: usize,
    /// Fill style for the footprint.
    pub style: &'a LayerStyle,
    /// Whether this is the bottom sheet (gets the water background).
    pub is_base: bool,
}

/// A finished page for one layer.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Zero-based layer index.
    pub index: usize,
    /// Label drawn on the sheet.
    pub label: String,
    /// Complete SVG document.
    pub svg: String,
    /// Physical width in millimeters.
    pub width_mm: f64,
    /// Physical height in millimeters.
    pub height_mm: f64,
    /// True when the vector fill was replaced by a rasterized image.
    pub fallback_used: bool,
}

/// Fill for regions that higher sheets will cover.
const INK_SAVER_GREY: &str = "#c8c8c8";

/// Pick the flat fill color for a band at normalized elevation `t`.
pub fn flat_style_for(t: f64) -> LayerStyle {
    LayerStyle::Flat(topo_color(t))
}

/// Render one layer into a page-sized SVG document.
///
/// When the combined vertex count exceeds the configured budget the fill is
/// rasterized and embedded as a PNG image instead; the registration guide
/// and label stay vector. The caller records a warning for the degraded
/// sheet; this function never fails for complexity reasons.
pub fn render_layer(art: &LayerArt<'_>, config: &RenderConfig) -> Result<RenderedPage> {
    let w = art.grid_width as f64;
    let h = art.grid_height as f64;
    let width_mm = w * config.scale_mm_per_unit;
    let height_mm = h * config.scale_mm_per_unit;

    let vertex_count: usize = art.polygons.iter().map(Polygon::vertex_count).sum();
    let overflow = vertex_count > config.max_vector_vertices;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width_mm}mm\" height=\"{height_mm}mm\" viewBox=\"0 0 {w} {h}\">"
    );

    // Page background: water for the base sheet, paper white above it.
    let bg = if art.is_base {
        BASE_LAYER_BACKGROUND.to_hex()
    } else {
        "white".to_string()
    };
    let _ = writeln!(svg, "  <rect x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" fill=\"{bg}\"/>");

    if overflow {
        tracing::warn!(
            layer = art.index,
            vertex_count,
            budget = config.max_vector_vertices,
            "vector budget exceeded, embedding rasterized fill"
        );
        write_raster_fill(&mut svg, art, config)?;
    } else {
        write_vector_fill(&mut svg, art)?;
        // Hidden-area underlay goes over the fill, under the cut line.
        for poly in art.underlay {
            let _ = writeln!(
                svg,
                "  <path d=\"{}\" fill=\"{INK_SAVER_GREY}\" fill-rule=\"evenodd\" stroke=\"none\"/>",
                path_data(poly),
            );
        }
        // The layer's own cut line.
        write_stroked_paths(
            &mut svg,
            art.polygons,
            "black",
            config.stroke_width,
            None,
        );
    }

    // Registration guide: dashed red, heavier stroke, never filled. The
    // assembler aligns the next sheet's islands to these lines.
    if !art.guide.is_empty() {
        let dash = (config.stroke_width * 6.0).max(3.0);
        write_stroked_paths(
            &mut svg,
            art.guide,
            "red",
            config.stroke_width * 1.5,
            Some(dash),
        );
    }

    let label_y = h - 0.5f64.min(h * 0.05);
    let font_size = (h * 0.03).max(1.0);
    let _ = writeln!(
        svg,
        "  <text x=\"{x}\" y=\"{label_y}\" font-size=\"{font_size}\" font-family=\"sans-serif\" fill=\"#333\">{label}</text>",
        x = 0.5,
        label = art.label,
    );

    svg.push_str("</svg>\n");

    Ok(RenderedPage {
        index: art.index,
        label: art.label.clone(),
        svg,
        width_mm,
        height_mm,
        fallback_used: overflow,
    })
}

/// SVG path data for one polygon (outer ring plus holes, even-odd).
fn path_data(poly: &Polygon) -> String {
    let mut d = String::new();
    for ring in poly.rings() {
        let pts = ring.points();
        for (i, p) in pts[..pts.len() - 1].iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{cmd} {:.2},{:.2} ", p.x, p.y);
        }
        d.push_str("Z ");
    }
    d.trim_end().to_string()
}

fn write_vector_fill(svg: &mut String, art: &LayerArt<'_>) -> Result<()> {
    match art.style {
        LayerStyle::Flat(color) => {
            for poly in art.polygons {
                let _ = writeln!(
                    svg,
                    "  <path d=\"{}\" fill=\"{}\" fill-rule=\"evenodd\" fill-opacity=\"0.7\" stroke=\"none\"/>",
                    path_data(poly),
                    color.to_hex(),
                );
            }
        }
        LayerStyle::Satellite(crop) => {
            // Clip the imagery to the footprint so cut pieces carry only
            // their own texture.
            let _ = writeln!(svg, "  <clipPath id=\"fp{}\">", art.index);
            for poly in art.polygons {
                let _ = writeln!(
                    svg,
                    "    <path d=\"{}\" clip-rule=\"evenodd\"/>",
                    path_data(poly)
                );
            }
            let _ = writeln!(svg, "  </clipPath>");
            let png = encode_png(&crop.pixels, crop.width, crop.height)?;
            let _ = writeln!(
                svg,
                "  <image x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" clip-path=\"url(#fp{})\" preserveAspectRatio=\"none\" href=\"data:image/png;base64,{}\"/>",
                art.grid_width,
                art.grid_height,
                art.index,
                BASE64.encode(&png),
            );
        }
    }
    Ok(())
}

/// Rasterized approximation of the fill, embedded as one image element.
fn write_raster_fill(svg: &mut String, art: &LayerArt<'_>, config: &RenderConfig) -> Result<()> {
    let px_w = ((art.grid_width as f64 * config.fallback_px_per_unit).ceil() as usize).max(1);
    let px_h = ((art.grid_height as f64 * config.fallback_px_per_unit).ceil() as usize).max(1);

    let bg = if art.is_base {
        BASE_LAYER_BACKGROUND
    } else {
        Rgb::new(255, 255, 255)
    };
    let fg = match art.style {
        LayerStyle::Flat(color) => *color,
        // Satellite fills degrade to the mid-ramp tone in raster mode.
        LayerStyle::Satellite(_) => topo_color(0.5),
    };

    let mut canvas = Canvas::filled(px_w, px_h, bg);
    canvas.fill_polygons(art.polygons, config.fallback_px_per_unit, fg);
    if !art.underlay.is_empty() {
        canvas.fill_polygons(
            art.underlay,
            config.fallback_px_per_unit,
            Rgb::new(0xc8, 0xc8, 0xc8),
        );
    }
    let png = canvas.encode_png()?;

    let _ = writeln!(
        svg,
        "  <image x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\" href=\"data:image/png;base64,{}\"/>",
        art.grid_width,
        art.grid_height,
        BASE64.encode(&png),
    );
    Ok(())
}

fn write_stroked_paths(
    svg: &mut String,
    polygons: &[Polygon],
    color: &str,
    width: f64,
    dash: Option<f64>,
) {
    let dash_attr = dash
        .map(|d| format!(" stroke-dasharray=\"{d},{d}\""))
        .unwrap_or_default();
    for poly in polygons {
        let _ = writeln!(
            svg,
            "  <path d=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{width}\"{dash_attr}/>",
            path_data(poly),
        );
    }
}
