//! Multi-page PDF assembly.
//!
//! One cover sheet, then one page per terrain layer at exact physical
//! scale. Layers wider than the usable page area are either split over
//! overlapping tiles with corner registration marks or emitted on a
//! single page at true scale with the overflow reported, depending on
//! the configured policy.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, LineDashPattern, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point as PdfPoint, Polygon as PdfPolygon,
    Rgb as PdfRgb,
};
use tracing::{debug, info, warn};

use terrastack_contour::{Point, Polygon, Ring};
use terrastack_render::{Rgb, BASE_LAYER_BACKGROUND};

use crate::error::PrintError;
use crate::paper::{OverflowPolicy, PaperSize};
use crate::Result;

const MM_PER_PT: f64 = 25.4 / 72.0;

fn mm_to_pt(mm: f64) -> f32 {
    (mm / MM_PER_PT) as f32
}

fn pdf_color(c: Rgb) -> Color {
    Color::Rgb(PdfRgb::new(
        c.r as f32 / 255.0,
        c.g as f32 / 255.0,
        c.b as f32 / 255.0,
        None,
    ))
}

const BLACK: Rgb = Rgb::new(0, 0, 0);
const GUIDE_RED: Rgb = Rgb::new(0xcc, 0x00, 0x00);

/// Document-level print settings.
#[derive(Debug, Clone)]
pub struct PrintConfig {
    /// Title shown on the cover sheet and in the PDF metadata.
    pub title: String,
    /// Target paper size.
    pub paper: PaperSize,
    /// Page margin in mm. Content is laid out inside this border.
    pub margin_mm: f64,
    /// Overlap between adjacent tiles when a layer is split over
    /// several pages, in mm.
    pub overlap_mm: f64,
    /// What to do when a layer does not fit one page.
    pub overflow: OverflowPolicy,
    /// Physical scale: millimeters of paper per grid unit.
    pub scale_mm_per_unit: f64,
    /// Cut-line stroke width in mm.
    pub stroke_width_mm: f64,
    /// Free-form parameter summary lines for the cover sheet.
    pub parameter_lines: Vec<String>,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            title: "Terrain model".to_string(),
            paper: PaperSize::A4,
            margin_mm: 10.0,
            overlap_mm: 10.0,
            overflow: OverflowPolicy::Report,
            scale_mm_per_unit: 1.0,
            stroke_width_mm: 0.1,
            parameter_lines: Vec::new(),
        }
    }
}

/// One layer's printable content.
#[derive(Debug)]
pub struct SheetArt<'a> {
    /// Zero-based layer index, bottom layer first.
    pub index: usize,
    /// Human-readable label, e.g. `layer 0003 - 150m`.
    pub label: String,
    /// Footprint polygons in grid units.
    pub polygons: &'a [Polygon],
    /// Registration guide: the polygons of the layer directly above.
    pub guide: &'a [Polygon],
    /// Fill color for the footprint.
    pub fill: Rgb,
    /// Lowest layer gets the water background behind its footprint.
    pub is_base: bool,
    /// Grid extent in cells (shared by every layer).
    pub grid_width: usize,
    /// Grid extent in cells.
    pub grid_height: usize,
}

/// What the assembler produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDocument {
    /// Total page count including the cover sheet.
    pub pages: usize,
    /// Indices of sheets that were split over multiple tiles.
    pub tiled: Vec<usize>,
    /// Indices of sheets that exceeded the page and were emitted at
    /// true scale under [`OverflowPolicy::Report`].
    pub overflowed: Vec<usize>,
}

/// Builds the combined print document from rendered layer content.
#[derive(Debug)]
pub struct DocumentAssembler {
    config: PrintConfig,
}

/// Page placement for one sheet or tile: maps content mm coordinates
/// (x right, y down, origin at the grid's top-left corner) onto PDF
/// page coordinates (origin bottom-left, y up).
#[derive(Debug, Clone, Copy)]
struct PageFrame {
    page_w: f64,
    page_h: f64,
    /// Page position of the content window's top-left corner.
    origin_x: f64,
    origin_y: f64,
    /// Content window offset in content mm.
    window_x: f64,
    window_y: f64,
}

impl PageFrame {
    fn to_page(&self, x_mm: f64, y_mm: f64) -> PdfPoint {
        let px = self.origin_x + (x_mm - self.window_x);
        let py = self.page_h - self.origin_y - (y_mm - self.window_y);
        PdfPoint::new(Mm(px as f32), Mm(py as f32))
    }
}

impl DocumentAssembler {
    /// Create an assembler with the given settings.
    pub fn new(config: PrintConfig) -> Self {
        Self { config }
    }

    /// Write the complete document to `path`.
    pub fn assemble(&self, sheets: &[SheetArt<'_>], path: &Path) -> Result<AssembledDocument> {
        if sheets.is_empty() {
            return Err(PrintError::EmptyDocument);
        }
        let (cover_w, cover_h) = self.config.paper.dims_mm();
        let (doc, cover_page, cover_layer) = PdfDocument::new(
            &self.config.title,
            Mm(cover_w as f32),
            Mm(cover_h as f32),
            "content",
        );
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| PrintError::Font(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| PrintError::Font(e.to_string()))?;

        self.draw_cover(
            &doc.get_page(cover_page).get_layer(cover_layer),
            sheets,
            (cover_w, cover_h),
            &font,
            &bold,
        );

        let mut result = AssembledDocument {
            pages: 1,
            tiled: Vec::new(),
            overflowed: Vec::new(),
        };

        for sheet in sheets {
            let content_w = sheet.grid_width as f64 * self.config.scale_mm_per_unit;
            let content_h = sheet.grid_height as f64 * self.config.scale_mm_per_unit;

            // Rotate the page when the content is wider than tall.
            let (pw, ph) = self.config.paper.dims_mm();
            let (page_w, page_h) = if content_w > content_h {
                (pw.max(ph), pw.min(ph))
            } else {
                (pw.min(ph), pw.max(ph))
            };
            let usable_w = page_w - 2.0 * self.config.margin_mm;
            let usable_h = page_h - 2.0 * self.config.margin_mm;
            let fits = content_w <= usable_w && content_h <= usable_h;

            if fits {
                let frame = PageFrame {
                    page_w,
                    page_h,
                    origin_x: (page_w - content_w) / 2.0,
                    origin_y: (page_h - content_h) / 2.0,
                    window_x: 0.0,
                    window_y: 0.0,
                };
                let layer = add_page(&doc, page_w, page_h);
                self.draw_sheet(&layer, sheet, frame, None, &font);
                result.pages += 1;
                continue;
            }

            match self.config.overflow {
                OverflowPolicy::Report => {
                    warn!(
                        sheet = sheet.index,
                        content_w, content_h, "sheet exceeds usable page area"
                    );
                    let frame = PageFrame {
                        page_w,
                        page_h,
                        origin_x: (page_w - content_w) / 2.0,
                        origin_y: (page_h - content_h) / 2.0,
                        window_x: 0.0,
                        window_y: 0.0,
                    };
                    let layer = add_page(&doc, page_w, page_h);
                    self.draw_sheet(&layer, sheet, frame, None, &font);
                    result.pages += 1;
                    result.overflowed.push(sheet.index);
                }
                OverflowPolicy::Tile => {
                    let cols = tiles_needed(content_w, usable_w, self.config.overlap_mm);
                    let rows = tiles_needed(content_h, usable_h, self.config.overlap_mm);
                    debug!(sheet = sheet.index, rows, cols, "tiling sheet");
                    let stride_x = (usable_w - self.config.overlap_mm).max(1.0);
                    let stride_y = (usable_h - self.config.overlap_mm).max(1.0);
                    for row in 0..rows {
                        for col in 0..cols {
                            let frame = PageFrame {
                                page_w,
                                page_h,
                                origin_x: self.config.margin_mm,
                                origin_y: self.config.margin_mm,
                                window_x: col as f64 * stride_x,
                                window_y: row as f64 * stride_y,
                            };
                            let tile = TileInfo {
                                row,
                                col,
                                rows,
                                cols,
                            };
                            let layer = add_page(&doc, page_w, page_h);
                            self.draw_sheet(&layer, sheet, frame, Some(tile), &font);
                            result.pages += 1;
                        }
                    }
                    result.tiled.push(sheet.index);
                }
            }
        }

        info!(pages = result.pages, path = %path.display(), "writing print document");
        let mut writer = BufWriter::new(File::create(path)?);
        doc.save(&mut writer)?;
        Ok(result)
    }

    fn draw_cover(
        &self,
        layer: &PdfLayerReference,
        sheets: &[SheetArt<'_>],
        (page_w, page_h): (f64, f64),
        font: &IndirectFontRef,
        bold: &IndirectFontRef,
    ) {
        let m = self.config.margin_mm.max(15.0);
        let mut y = page_h - m - 10.0;

        layer.set_fill_color(pdf_color(BLACK));
        layer.use_text(&self.config.title, 20.0, Mm(m as f32), Mm(y as f32), bold);
        y -= 10.0;
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
        layer.use_text(stamp, 10.0, Mm(m as f32), Mm(y as f32), font);
        y -= 12.0;

        for line in &self.config.parameter_lines {
            layer.use_text(line, 9.0, Mm(m as f32), Mm(y as f32), font);
            y -= 5.0;
        }
        y -= 6.0;
        layer.use_text(
            format!("{} sheets, bottom to top:", sheets.len()),
            10.0,
            Mm(m as f32),
            Mm(y as f32),
            bold,
        );
        y -= 7.0;

        // Legend: one swatch and label per sheet, until the page runs out.
        for (i, sheet) in sheets.iter().enumerate() {
            if y < m + 10.0 {
                layer.set_fill_color(pdf_color(BLACK));
                layer.use_text(
                    format!("... and {} more", sheets.len() - i),
                    9.0,
                    Mm(m as f32),
                    Mm(y as f32),
                    font,
                );
                break;
            }
            layer.set_fill_color(pdf_color(sheet.fill));
            layer.add_polygon(rect_polygon(m, y, 4.0, 4.0, PaintMode::Fill));
            layer.set_fill_color(pdf_color(BLACK));
            layer.use_text(&sheet.label, 9.0, Mm((m + 6.0) as f32), Mm(y as f32), font);
            y -= 6.0;
        }
    }

    fn draw_sheet(
        &self,
        layer: &PdfLayerReference,
        sheet: &SheetArt<'_>,
        frame: PageFrame,
        tile: Option<TileInfo>,
        font: &IndirectFontRef,
    ) {
        let scale = self.config.scale_mm_per_unit;
        let content_w = sheet.grid_width as f64 * scale;
        let content_h = sheet.grid_height as f64 * scale;

        layer.save_graphics_state();
        if tile.is_some() {
            // Keep the drawing inside the usable area; the overlap
            // between adjacent tiles comes from the window stride.
            let usable_w = frame.page_w - 2.0 * self.config.margin_mm;
            let usable_h = frame.page_h - 2.0 * self.config.margin_mm;
            layer.add_polygon(rect_polygon(
                self.config.margin_mm,
                self.config.margin_mm + usable_h,
                usable_w,
                usable_h,
                PaintMode::Clip,
            ));
        }

        if sheet.is_base {
            layer.set_fill_color(pdf_color(BASE_LAYER_BACKGROUND));
            let tl = frame.to_page(0.0, 0.0);
            let br = frame.to_page(content_w, content_h);
            layer.add_polygon(PdfPolygon {
                rings: vec![vec![
                    (tl, false),
                    (PdfPoint { x: br.x, y: tl.y }, false),
                    (br, false),
                    (PdfPoint { x: tl.x, y: br.y }, false),
                ]],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::EvenOdd,
            });
        }

        layer.set_fill_color(pdf_color(sheet.fill));
        layer.set_outline_color(pdf_color(BLACK));
        layer.set_outline_thickness(mm_to_pt(self.config.stroke_width_mm));
        for poly in sheet.polygons {
            layer.add_polygon(PdfPolygon {
                rings: poly
                    .rings()
                    .map(|ring| self.ring_points(ring, frame, scale))
                    .collect(),
                mode: PaintMode::FillStroke,
                winding_order: WindingOrder::EvenOdd,
            });
        }

        if !sheet.guide.is_empty() {
            let dash_mm = (self.config.stroke_width_mm * 6.0).max(3.0);
            let dash_pt = mm_to_pt(dash_mm).round().max(1.0) as i64;
            layer.set_outline_color(pdf_color(GUIDE_RED));
            layer.set_outline_thickness(mm_to_pt(self.config.stroke_width_mm * 1.5));
            layer.set_line_dash_pattern(LineDashPattern {
                dash_1: Some(dash_pt),
                gap_1: Some(dash_pt),
                ..Default::default()
            });
            for poly in sheet.guide {
                for ring in poly.rings() {
                    layer.add_line(Line {
                        points: self.ring_points(ring, frame, scale),
                        is_closed: true,
                    });
                }
            }
            layer.set_line_dash_pattern(LineDashPattern::default());
        }
        layer.restore_graphics_state();

        if let Some(tile) = tile {
            self.draw_registration_marks(layer, frame);
            let text = format!(
                "{}  tile {}/{} (row {}, col {})",
                sheet.label,
                tile.row * tile.cols + tile.col + 1,
                tile.rows * tile.cols,
                tile.row + 1,
                tile.col + 1,
            );
            layer.set_fill_color(pdf_color(BLACK));
            layer.use_text(
                text,
                8.0,
                Mm(self.config.margin_mm as f32),
                Mm((self.config.margin_mm / 2.0) as f32),
                font,
            );
        } else {
            layer.set_fill_color(pdf_color(BLACK));
            layer.use_text(
                &sheet.label,
                8.0,
                Mm(self.config.margin_mm as f32),
                Mm((self.config.margin_mm / 2.0) as f32),
                font,
            );
        }
    }

    fn ring_points(&self, ring: &Ring, frame: PageFrame, scale: f64) -> Vec<(PdfPoint, bool)> {
        // Drop the closing duplicate; PDF paths close explicitly.
        ring.points()[..ring.distinct_len()]
            .iter()
            .map(|p: &Point| (frame.to_page(p.x * scale, p.y * scale), false))
            .collect()
    }

    /// Crosshairs at the four corners of the usable area so overlapping
    /// tiles can be aligned when taping pages together.
    fn draw_registration_marks(&self, layer: &PdfLayerReference, frame: PageFrame) {
        let m = self.config.margin_mm;
        let arm = 4.0;
        let corners = [
            (m, m),
            (frame.page_w - m, m),
            (m, frame.page_h - m),
            (frame.page_w - m, frame.page_h - m),
        ];
        layer.set_outline_color(pdf_color(BLACK));
        layer.set_outline_thickness(mm_to_pt(0.2));
        for (cx, cy) in corners {
            layer.add_line(Line {
                points: vec![
                    (point_mm(cx - arm, cy), false),
                    (point_mm(cx + arm, cy), false),
                ],
                is_closed: false,
            });
            layer.add_line(Line {
                points: vec![
                    (point_mm(cx, cy - arm), false),
                    (point_mm(cx, cy + arm), false),
                ],
                is_closed: false,
            });
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TileInfo {
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
}

fn add_page(doc: &PdfDocumentReference, w_mm: f64, h_mm: f64) -> PdfLayerReference {
    let (page, layer) = doc.add_page(Mm(w_mm as f32), Mm(h_mm as f32), "content");
    doc.get_page(page).get_layer(layer)
}

fn point_mm(x: f64, y: f64) -> PdfPoint {
    PdfPoint::new(Mm(x as f32), Mm(y as f32))
}

/// Axis-aligned rectangle with its top-left corner at `(x, top_y)` in
/// page mm (y up), extending `w` right and `h` down.
fn rect_polygon(x: f64, top_y: f64, w: f64, h: f64, mode: PaintMode) -> PdfPolygon {
    PdfPolygon {
        rings: vec![vec![
            (point_mm(x, top_y), false),
            (point_mm(x + w, top_y), false),
            (point_mm(x + w, top_y - h), false),
            (point_mm(x, top_y - h), false),
        ]],
        mode,
        winding_order: WindingOrder::EvenOdd,
    }
}

/// Number of tiles needed to cover `content` mm with pages of
/// `usable` mm and the given overlap between neighbors.
fn tiles_needed(content: f64, usable: f64, overlap: f64) -> usize {
    if content <= usable {
        return 1;
    }
    let stride = (usable - overlap).max(1.0);
    (((content - usable) / stride).ceil() as usize) + 1
}
