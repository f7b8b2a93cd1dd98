//! End-to-end run orchestration.
//!
//! Everything is written into a `<out>.partial` staging directory that is
//! renamed onto the target directory only when the run succeeds. A failed
//! or cancelled run leaves no output behind.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use terrastack_grid::{
    bin_elevations, fill_gaps, gaussian_smooth, merge_sources, ElevationGrid, Source, TargetSpec,
};
use terrastack_render::{
    flat_style_for, render_layer, topo_color, ImageCrop, LayerArt, LayerStyle, RenderConfig,
    RenderedPage,
};
use terrastack_print::{AssembledDocument, DocumentAssembler, PrintConfig, SheetArt};

use crate::layers::{attach_guides, compute_layers, Layer};
use crate::{CancelToken, FillStyleKind, Params, PipelineError, Result, Warning};

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Number of layers in the stack.
    pub layers: usize,
    /// Total PDF page count including the cover sheet.
    pub pages: usize,
    /// Non-fatal conditions encountered, in pipeline order.
    pub warnings: Vec<Warning>,
}

/// Run the full pipeline and write the output directory.
///
/// `satellite`, when given, is a pre-cropped RGB image aligned with the
/// target grid extent; it is only used with
/// [`FillStyleKind::Satellite`].
pub fn run(
    sources: Vec<Source>,
    satellite: Option<ImageCrop>,
    params: &Params,
    out_dir: &Path,
    token: &CancelToken,
) -> Result<RunSummary> {
    params.validate()?;

    let staging = staging_path(out_dir);
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }

    let result = run_staged(sources, satellite, params, out_dir, &staging, token);
    if result.is_err() && staging.exists() {
        // Nothing partial survives a failed or cancelled run.
        if let Err(e) = fs::remove_dir_all(&staging) {
            warn!(path = %staging.display(), "failed to remove staging directory: {e}");
        }
    }
    result
}

fn run_staged(
    sources: Vec<Source>,
    satellite: Option<ImageCrop>,
    params: &Params,
    out_dir: &Path,
    staging: &Path,
    token: &CancelToken,
) -> Result<RunSummary> {
    let warnings = Mutex::new(Vec::new());

    let merged = prepare_grid(sources, params, token, &warnings)?;
    token.checkpoint()?;

    let bands = bin_elevations(&merged, params.interval_m, params.floor_m, params.ceiling_m)?;
    let mut layers = compute_layers(&bands, params, token, &warnings)?;
    attach_guides(&mut layers);
    token.checkpoint()?;

    let pages = render_pages(&layers, &merged, satellite.as_ref(), params, token, &warnings)?;
    token.checkpoint()?;

    fs::create_dir_all(staging)?;
    for page in &pages {
        let band = layers[page.index].band;
        let name = format!(
            "layer_{:04}_{}m.svg",
            page.index,
            format_elevation(band.lower)
        );
        fs::write(staging.join(name), &page.svg)?;
    }
    fs::write(
        staging.join("assembly_guide.txt"),
        assembly_guide(&layers, params),
    )?;
    token.checkpoint()?;

    let document = assemble_pdf(&layers, &merged, params, staging)?;
    for &layer in &document.overflowed {
        warnings.lock().push(Warning::PageOverflow { layer });
    }
    token.checkpoint()?;

    let warnings = warnings.into_inner();
    let report = RunReport {
        parameters: params,
        layers: layers.len(),
        pages: document.pages,
        warnings: &warnings,
    };
    fs::write(
        staging.join("run_report.json"),
        serde_json::to_string_pretty(&report)?,
    )?;

    // Commit: replace the target directory atomically from the caller's
    // point of view.
    if out_dir.exists() {
        fs::remove_dir_all(out_dir)?;
    }
    fs::rename(staging, out_dir)?;

    info!(
        layers = layers.len(),
        pages = document.pages,
        warnings = warnings.len(),
        out = %out_dir.display(),
        "run complete"
    );
    Ok(RunSummary {
        layers: layers.len(),
        pages: document.pages,
        warnings,
    })
}

/// Downsample, merge, gap-fill and smooth the sources into the one grid the
/// rest of the pipeline works on.
fn prepare_grid(
    sources: Vec<Source>,
    params: &Params,
    token: &CancelToken,
    warnings: &Mutex<Vec<Warning>>,
) -> Result<ElevationGrid> {
    token.checkpoint()?;
    let sources = if params.downsample < 1.0 {
        sources
            .into_iter()
            .map(|s| {
                Ok(Source::new(
                    s.grid.downsample(params.downsample)?,
                    s.priority,
                ))
            })
            .collect::<Result<Vec<_>>>()?
    } else {
        sources
    };

    // The preferred source defines the target extent and resolution.
    let preferred = sources
        .iter()
        .min_by_key(|s| s.priority)
        .ok_or(terrastack_grid::GridError::EmptyCoverage)?;
    let target = TargetSpec::from_grid(&preferred.grid);

    let outcome = merge_sources(&sources, target)?;
    let mut grid = outcome.grid;
    token.checkpoint()?;

    if outcome.uncovered_cells > 0 {
        let remaining = fill_gaps(&mut grid, params.gap_fill_radius);
        debug!(
            uncovered = outcome.uncovered_cells,
            remaining, "filled coverage gaps"
        );
        if remaining > 0 {
            warnings.lock().push(Warning::SourceCoverageGap {
                unfilled_cells: remaining,
            });
        }
    }
    token.checkpoint()?;

    Ok(gaussian_smooth(&grid, params.smoothing_sigma))
}

/// Render every layer's SVG page in parallel, preserving stack order.
fn render_pages(
    layers: &[Layer],
    grid: &ElevationGrid,
    satellite: Option<&ImageCrop>,
    params: &Params,
    token: &CancelToken,
    warnings: &Mutex<Vec<Warning>>,
) -> Result<Vec<RenderedPage>> {
    let config = RenderConfig {
        scale_mm_per_unit: params.scale_mm_per_unit,
        // SVG strokes are in grid units; the physical width is fixed in mm.
        stroke_width: params.stroke_width_mm / params.scale_mm_per_unit,
        max_vector_vertices: params.max_vector_vertices,
        fallback_px_per_unit: params.raster_fallback_dpi / 25.4 * params.scale_mm_per_unit,
    };

    let pages: Result<Vec<RenderedPage>> = layers
        .par_iter()
        .map(|layer| {
            token.checkpoint()?;
            let style = match params.fill_style {
                FillStyleKind::Satellite => match satellite {
                    Some(crop) => LayerStyle::Satellite(crop.clone()),
                    None => flat_style_for(ramp_position(layer.index, layers.len())),
                },
                FillStyleKind::Flat => {
                    flat_style_for(ramp_position(layer.index, layers.len()))
                }
            };
            let guide = layer
                .guide
                .map(|g| layers[g].polygons.as_slice())
                .unwrap_or(&[]);
            let underlay = if params.ink_saver {
                layers
                    .get(layer.index + 2)
                    .map(|l| l.polygons.as_slice())
                    .unwrap_or(&[])
            } else {
                &[]
            };
            let art = LayerArt {
                index: layer.index,
                label: layer_label(layer),
                polygons: &layer.polygons,
                guide,
                underlay,
                grid_width: grid.width(),
                grid_height: grid.height(),
                style: &style,
                is_base: layer.index == 0,
            };
            let page = render_layer(&art, &config)?;
            if page.fallback_used {
                warnings.lock().push(Warning::RenderOverflow {
                    layer: layer.index,
                });
            }
            Ok(page)
        })
        .collect();
    pages
}

fn assemble_pdf(
    layers: &[Layer],
    grid: &ElevationGrid,
    params: &Params,
    staging: &Path,
) -> Result<AssembledDocument> {
    let sheets: Vec<SheetArt<'_>> = layers
        .iter()
        .map(|layer| SheetArt {
            index: layer.index,
            label: layer_label(layer),
            polygons: &layer.polygons,
            guide: layer
                .guide
                .map(|g| layers[g].polygons.as_slice())
                .unwrap_or(&[]),
            fill: topo_color(ramp_position(layer.index, layers.len())),
            is_base: layer.index == 0,
            grid_width: grid.width(),
            grid_height: grid.height(),
        })
        .collect();

    let assembler = DocumentAssembler::new(PrintConfig {
        title: params.title.clone(),
        paper: params.paper_size,
        margin_mm: 10.0,
        overlap_mm: 10.0,
        overflow: params.overflow_policy,
        scale_mm_per_unit: params.scale_mm_per_unit,
        stroke_width_mm: params.stroke_width_mm,
        parameter_lines: parameter_lines(layers, params),
    });
    Ok(assembler.assemble(&sheets, &staging.join("print_all_layers.pdf"))?)
}

fn assembly_guide(layers: &[Layer], params: &Params) -> String {
    let floor = layers.first().map(|l| l.band.lower).unwrap_or(0.0);
    let ceiling = layers.last().map(|l| l.band.upper).unwrap_or(0.0);

    let mut out = String::new();
    out.push_str(&params.title);
    out.push('\n');
    out.push_str(&"=".repeat(params.title.chars().count()));
    out.push_str("\n\n");
    out.push_str(&format!(
        "Contour interval : {} m\n",
        format_elevation(params.interval_m)
    ));
    out.push_str(&format!(
        "Elevation range  : {} m to {} m\n",
        format_elevation(floor),
        format_elevation(ceiling)
    ));
    out.push_str(&format!("Layer count      : {}\n", layers.len()));
    out.push_str(&format!(
        "Scale            : {} mm per grid unit\n\n",
        params.scale_mm_per_unit
    ));
    out.push_str(
        "Cut each sheet along its solid black outline, then stack bottom\n\
         to top. The dashed red line on every sheet shows where the next\n\
         sheet sits; align the next sheet's cut edge to it before gluing.\n\n",
    );
    for layer in layers {
        out.push_str(&format!(
            "  {:>4}  {}  (file layer_{:04}_{}m.svg)\n",
            layer.index + 1,
            layer_label(layer),
            layer.index,
            format_elevation(layer.band.lower)
        ));
    }
    out
}

fn parameter_lines(layers: &[Layer], params: &Params) -> Vec<String> {
    vec![
        format!(
            "Contour interval: {} m, {} layers",
            format_elevation(params.interval_m),
            layers.len()
        ),
        format!(
            "Scale: {} mm per grid unit, paper {:?}",
            params.scale_mm_per_unit, params.paper_size
        ),
        format!(
            "Smoothing sigma: {}, simplify tolerance: {}",
            params.smoothing_sigma, params.simplify_tolerance
        ),
    ]
}

fn layer_label(layer: &Layer) -> String {
    format!(
        "layer {:04} - {}m",
        layer.index,
        format_elevation(layer.band.lower)
    )
}

/// Position of a layer on the terrain color ramp.
fn ramp_position(index: usize, count: usize) -> f64 {
    if count > 1 {
        index as f64 / (count - 1) as f64
    } else {
        0.0
    }
}

/// Integer meters where exact, one decimal otherwise.
fn format_elevation(m: f64) -> String {
    if (m - m.round()).abs() < 1e-6 {
        format!("{}", m.round() as i64)
    } else {
        format!("{m:.1}")
    }
}

fn staging_path(out_dir: &Path) -> PathBuf {
    let name = out_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());
    out_dir.with_file_name(format!("{name}.partial"))
}

#[derive(Serialize)]
struct RunReport<'a> {
    parameters: &'a Params,
    layers: usize,
    pages: usize,
    warnings: &'a [Warning],
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrastack_grid::GridTransform;

    fn cone_source(size: usize, peak: f32) -> Source {
        // Goes negative toward the corners, so the lowest band is a disk
        // rather than covering the whole grid.
        let center = size as f64 / 2.0;
        let data = (0..size * size)
            .map(|i| {
                let (c, r) = ((i % size) as f64, (i / size) as f64);
                let d = ((c - center).powi(2) + (r - center).powi(2)).sqrt();
                (peak as f64 * (1.0 - d / center)) as f32
            })
            .collect();
        let grid = ElevationGrid::new(
            data,
            size,
            size,
            GridTransform {
                origin_x: 0.0,
                origin_y: 0.0,
                cell_size: 1.0,
            },
        )
        .unwrap();
        Source::new(grid, 0)
    }

    fn test_params() -> Params {
        Params {
            interval_m: 50.0,
            floor_m: Some(0.0),
            ceiling_m: Some(200.0),
            smoothing_sigma: 0.0,
            simplify_tolerance: 0.0,
            min_ring_points: 3,
            ..Default::default()
        }
    }

    fn temp_out(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("terrastack_run_{name}"))
    }

    #[test]
    fn test_run_produces_expected_files() {
        let out = temp_out("ok");
        fs::remove_dir_all(&out).ok();
        let summary = run(
            vec![cone_source(60, 200.0)],
            None,
            &test_params(),
            &out,
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(summary.layers, 4);
        assert_eq!(summary.pages, 5); // cover + 4 sheets
        assert!(out.join("print_all_layers.pdf").exists());
        assert!(out.join("assembly_guide.txt").exists());
        assert!(out.join("run_report.json").exists());
        assert!(out.join("layer_0000_0m.svg").exists());
        assert!(out.join("layer_0003_150m.svg").exists());
        // Staging directory was renamed away.
        assert!(!staging_path(&out).exists());
        fs::remove_dir_all(&out).ok();
    }

    #[test]
    fn test_cancelled_run_leaves_nothing() {
        let out = temp_out("cancelled");
        fs::remove_dir_all(&out).ok();
        let token = CancelToken::new();
        token.cancel();
        let result = run(
            vec![cone_source(40, 100.0)],
            None,
            &test_params(),
            &out,
            &token,
        );
        assert!(matches!(result, Err(PipelineError::Cancelled)));
        assert!(!out.exists());
        assert!(!staging_path(&out).exists());
    }

    #[test]
    fn test_invalid_params_produce_nothing() {
        let out = temp_out("invalid");
        fs::remove_dir_all(&out).ok();
        let params = Params {
            interval_m: -1.0,
            ..test_params()
        };
        let result = run(
            vec![cone_source(40, 100.0)],
            None,
            &params,
            &out,
            &CancelToken::new(),
        );
        assert!(matches!(
            result,
            Err(PipelineError::InvalidParameter { .. })
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_run_overwrites_previous_output() {
        let out = temp_out("overwrite");
        fs::remove_dir_all(&out).ok();
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("stale.txt"), "old").unwrap();

        run(
            vec![cone_source(60, 200.0)],
            None,
            &test_params(),
            &out,
            &CancelToken::new(),
        )
        .unwrap();
        assert!(!out.join("stale.txt").exists());
        assert!(out.join("print_all_layers.pdf").exists());
        fs::remove_dir_all(&out).ok();
    }

    #[test]
    fn test_format_elevation() {
        assert_eq!(format_elevation(150.0), "150");
        assert_eq!(format_elevation(12.5), "12.5");
        assert_eq!(format_elevation(0.0), "0");
    }
}
