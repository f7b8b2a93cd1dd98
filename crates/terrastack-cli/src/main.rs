//! `terrastack` binary: turn GeoTIFF elevation sources into a printable
//! stack of laminated terrain layers.

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use terrastack_grid::{load_geotiff, Source};
use terrastack_pipeline::{run, CancelToken, FillStyleKind, Params, PipelineError};
use terrastack_print::{OverflowPolicy, PaperSize};
use terrastack_render::ImageCrop;

#[derive(Debug, Parser)]
#[command(
    name = "terrastack",
    about = "Slice elevation rasters into printable laminated terrain layers"
)]
struct Args {
    /// GeoTIFF elevation sources, highest priority first.
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Output directory (created or replaced on success).
    #[arg(short, long)]
    out: PathBuf,

    /// YAML run configuration; command-line flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Elevation band thickness in meters.
    #[arg(long)]
    interval: Option<f64>,

    /// Lowest band boundary in meters. Also disables the sea clamp, so
    /// elevations below zero are kept.
    #[arg(long)]
    floor: Option<f64>,

    /// Highest band boundary in meters.
    #[arg(long)]
    ceiling: Option<f64>,

    /// Gaussian smoothing sigma in cells (0 disables smoothing).
    #[arg(long)]
    sigma: Option<f64>,

    /// Outline simplification tolerance in grid units.
    #[arg(long)]
    tolerance: Option<f64>,

    /// Resolution reduction factor in (0, 1].
    #[arg(long)]
    downsample: Option<f64>,

    /// Paper size: a4, a3 or b4.
    #[arg(long)]
    paper: Option<PaperSize>,

    /// Physical scale in millimeters of paper per grid cell.
    #[arg(long)]
    scale: Option<f64>,

    /// Oversized-sheet policy: tile or report.
    #[arg(long)]
    overflow: Option<String>,

    /// Pre-cropped satellite texture (PNG) aligned with the grid extent.
    /// Switches the fill style to satellite.
    #[arg(long)]
    satellite: Option<PathBuf>,

    /// Fill regions hidden by higher sheets in plain grey to save ink.
    #[arg(long)]
    ink_saver: bool,

    /// Title for the cover sheet and assembly guide.
    #[arg(long)]
    title: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match real_main(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(PipelineError::Cancelled) => {
            warn!("cancelled, no output written");
            ExitCode::from(130)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn real_main(args: Args) -> Result<(), PipelineError> {
    let params = build_params(&args)?;
    params.validate()?;

    let token = CancelToken::new();
    {
        let token = token.clone();
        // A second Ctrl-C while shutdown is in progress kills the process.
        if let Err(e) = ctrlc::set_handler(move || token.cancel()) {
            warn!("could not install Ctrl-C handler: {e}");
        }
    }

    // The sea clamp drops negative elevations unless a floor was given.
    let explicit_floor = params.floor_m.is_some();
    let mut sources = Vec::with_capacity(args.sources.len());
    for (priority, path) in args.sources.iter().enumerate() {
        info!(path = %path.display(), priority, "loading source");
        let grid = load_geotiff(path, explicit_floor)?;
        sources.push(Source::new(grid, priority as u32));
    }

    let satellite = match &args.satellite {
        Some(path) => Some(load_satellite(path)?),
        None => None,
    };

    let summary = run(sources, satellite, &params, &args.out, &token)?;

    println!(
        "wrote {} layers ({} PDF pages) to {}",
        summary.layers,
        summary.pages,
        args.out.display()
    );
    if !summary.warnings.is_empty() {
        println!("{} warnings:", summary.warnings.len());
        for w in &summary.warnings {
            println!("  - {w}");
        }
    }
    Ok(())
}

/// Config file first, then command-line overrides.
fn build_params(args: &Args) -> Result<Params, PipelineError> {
    let mut params = match &args.config {
        Some(path) => {
            let file = File::open(path)?;
            serde_yaml::from_reader(file).map_err(|e| PipelineError::InvalidParameter {
                name: "config",
                reason: e.to_string(),
            })?
        }
        None => Params::default(),
    };

    if let Some(v) = args.interval {
        params.interval_m = v;
    }
    if let Some(v) = args.floor {
        params.floor_m = Some(v);
    }
    if let Some(v) = args.ceiling {
        params.ceiling_m = Some(v);
    }
    if let Some(v) = args.sigma {
        params.smoothing_sigma = v;
    }
    if let Some(v) = args.tolerance {
        params.simplify_tolerance = v;
    }
    if let Some(v) = args.downsample {
        params.downsample = v;
    }
    if let Some(v) = args.paper {
        params.paper_size = v;
    }
    if let Some(v) = args.scale {
        params.scale_mm_per_unit = v;
    }
    if let Some(v) = &args.overflow {
        params.overflow_policy = match v.as_str() {
            "tile" => OverflowPolicy::Tile,
            "report" => OverflowPolicy::Report,
            other => {
                return Err(PipelineError::InvalidParameter {
                    name: "overflow",
                    reason: format!("unknown policy '{other}' (expected tile or report)"),
                })
            }
        };
    }
    if args.satellite.is_some() {
        params.fill_style = FillStyleKind::Satellite;
    }
    if args.ink_saver {
        params.ink_saver = true;
    }
    if let Some(v) = &args.title {
        params.title = v.clone();
    }
    Ok(params)
}

/// Decode a PNG texture into an RGB8 crop, dropping any alpha channel.
fn load_satellite(path: &PathBuf) -> Result<ImageCrop, PipelineError> {
    let decoder = png::Decoder::new(File::open(path)?);
    let mut reader = decoder
        .read_info()
        .map_err(|e| bad_satellite(e.to_string()))?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| bad_satellite(e.to_string()))?;
    buf.truncate(info.buffer_size());

    let pixels = match info.color_type {
        png::ColorType::Rgb => buf,
        png::ColorType::Rgba => buf
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect(),
        other => {
            return Err(bad_satellite(format!(
                "unsupported color type {other:?} (expected RGB or RGBA)"
            )))
        }
    };
    Ok(ImageCrop {
        pixels,
        width: info.width as usize,
        height: info.height as usize,
    })
}

fn bad_satellite(reason: String) -> PipelineError {
    PipelineError::InvalidParameter {
        name: "satellite",
        reason,
    }
}
