//! Integration tests running the full pipeline on synthetic terrain.

use std::fs;
use std::path::PathBuf;

use terrastack_grid::{ElevationGrid, GridTransform, Source};
use terrastack_pipeline::{run, CancelToken, Params, Warning};
use terrastack_print::OverflowPolicy;

fn unit_transform() -> GridTransform {
    GridTransform {
        origin_x: 0.0,
        origin_y: 0.0,
        cell_size: 1.0,
    }
}

/// A cone that dips below zero toward the corners, so every band has a
/// real outline.
fn cone_grid(size: usize, peak: f32) -> ElevationGrid {
    let center = size as f64 / 2.0;
    let data = (0..size * size)
        .map(|i| {
            let (c, r) = ((i % size) as f64, (i / size) as f64);
            let d = ((c - center).powi(2) + (r - center).powi(2)).sqrt();
            (peak as f64 * (1.0 - d / center)) as f32
        })
        .collect();
    ElevationGrid::new(data, size, size, unit_transform()).unwrap()
}

fn base_params() -> Params {
    Params {
        interval_m: 50.0,
        floor_m: Some(0.0),
        ceiling_m: Some(200.0),
        smoothing_sigma: 0.0,
        simplify_tolerance: 0.5,
        min_ring_points: 3,
        ..Default::default()
    }
}

fn out_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("terrastack_e2e_{name}"))
}

#[test]
fn test_full_run_output_contract() {
    let out = out_dir("contract");
    fs::remove_dir_all(&out).ok();

    let summary = run(
        vec![Source::new(cone_grid(80, 200.0), 0)],
        None,
        &base_params(),
        &out,
        &CancelToken::new(),
    )
    .expect("run failed");

    assert_eq!(summary.layers, 4);
    assert_eq!(summary.pages, 5);

    // Lexical sort of the SVG names equals stacking order.
    let mut svgs: Vec<String> = fs::read_dir(&out)
        .unwrap()
        .filter_map(|e| {
            let name = e.unwrap().file_name().into_string().unwrap();
            name.ends_with(".svg").then_some(name)
        })
        .collect();
    svgs.sort();
    assert_eq!(
        svgs,
        vec![
            "layer_0000_0m.svg",
            "layer_0001_50m.svg",
            "layer_0002_100m.svg",
            "layer_0003_150m.svg",
        ]
    );

    // Every sheet but the top one carries a dashed red guide.
    for name in &svgs[..svgs.len() - 1] {
        let svg = fs::read_to_string(out.join(name)).unwrap();
        assert!(svg.contains("stroke=\"red\""), "{name} has no guide");
    }
    let top = fs::read_to_string(out.join(&svgs[svgs.len() - 1])).unwrap();
    assert!(!top.contains("stroke=\"red\""));

    // Base sheet gets the water background.
    let base = fs::read_to_string(out.join(&svgs[0])).unwrap();
    assert!(base.contains("#40cbc8"));

    // Machine-readable report parses and echoes the parameters.
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("run_report.json")).unwrap()).unwrap();
    assert_eq!(report["layers"], 4);
    assert_eq!(report["pages"], 5);
    assert_eq!(report["parameters"]["interval_m"], 50.0);

    let guide = fs::read_to_string(out.join("assembly_guide.txt")).unwrap();
    assert!(guide.contains("Layer count      : 4"));

    fs::remove_dir_all(&out).ok();
}

#[test]
fn test_priority_merge_feeds_pipeline() {
    let out = out_dir("merge");
    fs::remove_dir_all(&out).ok();

    // A coarse backup source disagrees everywhere; the fine source must win.
    let fine = cone_grid(60, 200.0);
    let flat = ElevationGrid::new(vec![5.0; 60 * 60], 60, 60, unit_transform()).unwrap();

    let summary = run(
        vec![Source::new(fine, 0), Source::new(flat, 1)],
        None,
        &base_params(),
        &out,
        &CancelToken::new(),
    )
    .unwrap();

    // Were the flat source winning, only one band would have content.
    assert_eq!(summary.layers, 4);
    let top = fs::read_to_string(out.join("layer_0003_150m.svg")).unwrap();
    assert!(top.contains("<path"), "summit band lost its outline");

    fs::remove_dir_all(&out).ok();
}

#[test]
fn test_oversized_sheet_reported_not_distorted() {
    let out = out_dir("overflow");
    fs::remove_dir_all(&out).ok();

    // 400 grid units at 1 mm each cannot fit A4.
    let params = Params {
        overflow_policy: OverflowPolicy::Report,
        ..base_params()
    };
    let summary = run(
        vec![Source::new(cone_grid(400, 200.0), 0)],
        None,
        &params,
        &out,
        &CancelToken::new(),
    )
    .unwrap();

    let overflows = summary
        .warnings
        .iter()
        .filter(|w| matches!(w, Warning::PageOverflow { .. }))
        .count();
    assert_eq!(overflows, 4, "every sheet should report overflow");
    // One page per sheet plus the cover: no tiling happened.
    assert_eq!(summary.pages, 5);

    fs::remove_dir_all(&out).ok();
}

#[test]
fn test_oversized_sheet_tiles_with_more_pages() {
    let out = out_dir("tiling");
    fs::remove_dir_all(&out).ok();

    let params = Params {
        overflow_policy: OverflowPolicy::Tile,
        ..base_params()
    };
    let summary = run(
        vec![Source::new(cone_grid(400, 200.0), 0)],
        None,
        &params,
        &out,
        &CancelToken::new(),
    )
    .unwrap();

    assert!(
        summary.pages > 5,
        "tiling should emit multiple pages per sheet, got {}",
        summary.pages
    );
    assert!(summary
        .warnings
        .iter()
        .all(|w| !matches!(w, Warning::PageOverflow { .. })));

    fs::remove_dir_all(&out).ok();
}

#[test]
fn test_cancellation_discards_staging() {
    let out = out_dir("cancel");
    fs::remove_dir_all(&out).ok();

    let token = CancelToken::new();
    token.cancel();
    let result = run(
        vec![Source::new(cone_grid(60, 200.0), 0)],
        None,
        &base_params(),
        &out,
        &token,
    );
    assert!(result.is_err());
    assert!(!out.exists());
    let staging = out.with_file_name(format!(
        "{}.partial",
        out.file_name().unwrap().to_string_lossy()
    ));
    assert!(!staging.exists());
}
