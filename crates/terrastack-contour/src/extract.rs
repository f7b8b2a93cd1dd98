//! Marching-squares contour extraction from band masks.
//!
//! The mask is sampled at cell centers; boundaries are traced at the 0.5
//! iso-level between adjacent centers, so outlines pass between cells
//! rather than snapping to the grid and low-resolution sources do not look
//! staircased. A virtual one-cell false border around the mask guarantees
//! that rings touching the grid edge still close.

use crate::ring::{Point, Polygon, Ring};
use std::collections::HashMap;
use terrastack_grid::Mask;

/// Options for contour extraction.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Rings traced with fewer points than this are discarded as noise.
    pub min_ring_points: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { min_ring_points: 8 }
    }
}

/// Endpoint key with half-cell resolution. Every crossing point lies on an
/// edge midpoint, so doubling the coordinates gives exact integer keys.
type NodeKey = (i64, i64);

fn key_of(p: Point) -> NodeKey {
    ((p.x * 2.0).round() as i64, (p.y * 2.0).round() as i64)
}

/// Extract the boundary polygons of a mask.
///
/// Produces one [`Polygon`] per filled region: disjoint land masses become
/// separate polygons, enclosed false regions become holes. Outer rings wind
/// counter-clockwise and holes clockwise (grid space, y down). Degenerate
/// masks (all true or all false) yield an empty vector.
pub fn extract_polygons(mask: &Mask, options: ExtractOptions) -> Vec<Polygon> {
    // A uniform mask carries no boundary information.
    let set = mask.count_set();
    if set == 0 || set == mask.width() * mask.height() {
        return Vec::new();
    }
    let segments = trace_segments(mask);
    if segments.is_empty() {
        return Vec::new();
    }
    let rings = chain_rings(segments, options.min_ring_points);
    group_into_polygons(rings)
}

/// Walk every 2x2 cell window (including the virtual false border) and emit
/// directed segments with the filled region on the left of travel.
fn trace_segments(mask: &Mask) -> Vec<(Point, Point)> {
    let w = mask.width() as i64;
    let h = mask.height() as i64;
    let sample = |c: i64, r: i64| -> bool {
        c >= 0 && r >= 0 && c < w && r < h && mask.get(c as usize, r as usize)
    };

    let mut segments = Vec::new();
    for cy in -1..h {
        for cx in -1..w {
            let tl = sample(cx, cy) as u8;
            let tr = sample(cx + 1, cy) as u8;
            let br = sample(cx + 1, cy + 1) as u8;
            let bl = sample(cx, cy + 1) as u8;
            // Bit order must match the segment table below.
            let case = (bl << 3) | (br << 2) | (tr << 1) | tl;
            if case == 0 || case == 15 {
                continue;
            }

            let fx = cx as f64;
            let fy = cy as f64;
            let top = Point::new(fx + 0.5, fy);
            let right = Point::new(fx + 1.0, fy + 0.5);
            let bottom = Point::new(fx + 0.5, fy + 1.0);
            let left = Point::new(fx, fy + 0.5);

            match case {
                1 => segments.push((left, top)),
                2 => segments.push((top, right)),
                3 => segments.push((left, right)),
                4 => segments.push((right, bottom)),
                5 => {
                    // Saddle (tl + br): keep the regions disconnected.
                    segments.push((left, top));
                    segments.push((right, bottom));
                }
                6 => segments.push((top, bottom)),
                7 => segments.push((left, bottom)),
                8 => segments.push((bottom, left)),
                9 => segments.push((bottom, top)),
                10 => {
                    // Saddle (tr + bl).
                    segments.push((top, right));
                    segments.push((bottom, left));
                }
                11 => segments.push((bottom, right)),
                12 => segments.push((right, left)),
                13 => segments.push((right, top)),
                14 => segments.push((top, left)),
                _ => unreachable!(),
            }
        }
    }
    segments
}

/// Connect directed segments into closed rings by endpoint matching.
fn chain_rings(segments: Vec<(Point, Point)>, min_points: usize) -> Vec<Ring> {
    let mut by_start: HashMap<NodeKey, (Point, Point)> = HashMap::with_capacity(segments.len());
    for seg in segments {
        by_start.insert(key_of(seg.0), seg);
    }

    // Deterministic walk order: smallest start key first.
    let mut starts: Vec<NodeKey> = by_start.keys().copied().collect();
    starts.sort_unstable();

    let mut rings = Vec::new();
    let mut dropped = 0usize;
    for start in starts {
        let Some(first) = by_start.remove(&start) else {
            continue;
        };
        let mut points = vec![first.0, first.1];
        let mut cursor = key_of(first.1);

        while cursor != start {
            match by_start.remove(&cursor) {
                Some((_, end)) => {
                    points.push(end);
                    cursor = key_of(end);
                }
                // Broken chain; should not happen for a well-formed mask.
                None => break,
            }
        }

        if cursor != start || points.len() < min_points {
            dropped += 1;
            continue;
        }
        if let Some(ring) = Ring::new(points) {
            rings.push(ring);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        tracing::trace!(dropped, "discarded short or broken contour chains");
    }
    rings
}

/// Classify rings by nesting depth: even depth is an outer boundary, odd
/// depth is a hole of its innermost enclosing outer ring. Winding is
/// normalized (outer CCW, hole CW).
fn group_into_polygons(mut rings: Vec<Ring>) -> Vec<Polygon> {
    // Largest first so parents precede children.
    rings.sort_by(|a, b| {
        b.signed_area()
            .abs()
            .partial_cmp(&a.signed_area().abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let n = rings.len();
    let mut depth = vec![0usize; n];
    let mut parent = vec![None; n];
    for i in 0..n {
        let probe = rings[i].points()[0];
        // Innermost container is the smallest-area ring containing the
        // probe; with the largest-first ordering that is the last match.
        for j in 0..n {
            if i != j && rings[j].contains(probe) {
                depth[i] += 1;
                // Largest-first ordering: the last container found is the
                // innermost one.
                parent[i] = Some(j);
            }
        }
    }

    let mut polygons: Vec<Polygon> = Vec::new();
    let mut outer_index: HashMap<usize, usize> = HashMap::new();

    for (i, mut ring) in rings.into_iter().enumerate() {
        if depth[i] % 2 == 0 {
            if !ring.is_counter_clockwise() {
                ring.reverse();
            }
            outer_index.insert(i, polygons.len());
            polygons.push(Polygon {
                outer: ring,
                holes: Vec::new(),
            });
        } else {
            if ring.is_counter_clockwise() {
                ring.reverse();
            }
            // Attach to the innermost enclosing outer ring; because rings
            // were visited largest-first, that outer already exists.
            let owner = parent[i]
                .and_then(|p| outer_index.get(&p))
                .copied()
                .unwrap_or(polygons.len().saturating_sub(1));
            if let Some(poly) = polygons.get_mut(owner) {
                poly.holes.push(ring);
            }
        }
    }
    polygons
}
