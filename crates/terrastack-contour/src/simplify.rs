//! Ramer-Douglas-Peucker ring simplification.

use crate::ring::{Point, Ring};

/// Simplify a closed ring within `tolerance`.
///
/// No surviving point deviates from the original path by more than
/// `tolerance` (grid units). Tolerance 0 returns the input unchanged,
/// vertex for vertex. Ring closure is preserved. Returns `None` when the
/// ring would collapse below 3 distinct vertices; callers drop such rings
/// and record a warning rather than failing.
pub fn simplify_ring(ring: &Ring, tolerance: f64) -> Option<Ring> {
    if tolerance <= 0.0 {
        return Some(ring.clone());
    }

    let simplified = rdp(ring.points(), tolerance);
    if simplified.len() < 4 {
        // Fewer than 3 distinct vertices once the closure point is counted.
        return None;
    }
    Ring::new(simplified)
}

/// Recursive Douglas-Peucker over a point path.
///
/// For closed rings (first == last) the perpendicular baseline degenerates,
/// so the split distance falls back to distance-from-start; the first
/// recursion then splits at the point farthest from the anchor, which keeps
/// closed rings from collapsing onto a zero-length segment.
fn rdp(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let start = points[0];
    let end = points[points.len() - 1];
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let norm = (dx * dx + dy * dy).sqrt();

    let mut max_dist = 0.0;
    let mut max_idx = 0;
    for (i, p) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let dist = if norm == 0.0 {
            let ex = p.x - start.x;
            let ey = p.y - start.y;
            (ex * ex + ey * ey).sqrt()
        } else {
            (dx * (start.y - p.y) - (start.x - p.x) * dy).abs() / norm
        };
        if dist > max_dist {
            max_dist = dist;
            max_idx = i;
        }
    }

    if max_dist > epsilon {
        let mut left = rdp(&points[..=max_idx], epsilon);
        let right = rdp(&points[max_idx..], epsilon);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![start, end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy_square(jitter: f64) -> Ring {
        // A 10x10 square sampled every unit along each edge, with small
        // perpendicular jitter on alternating points.
        let mut pts = Vec::new();
        for i in 0..10 {
            let j = if i % 2 == 0 { jitter } else { 0.0 };
            pts.push(Point::new(i as f64, j));
        }
        for i in 0..10 {
            let j = if i % 2 == 0 { jitter } else { 0.0 };
            pts.push(Point::new(10.0 + j, i as f64));
        }
        for i in 0..10 {
            pts.push(Point::new(10.0 - i as f64, 10.0));
        }
        for i in 0..10 {
            pts.push(Point::new(0.0, 10.0 - i as f64));
        }
        Ring::new(pts).unwrap()
    }

    #[test]
    fn test_tolerance_zero_is_identity() {
        let ring = noisy_square(0.2);
        let out = simplify_ring(&ring, 0.0).unwrap();
        assert_eq!(ring.points(), out.points());
    }

    #[test]
    fn test_simplification_reduces_vertices() {
        let ring = noisy_square(0.2);
        let out = simplify_ring(&ring, 0.5).unwrap();
        assert!(out.distinct_len() < ring.distinct_len());
        assert!(out.distinct_len() >= 3);
        // Still closed.
        assert_eq!(out.points().first(), out.points().last());
    }

    #[test]
    fn test_monotone_in_tolerance() {
        let ring = noisy_square(0.3);
        let mut last = usize::MAX;
        for tol in [0.05, 0.1, 0.5, 1.0, 2.0] {
            let n = simplify_ring(&ring, tol)
                .map(|r| r.distinct_len())
                .unwrap_or(0);
            assert!(n <= last, "tolerance {tol} grew vertex count to {n}");
            last = n;
        }
    }

    #[test]
    fn test_deviation_bounded() {
        let ring = noisy_square(0.2);
        let tol = 0.5;
        let out = simplify_ring(&ring, tol).unwrap();
        // Every original vertex must be within tolerance of the simplified
        // path (checked against each retained segment).
        for p in ring.points() {
            let mut best = f64::INFINITY;
            for seg in out.points().windows(2) {
                best = best.min(point_segment_dist(*p, seg[0], seg[1]));
            }
            assert!(best <= tol + 1e-9, "vertex deviates by {best}");
        }
    }

    #[test]
    fn test_collapsing_ring_returns_none() {
        // A sliver: three nearly collinear points.
        let ring = Ring::new(vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.01),
            Point::new(10.0, 0.0),
        ])
        .unwrap();
        assert!(simplify_ring(&ring, 1.0).is_none());
    }

    fn point_segment_dist(p: Point, a: Point, b: Point) -> f64 {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len_sq = dx * dx + dy * dy;
        let t = if len_sq == 0.0 {
            0.0
        } else {
            (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
        };
        let cx = a.x + t * dx;
        let cy = a.y + t * dy;
        ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
    }
}
