//! Closed ring and polygon types.

/// A 2D point in grid coordinates (cell centers at integers, y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Column coordinate.
    pub x: f64,
    /// Row coordinate.
    pub y: f64,
}

impl Point {
    /// Construct a point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A closed ring of points: the first and last points are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    points: Vec<Point>,
}

impl Ring {
    /// Build a ring, closing it if the input is open.
    ///
    /// Returns `None` for inputs with fewer than 3 distinct vertices.
    pub fn new(mut points: Vec<Point>) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let first = points[0];
        if points.last() != Some(&first) {
            points.push(first);
        }
        let ring = Self { points };
        (ring.distinct_len() >= 3).then_some(ring)
    }

    /// Closed point sequence (first == last).
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of distinct vertices (closure point not counted).
    pub fn distinct_len(&self) -> usize {
        self.points.len() - 1
    }

    /// Shoelace signed area in grid space (y increasing downward).
    ///
    /// Negative for counter-clockwise rings, positive for clockwise ones.
    pub fn signed_area(&self) -> f64 {
        let mut sum = 0.0;
        for pair in self.points.windows(2) {
            sum += pair[0].x * pair[1].y - pair[1].x * pair[0].y;
        }
        sum / 2.0
    }

    /// Whether the ring winds counter-clockwise in grid space (y down).
    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    /// Reverse the winding direction in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Even-odd point-in-ring test. Points exactly on the boundary may fall
    /// on either side.
    pub fn contains(&self, p: Point) -> bool {
        let mut inside = false;
        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if (a.y > p.y) != (b.y > p.y) {
                let t = (p.y - a.y) / (b.y - a.y);
                let x_cross = a.x + t * (b.x - a.x);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Axis-aligned bounding box as (min, max) points.
    pub fn bounds(&self) -> (Point, Point) {
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in &self.points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        (min, max)
    }
}

/// An outer boundary with zero or more holes.
///
/// Outer rings wind counter-clockwise, holes clockwise (grid space, y down),
/// so an even-odd fill renders holes as cutouts.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// The outer boundary (counter-clockwise).
    pub outer: Ring,
    /// Enclosed holes (clockwise).
    pub holes: Vec<Ring>,
}

impl Polygon {
    /// Total vertex count across the outer ring and all holes.
    pub fn vertex_count(&self) -> usize {
        self.outer.distinct_len() + self.holes.iter().map(Ring::distinct_len).sum::<usize>()
    }

    /// All rings: outer first, then holes.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(side: f64) -> Ring {
        Ring::new(vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ])
        .unwrap()
    }

    #[test]
    fn test_ring_closes_open_input() {
        let ring = square(1.0);
        assert_eq!(ring.points().first(), ring.points().last());
        assert_eq!(ring.distinct_len(), 4);
    }

    #[test]
    fn test_ring_rejects_degenerate() {
        assert!(Ring::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]).is_none());
        assert!(Ring::new(vec![]).is_none());
    }

    #[test]
    fn test_signed_area_and_winding() {
        // Traversal (0,0)->(2,0)->(2,2)->(0,2) is clockwise on screen (y down).
        let mut ring = square(2.0);
        assert_relative_eq!(ring.signed_area(), 4.0);
        assert!(!ring.is_counter_clockwise());
        ring.reverse();
        assert_relative_eq!(ring.signed_area(), -4.0);
        assert!(ring.is_counter_clockwise());
    }

    #[test]
    fn test_contains() {
        let ring = square(4.0);
        assert!(ring.contains(Point::new(2.0, 2.0)));
        assert!(!ring.contains(Point::new(5.0, 2.0)));
        assert!(!ring.contains(Point::new(-1.0, -1.0)));
    }

    #[test]
    fn test_bounds() {
        let ring = square(3.0);
        let (min, max) = ring.bounds();
        assert_relative_eq!(min.x, 0.0);
        assert_relative_eq!(max.y, 3.0);
    }
}
