//! # terrastack-contour
//!
//! Converts elevation band masks into closed polygon outlines and reduces
//! their vertex counts for cutting.
//!
//! [`extract_polygons`] traces the land/below boundary of a cumulative mask
//! with marching squares at sub-cell precision, grouping disjoint land
//! masses and their enclosed holes into [`Polygon`]s with consistent
//! winding. [`simplify_ring`] then thins each ring with Douglas-Peucker
//! within a caller tolerance.

mod extract;
mod ring;
mod simplify;

pub use extract::{extract_polygons, ExtractOptions};
pub use ring::{Point, Polygon, Ring};
pub use simplify::simplify_ring;
