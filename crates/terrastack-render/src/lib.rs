//! # terrastack-render
//!
//! Renders one terrain layer into a page-sized SVG document: the layer's
//! filled footprint (flat color or clipped satellite imagery), its stroked
//! cut line, the dashed-red registration guide borrowed from the layer
//! above, and an index label. Sheets whose vector complexity exceeds a
//! budget degrade to a rasterized PNG fill embedded in the same page
//! instead of aborting the run.

mod error;
mod raster;
mod style;
mod svg;

pub use error::RenderError;
pub use raster::{encode_png, Canvas};
pub use style::{topo_color, ImageCrop, LayerStyle, Rgb, BASE_LAYER_BACKGROUND};
pub use svg::{flat_style_for, render_layer, LayerArt, RenderConfig, RenderedPage};

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;
