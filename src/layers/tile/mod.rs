//! Raster tile layer
//!
//! Tiles are picked from the pyramid level just above the current zoom and
//! scaled down on the canvas. Missing tiles are covered by the closest cached
//! ancestor until they arrive.

pub mod layer;
pub mod source;

pub use layer::{Fallback, TileLayer, TileLayerOptions, TileRange};
pub use source::{TileSource, UrlTemplate};
