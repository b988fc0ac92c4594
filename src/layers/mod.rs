pub mod base;
pub mod macros;
pub mod manager;
pub mod marker;
pub mod tile;

pub use base::{LayerProperties, LayerTrait, LayerType};
pub use manager::{LayerHit, LayerManager};
pub use marker::{Marker, MarkerLayer, MarkerLayerOptions};
pub use tile::{TileLayer, TileLayerOptions, TileSource, UrlTemplate};
