//! # mapview
//!
//! A headless, interactive 2D map viewport engine.
//!
//! The [`Map`] keeps a continuous (fractional zoom) view over a large tiled
//! raster space, renders its layers on demand through a host-provided
//! [`Surface`](rendering::Surface) and [`RenderHost`](rendering::RenderHost),
//! and turns gestures and API calls into clamped, eased view changes.
//! Images are fetched in the background and never block a frame.

pub mod animation;
pub mod background;
pub mod core;
pub mod images;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod rendering;
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
pub mod spatial;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    bounds::Bounds,
    builder::MapBuilder,
    config::MapOptions,
    geo::{Coordinate, Padding, PixelPoint, Point, TileCoord},
    map::Map,
    view::{View, ViewRequest},
};

pub use animation::{EaseOptions, Easing};

pub use layers::{
    base::LayerTrait,
    marker::{Marker, MarkerLayer, MarkerLayerOptions},
    tile::{TileLayer, TileLayerOptions, UrlTemplate},
};

pub use input::{InputEvent, MapEvent};

pub use rendering::{RenderPriority, Surface};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Invalid view: {0}")]
    InvalidView(String),

    #[error("Invalid tile size {size:.1}px for {tile_size}px tiles at level {level}")]
    InvalidTileSize { size: f64, tile_size: u32, level: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[cfg(feature = "http")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Error = MapError;
