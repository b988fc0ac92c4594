//! Prelude module for common mapview types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use mapview::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    builder::MapBuilder,
    clock::{Clock, ManualClock, SystemClock},
    config::{GestureConfig, ImageCacheConfig, InertiaConfig, MapOptions},
    geo::{Coordinate, Padding, PixelPoint, Point, TileCoord},
    map::Map,
    view::{View, ViewRequest},
};

pub use crate::animation::{EaseOptions, Easing};

pub use crate::layers::{
    base::{LayerProperties, LayerTrait, LayerType},
    manager::{LayerHit, LayerManager},
    marker::{Marker, MarkerLayer, MarkerLayerOptions},
    tile::{TileLayer, TileLayerOptions, TileSource, UrlTemplate},
};

pub use crate::input::{Gesture, InputEvent, MapEvent, Modifiers, WheelMode};

pub use crate::images::{Image, ImageCache};

pub use crate::background::{BackgroundExecutor, ImageFetcher, ManualExecutor};

#[cfg(feature = "tokio-runtime")]
pub use crate::background::{FetchPool, FetchPoolConfig};

#[cfg(feature = "http")]
pub use crate::background::HttpFetcher;

pub use crate::rendering::{
    Color, ManualHost, RecordingSurface, RenderContext, RenderHost, RenderPriority, Surface,
};

pub use crate::spatial::index::{SpatialIndex, SpatialItem};

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::{runtime, spawn, AsyncHandle, AsyncSpawner};

pub use crate::{Error as MapError, Result};

pub use std::{collections::VecDeque, sync::Arc, time::Duration};

pub use instant::Instant;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
