use crate::core::geo::PixelPoint;
use crate::images::PreloadedImage;
use crate::rendering::context::{MapState, PreloadContext, RenderContext};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Tile,
    Marker,
    Custom,
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::Tile => write!(f, "tile"),
            LayerType::Marker => write!(f, "marker"),
            LayerType::Custom => write!(f, "custom"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayerProperties {
    pub id: String,
    pub layer_type: LayerType,
    pub z_index: i32,
    pub opacity: f32,
    pub visible: bool,
    pub interactive: bool,
}

impl LayerProperties {
    pub fn new(id: impl Into<String>, layer_type: LayerType) -> Self {
        Self {
            id: id.into(),
            layer_type,
            z_index: 0,
            opacity: 1.0,
            visible: true,
            interactive: true,
        }
    }
}

/// A drawable map layer.
///
/// The boilerplate accessors come from [`impl_layer_trait!`](crate::impl_layer_trait);
/// layers implement `render` and whichever hooks they need.
pub trait LayerTrait: Send {
    fn id(&self) -> &str;
    fn layer_type(&self) -> LayerType;
    fn z_index(&self) -> i32;
    fn set_z_index(&mut self, z_index: i32);
    fn opacity(&self) -> f32;
    fn set_opacity(&mut self, opacity: f32);
    fn is_visible(&self) -> bool;
    fn set_visible(&mut self, visible: bool);
    fn is_interactive(&self) -> bool;
    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;

    /// Draws the layer for the frame described by `context.state`
    fn render(&mut self, context: &mut RenderContext<'_>) -> Result<()>;

    /// Requests the images a future view will need, without drawing
    fn preload(&mut self, _context: &mut PreloadContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Receives images requested through `preload` once they arrive
    fn images_preloaded(&mut self, _images: &[PreloadedImage]) {}

    /// Id of the top-most item under `pixel`, if any
    fn hit_test(&self, _pixel: &PixelPoint, _state: &MapState) -> Option<String> {
        None
    }
}
