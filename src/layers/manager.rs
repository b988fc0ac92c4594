use crate::core::geo::PixelPoint;
use crate::layers::base::LayerTrait;
use crate::prelude::HashMap;
use crate::rendering::context::MapState;
use crate::{MapError, Result};

/// A hit reported by an interactive layer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayerHit {
    pub layer_id: String,
    pub item_id: String,
}

/// Manages layers for the map, handling ordering and rendering
pub struct LayerManager {
    /// All layers indexed by ID
    layers: HashMap<String, Box<dyn LayerTrait>>,
    /// Ordered list of layer IDs for rendering (sorted by z-index, then insertion)
    render_order: Vec<String>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self {
            layers: HashMap::default(),
            render_order: Vec::new(),
        }
    }

    /// Adds a layer to the manager. Ids must be unique.
    pub fn add_layer(&mut self, layer: Box<dyn LayerTrait>) -> Result<()> {
        let layer_id = layer.id().to_string();
        if self.layers.contains_key(&layer_id) {
            return Err(MapError::Layer(format!("duplicate layer id '{}'", layer_id)));
        }
        let z_index = layer.z_index();

        self.layers.insert(layer_id.clone(), layer);

        // Insert in sorted order by z-index
        let insert_pos = self
            .render_order
            .iter()
            .position(|id| {
                self.layers
                    .get(id)
                    .map(|l| l.z_index() > z_index)
                    .unwrap_or(false)
            })
            .unwrap_or(self.render_order.len());

        self.render_order.insert(insert_pos, layer_id);
        Ok(())
    }

    /// Removes a layer from the manager
    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Box<dyn LayerTrait>> {
        self.render_order.retain(|id| id != layer_id);
        self.layers.remove(layer_id)
    }

    /// Gets a reference to a layer by ID
    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn LayerTrait> {
        self.layers.get(layer_id).map(|l| l.as_ref())
    }

    pub fn get_layer_mut(&mut self, layer_id: &str) -> Option<&mut (dyn LayerTrait + 'static)> {
        self.layers.get_mut(layer_id).map(|l| l.as_mut())
    }

    /// Lists layer IDs in render order
    pub fn list_layers(&self) -> Vec<String> {
        self.render_order.clone()
    }

    /// Applies a function to each visible layer mutably in render order
    pub fn for_each_visible_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut dyn LayerTrait),
    {
        for id in &self.render_order {
            if let Some(layer) = self.layers.get_mut(id) {
                if layer.is_visible() {
                    f(layer.as_mut());
                }
            }
        }
    }

    /// Finds the top-most interactive hit, walking layers from the top down
    pub fn hit_test(&self, pixel: &PixelPoint, state: &MapState) -> Option<LayerHit> {
        self.render_order.iter().rev().find_map(|id| {
            let layer = self.layers.get(id)?;
            if !layer.is_visible() || !layer.is_interactive() {
                return None;
            }
            layer.hit_test(pixel, state).map(|item_id| LayerHit {
                layer_id: id.clone(),
                item_id,
            })
        })
    }

    /// Updates the render order based on current z-indices
    pub fn update_render_order(&mut self) {
        let layers = &self.layers;
        self.render_order
            .sort_by_key(|id| layers.get(id).map(|l| l.z_index()).unwrap_or(0));
    }

    /// Gets the number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Checks if the manager is empty
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::new()
    }
}
