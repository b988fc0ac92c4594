use crate::{
    core::{
        bounds::Bounds,
        constants::DEFAULT_MARKER_HIT_SIZE,
        geo::{Coordinate, PixelPoint, Point},
    },
    images::PreloadedImage,
    layers::base::{LayerProperties, LayerTrait, LayerType},
    prelude::HashMap,
    rendering::context::{MapState, PreloadContext, RenderContext},
    spatial::{Culling, SpatialIndex, SpatialItem},
    Result,
};
use serde::{Deserialize, Serialize};

/// A point of interest drawn as an icon centered on its position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    pub position: Coordinate,
    /// Overrides the layer's default icon
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub icon_size: Option<Point>,
}

impl Marker {
    pub fn new(id: impl Into<String>, position: impl Into<Coordinate>) -> Self {
        Self {
            id: id.into(),
            position: position.into(),
            icon: None,
            icon_size: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_icon_size(mut self, width: f64, height: f64) -> Self {
        self.icon_size = Some(Point::new(width, height));
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerLayerOptions {
    /// Default icon source
    pub icon: String,
    pub icon_size: Option<Point>,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    /// Pre-filter culling with an R-tree
    pub spatial_index: bool,
    pub z_index: i32,
}

impl Default for MarkerLayerOptions {
    fn default() -> Self {
        Self {
            icon: String::new(),
            icon_size: None,
            min_zoom: None,
            max_zoom: None,
            spatial_index: false,
            z_index: 10,
        }
    }
}

pub struct MarkerLayer {
    properties: LayerProperties,
    options: MarkerLayerOptions,
    markers: Vec<Marker>,
    index: Option<SpatialIndex<usize>>,
    /// Natural icon sizes learned from loaded images
    natural_sizes: HashMap<String, Point>,
}

impl MarkerLayer {
    pub fn new(id: impl Into<String>, options: MarkerLayerOptions) -> Self {
        let mut properties = LayerProperties::new(id, LayerType::Marker);
        properties.z_index = options.z_index;

        Self {
            properties,
            index: options.spatial_index.then(SpatialIndex::new),
            options,
            markers: Vec::new(),
            natural_sizes: HashMap::default(),
        }
    }

    pub fn options(&self) -> &MarkerLayerOptions {
        &self.options
    }

    /// Registers markers. Later markers draw on top of earlier ones.
    pub fn add(&mut self, markers: impl IntoIterator<Item = Marker>) {
        for marker in markers {
            if let Some(index) = &mut self.index {
                index.insert(SpatialItem::from_point(
                    marker.id.clone(),
                    marker.position,
                    self.markers.len(),
                ));
            }
            self.markers.push(marker);
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Marker> {
        let position = self.markers.iter().position(|m| m.id == id)?;
        let removed = self.markers.remove(position);
        self.rebuild_index();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.markers.clear();
        if let Some(index) = &mut self.index {
            index.clear();
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    fn rebuild_index(&mut self) {
        if self.index.is_some() {
            let items = self
                .markers
                .iter()
                .enumerate()
                .map(|(i, m)| SpatialItem::from_point(m.id.clone(), m.position, i))
                .collect();
            self.index = Some(SpatialIndex::bulk_load(items));
        }
    }

    fn zoom_visible(&self, zoom: f64) -> bool {
        self.options.min_zoom.map_or(true, |min| zoom >= min)
            && self.options.max_zoom.map_or(true, |max| zoom <= max)
    }

    /// Markers strictly inside the visible area, in registration order
    pub fn visible_markers(&self, state: &MapState) -> Vec<&Marker> {
        if !self.zoom_visible(state.zoom()) {
            return Vec::new();
        }

        let area = &state.area;
        match &self.index {
            Some(index) => {
                let mut candidates: Vec<usize> =
                    index.query(area).into_iter().map(|item| item.data).collect();
                candidates.sort_unstable();
                candidates
                    .into_iter()
                    .filter_map(|i| self.markers.get(i))
                    .filter(|m| Culling::point_visible(area, &m.position))
                    .collect()
            }
            None => self
                .markers
                .iter()
                .filter(|m| Culling::point_visible(area, &m.position))
                .collect(),
        }
    }

    fn icon_for<'a>(&'a self, marker: &'a Marker) -> &'a str {
        marker.icon.as_deref().unwrap_or(&self.options.icon)
    }

    fn icon_size(&self, marker: &Marker) -> Option<Point> {
        marker
            .icon_size
            .or(self.options.icon_size)
            .or_else(|| self.natural_sizes.get(self.icon_for(marker)).copied())
    }
}

impl LayerTrait for MarkerLayer {
    crate::impl_layer_trait!(MarkerLayer, properties);

    fn render(&mut self, context: &mut RenderContext<'_>) -> Result<()> {
        let state = context.state;
        let mut draws = Vec::new();

        for marker in self.visible_markers(state) {
            let icon = self.icon_for(marker);
            if icon.is_empty() {
                continue;
            }
            let Some(image) = context.get_image(icon, 0.0) else {
                continue;
            };
            let size = marker
                .icon_size
                .or(self.options.icon_size)
                .unwrap_or_else(|| image.size());
            let dest = Bounds::from_center_and_size(state.map_to_canvas(&marker.position), size.x, size.y);
            draws.push((self.icon_for(marker).to_string(), image, dest));
        }

        for (icon, image, dest) in draws {
            context
                .surface
                .draw_image(&image, image.full_rect(), dest, self.properties.opacity);
            self.natural_sizes.entry(icon).or_insert_with(|| image.size());
        }

        Ok(())
    }

    fn preload(&mut self, context: &mut PreloadContext<'_>) -> Result<()> {
        if !self.zoom_visible(context.state.zoom()) {
            return Ok(());
        }

        if !self.options.icon.is_empty() {
            context.get_image(&self.options.icon, 0.0);
        }
        for marker in self.visible_markers(context.state) {
            match &marker.icon {
                Some(icon) if !icon.is_empty() => {
                    context.get_image(icon, 0.0);
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn images_preloaded(&mut self, images: &[PreloadedImage]) {
        for preloaded in images {
            self.natural_sizes
                .insert(preloaded.src.clone(), preloaded.image.size());
        }
    }

    fn hit_test(&self, pixel: &PixelPoint, state: &MapState) -> Option<String> {
        self.visible_markers(state).into_iter().rev().find_map(|marker| {
            let size = self
                .icon_size(marker)
                .unwrap_or_else(|| Point::splat(DEFAULT_MARKER_HIT_SIZE));
            let hit_box =
                Bounds::from_center_and_size(state.map_to_canvas(&marker.position), size.x, size.y);
            hit_box.contains_strict(pixel).then(|| marker.id.clone())
        })
    }
}
