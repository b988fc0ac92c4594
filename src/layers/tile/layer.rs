//! Raster tile layer with level-of-detail selection and ancestor fallback

use super::TileSource;
use crate::{
    core::{
        bounds::Bounds,
        constants::TILE_SIZE,
        geo::{Point, TileCoord},
    },
    images::Image,
    layers::base::{LayerProperties, LayerTrait, LayerType},
    rendering::{
        context::{MapState, PreloadContext, RenderContext},
        surface::Color,
    },
    MapError, Result,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLayerOptions {
    pub tile_size: u32,
    /// Lowest pyramid level the source serves
    pub min_zoom: u32,
    /// Highest pyramid level the source serves
    pub max_zoom: u32,
    /// Map-space extent of the tiles
    pub bounds: Option<Bounds>,
    pub opacity: f32,
    pub z_index: i32,
}

impl Default for TileLayerOptions {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            min_zoom: 0,
            max_zoom: 18,
            bounds: None,
            opacity: 1.0,
            z_index: 0,
        }
    }
}

/// Tiles visible at one pyramid level. `x` and `y` ranges are half-open.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRange {
    pub level: u32,
    pub x: std::ops::Range<u32>,
    pub y: std::ops::Range<u32>,
    /// Size of one tile on the canvas in CSS pixels
    pub rendered_size: f64,
    /// Size of one tile in map units
    pub tile_extent: f64,
    /// Viewport center in tile units at `level`
    pub center: Point,
}

impl TileRange {
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty()
    }

    pub fn len(&self) -> usize {
        self.x.len() * self.y.len()
    }

    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let level = self.level;
        self.y
            .clone()
            .flat_map(move |y| self.x.clone().map(move |x| TileCoord::new(x, y, level)))
    }

    /// Closer to the viewport center means higher priority, in `(0, 1]`.
    /// Distances run from tile middles and are normalized by the range size.
    pub fn priority(&self, coord: &TileCoord) -> f64 {
        let extent_x = (self.x.len() as f64).max(1.0);
        let extent_y = (self.y.len() as f64).max(1.0);

        let distance = (coord.x as f64 + 0.5 - self.center.x).abs() / extent_x
            + (coord.y as f64 + 0.5 - self.center.y).abs() / extent_y;
        1.0 / (1.0 + distance)
    }

    /// Map-space box of `coord`
    pub fn tile_bounds(&self, coord: &TileCoord) -> Bounds {
        Bounds::from_origin_and_size(
            Point::new(coord.x as f64, coord.y as f64).multiply(self.tile_extent),
            self.tile_extent,
            self.tile_extent,
        )
    }
}

/// An ancestor tile standing in for a missing one
#[derive(Debug, Clone)]
pub struct Fallback {
    pub coord: TileCoord,
    pub image: Image,
    /// Top-left of the covered part, as a fraction of the ancestor
    pub offset: Point,
    /// Covered fraction of the ancestor per axis
    pub scale: f64,
}

impl Fallback {
    /// Source rectangle inside the ancestor image
    pub fn source_rect(&self) -> Bounds {
        let size = self.image.size();
        Bounds::from_origin_and_size(
            Point::new(self.offset.x * size.x, self.offset.y * size.y),
            self.scale * size.x,
            self.scale * size.y,
        )
    }
}

pub struct TileLayer {
    properties: LayerProperties,
    options: TileLayerOptions,
    source: Box<dyn TileSource>,
}

impl TileLayer {
    pub fn new(
        id: impl Into<String>,
        source: impl TileSource + 'static,
        options: TileLayerOptions,
    ) -> Self {
        let mut properties = LayerProperties::new(id, LayerType::Tile);
        properties.opacity = options.opacity;
        properties.z_index = options.z_index;
        properties.interactive = false;

        Self {
            properties,
            options,
            source: Box::new(source),
        }
    }

    pub fn options(&self) -> &TileLayerOptions {
        &self.options
    }

    pub fn url(&self, coord: TileCoord) -> String {
        self.source.url(coord)
    }

    /// Pyramid level used at `zoom`: the next level up, so tiles are never
    /// magnified by more than one level
    pub fn level_for_zoom(&self, zoom: f64) -> u32 {
        let level = zoom.ceil().max(0.0) as u32;
        level.clamp(self.options.min_zoom, self.options.max_zoom.max(self.options.min_zoom))
    }

    /// Computes the tiles covering the visible area of `state`
    pub fn tile_range(&self, state: &MapState) -> Result<TileRange> {
        let level = self.level_for_zoom(state.zoom());
        let tile_size = self.options.tile_size as f64;
        let rendered_size = tile_size * (state.zoom() - level as f64).exp2();

        if !(rendered_size >= tile_size / 2.0) {
            return Err(MapError::InvalidTileSize {
                size: rendered_size,
                tile_size: self.options.tile_size,
                level,
            });
        }

        let tile_extent = tile_size * state.projection.native_scale() / (level as f64).exp2();
        let empty = TileRange {
            level,
            x: 0..0,
            y: 0..0,
            rendered_size,
            tile_extent,
            center: state.view.center.divide(tile_extent),
        };

        let area = match self.options.bounds {
            Some(bounds) => match state.area.intersection(&bounds) {
                Some(area) => area,
                None => return Ok(empty),
            },
            None => state.area,
        };

        let to_range = |min: f64, max: f64| -> std::ops::Range<u32> {
            let start = (min / tile_extent).floor().max(0.0);
            let end = (max / tile_extent).ceil().max(0.0);
            if end <= start {
                return 0..0;
            }
            (start as u32)..(end as u32)
        };

        Ok(TileRange {
            x: to_range(area.min.x, area.max.x),
            y: to_range(area.min.y, area.max.y),
            ..empty
        })
    }

    /// Walks up the pyramid looking for a cached ancestor of `coord`
    pub fn find_fallback<F>(&self, coord: TileCoord, mut lookup: F) -> Option<Fallback>
    where
        F: FnMut(&str) -> Option<Image>,
    {
        let mut x = coord.x as f64;
        let mut y = coord.y as f64;
        let mut z = coord.z;
        let mut scale = 1.0;

        while z > 0 {
            x /= 2.0;
            y /= 2.0;
            z -= 1;
            scale *= 0.5;

            let ancestor = TileCoord::new(x.floor() as u32, y.floor() as u32, z);
            if let Some(image) = lookup(&self.source.url(ancestor)) {
                return Some(Fallback {
                    coord: ancestor,
                    image,
                    offset: Point::new(x.fract(), y.fract()),
                    scale,
                });
            }
        }

        None
    }
}

impl LayerTrait for TileLayer {
    crate::impl_layer_trait!(TileLayer, properties);

    fn render(&mut self, context: &mut RenderContext<'_>) -> Result<()> {
        let range = self.tile_range(context.state)?;
        if range.is_empty() {
            return Ok(());
        }

        let state = context.state;
        let opacity = self.properties.opacity;

        for coord in range.coords() {
            let tile_bounds = range.tile_bounds(&coord);
            let dest = Bounds::from_corners(
                state.map_to_canvas(&tile_bounds.min),
                state.map_to_canvas(&tile_bounds.max),
            );

            let src = self.source.url(coord);
            if let Some(image) = context.get_image(&src, range.priority(&coord)) {
                context
                    .surface
                    .draw_image(&image, image.full_rect(), dest, opacity);
            } else if let Some(fallback) = self.find_fallback(coord, |src| context.get_cached(src)) {
                context
                    .surface
                    .draw_image(&fallback.image, fallback.source_rect(), dest, opacity);
            } else if state.debug {
                context.surface.fill_rect(dest, Color::DEBUG_MISSING);
            }

            if state.debug {
                context.surface.stroke_rect(dest, Color::DEBUG_OUTLINE, 1.0);
            }
        }

        Ok(())
    }

    fn preload(&mut self, context: &mut PreloadContext<'_>) -> Result<()> {
        let range = self.tile_range(context.state)?;
        log::trace!(
            "preloading {} tiles at level {} for {}",
            range.len(),
            range.level,
            self.properties.id
        );

        for coord in range.coords() {
            let src = self.source.url(coord);
            context.get_image(&src, range.priority(&coord) + 1.0);
        }

        Ok(())
    }
}
