use crate::core::{
    bounds::Bounds,
    geo::{Coordinate, Padding, PixelPoint, Point},
    projection::Projection,
    view::View,
};
use crate::images::{GetOptions, Image, ImageCache};
use crate::rendering::surface::Surface;
use instant::Instant;

/// Per-frame snapshot handed to layers. The view center sits at the center of
/// the padded area.
#[derive(Debug, Clone, PartialEq)]
pub struct MapState {
    pub view: View,
    /// Canvas size in CSS pixels
    pub size: Point,
    pub padding: Padding,
    pub device_pixel_ratio: f64,
    pub projection: Projection,
    /// Map-space box covered by the whole canvas
    pub area: Bounds,
    pub debug: bool,
}

impl MapState {
    pub fn new(
        view: View,
        size: Point,
        padding: Padding,
        device_pixel_ratio: f64,
        projection: Projection,
        debug: bool,
    ) -> Self {
        let mut state = Self {
            view,
            size,
            padding,
            device_pixel_ratio,
            projection,
            area: Bounds::default(),
            debug,
        };
        state.area = Bounds::from_corners(
            state.canvas_to_map(&Point::new(0.0, 0.0)),
            state.canvas_to_map(&size),
        );
        state
    }

    pub fn zoom(&self) -> f64 {
        self.view.zoom
    }

    /// Canvas position of the view center
    pub fn anchor(&self) -> PixelPoint {
        self.padding.center_of(&self.size)
    }

    /// Projects a map-space vector at the current zoom
    pub fn project(&self, coordinate: &Coordinate) -> PixelPoint {
        self.projection.project(coordinate, self.view.zoom)
    }

    pub fn unproject(&self, pixel: &PixelPoint) -> Coordinate {
        self.projection.unproject(pixel, self.view.zoom)
    }

    pub fn map_to_canvas(&self, coordinate: &Coordinate) -> PixelPoint {
        self.anchor()
            .add(&self.project(&coordinate.subtract(&self.view.center)))
    }

    pub fn canvas_to_map(&self, pixel: &PixelPoint) -> Coordinate {
        self.view
            .center
            .add(&self.unproject(&pixel.subtract(&self.anchor())))
    }

    /// The whole canvas in CSS pixels
    pub fn canvas_rect(&self) -> Bounds {
        Bounds::from_origin_and_size(Point::default(), self.size.x, self.size.y)
    }
}

/// Everything a layer needs to draw one frame
pub struct RenderContext<'a> {
    pub surface: &'a mut dyn Surface,
    pub state: &'a MapState,
    images: &'a mut ImageCache,
    layer_id: &'a str,
    now: Instant,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        surface: &'a mut dyn Surface,
        state: &'a MapState,
        images: &'a mut ImageCache,
        layer_id: &'a str,
        now: Instant,
    ) -> Self {
        Self {
            surface,
            state,
            images,
            layer_id,
            now,
        }
    }

    /// Returns the image if cached, otherwise queues it at `priority`
    pub fn get_image(&mut self, src: &str, priority: f64) -> Option<Image> {
        self.images
            .get(src, GetOptions::priority(priority), Some(self.layer_id), self.now)
    }

    /// Returns the image only if it is already cached
    pub fn get_cached(&mut self, src: &str) -> Option<Image> {
        self.images
            .get(src, GetOptions::cache_only(), Some(self.layer_id), self.now)
    }

    pub fn layer_id(&self) -> &str {
        self.layer_id
    }
}

/// Context for warming the cache ahead of a view change
pub struct PreloadContext<'a> {
    pub state: &'a MapState,
    images: &'a mut ImageCache,
    layer_id: &'a str,
    now: Instant,
}

impl<'a> PreloadContext<'a> {
    pub fn new(
        state: &'a MapState,
        images: &'a mut ImageCache,
        layer_id: &'a str,
        now: Instant,
    ) -> Self {
        Self {
            state,
            images,
            layer_id,
            now,
        }
    }

    /// Requests `src`, notifying the layer once it arrives
    pub fn get_image(&mut self, src: &str, priority: f64) -> Option<Image> {
        self.images
            .get(src, GetOptions::preload(priority), Some(self.layer_id), self.now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> MapState {
        MapState::new(
            View::new(Point::new(1000.0, 1000.0), 6.0),
            Point::new(800.0, 600.0),
            Padding::default(),
            1.0,
            Projection::new(7.0),
            false,
        )
    }

    #[test]
    fn test_center_maps_to_canvas_center() {
        let state = state();
        assert_eq!(state.map_to_canvas(&state.view.center), Point::new(400.0, 300.0));
    }

    #[test]
    fn test_area_covers_canvas() {
        let state = state();
        // zoom 6 with native zoom 7: 2 map units per pixel
        assert_eq!(state.area, Bounds::from_coords(200.0, 400.0, 1800.0, 1600.0));
    }

    #[test]
    fn test_canvas_round_trip() {
        let state = state();
        let p = Point::new(123.0, 456.0);
        let back = state.map_to_canvas(&state.canvas_to_map(&p));
        assert!((back.x - p.x).abs() < 1e-9 && (back.y - p.y).abs() < 1e-9);
    }

    #[test]
    fn test_padding_shifts_anchor() {
        let mut state = state();
        state.padding = Padding::new(16.0, 80.0, 80.0, 16.0);
        assert_eq!(state.map_to_canvas(&state.view.center), Point::new(368.0, 268.0));
    }
}
