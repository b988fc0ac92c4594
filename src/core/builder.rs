//! Map builder for fluent API configuration
//!
//! Collaborators that are not supplied fall back to headless defaults: a
//! system clock, a [`ManualHost`], a [`RecordingSurface`] and a
//! [`ManualExecutor`].

use crate::{
    background::{BackgroundExecutor, ManualExecutor},
    core::{
        clock::{Clock, SystemClock},
        config::MapOptions,
        geo::Point,
        map::{Map, MapParts},
        view::View,
    },
    images::ImageCache,
    input::HandlerManager,
    prelude::Arc,
    rendering::{scheduler::ManualHost, surface::RecordingSurface, RenderHost, Surface},
    MapError, Result,
};

/// Builder for creating and configuring Map instances
pub struct MapBuilder {
    options: MapOptions,
    size: Point,
    view: Option<View>,
    surface: Option<Box<dyn Surface>>,
    host: Option<Box<dyn RenderHost>>,
    executor: Option<Box<dyn BackgroundExecutor>>,
    clock: Option<Arc<dyn Clock>>,
    handlers: Option<HandlerManager>,
}

impl MapBuilder {
    /// Create a new MapBuilder with default settings
    pub fn new() -> Self {
        Self {
            options: MapOptions::default(),
            size: Point::new(800.0, 600.0),
            view: None,
            surface: None,
            host: None,
            executor: None,
            clock: None,
            handlers: None,
        }
    }

    pub fn with_options(mut self, options: MapOptions) -> Self {
        self.options = options;
        self
    }

    /// Load options from JSON
    pub fn with_options_json(mut self, json: &str) -> Result<Self> {
        self.options = MapOptions::from_json(json)?;
        Ok(self)
    }

    /// Canvas size in CSS pixels
    pub fn with_size(mut self, size: Point) -> Self {
        self.size = size;
        self
    }

    /// Initial view; clamped like any other request
    pub fn with_view(mut self, view: View) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_surface(mut self, surface: Box<dyn Surface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_host(mut self, host: Box<dyn RenderHost>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_executor(mut self, executor: Box<dyn BackgroundExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replaces the default gesture handlers
    pub fn with_handlers(mut self, handlers: HandlerManager) -> Self {
        self.handlers = Some(handlers);
        self
    }

    /// Fetch images over HTTP through a tokio fetch pool. Must be called
    /// inside a tokio runtime.
    #[cfg(feature = "http")]
    pub fn with_http_fetcher(self, config: crate::background::FetchPoolConfig) -> Self {
        let fetcher = Arc::new(crate::background::HttpFetcher::new());
        self.with_executor(Box::new(crate::background::FetchPool::new(fetcher, config)))
    }

    fn default_view(&self) -> View {
        let center = self
            .options
            .bounds
            .map(|b| b.center())
            .unwrap_or_default();
        View::new(center, self.options.min_zoom)
    }

    /// Validates the configuration and creates the map
    pub fn build(self) -> Result<Map> {
        self.options.validate()?;

        if !self.size.is_finite() || self.size.x < 0.0 || self.size.y < 0.0 {
            return Err(MapError::InvalidConfig(format!(
                "invalid canvas size {}x{}",
                self.size.x, self.size.y
            )));
        }

        let view = self.view.unwrap_or_else(|| self.default_view());
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let host = self
            .host
            .unwrap_or_else(|| Box::new(ManualHost::new(clock.clone())));
        let surface = self
            .surface
            .unwrap_or_else(|| Box::new(RecordingSurface::new()));
        let executor = self
            .executor
            .unwrap_or_else(|| Box::new(ManualExecutor::new()));
        let handlers = self
            .handlers
            .unwrap_or_else(|| HandlerManager::with_defaults(&self.options.gestures));

        Map::from_parts(MapParts {
            images: ImageCache::new(self.options.cache.clone(), executor),
            options: self.options,
            view,
            size: self.size,
            host,
            surface,
            clock,
            handlers,
        })
    }
}

impl Default for MapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bounds::Bounds;

    #[test]
    fn test_default_view_is_bounds_center_at_min_zoom() {
        let map = MapBuilder::new()
            .with_options(MapOptions {
                min_zoom: 2.0,
                max_zoom: 7.0,
                bounds: Some(Bounds::from_coords(0.0, 0.0, 1024.0, 1024.0)),
                ..Default::default()
            })
            .build()
            .unwrap();

        assert_eq!(map.view().zoom, 2.0);
        assert_eq!(map.view().center, Point::new(512.0, 512.0));
    }

    #[test]
    fn test_initial_view_is_clamped() {
        let map = MapBuilder::new()
            .with_options(MapOptions {
                max_zoom: 7.0,
                ..Default::default()
            })
            .with_view(View::new(Point::new(0.0, 0.0), 12.0))
            .build()
            .unwrap();
        assert_eq!(map.view().zoom, 7.0);
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let result = MapBuilder::new()
            .with_options(MapOptions {
                min_zoom: 5.0,
                max_zoom: 1.0,
                ..Default::default()
            })
            .build();
        assert!(matches!(result, Err(MapError::InvalidConfig(_))));

        let result = MapBuilder::new().with_size(Point::new(-1.0, 10.0)).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_options_from_json() {
        let map = MapBuilder::new()
            .with_options_json(r#"{ "min_zoom": 1, "max_zoom": 7, "zoom_snap": 0.5 }"#)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(map.options().zoom_snap, 0.5);
        assert_eq!(map.view().zoom, 1.0);
    }
}
