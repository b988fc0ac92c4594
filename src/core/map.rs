//! The map: owns the view, the layers, the image cache and the gesture
//! handlers, and drives rendering through the host's frame and timer hooks.

use crate::{
    animation::{EaseOptions, Inertia, ViewTransition},
    core::{
        builder::MapBuilder,
        clock::Clock,
        config::MapOptions,
        geo::{Coordinate, Padding, PixelPoint, Point},
        projection::Projection,
        view::{self, View, ViewConstraints, ViewRequest},
    },
    images::{ImageCache, PreloadedImage},
    input::{EventManager, Gesture, HandlerContext, HandlerManager, InputEvent, MapEvent},
    layers::{LayerHit, LayerManager, LayerTrait},
    prelude::{Arc, HashMap},
    rendering::{
        context::{MapState, PreloadContext, RenderContext},
        scheduler::{FrameHandle, RenderHost, RenderPriority, RenderQueue, TimerHandle},
        surface::Surface,
    },
    Result,
};

pub struct Map {
    options: MapOptions,
    view: View,
    size: Point,
    projection: Projection,
    transition: Option<ViewTransition>,
    layers: LayerManager,
    images: ImageCache,
    render_queue: RenderQueue,
    host: Box<dyn RenderHost>,
    surface: Box<dyn Surface>,
    clock: Arc<dyn Clock>,
    handlers: HandlerManager,
    inertia: Inertia,
    events: EventManager,
    hovered: Option<LayerHit>,
    frame_count: u64,
}

/// Everything the builder hands over
pub(crate) struct MapParts {
    pub options: MapOptions,
    pub view: View,
    pub size: Point,
    pub images: ImageCache,
    pub host: Box<dyn RenderHost>,
    pub surface: Box<dyn Surface>,
    pub clock: Arc<dyn Clock>,
    pub handlers: HandlerManager,
}

impl Map {
    pub fn builder() -> MapBuilder {
        MapBuilder::new()
    }

    pub(crate) fn from_parts(parts: MapParts) -> Result<Self> {
        let MapParts {
            options,
            view,
            size,
            images,
            host,
            surface,
            clock,
            handlers,
        } = parts;

        let mut map = Self {
            projection: Projection::new(options.native_zoom()),
            render_queue: RenderQueue::new(options.low_priority_delay()),
            inertia: Inertia::new(options.inertia.clone()),
            options,
            view,
            size,
            transition: None,
            layers: LayerManager::new(),
            images,
            host,
            surface,
            clock,
            handlers,
            events: EventManager::new(),
            hovered: None,
            frame_count: 0,
        };

        map.view = map.resolve_view(&ViewRequest::from(view))?;
        log::debug!(
            "map created at {:?} zoom {:.3}, size {}x{}",
            map.view.center,
            map.view.zoom,
            map.size.x,
            map.size.y
        );
        map.queue_render(RenderPriority::NextFrame);
        Ok(map)
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn size(&self) -> Point {
        self.size
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Snapshot of the current frame parameters
    pub fn state(&self) -> MapState {
        self.state_for(self.view)
    }

    fn state_for(&self, view: View) -> MapState {
        MapState::new(
            view,
            self.size,
            self.options.padding,
            self.options.device_pixel_ratio,
            self.projection,
            self.options.debug,
        )
    }

    pub fn constraints(&self) -> ViewConstraints {
        ViewConstraints::from_options(&self.options, self.size)
    }

    /// Map-space vector to pixels at the current zoom
    pub fn project(&self, coordinate: &Coordinate) -> PixelPoint {
        self.projection.project(coordinate, self.view.zoom)
    }

    pub fn unproject(&self, pixel: &PixelPoint) -> Coordinate {
        self.projection.unproject(pixel, self.view.zoom)
    }

    pub fn map_to_canvas(&self, coordinate: &Coordinate) -> PixelPoint {
        self.state().map_to_canvas(coordinate)
    }

    pub fn canvas_to_map(&self, pixel: &PixelPoint) -> Coordinate {
        self.state().canvas_to_map(pixel)
    }

    /// Resolves `request` against the current view without applying it
    pub fn resolve_view(&self, request: &ViewRequest) -> Result<View> {
        view::resolve_view(&self.view, request, &self.constraints())
    }

    fn set_view(&mut self, view: View) {
        if view != self.view {
            log::trace!("view {:?} zoom {:.4}", view.center, view.zoom);
            self.view = view;
            self.events.emit(MapEvent::ViewChanged { view });
        }
    }

    /// Applies `request` immediately, cancelling any transition
    pub fn jump_to(&mut self, request: &ViewRequest) -> Result<View> {
        let view = self.resolve_view(request)?;
        self.jump_to_view(view);
        Ok(view)
    }

    fn jump_to_view(&mut self, view: View) {
        self.transition = None;
        self.set_view(view);
        self.queue_render(RenderPriority::NextFrame);
    }

    /// Animates towards `request`, replacing any running transition.
    /// Returns the resolved target.
    pub fn ease_to(&mut self, request: &ViewRequest, options: EaseOptions) -> Result<View> {
        let target = self.resolve_view(request)?;
        if options.duration.is_zero() {
            self.jump_to_view(target);
            return Ok(target);
        }

        log::debug!(
            "easing to {:?} zoom {:.3} over {:?}",
            target.center,
            target.zoom,
            options.duration
        );
        let now = self.clock.now();
        self.transition = Some(ViewTransition::new(self.view, target, now, options));
        self.preload(target);
        self.queue_render(RenderPriority::NextFrame);
        Ok(target)
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Stops a running transition where it is
    pub fn stop(&mut self) {
        if self.transition.take().is_some() {
            log::debug!("transition stopped at zoom {:.3}", self.view.zoom);
        }
    }

    /// Warms the cache for `view` without drawing
    fn preload(&mut self, view: View) {
        let state = self.state_for(view);
        let now = self.clock.now();
        let images = &mut self.images;

        self.layers.for_each_visible_mut(|layer| {
            let layer_id = layer.id().to_string();
            let mut context = PreloadContext::new(&state, images, &layer_id, now);
            if let Err(err) = layer.preload(&mut context) {
                log::warn!("preload of layer {} skipped: {}", layer_id, err);
            }
        });
        self.images.submit();
    }

    pub fn resize(&mut self, size: Point) -> Result<()> {
        if !size.is_finite() || size.x < 0.0 || size.y < 0.0 {
            return Err(crate::MapError::InvalidView(format!(
                "invalid canvas size {}x{}",
                size.x, size.y
            )));
        }
        self.size = size;
        let view = self.resolve_view(&ViewRequest::from(self.view))?;
        self.set_view(view);
        self.queue_render(RenderPriority::NextFrame);
        Ok(())
    }

    pub fn set_padding(&mut self, padding: Padding) -> Result<()> {
        if !padding.is_finite() {
            return Err(crate::MapError::InvalidView(
                "padding must be finite".to_string(),
            ));
        }
        self.options.padding = padding;
        self.queue_render(RenderPriority::NextFrame);
        Ok(())
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.options.debug = debug;
        self.queue_render(RenderPriority::NextFrame);
    }

    pub fn add_layer(&mut self, layer: Box<dyn LayerTrait>) -> Result<()> {
        self.layers.add_layer(layer)?;
        self.queue_render(RenderPriority::NextFrame);
        Ok(())
    }

    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Box<dyn LayerTrait>> {
        let removed = self.layers.remove_layer(layer_id);
        if removed.is_some() {
            self.hovered = self.hovered.take().filter(|hit| hit.layer_id != layer_id);
            self.queue_render(RenderPriority::NextFrame);
        }
        removed
    }

    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    /// Typed access to a layer
    pub fn layer<T: LayerTrait + 'static>(&self, layer_id: &str) -> Option<&T> {
        self.layers.get_layer(layer_id)?.as_any().downcast_ref::<T>()
    }

    /// Typed mutable access to a layer. Queues a render, since the caller is
    /// expected to change it.
    pub fn layer_mut<T: LayerTrait + 'static>(&mut self, layer_id: &str) -> Option<&mut T> {
        self.queue_render(RenderPriority::NextFrame);
        self.layers
            .get_layer_mut(layer_id)?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Top-most interactive item under `pixel`
    pub fn hit_test(&self, pixel: &PixelPoint) -> Option<LayerHit> {
        self.layers.hit_test(pixel, &self.state())
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn queue_render(&mut self, priority: RenderPriority) {
        self.render_queue.queue(priority, self.host.as_mut());
    }

    /// Host callback for a requested animation frame
    pub fn on_animation_frame(&mut self, handle: FrameHandle) -> bool {
        if self.render_queue.on_frame(handle) {
            self.render();
            true
        } else {
            false
        }
    }

    /// Host callback for a low-priority render timer
    pub fn on_timer(&mut self, handle: TimerHandle) -> bool {
        if self.render_queue.on_timer(handle) {
            self.render();
            true
        } else {
            false
        }
    }

    /// Drains finished fetches. Arrivals schedule a low-priority render.
    pub fn pump(&mut self) -> usize {
        let arrived = self.images.process_responses(self.clock.now());
        if arrived > 0 {
            self.queue_render(RenderPriority::LowPriority);
        }
        arrived
    }

    /// Draws one frame, consuming any frame or timer still pending
    pub fn render(&mut self) {
        self.render_queue.cancel(self.host.as_mut());
        // z-indices may have changed through `layer_mut`
        self.layers.update_render_order();
        let now = self.clock.now();
        self.images.process_responses(now);

        if let Some(transition) = &self.transition {
            let (view, finished) = transition.view_at(now);
            if finished {
                log::debug!("transition finished at zoom {:.3}", view.zoom);
                self.transition = None;
            }
            self.set_view(view);
        }

        let state = self.state();
        let surface = self.surface.as_mut();
        let images = &mut self.images;

        surface.begin_frame(self.size);
        surface.fill_rect(state.canvas_rect(), self.options.background_color);

        self.layers.for_each_visible_mut(|layer| {
            let layer_id = layer.id().to_string();
            let mut context = RenderContext::new(&mut *surface, &state, images, &layer_id, now);
            if let Err(err) = layer.render(&mut context) {
                log::warn!("layer {} skipped this frame: {}", layer_id, err);
            }
        });

        self.deliver_preloaded();
        self.images.flush(now);
        self.poll_handlers();

        self.frame_count += 1;
        if self.transition.is_some() || self.handlers.needs_poll() {
            self.queue_render(RenderPriority::NextFrame);
        }
    }

    fn deliver_preloaded(&mut self) {
        let mut by_layer: HashMap<String, Vec<PreloadedImage>> = HashMap::default();
        for preloaded in self.images.take_preloaded() {
            by_layer
                .entry(preloaded.layer_id.clone())
                .or_default()
                .push(preloaded);
        }

        for (layer_id, images) in by_layer {
            if let Some(layer) = self.layers.get_layer_mut(&layer_id) {
                layer.images_preloaded(&images);
            }
        }
    }

    fn poll_handlers(&mut self) {
        if !self.handlers.needs_poll() {
            return;
        }

        let state = self.state();
        let context = HandlerContext {
            state: &state,
            now: self.clock.now(),
            min_zoom: self.options.min_zoom,
            max_zoom: self.options.max_zoom,
            config: &self.options.gestures,
        };
        if let Some(gesture) = self.handlers.poll(&context) {
            if let Err(err) = self.apply_gesture(gesture) {
                log::warn!("buffered gesture dropped: {}", err);
            }
        }
    }

    /// Feeds raw input through the gesture handlers
    pub fn handle_event(&mut self, event: InputEvent) -> Result<()> {
        if let InputEvent::Resize { size } = event {
            return self.resize(size);
        }

        let state = self.state();
        let context = HandlerContext {
            state: &state,
            now: self.clock.now(),
            min_zoom: self.options.min_zoom,
            max_zoom: self.options.max_zoom,
            config: &self.options.gestures,
        };
        let gesture = self.handlers.handle(&event, &context);

        if self.handlers.needs_poll() {
            self.queue_render(RenderPriority::NextFrame);
        }

        match gesture {
            Some(gesture) => self.apply_gesture(gesture),
            None => Ok(()),
        }
    }

    fn apply_gesture(&mut self, gesture: Gesture) -> Result<()> {
        let now = self.clock.now();
        match gesture {
            Gesture::Pan(request) => {
                let view = self.resolve_view(&request)?;
                self.inertia.record(now, view);
                self.jump_to_view(view);
            }
            Gesture::PanEnd(request) => {
                let view = self.resolve_view(&request)?;
                self.inertia.record(now, view);
                self.jump_to_view(view);

                if let Some((request, options)) = self.inertia.apply(&self.view, &self.projection, now)
                {
                    self.ease_to(&request, options)?;
                }
            }
            Gesture::Zoom(request, options) => {
                self.ease_to(&request, options)?;
            }
            Gesture::Click(pixel) => {
                if let Some(hit) = self.hit_test(&pixel) {
                    self.events.emit(MapEvent::MarkerClick {
                        layer_id: hit.layer_id,
                        marker_id: hit.item_id,
                    });
                }
            }
            Gesture::Hover(pixel) => {
                let hit = self.hit_test(&pixel);
                if hit != self.hovered {
                    if let Some(previous) = self.hovered.take() {
                        self.events.emit(MapEvent::MarkerLeave {
                            layer_id: previous.layer_id,
                            marker_id: previous.item_id,
                        });
                    }
                    if let Some(current) = &hit {
                        self.events.emit(MapEvent::MarkerOver {
                            layer_id: current.layer_id.clone(),
                            marker_id: current.item_id.clone(),
                        });
                    }
                    self.hovered = hit;
                }
            }
        }
        Ok(())
    }

    pub fn handlers_mut(&mut self) -> &mut HandlerManager {
        &mut self.handlers
    }

    /// Register an event listener, keyed by [`MapEvent::kind`]
    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.events.on(event_type, callback);
    }

    /// Dispatches queued events to listeners and returns them
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        self.events.process_events()
    }
}
