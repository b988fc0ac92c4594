//! View state and the resolver that turns a [`ViewRequest`] into a concrete,
//! clamped [`View`].

use crate::core::{
    bounds::Bounds,
    config::MapOptions,
    constants::ZOOM_SNAP_EPSILON,
    geo::{Coordinate, Padding, Point},
    projection::Projection,
};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

/// An immutable center/zoom snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub center: Coordinate,
    pub zoom: f64,
}

impl View {
    pub fn new(center: Coordinate, zoom: f64) -> Self {
        Self { center, zoom }
    }
}

/// A partial description of a desired view. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewRequest {
    pub center: Option<Coordinate>,
    pub zoom: Option<f64>,
    /// Keep this coordinate fixed on screen while the zoom changes
    pub around: Option<Coordinate>,
    /// Fit the whole box inside the padded viewport
    pub contain: Option<Bounds>,
    /// Fill the padded viewport with the box
    pub cover: Option<Bounds>,
    /// Overrides the configured padding for this request only
    pub padding: Option<Padding>,
    /// `None` aligns only requests that reposition the center
    pub align_to_pixels: Option<bool>,
}

impl ViewRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn center(mut self, center: impl Into<Coordinate>) -> Self {
        self.center = Some(center.into());
        self
    }

    pub fn zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn around(mut self, around: impl Into<Coordinate>) -> Self {
        self.around = Some(around.into());
        self
    }

    pub fn contain(mut self, bounds: Bounds) -> Self {
        self.contain = Some(bounds);
        self
    }

    pub fn cover(mut self, bounds: Bounds) -> Self {
        self.cover = Some(bounds);
        self
    }

    pub fn padding(mut self, padding: Padding) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn align_to_pixels(mut self, align: bool) -> Self {
        self.align_to_pixels = Some(align);
        self
    }

    fn validate(&self) -> Result<()> {
        let points = self.center.iter().chain(self.around.iter());
        let boxes = self.contain.iter().chain(self.cover.iter());

        if self.zoom.map_or(false, f64::is_nan) {
            return Err(MapError::InvalidView("zoom is NaN".to_string()));
        }
        for p in points {
            if !p.is_finite() {
                return Err(MapError::InvalidView(format!(
                    "non-finite coordinate {:?}",
                    p
                )));
            }
        }
        for b in boxes {
            if !b.is_finite() || !b.is_valid() {
                return Err(MapError::InvalidView(format!("invalid bounds {:?}", b)));
            }
        }
        if self.contain.is_some() && self.cover.is_some() {
            return Err(MapError::InvalidView(
                "contain and cover are mutually exclusive".to_string(),
            ));
        }
        if let Some(padding) = &self.padding {
            if !padding.is_finite() {
                return Err(MapError::InvalidView("non-finite padding".to_string()));
            }
        }
        Ok(())
    }
}

impl From<View> for ViewRequest {
    fn from(view: View) -> Self {
        ViewRequest::new().center(view.center).zoom(view.zoom)
    }
}

/// Everything besides the current view that resolution depends on
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConstraints {
    pub projection: Projection,
    /// Canvas size in CSS pixels
    pub size: Point,
    pub padding: Padding,
    pub device_pixel_ratio: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_snap: f64,
    pub bounds: Option<Bounds>,
}

impl ViewConstraints {
    pub fn from_options(options: &MapOptions, size: Point) -> Self {
        Self {
            projection: Projection::new(options.native_zoom()),
            size,
            padding: options.padding,
            device_pixel_ratio: options.device_pixel_ratio,
            min_zoom: options.min_zoom,
            max_zoom: options.max_zoom,
            zoom_snap: options.zoom_snap,
            bounds: options.bounds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnapMode {
    Nearest,
    Down,
    Up,
}

/// Resolves `request` against the `current` view.
///
/// Rejects NaN and non-finite positions; out-of-range zoom (including
/// infinities) is clamped.
pub fn resolve_view(
    current: &View,
    request: &ViewRequest,
    constraints: &ViewConstraints,
) -> Result<View> {
    request.validate()?;

    let padding = request.padding.unwrap_or(constraints.padding);
    let inner = padding.inner_size(&constraints.size);
    let native_scale = constraints.projection.native_scale();

    let mut center = request.center.unwrap_or(current.center);
    let mut zoom = request.zoom.unwrap_or(current.zoom);
    let mut snap = SnapMode::Nearest;
    let mut repositioned = request.center.is_some();

    if let Some(contain) = &request.contain {
        let fit = fit_zoom(&inner, contain, native_scale, f64::min);
        zoom = request.zoom.map_or(fit, |z| z.min(fit));
        center = contain.center();
        snap = SnapMode::Down;
        repositioned = true;
    } else if let Some(cover) = &request.cover {
        zoom = fit_zoom(&inner, cover, native_scale, f64::max);
        center = cover.center();
        snap = SnapMode::Up;
        repositioned = true;
    }

    zoom = snap_zoom(zoom, constraints.zoom_snap, snap);
    zoom = zoom.clamp(constraints.min_zoom, constraints.max_zoom);

    if let Some(around) = &request.around {
        if zoom != current.zoom {
            let factor = 1.0 - (current.zoom - zoom).exp2();
            center = center.add(&around.subtract(&center).multiply(factor));
            repositioned = true;
        }
    }

    if let Some(bounds) = &constraints.bounds {
        center = bounds.clamp(&center);
    }

    if request.align_to_pixels.unwrap_or(repositioned) {
        center = align_center(&center, zoom, constraints, &padding);
    }

    Ok(View::new(center, zoom))
}

/// Zoom at which `target` fills `inner`, combining the per-axis zooms with `pick`.
/// Degenerate axes are ignored; a box with no extent fits at any zoom.
fn fit_zoom(inner: &Point, target: &Bounds, native_scale: f64, pick: fn(f64, f64) -> f64) -> f64 {
    let axes = [(inner.x, target.width()), (inner.y, target.height())];
    axes.iter()
        .filter(|(_, extent)| *extent > 0.0)
        .map(|(available, extent)| (available * native_scale / extent).log2())
        .reduce(pick)
        .unwrap_or(f64::INFINITY)
}

fn snap_zoom(zoom: f64, snap: f64, mode: SnapMode) -> f64 {
    if snap <= 0.0 || !zoom.is_finite() {
        return zoom;
    }
    let steps = zoom / snap;
    let snapped = match mode {
        SnapMode::Nearest => steps.round(),
        SnapMode::Down => (steps + ZOOM_SNAP_EPSILON).floor(),
        SnapMode::Up => (steps - ZOOM_SNAP_EPSILON).ceil(),
    };
    snapped * snap
}

/// Moves `center` so the map origin lands on a whole device pixel
fn align_center(
    center: &Coordinate,
    zoom: f64,
    constraints: &ViewConstraints,
    padding: &Padding,
) -> Coordinate {
    let projection = &constraints.projection;
    let dpr = constraints.device_pixel_ratio;
    let anchor = padding.center_of(&constraints.size);

    let origin = anchor.subtract(&projection.project(center, zoom));
    let aligned = origin.multiply(dpr).round().divide(dpr);

    projection.unproject(&anchor.subtract(&aligned), zoom)
}
