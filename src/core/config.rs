//! Configuration for the map and its subsystems
//!
//! Every group deserializes from JSON with per-field defaults, so a config file
//! only has to name the values it changes.

use crate::core::{bounds::Bounds, constants, geo::Padding};
use crate::rendering::surface::Color;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level map options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom level at which map coordinates equal pixels. Defaults to `max_zoom`.
    pub native_zoom: Option<f64>,
    /// Zoom quantum; `0` disables snapping
    pub zoom_snap: f64,
    /// Extent the view center is kept inside
    pub bounds: Option<Bounds>,
    pub background_color: Color,
    pub padding: Padding,
    pub device_pixel_ratio: f64,
    pub low_priority_delay_ms: u64,
    /// Outline tiles and mark missing ones while rendering
    pub debug: bool,
    pub cache: ImageCacheConfig,
    pub gestures: GestureConfig,
    pub inertia: InertiaConfig,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            min_zoom: 0.0,
            max_zoom: 18.0,
            native_zoom: None,
            zoom_snap: 0.0,
            bounds: None,
            background_color: Color::BLACK,
            padding: Padding::default(),
            device_pixel_ratio: 1.0,
            low_priority_delay_ms: constants::LOW_PRIORITY_RENDER_DELAY_MS,
            debug: false,
            cache: ImageCacheConfig::default(),
            gestures: GestureConfig::default(),
            inertia: InertiaConfig::default(),
        }
    }
}

impl MapOptions {
    /// Parses options from JSON and validates them
    pub fn from_json(json: &str) -> Result<Self> {
        let options: MapOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn native_zoom(&self) -> f64 {
        self.native_zoom.unwrap_or(self.max_zoom)
    }

    pub fn low_priority_delay(&self) -> Duration {
        Duration::from_millis(self.low_priority_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min_zoom.is_finite() || !self.max_zoom.is_finite() {
            return Err(MapError::InvalidConfig(
                "zoom limits must be finite".to_string(),
            ));
        }
        if self.min_zoom > self.max_zoom {
            return Err(MapError::InvalidConfig(format!(
                "min_zoom {} exceeds max_zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !self.native_zoom().is_finite() {
            return Err(MapError::InvalidConfig(
                "native_zoom must be finite".to_string(),
            ));
        }
        if !self.zoom_snap.is_finite() || self.zoom_snap < 0.0 {
            return Err(MapError::InvalidConfig(format!(
                "zoom_snap must be a non-negative number, got {}",
                self.zoom_snap
            )));
        }
        if !self.device_pixel_ratio.is_finite() || self.device_pixel_ratio <= 0.0 {
            return Err(MapError::InvalidConfig(format!(
                "device_pixel_ratio must be positive, got {}",
                self.device_pixel_ratio
            )));
        }
        if let Some(bounds) = &self.bounds {
            if !bounds.is_finite() || !bounds.is_valid() {
                return Err(MapError::InvalidConfig(format!(
                    "invalid map bounds {:?}",
                    bounds
                )));
            }
        }
        if !self.padding.is_finite() {
            return Err(MapError::InvalidConfig("padding must be finite".to_string()));
        }
        self.inertia.validate()
    }
}

/// Retention policy for the image cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageCacheConfig {
    pub retention_ms: u64,
    pub sweep_interval_ms: u64,
    pub render_grace_ms: u64,
    pub failure_backoff_ms: u64,
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            retention_ms: constants::IMAGE_RETENTION_MS,
            sweep_interval_ms: constants::CACHE_SWEEP_INTERVAL_MS,
            render_grace_ms: constants::RENDER_GRACE_MS,
            failure_backoff_ms: constants::FETCH_FAILURE_BACKOFF_MS,
        }
    }
}

impl ImageCacheConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_millis(self.retention_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn render_grace(&self) -> Duration {
        Duration::from_millis(self.render_grace_ms)
    }

    pub fn failure_backoff(&self) -> Duration {
        Duration::from_millis(self.failure_backoff_ms)
    }
}

/// Which gesture handlers are installed, and how they feel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub scroll_zoom: bool,
    pub pan: bool,
    pub click_zoom: bool,
    pub interaction: bool,
    pub drag_threshold: f64,
    pub wheel_zoom_rate: f64,
    pub trackpad_zoom_rate: f64,
    pub wheel_ease_ms: u64,
    pub trackpad_ease_ms: u64,
    pub click_zoom_delta: f64,
    pub click_zoom_duration_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            scroll_zoom: true,
            pan: true,
            click_zoom: true,
            interaction: true,
            drag_threshold: constants::DRAG_THRESHOLD,
            wheel_zoom_rate: constants::WHEEL_ZOOM_RATE,
            trackpad_zoom_rate: constants::TRACKPAD_ZOOM_RATE,
            wheel_ease_ms: constants::WHEEL_EASE_MS,
            trackpad_ease_ms: constants::TRACKPAD_EASE_MS,
            click_zoom_delta: 1.0,
            click_zoom_duration_ms: constants::CLICK_ZOOM_DURATION_MS,
        }
    }
}

/// Momentum applied when a pan is released
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InertiaConfig {
    pub enabled: bool,
    pub window_ms: u64,
    pub max_speed: f64,
    pub linearity: f64,
    pub center_deceleration: f64,
    pub zoom_deceleration: f64,
}

impl Default for InertiaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: constants::INERTIA_WINDOW_MS,
            max_speed: constants::INERTIA_MAX_SPEED,
            linearity: constants::INERTIA_LINEARITY,
            center_deceleration: constants::INERTIA_CENTER_DECELERATION,
            zoom_deceleration: constants::INERTIA_ZOOM_DECELERATION,
        }
    }
}

impl InertiaConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.linearity)
            || !positive(self.max_speed)
            || !positive(self.center_deceleration)
            || !positive(self.zoom_deceleration)
        {
            return Err(MapError::InvalidConfig(
                "inertia parameters must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = MapOptions::default();
        assert_eq!(options.native_zoom(), 18.0);
        assert_eq!(options.low_priority_delay(), Duration::from_millis(80));
        assert_eq!(options.cache.retention(), Duration::from_secs(10));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let options = MapOptions::from_json(
            r##"{
                "min_zoom": 1,
                "max_zoom": 7,
                "zoom_snap": 0.5,
                "bounds": { "min": { "x": 0, "y": 0 }, "max": { "x": 81920, "y": 114688 } },
                "background_color": "#112233",
                "padding": { "top": 16, "right": 80, "bottom": 80, "left": 16 },
                "cache": { "retention_ms": 2000 }
            }"##,
        )
        .unwrap();

        assert_eq!(options.min_zoom, 1.0);
        assert_eq!(options.native_zoom(), 7.0);
        assert_eq!(options.background_color, Color::rgb(0x11, 0x22, 0x33));
        assert_eq!(options.padding.right, 80.0);
        assert_eq!(options.cache.retention_ms, 2000);
        assert_eq!(options.cache.sweep_interval_ms, 1000);
        assert!(options.gestures.pan);
    }

    #[test]
    fn test_validation_rejects_inverted_zoom() {
        let result = MapOptions::from_json(r#"{ "min_zoom": 5, "max_zoom": 2 }"#);
        assert!(matches!(result, Err(MapError::InvalidConfig(_))));
    }

    #[test]
    fn test_validation_rejects_bad_color() {
        let result = MapOptions::from_json(r#"{ "background_color": "teal" }"#);
        assert!(matches!(result, Err(MapError::Serialization(_))));
    }
}
