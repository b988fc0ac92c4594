//! Wheel and trackpad zoom.
//!
//! Mouse wheels report large deltas in fixed steps, trackpads report small,
//! frequent ones. The first event after a pause is ambiguous, so it is held
//! back briefly and classified by the event that follows it.

use crate::animation::{EaseOptions, Easing};
use crate::core::{
    constants::{SCROLL_CLASSIFY_DELAY_MS, SCROLL_IDLE_MS, WHEEL_DELTA_STEP, WHEEL_LINE_HEIGHT},
    geo::PixelPoint,
    view::ViewRequest,
};
use crate::input::{
    events::{InputEvent, WheelMode},
    handler::{Gesture, Handler, HandlerContext},
};
use instant::Instant;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollKind {
    Wheel,
    Trackpad,
}

#[derive(Debug, Clone, Copy)]
struct PendingScroll {
    delta: f64,
    position: PixelPoint,
    at: Instant,
}

#[derive(Debug, Clone, Copy)]
struct RunningZoom {
    target: f64,
    until: Instant,
}

#[derive(Debug, Default)]
pub struct ScrollZoomHandler {
    kind: Option<ScrollKind>,
    last_event: Option<Instant>,
    pending: Option<PendingScroll>,
    running: Option<RunningZoom>,
}

impl ScrollZoomHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classification of the current scroll sequence
    pub fn kind(&self) -> Option<ScrollKind> {
        self.kind
    }

    fn zoom(
        &mut self,
        kind: ScrollKind,
        delta: f64,
        position: PixelPoint,
        context: &HandlerContext<'_>,
    ) -> Option<Gesture> {
        if delta == 0.0 {
            return None;
        }

        let config = context.config;
        let (rate, ease_ms) = match kind {
            ScrollKind::Wheel => (config.wheel_zoom_rate, config.wheel_ease_ms),
            ScrollKind::Trackpad => (config.trackpad_zoom_rate, config.trackpad_ease_ms),
        };

        // scrolling down zooms out
        let scale = 2.0 / (1.0 + (-(delta * rate).abs()).exp());
        let zoom_delta = -delta.signum() * scale.log2();

        let now = context.now;
        let base = match self.running {
            Some(running) if now < running.until => running.target,
            _ => context.state.zoom(),
        };
        let target = (base + zoom_delta).clamp(context.min_zoom, context.max_zoom);

        let duration = Duration::from_millis(ease_ms);
        self.running = Some(RunningZoom {
            target,
            until: now + duration,
        });

        log::trace!("{:?} scroll {:.2} -> zoom {:.3}", kind, delta, target);

        Some(Gesture::Zoom(
            ViewRequest::new()
                .zoom(target)
                .around(context.state.canvas_to_map(&position)),
            EaseOptions::new(duration).with_easing(Easing::EaseOutSine),
        ))
    }
}

impl Handler for ScrollZoomHandler {
    fn name(&self) -> &'static str {
        "scroll_zoom"
    }

    fn handle(&mut self, event: &InputEvent, context: &HandlerContext<'_>) -> Option<Gesture> {
        let InputEvent::Wheel {
            position,
            delta_y,
            mode,
            modifiers,
        } = *event
        else {
            return None;
        };

        let mut delta = match mode {
            WheelMode::Line => delta_y * WHEEL_LINE_HEIGHT,
            WheelMode::Pixel => delta_y,
        };
        if modifiers.shift && delta != 0.0 {
            delta /= 4.0;
        }

        let now = context.now;
        let idle_ms = self
            .last_event
            .map_or(f64::INFINITY, |t| now.saturating_duration_since(t).as_secs_f64() * 1000.0);
        self.last_event = Some(now);

        if delta != 0.0 && delta % WHEEL_DELTA_STEP == 0.0 {
            self.kind = Some(ScrollKind::Wheel);
        } else if delta != 0.0 && delta.abs() < 4.0 {
            self.kind = Some(ScrollKind::Trackpad);
        } else if idle_ms > SCROLL_IDLE_MS as f64 {
            self.kind = None;
            self.pending = Some(PendingScroll {
                delta,
                position,
                at: now,
            });
            return None;
        } else if self.kind.is_none() {
            self.kind = Some(if (idle_ms * delta).abs() < 200.0 {
                ScrollKind::Trackpad
            } else {
                ScrollKind::Wheel
            });
        }

        if let Some(pending) = self.pending.take() {
            delta += pending.delta;
        }

        let kind = self.kind?;
        self.zoom(kind, delta, position, context)
    }

    fn poll(&mut self, context: &HandlerContext<'_>) -> Option<Gesture> {
        let pending = self.pending?;
        let waited = context.now.saturating_duration_since(pending.at);
        if waited < Duration::from_millis(SCROLL_CLASSIFY_DELAY_MS) {
            return None;
        }

        // nothing followed the buffered event
        self.pending = None;
        self.kind = Some(ScrollKind::Wheel);
        self.zoom(ScrollKind::Wheel, pending.delta, pending.position, context)
    }

    fn needs_poll(&self) -> bool {
        self.pending.is_some()
    }
}
