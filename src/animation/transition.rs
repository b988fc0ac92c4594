//! Eased view transitions.
//!
//! Center moves linearly in map space. Zoom follows the curve
//! `s(x) = (2^-dz - 1)·x + 1`, `zoom = start + log2(1/s)`, which makes the
//! apparent scale change uniformly over the animation.

use crate::animation::easing::Easing;
use crate::core::{constants, view::View};
use instant::Instant;
use std::time::Duration;

/// Timing for an eased view change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EaseOptions {
    pub duration: Duration,
    pub easing: Easing,
}

impl EaseOptions {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            easing: Easing::default(),
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl Default for EaseOptions {
    fn default() -> Self {
        Self::from_millis(constants::DEFAULT_EASE_DURATION_MS)
    }
}

/// An in-flight animation between two views
#[derive(Debug, Clone)]
pub struct ViewTransition {
    start: View,
    target: View,
    start_time: Instant,
    duration: Duration,
    easing: Easing,
}

impl ViewTransition {
    pub fn new(start: View, target: View, start_time: Instant, options: EaseOptions) -> Self {
        Self {
            start,
            target,
            start_time,
            duration: options.duration,
            easing: options.easing,
        }
    }

    pub fn start(&self) -> &View {
        &self.start
    }

    pub fn target(&self) -> &View {
        &self.target
    }

    /// View at `now`, and whether the transition has finished.
    /// A finished transition yields exactly the target view.
    pub fn view_at(&self, now: Instant) -> (View, bool) {
        let elapsed = now.saturating_duration_since(self.start_time);
        if elapsed >= self.duration {
            return (self.target, true);
        }

        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let x = self.easing.apply(t);

        let center = self.start.center.lerp(&self.target.center, x);
        let zoom = interpolate_zoom(self.start.zoom, self.target.zoom, x);

        (View::new(center, zoom), false)
    }
}

fn interpolate_zoom(start: f64, target: f64, x: f64) -> f64 {
    let delta = target - start;
    if delta == 0.0 {
        return start;
    }
    let s = ((-delta).exp2() - 1.0) * x + 1.0;
    start + (1.0 / s).log2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Point;

    fn transition(start_time: Instant) -> ViewTransition {
        ViewTransition::new(
            View::new(Point::new(0.0, 0.0), 2.0),
            View::new(Point::new(100.0, 50.0), 4.0),
            start_time,
            EaseOptions::from_millis(1000).with_easing(Easing::Linear),
        )
    }

    #[test]
    fn test_finishes_exactly_on_target() {
        let t0 = Instant::now();
        let transition = transition(t0);

        let (view, finished) = transition.view_at(t0 + Duration::from_millis(1000));
        assert!(finished);
        assert_eq!(view, *transition.target());

        let (late, finished) = transition.view_at(t0 + Duration::from_secs(5));
        assert!(finished);
        assert_eq!(late, *transition.target());
    }

    #[test]
    fn test_midpoint() {
        let t0 = Instant::now();
        let (view, finished) = transition(t0).view_at(t0 + Duration::from_millis(500));
        assert!(!finished);
        assert_eq!(view.center, Point::new(50.0, 25.0));

        // s(0.5) = (1/4 - 1)/2 + 1 = 0.625
        let expected = 2.0 + (1.0f64 / 0.625).log2();
        assert!((view.zoom - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_is_monotonic() {
        let t0 = Instant::now();
        let transition = transition(t0);
        let mut last = 2.0;
        for ms in (0..=1000).step_by(50) {
            let (view, _) = transition.view_at(t0 + Duration::from_millis(ms));
            assert!(view.zoom >= last);
            last = view.zoom;
        }
    }

    #[test]
    fn test_zoom_out() {
        assert!((interpolate_zoom(4.0, 2.0, 1.0) - 2.0).abs() < 1e-12);
        assert_eq!(interpolate_zoom(4.0, 2.0, 0.0), 4.0);
    }
}
