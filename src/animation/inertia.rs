use crate::animation::{easing::Easing, transition::EaseOptions};
use crate::core::{
    config::InertiaConfig,
    geo::Point,
    projection::Projection,
    view::{View, ViewRequest},
};
use instant::Instant;
use std::collections::VecDeque;
use std::time::Duration;

/// Recent views recorded during a pan, used to carry momentum past the release
#[derive(Debug, Clone)]
pub struct Inertia {
    config: InertiaConfig,
    buffer: VecDeque<(Instant, View)>,
}

struct Decay {
    duration: f64,
    amount: f64,
}

impl Inertia {
    pub fn new(config: InertiaConfig) -> Self {
        Self {
            config,
            buffer: VecDeque::new(),
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn remove_expired(&mut self, now: Instant) {
        let window = self.config.window();
        while let Some((time, _)) = self.buffer.front() {
            if now.saturating_duration_since(*time) > window {
                self.buffer.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn record(&mut self, now: Instant, view: View) {
        self.remove_expired(now);
        self.buffer.push_back((now, view));
    }

    /// Builds the momentum ease for a release at `now`, if the recorded motion
    /// warrants one. Consumes the buffer.
    pub fn apply(
        &mut self,
        current: &View,
        projection: &Projection,
        now: Instant,
    ) -> Option<(ViewRequest, EaseOptions)> {
        if !self.config.enabled {
            self.buffer.clear();
            return None;
        }
        self.remove_expired(now);

        let (start_time, start) = *self.buffer.front()?;
        let (end_time, end) = *self.buffer.back()?;
        self.buffer.clear();

        let elapsed = end_time.saturating_duration_since(start_time).as_secs_f64();
        if elapsed <= 0.0 {
            return None;
        }

        let zoom_delta = end.zoom - start.zoom;
        let center_delta_px = projection.project(&end.center.subtract(&start.center), current.zoom);
        let center_distance = center_delta_px.length();

        let zoom = self.decay(zoom_delta, elapsed, self.config.zoom_deceleration);
        let pan = self.decay(center_distance, elapsed, self.config.center_deceleration);

        let duration = zoom.duration.max(pan.duration);
        if !(duration > 0.0) {
            return None;
        }

        let offset = if center_distance > 0.0 {
            projection.unproject(
                &center_delta_px.multiply(pan.amount / center_distance),
                current.zoom,
            )
        } else {
            Point::default()
        };

        let request = ViewRequest::new()
            .center(current.center.add(&offset))
            .zoom(current.zoom + zoom.amount);
        let ease = EaseOptions::new(Duration::from_secs_f64(duration)).with_easing(Easing::EaseOutCubic);

        log::debug!(
            "inertia: pan {:.1}px zoom {:+.3} over {:.0}ms",
            pan.amount,
            zoom.amount,
            duration * 1000.0
        );
        Some((request, ease))
    }

    /// Linear deceleration from the observed speed. Durations are in seconds.
    fn decay(&self, amount: f64, elapsed: f64, deceleration: f64) -> Decay {
        let linearity = self.config.linearity;
        let max_speed = self.config.max_speed;

        let speed = (amount * linearity / elapsed).clamp(-max_speed, max_speed);
        let duration = speed.abs() / (deceleration * linearity);

        Decay {
            duration,
            amount: speed * (duration / 2.0),
        }
    }
}

impl Default for Inertia {
    fn default() -> Self {
        Self::new(InertiaConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection() -> Projection {
        Projection::new(0.0)
    }

    #[test]
    fn test_needs_two_samples() {
        let mut inertia = Inertia::default();
        let now = Instant::now();
        let view = View::new(Point::new(0.0, 0.0), 0.0);

        inertia.record(now, view);
        assert!(inertia.apply(&view, &projection(), now).is_none());
    }

    #[test]
    fn test_expired_samples_are_dropped() {
        let mut inertia = Inertia::default();
        let t0 = Instant::now();

        inertia.record(t0, View::new(Point::new(0.0, 0.0), 0.0));
        inertia.record(t0 + Duration::from_millis(20), View::new(Point::new(10.0, 0.0), 0.0));

        let release = t0 + Duration::from_millis(400);
        let current = View::new(Point::new(10.0, 0.0), 0.0);
        assert!(inertia.apply(&current, &projection(), release).is_none());
    }

    #[test]
    fn test_pan_momentum() {
        let mut inertia = Inertia::default();
        let t0 = Instant::now();

        // 100px in 100ms: speed = 100 * 0.3 / 0.1 = 300
        inertia.record(t0, View::new(Point::new(0.0, 0.0), 0.0));
        inertia.record(t0 + Duration::from_millis(100), View::new(Point::new(100.0, 0.0), 0.0));

        let current = View::new(Point::new(100.0, 0.0), 0.0);
        let (request, ease) = inertia
            .apply(&current, &projection(), t0 + Duration::from_millis(110))
            .unwrap();

        // duration = 300 / (4000 * 0.3) = 0.25s, amount = 300 * 0.125 = 37.5
        assert!((ease.duration.as_secs_f64() - 0.25).abs() < 1e-9);
        let center = request.center.unwrap();
        assert!((center.x - 137.5).abs() < 1e-9);
        assert_eq!(center.y, 0.0);
        assert_eq!(request.zoom, Some(0.0));
        assert!(inertia.is_empty());
    }

    #[test]
    fn test_speed_is_capped() {
        let mut inertia = Inertia::default();
        let t0 = Instant::now();

        inertia.record(t0, View::new(Point::new(0.0, 0.0), 0.0));
        inertia.record(t0 + Duration::from_millis(10), View::new(Point::new(10_000.0, 0.0), 0.0));

        let current = View::new(Point::new(10_000.0, 0.0), 0.0);
        let (_, ease) = inertia
            .apply(&current, &projection(), t0 + Duration::from_millis(10))
            .unwrap();

        // 1400 / (4000 * 0.3)
        assert!((ease.duration.as_secs_f64() - 1400.0 / 1200.0).abs() < 1e-9);
    }

    #[test]
    fn test_stationary_release_has_no_momentum() {
        let mut inertia = Inertia::default();
        let t0 = Instant::now();
        let view = View::new(Point::new(5.0, 5.0), 2.0);

        inertia.record(t0, view);
        inertia.record(t0 + Duration::from_millis(50), view);
        assert!(inertia.apply(&view, &projection(), t0 + Duration::from_millis(60)).is_none());
    }
}
