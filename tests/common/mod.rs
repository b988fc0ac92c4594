//! Headless driver shared by the integration tests

#![allow(dead_code)]

use mapview::prelude::*;
use mapview::rendering::scheduler::{FrameHandle, TimerHandle};

pub struct Harness {
    pub map: Map,
    pub clock: ManualClock,
    pub host: ManualHost,
    pub surface: RecordingSurface,
    pub executor: ManualExecutor,
}

impl Harness {
    pub fn new(options: MapOptions, view: View) -> Self {
        Self::with_size(options, view, Point::new(800.0, 600.0))
    }

    pub fn with_size(options: MapOptions, view: View, size: Point) -> Self {
        let clock = ManualClock::new();
        let host = ManualHost::new(Arc::new(clock.clone()));
        let surface = RecordingSurface::new();
        let executor = ManualExecutor::new();

        let map = MapBuilder::new()
            .with_options(options)
            .with_size(size)
            .with_view(view)
            .with_clock(Arc::new(clock.clone()))
            .with_host(Box::new(host.clone()))
            .with_surface(Box::new(surface.clone()))
            .with_executor(Box::new(executor.clone()))
            .build()
            .expect("valid map");

        Self {
            map,
            clock,
            host,
            surface,
            executor,
        }
    }

    /// Runs every pending animation frame; returns how many rendered
    pub fn frames(&mut self) -> usize {
        let frames: Vec<FrameHandle> = self.host.take_frames();
        frames
            .into_iter()
            .filter(|frame| self.map.on_animation_frame(*frame))
            .count()
    }

    /// Runs every due low-priority timer; returns how many rendered
    pub fn timers(&mut self) -> usize {
        let timers: Vec<TimerHandle> = self.host.take_due_timers();
        timers
            .into_iter()
            .filter(|timer| self.map.on_timer(*timer))
            .count()
    }

    /// Advances the clock frame by frame for `ms` milliseconds
    pub fn run_for(&mut self, ms: u64) {
        let mut elapsed = 0;
        while elapsed < ms {
            let step = 16.min(ms - elapsed);
            self.clock.advance_ms(step);
            elapsed += step;
            self.frames();
            self.timers();
        }
    }

    /// Completes every submitted fetch with a solid 256x256 tile
    pub fn complete_all(&self) -> usize {
        self.executor
            .complete_all(|_| Some(Image::solid(256, 256, Color::WHITE)))
    }

    pub fn send(&mut self, event: InputEvent) {
        self.map.handle_event(event).expect("event handled");
    }
}

pub fn approx(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon
}
