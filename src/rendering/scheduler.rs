//! Render coalescing.
//!
//! Any number of render requests between two frames collapse into at most one
//! pending frame callback or one pending low-priority timer. A next-frame
//! request supersedes a pending timer.

use crate::core::clock::Clock;
use instant::Instant;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenderPriority {
    /// Render after a short delay; used when new images arrive
    LowPriority,
    /// Render on the next animation frame
    NextFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Frame and timer capability provided by the embedding host.
///
/// The host later calls [`Map::on_animation_frame`](crate::Map::on_animation_frame)
/// or [`Map::on_timer`](crate::Map::on_timer) with the returned handle.
pub trait RenderHost: Send {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
    fn start_timer(&mut self, delay: Duration) -> TimerHandle;
    fn cancel_timer(&mut self, handle: TimerHandle);
}

#[derive(Debug)]
pub struct RenderQueue {
    low_priority_delay: Duration,
    pending_frame: Option<FrameHandle>,
    pending_timer: Option<TimerHandle>,
}

impl RenderQueue {
    pub fn new(low_priority_delay: Duration) -> Self {
        Self {
            low_priority_delay,
            pending_frame: None,
            pending_timer: None,
        }
    }

    pub fn queue(&mut self, priority: RenderPriority, host: &mut dyn RenderHost) {
        if self.pending_frame.is_some() {
            return;
        }
        match priority {
            RenderPriority::NextFrame => {
                if let Some(timer) = self.pending_timer.take() {
                    host.cancel_timer(timer);
                }
                self.pending_frame = Some(host.request_frame());
            }
            RenderPriority::LowPriority => {
                if self.pending_timer.is_none() {
                    self.pending_timer = Some(host.start_timer(self.low_priority_delay));
                }
            }
        }
    }

    /// Cancels whatever is pending. Calling it with nothing pending is a no-op.
    pub fn cancel(&mut self, host: &mut dyn RenderHost) {
        if let Some(frame) = self.pending_frame.take() {
            host.cancel_frame(frame);
        }
        if let Some(timer) = self.pending_timer.take() {
            host.cancel_timer(timer);
        }
    }

    /// Returns `true` if `handle` is the pending frame, consuming it
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        if self.pending_frame == Some(handle) {
            self.pending_frame = None;
            true
        } else {
            false
        }
    }

    /// Returns `true` if `handle` is the pending timer, consuming it
    pub fn on_timer(&mut self, handle: TimerHandle) -> bool {
        if self.pending_timer == Some(handle) {
            self.pending_timer = None;
            true
        } else {
            false
        }
    }

    /// Highest priority currently pending
    pub fn queued(&self) -> Option<RenderPriority> {
        if self.pending_frame.is_some() {
            Some(RenderPriority::NextFrame)
        } else if self.pending_timer.is_some() {
            Some(RenderPriority::LowPriority)
        } else {
            None
        }
    }
}

/// In-memory host for headless drivers and tests. Clones share state, so the
/// driver keeps one handle while the map owns another.
#[derive(Clone)]
pub struct ManualHost {
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<ManualHostState>>,
}

#[derive(Default)]
struct ManualHostState {
    next_id: u64,
    frames: Vec<FrameHandle>,
    timers: Vec<(TimerHandle, Instant)>,
}

impl ManualHost {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Arc::new(Mutex::new(ManualHostState::default())),
        }
    }

    /// Takes every requested frame
    pub fn take_frames(&self) -> Vec<FrameHandle> {
        self.state
            .lock()
            .map(|mut s| std::mem::take(&mut s.frames))
            .unwrap_or_default()
    }

    /// Takes the timers whose delay has elapsed on the host clock
    pub fn take_due_timers(&self) -> Vec<TimerHandle> {
        let now = self.clock.now();
        let Ok(mut state) = self.state.lock() else {
            return Vec::new();
        };
        let (due, pending): (Vec<_>, Vec<_>) = state.timers.drain(..).partition(|(_, at)| *at <= now);
        state.timers = pending;
        due.into_iter().map(|(handle, _)| handle).collect()
    }

    pub fn pending_frames(&self) -> usize {
        self.state.lock().map(|s| s.frames.len()).unwrap_or(0)
    }

    pub fn pending_timers(&self) -> usize {
        self.state.lock().map(|s| s.timers.len()).unwrap_or(0)
    }

    fn next_id(state: &mut ManualHostState) -> u64 {
        state.next_id += 1;
        state.next_id
    }
}

impl RenderHost for ManualHost {
    fn request_frame(&mut self) -> FrameHandle {
        let Ok(mut state) = self.state.lock() else {
            return FrameHandle(0);
        };
        let handle = FrameHandle(Self::next_id(&mut state));
        state.frames.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Ok(mut state) = self.state.lock() {
            state.frames.retain(|h| *h != handle);
        }
    }

    fn start_timer(&mut self, delay: Duration) -> TimerHandle {
        let due = self.clock.now() + delay;
        let Ok(mut state) = self.state.lock() else {
            return TimerHandle(0);
        };
        let handle = TimerHandle(Self::next_id(&mut state));
        state.timers.push((handle, due));
        handle
    }

    fn cancel_timer(&mut self, handle: TimerHandle) {
        if let Ok(mut state) = self.state.lock() {
            state.timers.retain(|(h, _)| *h != handle);
        }
    }
}
