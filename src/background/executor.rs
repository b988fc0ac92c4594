use crate::images::Image;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A request for one image source
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub src: String,
    /// Higher values are dispatched first
    pub priority: f64,
}

/// Outcome of a fetch. `image` is `None` when fetching or decoding failed.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub src: String,
    pub image: Option<Image>,
}

/// Off-thread fetch/decode capability consumed by the image cache
pub trait BackgroundExecutor: Send {
    /// Hands over a batch of requests. Must not block.
    fn submit(&self, batch: Vec<FetchRequest>);

    /// Returns every response finished since the previous call. Must not block.
    fn drain_completed(&self) -> Vec<FetchResponse>;
}

/// Executor completed by hand, for tests and deterministic drivers.
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ManualExecutor {
    state: Arc<Mutex<ManualExecutorState>>,
}

#[derive(Debug, Default)]
struct ManualExecutorState {
    submitted: Vec<FetchRequest>,
    completed: VecDeque<FetchResponse>,
}

impl ManualExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes everything submitted since the last call
    pub fn take_submitted(&self) -> Vec<FetchRequest> {
        self.state
            .lock()
            .map(|mut s| std::mem::take(&mut s.submitted))
            .unwrap_or_default()
    }

    /// Queues a response, to be picked up by the next drain
    pub fn complete(&self, src: &str, image: Option<Image>) {
        if let Ok(mut state) = self.state.lock() {
            state.completed.push_back(FetchResponse {
                src: src.to_string(),
                image,
            });
        }
    }

    /// Completes every submitted request with the result of `resolve`
    pub fn complete_all(&self, mut resolve: impl FnMut(&FetchRequest) -> Option<Image>) -> usize {
        let requests = self.take_submitted();
        for request in &requests {
            self.complete(&request.src, resolve(request));
        }
        requests.len()
    }
}

impl BackgroundExecutor for ManualExecutor {
    fn submit(&self, batch: Vec<FetchRequest>) {
        if let Ok(mut state) = self.state.lock() {
            state.submitted.extend(batch);
        }
    }

    fn drain_completed(&self) -> Vec<FetchResponse> {
        self.state
            .lock()
            .map(|mut s| s.completed.drain(..).collect())
            .unwrap_or_default()
    }
}
