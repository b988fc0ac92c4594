//! Concurrency-limited fetch pool running on the async runtime.
//!
//! Batches arrive over a channel and join a pending queue. Before every
//! dispatch the queue is stably sorted by descending priority, and at most
//! `max_concurrency` fetches run at once. Finished responses go back over a
//! crossbeam channel that the render thread drains without blocking.

use crate::background::{
    executor::{BackgroundExecutor, FetchRequest, FetchResponse},
    fetch::ImageFetcher,
};
use crate::core::constants::MAX_FETCH_CONCURRENCY;
use crate::runtime::{self, AsyncHandle};
use crossbeam_channel::{unbounded, Receiver, Sender};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Configuration for the fetch pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchPoolConfig {
    /// Maximum number of concurrent fetches
    pub max_concurrency: usize,
}

impl Default for FetchPoolConfig {
    fn default() -> Self {
        Self {
            max_concurrency: MAX_FETCH_CONCURRENCY,
        }
    }
}

/// Called from the worker whenever a response is ready, e.g. to wake the host loop
pub type CompletionNotifier = Arc<dyn Fn() + Send + Sync>;

pub struct FetchPool {
    request_tx: mpsc::UnboundedSender<Vec<FetchRequest>>,
    result_rx: Receiver<FetchResponse>,
    worker: Box<dyn AsyncHandle>,
}

impl FetchPool {
    /// Starts the pool on the current runtime
    pub fn new(fetcher: Arc<dyn ImageFetcher>, config: FetchPoolConfig) -> Self {
        Self::start(fetcher, config, None)
    }

    /// Starts the pool with a callback fired after every completed fetch
    pub fn with_notifier(
        fetcher: Arc<dyn ImageFetcher>,
        config: FetchPoolConfig,
        notify: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self::start(fetcher, config, Some(Arc::new(notify)))
    }

    fn start(
        fetcher: Arc<dyn ImageFetcher>,
        config: FetchPoolConfig,
        notify: Option<CompletionNotifier>,
    ) -> Self {
        let max_concurrency = config.max_concurrency.max(1);
        log::debug!("starting fetch pool with max_concurrency={}", max_concurrency);

        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = unbounded();

        let worker = runtime::spawn(dispatch_loop(
            request_rx,
            result_tx,
            fetcher,
            max_concurrency,
            notify,
        ));

        Self {
            request_tx,
            result_rx,
            worker,
        }
    }

    /// Whether the dispatch loop has exited
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Stops dispatching; in-flight fetches are abandoned
    pub fn shutdown(&self) {
        self.worker.cancel();
    }
}

impl BackgroundExecutor for FetchPool {
    fn submit(&self, batch: Vec<FetchRequest>) {
        if self.request_tx.send(batch).is_err() {
            log::warn!("fetch pool is closed, dropping batch");
        }
    }

    fn drain_completed(&self) -> Vec<FetchResponse> {
        self.result_rx.try_iter().collect()
    }
}

impl Drop for FetchPool {
    fn drop(&mut self) {
        self.worker.cancel();
    }
}

async fn dispatch_loop(
    mut request_rx: mpsc::UnboundedReceiver<Vec<FetchRequest>>,
    result_tx: Sender<FetchResponse>,
    fetcher: Arc<dyn ImageFetcher>,
    max_concurrency: usize,
    notify: Option<CompletionNotifier>,
) {
    let mut pending: Vec<FetchRequest> = Vec::new();
    let mut in_flight: FuturesUnordered<BoxFuture<'static, FetchResponse>> = FuturesUnordered::new();
    let mut closed = false;

    loop {
        // pick up everything that arrived since the last cycle before sorting
        while let Ok(batch) = request_rx.try_recv() {
            pending.extend(batch);
        }

        if in_flight.len() < max_concurrency && !pending.is_empty() {
            pending.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(Ordering::Equal));
            let take = (max_concurrency - in_flight.len()).min(pending.len());
            for request in pending.drain(..take) {
                log::trace!("dispatching {} at {:.3}", request.src, request.priority);
                in_flight.push(fetch_one(fetcher.clone(), request).boxed());
            }
        }

        if closed && pending.is_empty() && in_flight.is_empty() {
            break;
        }

        tokio::select! {
            batch = request_rx.recv(), if !closed => match batch {
                Some(batch) => pending.extend(batch),
                None => closed = true,
            },
            Some(response) = in_flight.next(), if !in_flight.is_empty() => {
                if result_tx.send(response).is_err() {
                    log::debug!("fetch pool receiver dropped, stopping");
                    break;
                }
                if let Some(notify) = &notify {
                    notify();
                }
            }
        }
    }
}

async fn fetch_one(fetcher: Arc<dyn ImageFetcher>, request: FetchRequest) -> FetchResponse {
    let image = match fetcher.fetch(&request.src).await {
        Ok(image) => Some(image),
        Err(e) => {
            log::warn!("failed to fetch {}: {}", request.src, e);
            None
        }
    };
    FetchResponse {
        src: request.src,
        image,
    }
}
