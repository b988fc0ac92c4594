//! Non-blocking image cache.
//!
//! Lookups never wait: a miss queues the source for the background executor
//! and returns `None`, and the caller renders whatever it has. Arrivals are
//! drained on the render thread, which is the only writer.

use crate::background::executor::{BackgroundExecutor, FetchRequest};
use crate::core::config::ImageCacheConfig;
use crate::images::image::Image;
use crate::prelude::{HashMap, HashSet};
use instant::Instant;

/// How a lookup behaves on a miss
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GetOptions {
    /// Higher values are fetched first
    pub priority: f64,
    /// Never queue a fetch
    pub cache_only: bool,
    /// Notify the requesting layer when the image arrives
    pub preload: bool,
}

impl GetOptions {
    pub fn priority(priority: f64) -> Self {
        Self {
            priority,
            ..Self::default()
        }
    }

    pub fn cache_only() -> Self {
        Self {
            cache_only: true,
            ..Self::default()
        }
    }

    pub fn preload(priority: f64) -> Self {
        Self {
            priority,
            preload: true,
            ..Self::default()
        }
    }
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            priority: 0.0,
            cache_only: false,
            preload: false,
        }
    }
}

/// An image that arrived for a layer that preloaded it
#[derive(Debug, Clone)]
pub struct PreloadedImage {
    pub layer_id: String,
    pub src: String,
    pub image: Image,
}

#[derive(Debug, Clone)]
enum EntryState {
    Ready(Image),
    Failed { retry_at: Instant },
}

#[derive(Debug, Clone)]
struct CacheEntry {
    state: EntryState,
    last_used: Instant,
}

pub struct ImageCache {
    config: ImageCacheConfig,
    executor: Box<dyn BackgroundExecutor>,
    entries: HashMap<String, CacheEntry>,
    /// Sources that are batched or in flight
    queued: HashSet<String>,
    batch: Vec<FetchRequest>,
    waiters: HashMap<String, Vec<String>>,
    preloaded: Vec<PreloadedImage>,
    last_render: Option<Instant>,
    last_sweep: Option<Instant>,
}

impl ImageCache {
    pub fn new(config: ImageCacheConfig, executor: Box<dyn BackgroundExecutor>) -> Self {
        Self {
            config,
            executor,
            entries: HashMap::default(),
            queued: HashSet::default(),
            batch: Vec::new(),
            waiters: HashMap::default(),
            preloaded: Vec::new(),
            last_render: None,
            last_sweep: None,
        }
    }

    /// Looks up `src`, queueing a fetch on a miss unless `cache_only` is set.
    /// `layer` receives a preload notification when `options.preload` is set.
    pub fn get(
        &mut self,
        src: &str,
        options: GetOptions,
        layer: Option<&str>,
        now: Instant,
    ) -> Option<Image> {
        let mut expired = false;
        if let Some(entry) = self.entries.get_mut(src) {
            match &entry.state {
                EntryState::Ready(image) => {
                    let image = image.clone();
                    entry.last_used = now;
                    log::trace!("image cache hit: {}", src);
                    return Some(image);
                }
                EntryState::Failed { retry_at } if *retry_at > now => return None,
                EntryState::Failed { .. } => expired = true,
            }
        }
        if expired {
            self.entries.remove(src);
        }

        if options.cache_only {
            return None;
        }

        if options.preload {
            if let Some(layer) = layer {
                let waiters = self.waiters.entry(src.to_string()).or_default();
                if !waiters.iter().any(|w| w == layer) {
                    waiters.push(layer.to_string());
                }
            }
        }

        if self.queued.insert(src.to_string()) {
            log::trace!("image cache miss, queueing {} at {:.3}", src, options.priority);
            self.batch.push(FetchRequest {
                src: src.to_string(),
                priority: options.priority,
            });
        } else if let Some(pending) = self.batch.iter_mut().find(|r| r.src == src) {
            pending.priority = pending.priority.max(options.priority);
        }

        None
    }

    /// Sends the pending batch to the executor and runs the eviction sweep.
    /// Called once at the end of every render.
    pub fn flush(&mut self, now: Instant) {
        self.submit();
        self.sweep(now);
        self.last_render = Some(now);
    }

    /// Sends the pending batch to the executor without sweeping
    pub fn submit(&mut self) {
        if !self.batch.is_empty() {
            let batch = std::mem::take(&mut self.batch);
            log::debug!("submitting {} image requests", batch.len());
            self.executor.submit(batch);
        }
    }

    fn sweep(&mut self, now: Instant) {
        let due = self
            .last_sweep
            .map_or(true, |t| now.saturating_duration_since(t) >= self.config.sweep_interval());
        if !due {
            return;
        }
        self.last_sweep = Some(now);

        let retention = self.config.retention();
        let grace = self.config.render_grace();
        let last_render = self.last_render;
        let before = self.entries.len();

        self.entries.retain(|_, entry| {
            let idle = now.saturating_duration_since(entry.last_used) > retention;
            let missed_last_render =
                last_render.map_or(false, |r| r.saturating_duration_since(entry.last_used) > grace);
            !(idle && missed_last_render)
        });

        let evicted = before - self.entries.len();
        if evicted > 0 {
            log::debug!("evicted {} cached images", evicted);
        }
    }

    /// Stores finished fetches. Returns the number of arrivals.
    pub fn process_responses(&mut self, now: Instant) -> usize {
        let responses = self.executor.drain_completed();
        let count = responses.len();

        for response in responses {
            self.queued.remove(&response.src);
            let waiters = self.waiters.remove(&response.src).unwrap_or_default();

            let state = match response.image {
                Some(image) => {
                    for layer_id in waiters {
                        self.preloaded.push(PreloadedImage {
                            layer_id,
                            src: response.src.clone(),
                            image: image.clone(),
                        });
                    }
                    EntryState::Ready(image)
                }
                None => {
                    log::debug!("image {} failed, backing off", response.src);
                    EntryState::Failed {
                        retry_at: now + self.config.failure_backoff(),
                    }
                }
            };

            self.entries.insert(
                response.src,
                CacheEntry {
                    state,
                    last_used: now,
                },
            );
        }

        count
    }

    /// Takes the preload notifications collected since the last call
    pub fn take_preloaded(&mut self) -> Vec<PreloadedImage> {
        std::mem::take(&mut self.preloaded)
    }

    pub fn contains(&self, src: &str) -> bool {
        matches!(
            self.entries.get(src),
            Some(CacheEntry {
                state: EntryState::Ready(_),
                ..
            })
        )
    }

    pub fn is_queued(&self, src: &str) -> bool {
        self.queued.contains(src)
    }

    /// Number of cached entries, failures included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::executor::ManualExecutor;
    use crate::rendering::surface::Color;
    use std::time::Duration;

    fn cache() -> (ImageCache, ManualExecutor) {
        let executor = ManualExecutor::new();
        let cache = ImageCache::new(ImageCacheConfig::default(), Box::new(executor.clone()));
        (cache, executor)
    }

    fn image() -> Image {
        Image::solid(1, 1, Color::WHITE)
    }

    #[test]
    fn test_miss_enqueues_once() {
        let (mut cache, executor) = cache();
        let now = Instant::now();

        assert!(cache.get("a.png", GetOptions::priority(1.0), None, now).is_none());
        assert!(cache.get("a.png", GetOptions::priority(2.0), None, now).is_none());
        cache.flush(now);

        let submitted = executor.take_submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].src, "a.png");
        assert_eq!(submitted[0].priority, 2.0);

        // still in flight: no second request
        cache.get("a.png", GetOptions::default(), None, now);
        cache.flush(now);
        assert!(executor.take_submitted().is_empty());
    }

    #[test]
    fn test_cache_only_never_enqueues() {
        let (mut cache, executor) = cache();
        let now = Instant::now();

        assert!(cache.get("a.png", GetOptions::cache_only(), None, now).is_none());
        cache.flush(now);
        assert!(executor.take_submitted().is_empty());
        assert!(!cache.is_queued("a.png"));
    }

    #[test]
    fn test_arrival_is_served() {
        let (mut cache, executor) = cache();
        let now = Instant::now();
        let img = image();

        cache.get("a.png", GetOptions::default(), None, now);
        cache.flush(now);
        executor.complete("a.png", Some(img.clone()));

        assert_eq!(cache.process_responses(now), 1);
        let hit = cache.get("a.png", GetOptions::cache_only(), None, now).unwrap();
        assert!(hit.ptr_eq(&img));
        assert!(!cache.is_queued("a.png"));
    }

    #[test]
    fn test_preload_notifies_waiting_layer() {
        let (mut cache, executor) = cache();
        let now = Instant::now();

        cache.get("icon.png", GetOptions::preload(0.0), Some("markers"), now);
        cache.get("icon.png", GetOptions::preload(0.0), Some("markers"), now);
        cache.flush(now);
        executor.complete("icon.png", Some(image()));
        cache.process_responses(now);

        let preloaded = cache.take_preloaded();
        assert_eq!(preloaded.len(), 1);
        assert_eq!(preloaded[0].layer_id, "markers");
        assert_eq!(preloaded[0].src, "icon.png");
        assert!(cache.take_preloaded().is_empty());
    }

    #[test]
    fn test_failure_backs_off_then_retries() {
        let (mut cache, executor) = cache();
        let t0 = Instant::now();

        cache.get("broken.png", GetOptions::default(), None, t0);
        cache.flush(t0);
        executor.take_submitted();
        executor.complete("broken.png", None);
        cache.process_responses(t0);

        let soon = t0 + Duration::from_secs(1);
        assert!(cache.get("broken.png", GetOptions::default(), None, soon).is_none());
        cache.flush(soon);
        assert!(executor.take_submitted().is_empty());

        let later = t0 + Duration::from_secs(6);
        assert!(cache.get("broken.png", GetOptions::default(), None, later).is_none());
        cache.flush(later);
        assert_eq!(executor.take_submitted().len(), 1);
    }

    #[test]
    fn test_sweep_evicts_stale_entries_only() {
        let (mut cache, executor) = cache();
        let t0 = Instant::now();

        for src in ["stale.png", "fresh.png"] {
            cache.get(src, GetOptions::default(), None, t0);
        }
        cache.flush(t0);
        executor.complete("stale.png", Some(image()));
        executor.complete("fresh.png", Some(image()));
        cache.process_responses(t0);

        // keep "fresh" in use on every render for 12 seconds
        for second in 1..=12 {
            let now = t0 + Duration::from_secs(second);
            cache.get("fresh.png", GetOptions::cache_only(), None, now);
            cache.flush(now);
        }

        assert!(!cache.contains("stale.png"));
        assert!(cache.contains("fresh.png"));
    }

    #[test]
    fn test_sweep_keeps_images_used_by_last_render() {
        let (mut cache, executor) = cache();
        let t0 = Instant::now();

        cache.get("a.png", GetOptions::default(), None, t0);
        cache.flush(t0);
        executor.complete("a.png", Some(image()));
        cache.process_responses(t0);
        cache.get("a.png", GetOptions::cache_only(), None, t0);
        cache.flush(t0);

        // no renders for a long time: the last render still used the image
        let later = t0 + Duration::from_secs(60);
        cache.flush(later);
        assert!(cache.contains("a.png"));
    }
}
