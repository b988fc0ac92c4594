//! Runtime abstraction for background work
//!
//! The fetch pool spawns its dispatch loop through [`spawn`], so embedders can
//! install their own spawner with [`init_runtime`] before creating a pool.

use futures::future::BoxFuture;
use std::future::Future;

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and return a handle to it
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>) -> Box<dyn AsyncHandle>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;

    /// Cancel the task
    fn cancel(&self);
}

/// Spawns a future on the global runtime
pub fn spawn<F>(future: F) -> Box<dyn AsyncHandle>
where
    F: Future<Output = ()> + Send + 'static,
{
    log::trace!("spawning background task");
    runtime().spawn_boxed(Box::pin(future))
}

pub mod spawners {
    use super::*;
    use tokio::task::JoinHandle;

    /// Spawns onto the ambient tokio runtime. Must be called from within one.
    pub struct TokioSpawner;

    impl AsyncSpawner for TokioSpawner {
        fn spawn_boxed(&self, future: BoxFuture<'static, ()>) -> Box<dyn AsyncHandle> {
            Box::new(TokioHandle(tokio::spawn(future)))
        }
    }

    struct TokioHandle(JoinHandle<()>);

    impl AsyncHandle for TokioHandle {
        fn is_finished(&self) -> bool {
            self.0.is_finished()
        }

        fn cancel(&self) {
            self.0.abort();
        }
    }
}

/// Global runtime instance
static RUNTIME: std::sync::OnceLock<Box<dyn AsyncSpawner>> = std::sync::OnceLock::new();

/// Installs a custom spawner. Has no effect once the runtime is in use.
pub fn init_runtime(spawner: Box<dyn AsyncSpawner>) {
    if RUNTIME.set(spawner).is_err() {
        log::debug!("runtime already initialized, ignoring custom spawner");
    }
}

/// Get the global runtime spawner
pub fn runtime() -> &'static dyn AsyncSpawner {
    RUNTIME
        .get_or_init(|| Box::new(spawners::TokioSpawner))
        .as_ref()
}
