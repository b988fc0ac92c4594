pub mod executor;
pub mod fetch;
#[cfg(feature = "tokio-runtime")]
pub mod pool;

pub use executor::{BackgroundExecutor, FetchRequest, FetchResponse, ManualExecutor};
pub use fetch::ImageFetcher;
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
#[cfg(feature = "tokio-runtime")]
pub use pool::{FetchPool, FetchPoolConfig};
