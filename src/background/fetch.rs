use crate::images::Image;
use crate::Result;
use async_trait::async_trait;

/// Network and decode substrate used by the fetch pool
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, src: &str) -> Result<Image>;
}

#[cfg(feature = "http")]
pub use http::{decode_image, HttpFetcher};

#[cfg(feature = "http")]
mod http {
    use super::ImageFetcher;
    use crate::images::Image;
    use crate::{MapError, Result};
    use async_trait::async_trait;
    use once_cell::sync::Lazy;
    use std::time::Duration;

    static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
        reqwest::Client::builder()
            .user_agent(concat!("mapview/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(16)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            })
    });

    /// Decodes PNG, JPEG or WebP bytes into an RGBA image
    pub fn decode_image(bytes: &[u8]) -> Result<Image> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| MapError::Decode(e.to_string()))?
            .to_rgba8();
        let (width, height) = decoded.dimensions();
        Image::new(width, height, decoded.into_raw())
    }

    /// Fetches images over HTTP(S) and decodes them on the blocking pool
    #[derive(Debug, Clone)]
    pub struct HttpFetcher {
        client: reqwest::Client,
    }

    impl HttpFetcher {
        pub fn new() -> Self {
            Self {
                client: HTTP_CLIENT.clone(),
            }
        }

        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl Default for HttpFetcher {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ImageFetcher for HttpFetcher {
        async fn fetch(&self, src: &str) -> Result<Image> {
            let response = self
                .client
                .get(src)
                .header(reqwest::header::ACCEPT, "image/*")
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(MapError::Fetch(format!(
                    "HTTP {} for {}",
                    response.status(),
                    src
                )));
            }

            let bytes = response.bytes().await?;
            tokio::task::spawn_blocking(move || decode_image(&bytes))
                .await
                .map_err(|e| MapError::Decode(format!("decode task failed: {}", e)))?
        }
    }

}
