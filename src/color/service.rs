//! Color Service for orchestrating color extraction.
//!
//! The ColorService is the main entry point for color requests. It runs the
//! cache-aside pipeline:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         ColorService                            │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                    get_color()                          │    │
//! │  │  1. Validate URL      4. Decode (blocking pool)         │    │
//! │  │  2. Check cache       5. Reduce to one color            │    │
//! │  │  3. Fetch bytes       6. Write back & return            │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │           │
//! │           ▼                    ▼                    ▼           │
//! │    ┌────────────┐      ┌──────────────┐    ┌──────────────────┐ │
//! │    │ ColorStore │      │ ImageFetcher │    │ decode + reduce  │ │
//! │    └────────────┘      └──────────────┘    └──────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::error::{ColorError, DecodeError};
use crate::fetch::ImageFetcher;
use crate::store::{ColorStore, Fingerprint};

use super::decoder::decode_image;
use super::reducer::{reduce, ColorValue};

/// Response from the color service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorResponse {
    /// The representative color
    pub color: ColorValue,

    /// Whether the color came from the volatile tier
    pub cache_hit: bool,
}

/// Service computing and memoizing the dominant color of remote images.
///
/// # Type Parameters
///
/// * `F` - The image fetcher (e.g., [`HttpFetcher`](crate::fetch::HttpFetcher))
///
/// # Example
///
/// ```ignore
/// use img2color::color::ColorService;
/// use img2color::fetch::HttpFetcher;
/// use img2color::store::ColorStore;
///
/// let service = ColorService::new(HttpFetcher::new()?, ColorStore::new());
/// let response = service.get_color("https://example.com/cat.png").await?;
///
/// println!("{} (cache hit: {})", response.color, response.cache_hit);
/// ```
pub struct ColorService<F: ImageFetcher> {
    fetcher: Arc<F>,
    store: ColorStore,
}

impl<F: ImageFetcher> ColorService<F> {
    /// Create a new color service.
    pub fn new(fetcher: F, store: ColorStore) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            store,
        }
    }

    /// Create a color service with a shared fetcher.
    pub fn with_shared_fetcher(fetcher: Arc<F>, store: ColorStore) -> Self {
        Self { fetcher, store }
    }

    /// The store fronting the computation.
    pub fn store(&self) -> &ColorStore {
        &self.store
    }

    /// Get the color for an image URL, using the cache when available.
    ///
    /// On a cache hit nothing is fetched. On a miss the color is computed and
    /// written back through the store; write-back failures do not fail the
    /// request.
    ///
    /// # Errors
    ///
    /// - [`ColorError::MissingImage`] if `url` is empty
    /// - [`ColorError::Fetch`] if the image cannot be retrieved
    /// - [`ColorError::Decode`] if the image cannot be decoded
    pub async fn get_color(&self, url: &str) -> Result<ColorResponse, ColorError> {
        if url.is_empty() {
            return Err(ColorError::MissingImage);
        }

        let key = Fingerprint::of(url);

        if let Some(color) = self.store.get(&key).await {
            debug!(url = %url, color = %color, "Cache hit");
            return Ok(ColorResponse {
                color,
                cache_hit: true,
            });
        }

        debug!(url = %url, "Cache miss");
        let color = self.compute_color(url).await?;

        self.store.put(&key, url, color).await;

        Ok(ColorResponse {
            color,
            cache_hit: false,
        })
    }

    /// Fetch, decode and reduce an image without touching the cache.
    pub async fn compute_color(&self, url: &str) -> Result<ColorValue, ColorError> {
        let data = self.fetcher.fetch(url).await?;

        let color = tokio::task::spawn_blocking(move || decode_image(&data).map(|img| reduce(&img)))
            .await
            .map_err(|e| DecodeError::Corrupt(format!("decoder task failed: {}", e)))??;

        Ok(color)
    }
}
