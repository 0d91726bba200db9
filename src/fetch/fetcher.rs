use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FetchError;

/// Trait for retrieving the raw bytes of an image.
///
/// The whole payload is returned in memory so the decoder can seek freely.
/// Implementations make a single attempt per call; retry policy belongs to
/// the caller. Implementations must be thread-safe.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch the image at `url`.
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}
