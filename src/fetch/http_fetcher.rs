use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::ImageFetcher;
use crate::error::FetchError;

/// User agent sent with every image request.
///
/// Some image hosts refuse requests that look like they come from a script.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36 Edg/115.0.1901.253";

/// Default timeout for a whole image request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default upper bound on a fetched image body: 20 MiB.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// HTTP(S) implementation of [`ImageFetcher`] backed by `reqwest`.
///
/// The underlying client pools connections and is shared by all requests.
/// Cloning is cheap.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Create a fetcher with [`DEFAULT_FETCH_TIMEOUT`].
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Create a fetcher whose requests fail after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self::with_client(client))
    }

    /// Create a fetcher around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            max_body_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    /// Reject bodies larger than `limit` bytes.
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// The body size limit in bytes.
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

/// Parse `url` and accept only `http` and `https`.
fn parse_image_url(url: &str) -> Result<Url, FetchError> {
    let invalid = |message: String| FetchError::InvalidUrl {
        url: url.to_string(),
        message,
    };

    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(invalid(format!("unsupported scheme {:?}", other))),
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let target = parse_image_url(url)?;

        // The response body is dropped (and the connection released) on every
        // early return below.
        let mut response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let limit = self.max_body_bytes;
        let too_large = || FetchError::TooLarge {
            url: url.to_string(),
            limit,
        };

        // Content-Length is advisory; the running total below is what binds.
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(too_large());
        }

        let mut buffer = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?
        {
            if buffer.len() + chunk.len() > limit {
                return Err(too_large());
            }
            buffer.extend_from_slice(&chunk);
        }
        let body = buffer.freeze();

        debug!(url = %url, bytes = body.len(), "Fetched image");
        Ok(body)
    }
}
