//! Image retrieval.
//!
//! [`ImageFetcher`] is the seam between the color service and the network.
//! [`HttpFetcher`] is the production implementation; tests substitute their
//! own.

mod fetcher;
mod http_fetcher;

pub use fetcher::ImageFetcher;
pub use http_fetcher::{
    HttpFetcher, BROWSER_USER_AGENT, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_IMAGE_BYTES,
};
