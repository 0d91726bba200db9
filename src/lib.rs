//! # img2color
//!
//! An HTTP service that reports the dominant color of a remote image.
//!
//! A client sends `GET /api?img=<url>` and receives `{"RGB": "#rrggbb"}`, the
//! average color of the image after it has been downsampled. Results are
//! memoized in Redis and recorded in MongoDB when those tiers are enabled.
//!
//! ## Features
//!
//! - **Referer gate**: Only requests from allow-listed referers are served
//! - **Cache-aside**: Repeated URLs are answered without refetching
//! - **Format detection**: PNG, JPEG, GIF, BMP and WebP are detected from content
//! - **Browser-like fetching**: Images are requested with a browser user agent
//!
//! ## Architecture
//!
//! - [`server`] - Axum routes, referer gate and error mapping
//! - [`color`] - Decoding, reduction and the color service
//! - [`fetch`] - Image retrieval over HTTP(S)
//! - [`store`] - Volatile (Redis) and durable (MongoDB) tiers
//! - [`config`] - CLI and environment configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use img2color::{create_router, AllowList, ColorService, ColorStore, HttpFetcher, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ColorService::new(HttpFetcher::new()?, ColorStore::new());
//!     let router = create_router(service, RouterConfig::new(AllowList::parse("*.example.com")?));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod color;
pub mod config;
pub mod error;
pub mod fetch;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use color::{decode_image, reduce, ColorResponse, ColorService, ColorValue};
pub use config::Config;
pub use error::{CacheError, ColorError, ConfigError, DecodeError, FetchError};
pub use fetch::{HttpFetcher, ImageFetcher};
pub use server::{
    color_handler, create_router, health_handler, referer_middleware, AllowList, AppState,
    ErrorResponse, GateRejected, RouterConfig,
};
pub use store::{
    ColorStore, DurableTier, Fingerprint, MemoryTier, MongoTier, RedisTier, VolatileTier,
};
