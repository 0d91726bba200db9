//! Two-tier cache-aside store for computed colors.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      ColorStore                         │
//! │                                                         │
//! │   get(fingerprint) ──────────► VolatileTier (read)      │
//! │                                                         │
//! │   put(fingerprint, url, c) ──┬─► VolatileTier (SETEX)   │
//! │                              └─► DurableTier  (upsert)  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads consult only the volatile tier. The durable tier is a write sink
//! keyed by the literal URL. Both tiers are optional; tier failures are
//! logged and never reach the caller.

mod durable;
mod fingerprint;
mod volatile;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::color::ColorValue;

pub use durable::{
    record_filter, record_update, DurableTier, MongoSettings, MongoTier, DEFAULT_COLLECTION,
    IMAGE_URL_FIELD, MAIN_COLOR_FIELD,
};
pub use fingerprint::Fingerprint;
pub use volatile::{MemoryTier, RedisSettings, RedisTier, VolatileTier, DEFAULT_MEMORY_ENTRIES};

/// Default volatile-tier expiration horizon: 24 hours.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cache-aside facade over an optional volatile tier and an optional durable
/// tier.
///
/// With both tiers disabled, [`get`](Self::get) always misses and
/// [`put`](Self::put) does nothing.
#[derive(Clone)]
pub struct ColorStore {
    volatile: Option<Arc<dyn VolatileTier>>,
    durable: Option<Arc<dyn DurableTier>>,
    ttl: Duration,
}

impl ColorStore {
    /// Create a store with both tiers disabled and the default TTL.
    pub fn new() -> Self {
        Self {
            volatile: None,
            durable: None,
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Enable the volatile tier.
    pub fn with_volatile(mut self, tier: Arc<dyn VolatileTier>) -> Self {
        self.volatile = Some(tier);
        self
    }

    /// Enable the durable tier.
    pub fn with_durable(mut self, tier: Arc<dyn DurableTier>) -> Self {
        self.durable = Some(tier);
        self
    }

    /// Set the volatile-tier expiration horizon.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Volatile-tier expiration horizon.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn volatile_enabled(&self) -> bool {
        self.volatile.is_some()
    }

    pub fn durable_enabled(&self) -> bool {
        self.durable.is_some()
    }

    /// Look up a cached color.
    ///
    /// Read failures and unparseable cached values are logged and reported
    /// as a miss.
    pub async fn get(&self, key: &Fingerprint) -> Option<ColorValue> {
        let tier = self.volatile.as_ref()?;

        let cached = match tier.get(key).await {
            Ok(cached) => cached?,
            Err(e) => {
                warn!(fingerprint = %key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match cached.parse::<ColorValue>() {
            Ok(color) => Some(color),
            Err(e) => {
                warn!(
                    fingerprint = %key,
                    cached = %cached,
                    error = %e,
                    "Ignoring malformed cached color"
                );
                None
            }
        }
    }

    /// Write a freshly computed color through both tiers.
    ///
    /// The volatile write is keyed by `key` and expires after the TTL. The
    /// durable write is an upsert keyed by the literal `url`. The two writes
    /// run concurrently and fail independently; failures are logged only.
    pub async fn put(&self, key: &Fingerprint, url: &str, color: ColorValue) {
        let hex = color.to_hex();

        let volatile_write = async {
            if let Some(tier) = &self.volatile {
                match tier.set(key, &hex, self.ttl).await {
                    Ok(()) => debug!(fingerprint = %key, color = %hex, "Cached color"),
                    Err(e) => warn!(fingerprint = %key, error = %e, "Cache write failed"),
                }
            }
        };

        let durable_write = async {
            if let Some(tier) = &self.durable {
                match tier.upsert(url, &hex).await {
                    Ok(()) => debug!(url = %url, color = %hex, "Persisted color record"),
                    Err(e) => warn!(url = %url, error = %e, "Durable write failed"),
                }
            }
        };

        tokio::join!(volatile_write, durable_write);
    }
}

impl Default for ColorStore {
    fn default() -> Self {
        Self::new()
    }
}
