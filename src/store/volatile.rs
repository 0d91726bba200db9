//! Volatile (expiring) cache tier.
//!
//! The volatile tier maps a [`Fingerprint`] to a hex color string with a fixed
//! expiration horizon. It is the only tier consulted on the read path.
//!
//! Two implementations are provided:
//! - [`RedisTier`]: Redis-backed, shared between service instances
//! - [`MemoryTier`]: In-process LRU with per-entry expiry

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::Mutex;

use super::Fingerprint;
use crate::error::{CacheError, ConfigError};

/// Default number of entries held by a [`MemoryTier`].
pub const DEFAULT_MEMORY_ENTRIES: usize = 10_000;

/// An expiring key/value store for computed colors.
///
/// Implementations must be safe for concurrent use from many requests.
#[async_trait]
pub trait VolatileTier: Send + Sync {
    /// Look up a cached color. `Ok(None)` means absent or expired.
    async fn get(&self, key: &Fingerprint) -> Result<Option<String>, CacheError>;

    /// Store a color, replacing any previous value and resetting its expiry.
    async fn set(&self, key: &Fingerprint, color: &str, ttl: Duration) -> Result<(), CacheError>;
}

// =============================================================================
// Redis
// =============================================================================

/// Connection settings for [`RedisTier`].
#[derive(Debug, Clone)]
pub struct RedisSettings {
    /// `host:port` of the Redis server
    pub address: String,

    /// Optional password (AUTH)
    pub password: Option<String>,

    /// Database index
    pub db: i64,
}

impl RedisSettings {
    /// Build the `redis://` connection URL for these settings.
    pub fn connection_url(&self) -> String {
        match self.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => format!(
                "redis://:{}@{}/{}",
                urlencoding::encode(password),
                self.address,
                self.db
            ),
            None => format!("redis://{}/{}", self.address, self.db),
        }
    }
}

/// Redis-backed volatile tier.
///
/// Wraps a [`ConnectionManager`], which multiplexes commands over a single
/// connection and reconnects on failure. Cloning is cheap.
#[derive(Clone)]
pub struct RedisTier {
    conn: ConnectionManager,
}

impl RedisTier {
    /// Connect to Redis and verify the connection with `PING`.
    pub async fn connect(settings: &RedisSettings) -> Result<Self, ConfigError> {
        let connection_error = |e: redis::RedisError| ConfigError::Connection {
            tier: "Redis",
            message: e.to_string(),
        };

        let client = redis::Client::open(settings.connection_url()).map_err(connection_error)?;
        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(connection_error)?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(connection_error)?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl VolatileTier for RedisTier {
    async fn get(&self, key: &Fingerprint) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key.as_str()).await?;
        Ok(value)
    }

    async fn set(&self, key: &Fingerprint, color: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key.as_str(), color, ttl.as_secs().max(1)).await?;
        Ok(())
    }
}

// =============================================================================
// In-process
// =============================================================================

struct MemoryEntry {
    color: String,
    expires_at: Instant,
}

/// In-process volatile tier backed by an LRU map.
///
/// Entries carry their own expiration horizon. Expired entries read as absent
/// and are dropped on access; the LRU bound evicts the rest.
///
/// # Example
///
/// ```
/// use img2color::store::{Fingerprint, MemoryTier, VolatileTier};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let tier = MemoryTier::new();
///     let key = Fingerprint::of("https://example.com/cat.png");
///
///     tier.set(&key, "#336699", Duration::from_secs(60)).await.unwrap();
///     assert_eq!(tier.get(&key).await.unwrap().as_deref(), Some("#336699"));
/// }
/// ```
pub struct MemoryTier {
    entries: Mutex<LruCache<Fingerprint, MemoryEntry>>,
}

impl MemoryTier {
    /// Create a tier holding up to [`DEFAULT_MEMORY_ENTRIES`] entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_ENTRIES)
    }

    /// Create a tier holding up to `max_entries` entries (minimum 1).
    pub fn with_capacity(max_entries: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Number of entries currently held, including ones that have expired
    /// but not yet been touched.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Check if the tier holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Default for MemoryTier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VolatileTier for MemoryTier {
    async fn get(&self, key: &Fingerprint) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().await;

        let expired = match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => {
                return Ok(Some(entry.color.clone()));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &Fingerprint, color: &str, ttl: Duration) -> Result<(), CacheError> {
        let entry = MemoryEntry {
            color: color.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().await.put(key.clone(), entry);
        Ok(())
    }
}
