//! Configuration management for img2color.
//!
//! Configuration is read once at startup from command-line arguments, falling
//! back to environment variables and then to defaults.
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use img2color::config::Config;
//!
//! let config = Config::parse();
//! config.validate()?;
//!
//! println!("Listening on {}", config.bind_address());
//! ```
//!
//! # Environment Variables
//!
//! - `HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 3000)
//! - `ALLOWED_REFERERS` - Comma-separated referer patterns (default: none, rejects all)
//! - `USE_REDIS_CACHE` - Enable the Redis volatile tier (default: false)
//! - `REDIS_ADDRESS` - Redis `host:port` (required when Redis is enabled)
//! - `REDIS_PASSWORD` - Redis password
//! - `REDIS_DB` - Redis database index (default: 0)
//! - `USE_MONGODB` - Enable the MongoDB durable tier (default: false)
//! - `MONGO_URI` - MongoDB connection string (required when MongoDB is enabled)
//! - `MONGO_DB` - MongoDB database (required when MongoDB is enabled)
//! - `MONGO_COLLECTION` - MongoDB collection (default: colors)
//! - `CACHE_TTL_SECS` - Volatile-tier expiry in seconds (default: 86400)
//! - `FETCH_TIMEOUT_SECS` - Image fetch timeout in seconds (default: 10)
//! - `MAX_IMAGE_BYTES` - Largest image body accepted, in bytes (default: 20 MiB)
//! - `REDACT_ERRORS` - Hide fetch/decode detail from callers (default: false)

use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::Parser;

use crate::error::ConfigError;
use crate::fetch::{DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_IMAGE_BYTES};
use crate::server::referer::AllowList;
use crate::store::{MongoSettings, RedisSettings, DEFAULT_CACHE_TTL, DEFAULT_COLLECTION};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

// =============================================================================
// CLI Arguments
// =============================================================================

/// img2color - dominant color of remote images over HTTP.
///
/// Serves `GET /api?img=<url>` and answers with the image's average color,
/// memoized in Redis and recorded in MongoDB when those are enabled.
#[derive(Parser, Debug, Clone)]
#[command(name = "img2color")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    // =========================================================================
    // Access Gate
    // =========================================================================
    /// Allowed referer patterns (comma-separated, `*` is a wildcard).
    ///
    /// An empty list rejects every request.
    #[arg(long, default_value = "", env = "ALLOWED_REFERERS")]
    pub allowed_referers: String,

    // =========================================================================
    // Volatile Tier (Redis)
    // =========================================================================
    /// Enable the Redis color cache.
    #[arg(long, env = "USE_REDIS_CACHE", value_parser = BoolishValueParser::new())]
    pub use_redis_cache: bool,

    /// Redis server address as `host:port`.
    #[arg(long, env = "REDIS_ADDRESS")]
    pub redis_address: Option<String>,

    /// Redis password.
    #[arg(long, env = "REDIS_PASSWORD", hide_env_values = true)]
    pub redis_password: Option<String>,

    /// Redis database index.
    #[arg(long, default_value_t = 0, env = "REDIS_DB")]
    pub redis_db: i64,

    /// Expiry of cached colors in seconds.
    #[arg(long = "cache-ttl", default_value_t = DEFAULT_CACHE_TTL.as_secs(), env = "CACHE_TTL_SECS")]
    pub cache_ttl_secs: u64,

    // =========================================================================
    // Durable Tier (MongoDB)
    // =========================================================================
    /// Enable the MongoDB color record store.
    #[arg(long, env = "USE_MONGODB", value_parser = BoolishValueParser::new())]
    pub use_mongodb: bool,

    /// MongoDB connection string.
    #[arg(long, env = "MONGO_URI", hide_env_values = true)]
    pub mongo_uri: Option<String>,

    /// MongoDB database name.
    #[arg(long, env = "MONGO_DB")]
    pub mongo_db: Option<String>,

    /// MongoDB collection name.
    #[arg(long, default_value = DEFAULT_COLLECTION, env = "MONGO_COLLECTION")]
    pub mongo_collection: String,

    // =========================================================================
    // Fetching
    // =========================================================================
    /// Timeout for fetching an image, in seconds.
    #[arg(long = "fetch-timeout", default_value_t = DEFAULT_FETCH_TIMEOUT.as_secs(), env = "FETCH_TIMEOUT_SECS")]
    pub fetch_timeout_secs: u64,

    /// Largest image body accepted, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_IMAGE_BYTES, env = "MAX_IMAGE_BYTES")]
    pub max_image_bytes: usize,

    /// Replace fetch/decode error detail in responses with a generic message.
    #[arg(long, env = "REDACT_ERRORS", value_parser = BoolishValueParser::new())]
    pub redact_errors: bool,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration.
    ///
    /// Checks that every enabled tier has the settings it needs and that
    /// the referer patterns compile.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.use_redis_cache {
            let address = non_empty(&self.redis_address).ok_or(ConfigError::MissingSetting {
                tier: "Redis cache",
                setting: "REDIS_ADDRESS",
            })?;
            validate_host_port(address)?;

            if self.redis_db < 0 {
                return Err(ConfigError::InvalidSetting {
                    setting: "REDIS_DB",
                    message: format!("database index must not be negative, got {}", self.redis_db),
                });
            }
        }

        if self.use_mongodb {
            let uri = non_empty(&self.mongo_uri).ok_or(ConfigError::MissingSetting {
                tier: "MongoDB",
                setting: "MONGO_URI",
            })?;
            if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
                return Err(ConfigError::InvalidSetting {
                    setting: "MONGO_URI",
                    message: "expected a mongodb:// or mongodb+srv:// connection string"
                        .to_string(),
                });
            }

            non_empty(&self.mongo_db).ok_or(ConfigError::MissingSetting {
                tier: "MongoDB",
                setting: "MONGO_DB",
            })?;

            if self.mongo_collection.trim().is_empty() {
                return Err(ConfigError::InvalidSetting {
                    setting: "MONGO_COLLECTION",
                    message: "collection name must not be empty".to_string(),
                });
            }
        }

        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                setting: "CACHE_TTL_SECS",
                message: "must be greater than 0".to_string(),
            });
        }

        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                setting: "FETCH_TIMEOUT_SECS",
                message: "must be greater than 0".to_string(),
            });
        }

        if self.max_image_bytes == 0 {
            return Err(ConfigError::InvalidSetting {
                setting: "MAX_IMAGE_BYTES",
                message: "must be greater than 0".to_string(),
            });
        }

        self.allow_list()?;

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Compile the referer allow-list.
    pub fn allow_list(&self) -> Result<AllowList, ConfigError> {
        AllowList::parse(&self.allowed_referers)
    }

    /// Redis settings, if the Redis tier is enabled.
    pub fn redis_settings(&self) -> Option<RedisSettings> {
        if !self.use_redis_cache {
            return None;
        }
        Some(RedisSettings {
            address: non_empty(&self.redis_address)?.to_string(),
            password: self.redis_password.clone(),
            db: self.redis_db,
        })
    }

    /// MongoDB settings, if the MongoDB tier is enabled.
    pub fn mongo_settings(&self) -> Option<MongoSettings> {
        if !self.use_mongodb {
            return None;
        }
        Some(MongoSettings {
            uri: non_empty(&self.mongo_uri)?.to_string(),
            database: non_empty(&self.mongo_db)?.to_string(),
            collection: self.mongo_collection.trim().to_string(),
        })
    }

    /// Expiry of cached colors.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Timeout for fetching an image.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn validate_host_port(address: &str) -> Result<(), ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidSetting {
        setting: "REDIS_ADDRESS",
        message: format!("{} (got {:?})", message, address),
    };

    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| invalid("expected host:port"))?;
    if host.is_empty() {
        return Err(invalid("missing host"));
    }
    port.parse::<u16>()
        .map_err(|_| invalid("port must be a number between 0 and 65535"))?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
