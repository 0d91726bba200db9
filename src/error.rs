use thiserror::Error;

/// Errors detected while validating startup configuration.
///
/// These are fatal: the process refuses to serve.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A tier is enabled but a value it needs was not provided
    #[error("{tier} is enabled but {setting} is not set")]
    MissingSetting {
        tier: &'static str,
        setting: &'static str,
    },

    /// A setting was provided but could not be interpreted
    #[error("Invalid value for {setting}: {message}")]
    InvalidSetting {
        setting: &'static str,
        message: String,
    },

    /// A referer pattern could not be compiled
    #[error("Invalid referer pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A cache tier could not be reached at startup
    #[error("Failed to connect to {tier}: {message}")]
    Connection { tier: &'static str, message: String },
}

/// Errors that can occur while retrieving image bytes
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The image reference is not a usable URL
    #[error("Invalid image URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    /// Transport-level failure, including timeouts
    #[error("Request failed: {0}")]
    Request(String),

    /// The remote host answered with a non-success status
    #[error("Unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    /// The response body exceeds the configured size limit
    #[error("Image at {url} exceeds the {limit} byte size limit")]
    TooLarge { url: String, limit: usize },
}

/// Errors that can occur while turning bytes into a pixel grid
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// Content does not match any supported container format
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Format was recognized but the payload could not be decoded
    #[error("Corrupt image data: {0}")]
    Corrupt(String),

    /// Decoded image has no pixels
    #[error("Image has zero area ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

/// Errors from the volatile or durable cache tiers.
///
/// These never reach the caller; the store logs them and degrades to a miss
/// or a lost write.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Redis command or connection failure
    #[error("Redis error: {0}")]
    Redis(String),

    /// MongoDB command or connection failure
    #[error("MongoDB error: {0}")]
    Mongo(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Redis(err.to_string())
    }
}

impl From<mongodb::error::Error> for CacheError {
    fn from(err: mongodb::error::Error) -> Self {
        CacheError::Mongo(err.to_string())
    }
}

/// Errors returned by the color service for a single request
#[derive(Debug, Clone, Error)]
pub enum ColorError {
    /// The `img` query parameter is missing or empty
    #[error("Missing img parameter")]
    MissingImage,

    /// The image could not be retrieved
    #[error("Failed to fetch image: {0}")]
    Fetch(#[from] FetchError),

    /// The image could not be decoded
    #[error("Failed to decode image: {0}")]
    Decode(#[from] DecodeError),
}
