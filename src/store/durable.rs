//! Durable (non-expiring) record sink.
//!
//! The durable tier keeps one record per distinct image URL holding the most
//! recently computed color. It is written after every fresh computation and
//! never read on the request path.

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection};

use crate::error::{CacheError, ConfigError};

/// Default MongoDB collection for color records.
pub const DEFAULT_COLLECTION: &str = "colors";

/// Field holding the literal image URL.
pub const IMAGE_URL_FIELD: &str = "image_url";

/// Field holding the `#rrggbb` color.
pub const MAIN_COLOR_FIELD: &str = "main_color";

/// A persistent store of URL → color records.
#[async_trait]
pub trait DurableTier: Send + Sync {
    /// Create the record for `url`, or overwrite its color if it exists.
    async fn upsert(&self, url: &str, color: &str) -> Result<(), CacheError>;
}

/// Connection settings for [`MongoTier`].
#[derive(Debug, Clone)]
pub struct MongoSettings {
    /// MongoDB connection string
    pub uri: String,

    /// Database name
    pub database: String,

    /// Collection name
    pub collection: String,
}

/// MongoDB-backed durable tier.
#[derive(Clone)]
pub struct MongoTier {
    collection: Collection<Document>,
}

impl MongoTier {
    /// Connect to MongoDB and verify the connection with a `ping` command.
    pub async fn connect(settings: &MongoSettings) -> Result<Self, ConfigError> {
        let connection_error = |e: mongodb::error::Error| ConfigError::Connection {
            tier: "MongoDB",
            message: e.to_string(),
        };

        let client = Client::with_uri_str(&settings.uri)
            .await
            .map_err(connection_error)?;
        let database = client.database(&settings.database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(connection_error)?;

        Ok(Self {
            collection: database.collection(&settings.collection),
        })
    }
}

/// Filter selecting the record for `url`.
pub fn record_filter(url: &str) -> Document {
    let mut filter = Document::new();
    filter.insert(IMAGE_URL_FIELD, url);
    filter
}

/// Update setting the color on the record.
pub fn record_update(color: &str) -> Document {
    let mut set = Document::new();
    set.insert(MAIN_COLOR_FIELD, color);

    let mut update = Document::new();
    update.insert("$set", set);
    update
}

#[async_trait]
impl DurableTier for MongoTier {
    async fn upsert(&self, url: &str, color: &str) -> Result<(), CacheError> {
        self.collection
            .update_one(record_filter(url), record_update(color))
            .upsert(true)
            .await?;
        Ok(())
    }
}
