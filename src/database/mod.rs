pub mod json_file;
pub mod postgres;
pub mod record;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{DatastoreBackend, DatastoreConfig};

pub use json_file::JsonFileStore;
pub use postgres::PgStore;

/// A stored document: arbitrary string keys, always carrying an `id`.
pub type Item = Map<String, Value>;

/// Shared handle to whichever backend the server was started with
pub type Store = Arc<dyn Datastore>;

/// Errors from datastore backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Item has no string `id` field")]
    MissingId,

    #[error("Datastore file is corrupt: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Collection accessor over named document collections.
///
/// Every call is atomic: it either fully applies or returns an error and
/// leaves the store untouched. Concurrent writes to the same item are
/// last-write-wins; there are no multi-call transactions.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// All items of a collection in insertion order
    async fn all(&self, collection: &str) -> Result<Vec<Item>, StoreError>;

    async fn find(&self, collection: &str, id: &str) -> Result<Option<Item>, StoreError>;

    /// Insert a new item. The item must contain a string `id`.
    async fn create(&self, collection: &str, item: Item) -> Result<Item, StoreError>;

    /// Shallow-merge `patch` into the stored item and return the result,
    /// or `None` if no item has that id.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Item,
    ) -> Result<Option<Item>, StoreError>;

    /// Returns whether an item was removed
    async fn remove(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// Readiness probe used by `/health`
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Build the configured backend
pub async fn open_store(config: &DatastoreConfig) -> Result<Store, StoreError> {
    match config.backend {
        DatastoreBackend::JsonFile => {
            let store = match &config.data_file {
                Some(path) => JsonFileStore::open(path).await?,
                None => JsonFileStore::in_memory(),
            };
            Ok(Arc::new(store))
        }
        DatastoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
            let store =
                PgStore::connect(url, config.max_connections, config.connection_timeout).await?;
            Ok(Arc::new(store))
        }
    }
}

/// The `id` of an item, if it has a string one
pub(crate) fn item_id(item: &Item) -> Option<&str> {
    item.get("id").and_then(Value::as_str)
}
