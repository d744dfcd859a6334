use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use super::{item_id, Datastore, Item, StoreError};

type Collections = HashMap<String, Vec<Item>>;

/// Flat JSON-document datastore.
///
/// The whole database is one object mapping collection names to arrays of
/// items. It is held in memory and rewritten to disk on every mutation
/// (temp file + rename), while the write lock is held, so the file always
/// reflects a complete sequence of applied calls.
pub struct JsonFileStore {
    path: Option<PathBuf>,
    collections: RwLock<Collections>,
}

impl JsonFileStore {
    /// Load the database at `path`. A missing file starts empty.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let collections = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Collections::new(),
            Ok(bytes) => serde_json::from_slice::<Collections>(&bytes)
                .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Collections::new(),
            Err(e) => return Err(e.into()),
        };

        info!(
            "Opened JSON datastore {} ({} collections)",
            path.display(),
            collections.len()
        );

        Ok(Self {
            path: Some(path),
            collections: RwLock::new(collections),
        })
    }

    /// Memory-only store, nothing is persisted
    pub fn in_memory() -> Self {
        Self {
            path: None,
            collections: RwLock::new(Collections::new()),
        }
    }

    async fn persist(&self, collections: &Collections) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(collections)?;
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl Datastore for JsonFileStore {
    async fn all(&self, collection: &str) -> Result<Vec<Item>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn find(&self, collection: &str, id: &str) -> Result<Option<Item>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|items| items.iter().find(|item| item_id(item) == Some(id)))
            .cloned())
    }

    async fn create(&self, collection: &str, item: Item) -> Result<Item, StoreError> {
        if item_id(&item).is_none() {
            return Err(StoreError::MissingId);
        }

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(item.clone());

        if let Err(e) = self.persist(&collections).await {
            if let Some(items) = collections.get_mut(collection) {
                items.pop();
            }
            return Err(e);
        }

        Ok(item)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Item,
    ) -> Result<Option<Item>, StoreError> {
        let mut collections = self.collections.write().await;

        let Some(items) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(index) = items.iter().position(|item| item_id(item) == Some(id)) else {
            return Ok(None);
        };

        let previous = items[index].clone();
        items[index].extend(patch);
        let merged = items[index].clone();

        if let Err(e) = self.persist(&collections).await {
            if let Some(items) = collections.get_mut(collection) {
                items[index] = previous;
            }
            return Err(e);
        }

        Ok(Some(merged))
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;

        let Some(items) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(index) = items.iter().position(|item| item_id(item) == Some(id)) else {
            return Ok(false);
        };

        let removed = items.remove(index);

        if let Err(e) = self.persist(&collections).await {
            if let Some(items) = collections.get_mut(collection) {
                items.insert(index, removed);
            }
            return Err(e);
        }

        Ok(true)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
