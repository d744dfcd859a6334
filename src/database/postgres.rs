use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use tracing::info;

use super::{item_id, Datastore, Item, StoreError};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS resource_items (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        data JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (collection, id)
    )
"#;

/// PostgreSQL-backed datastore: one JSONB document per item
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        connection_timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connection_timeout_secs))
            .connect(database_url)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;

        info!("Connected PostgreSQL datastore (max {} connections)", max_connections);
        Ok(Self { pool })
    }
}

#[async_trait]
impl Datastore for PgStore {
    async fn all(&self, collection: &str) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query_scalar::<_, Json<Item>>(
            "SELECT data FROM resource_items WHERE collection = $1 ORDER BY created_at, id",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|Json(item)| item).collect())
    }

    async fn find(&self, collection: &str, id: &str) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query_scalar::<_, Json<Item>>(
            "SELECT data FROM resource_items WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(item)| item))
    }

    async fn create(&self, collection: &str, item: Item) -> Result<Item, StoreError> {
        let id = item_id(&item).ok_or(StoreError::MissingId)?.to_string();

        sqlx::query("INSERT INTO resource_items (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(&id)
            .bind(Json(&item))
            .execute(&self.pool)
            .await?;

        Ok(item)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Item,
    ) -> Result<Option<Item>, StoreError> {
        // `||` on JSONB objects is a shallow merge, right side wins
        let row = sqlx::query_scalar::<_, Json<Item>>(
            "UPDATE resource_items SET data = data || $3 \
             WHERE collection = $1 AND id = $2 RETURNING data",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(&patch))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(item)| item))
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM resource_items WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn item(value: Value) -> Item {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test fixtures are objects"),
        }
    }

    /// Needs a live server; skipped when DATABASE_URL is unset
    async fn store() -> Option<PgStore> {
        let url = std::env::var("DATABASE_URL").ok()?;
        Some(PgStore::connect(&url, 2, 5).await.expect("connect to DATABASE_URL"))
    }

    #[tokio::test]
    async fn create_merge_and_remove() {
        let Some(store) = store().await else {
            eprintln!("DATABASE_URL not set, skipping");
            return;
        };
        // Fresh collection per run so reruns don't collide
        let collection = format!("test-{}", uuid::Uuid::new_v4());

        store
            .create(&collection, item(json!({"id": "a", "title": "Paris", "done": false})))
            .await
            .unwrap();
        store.create(&collection, item(json!({"id": "b"}))).await.unwrap();
        assert!(matches!(
            store.create(&collection, item(json!({"title": "no id"}))).await,
            Err(StoreError::MissingId)
        ));

        let merged = store
            .update(&collection, "a", item(json!({"done": true})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(merged["title"], "Paris");
        assert_eq!(merged["done"], true);
        assert!(store
            .update(&collection, "missing", item(json!({"done": true})))
            .await
            .unwrap()
            .is_none());

        let found = store.find(&collection, "a").await.unwrap().unwrap();
        assert_eq!(found, merged);
        assert_eq!(store.all(&collection).await.unwrap().len(), 2);

        assert!(store.remove(&collection, "a").await.unwrap());
        assert!(!store.remove(&collection, "a").await.unwrap());
        assert!(store.find(&collection, "a").await.unwrap().is_none());

        assert!(store.remove(&collection, "b").await.unwrap());
        store.ping().await.unwrap();
    }
}
