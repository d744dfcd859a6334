//! User accounts, stored as documents in the internal `users` collection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::database::{record::now_millis, Datastore, Item, StoreError};

/// Datastore collection holding accounts. Never mounted as a resource.
pub const USERS_COLLECTION: &str = "users";

/// Stored account document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub female_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub male_name: Option<String>,
    pub created_at: i64,
}

/// Account as returned to clients (no password hash)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub female_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub male_name: Option<String>,
    pub created_at: i64,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            female_name: user.female_name,
            male_name: user.male_name,
            created_at: user.created_at,
        }
    }
}

/// Fields accepted when creating an account
pub struct NewUser {
    pub name: String,
    pub password_hash: String,
    pub female_name: Option<String>,
    pub male_name: Option<String>,
}

fn from_item(item: Item) -> Result<User, StoreError> {
    Ok(serde_json::from_value(Value::Object(item))?)
}

/// Look up an account by name, case-insensitively
pub async fn find_by_name(store: &dyn Datastore, name: &str) -> Result<Option<User>, StoreError> {
    let wanted = name.to_lowercase();
    for item in store.all(USERS_COLLECTION).await? {
        let matches = item
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|n| n.to_lowercase() == wanted);
        if matches {
            return from_item(item).map(Some);
        }
    }
    Ok(None)
}

pub async fn find_by_id(store: &dyn Datastore, id: &str) -> Result<Option<User>, StoreError> {
    store
        .find(USERS_COLLECTION, id)
        .await?
        .map(from_item)
        .transpose()
}

pub async fn create_user(store: &dyn Datastore, new_user: NewUser) -> Result<User, StoreError> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: new_user.name,
        password_hash: new_user.password_hash,
        female_name: new_user.female_name,
        male_name: new_user.male_name,
        created_at: now_millis(),
    };

    let Value::Object(item) = serde_json::to_value(&user)? else {
        return Err(StoreError::Corrupt("user did not serialize to an object".into()));
    };
    store.create(USERS_COLLECTION, item).await?;

    Ok(user)
}
