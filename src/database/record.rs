use serde_json::Value;
use uuid::Uuid;

use super::Item;

/// Ownership fields: only the server ever writes these
pub const OWNERSHIP_FIELDS: &[&str] = &["userId", "createdBy"];

/// Bookkeeping fields the server assigns on create/update
pub const SYSTEM_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

/// Errors that can occur while reading client payloads
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Expected a JSON object body")]
    NotAnObject,
}

/// Milliseconds since the Unix epoch, the timestamp format stored on items
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Accept a client payload as an item body, dropping every field the
/// client isn't allowed to control.
pub fn sanitize(payload: Value) -> Result<Item, RecordError> {
    let Value::Object(mut fields) = payload else {
        return Err(RecordError::NotAnObject);
    };

    for field in OWNERSHIP_FIELDS.iter().chain(SYSTEM_FIELDS) {
        fields.remove(*field);
    }

    Ok(fields)
}

/// Build a fresh item from a sanitized payload. `owner` is stamped as
/// `userId` for user-owned collections.
pub fn new_item(fields: Item, owner: Option<&str>) -> Item {
    let mut item = Item::new();
    item.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    item.extend(fields);
    item.insert("createdAt".into(), Value::from(now_millis()));
    if let Some(owner) = owner {
        item.insert("userId".into(), Value::String(owner.to_string()));
    }
    item
}

/// Turn a sanitized payload into an update patch
pub fn update_patch(mut fields: Item) -> Item {
    fields.insert("updatedAt".into(), Value::from(now_millis()));
    fields
}

/// Ownership predicate for user-owned items
pub fn is_owned_by(item: &Item, user_id: &str) -> bool {
    item.get("userId").and_then(Value::as_str) == Some(user_id)
}
