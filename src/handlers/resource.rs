// handlers/resource.rs - Generic CRUD handlers, instantiated per collection type
//
// GET    /api/<collection>      list (scoped to caller for user-owned collections)
// POST   /api/<collection>      create
// GET    /api/<collection>/:id  get one
// PUT    /api/<collection>/:id  update
// DELETE /api/<collection>/:id  delete
//
// Items owned by someone else answer exactly like missing items.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tracing::info;

use crate::database::{record, Item, Store};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::resources::{Ownership, Resource};
use crate::state::AppState;

pub fn routes<R: Resource>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route("/:id", get(get_one::<R>).put(update::<R>).delete(delete::<R>))
}

fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    ApiError::invalid_json(rejection.body_text())
}

/// Whether `caller` may see `item` in collection `R`
fn visible_to<R: Resource>(item: &Item, caller: &AuthUser) -> bool {
    match R::OWNERSHIP {
        Ownership::Shared => true,
        Ownership::PerUser => record::is_owned_by(item, &caller.id),
    }
}

async fn find_visible<R: Resource>(
    store: &Store,
    id: &str,
    caller: &AuthUser,
) -> Result<Item, ApiError> {
    match store.find(R::NAME, id).await? {
        Some(item) if visible_to::<R>(&item, caller) => Ok(item),
        _ => Err(not_found()),
    }
}

/// GET /api/<collection> - credentials only required for user-owned collections
pub async fn list<R: Resource>(
    State(store): State<Store>,
    caller: Result<AuthUser, ApiError>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let caller = match R::OWNERSHIP {
        Ownership::PerUser => Some(caller?),
        Ownership::Shared => None,
    };

    let items = store.all(R::NAME).await?;

    let Some(caller) = caller else {
        return Ok(Json(items));
    };

    let total = items.len();
    let filtered: Vec<Item> = items
        .into_iter()
        .filter(|item| record::is_owned_by(item, &caller.id))
        .collect();

    info!(
        collection = R::NAME,
        user_id = %caller.id,
        total,
        filtered = filtered.len(),
        "Listed collection"
    );

    Ok(Json(filtered))
}

/// GET /api/<collection>/:id
pub async fn get_one<R: Resource>(
    State(store): State<Store>,
    Path(id): Path<String>,
    caller: AuthUser,
) -> Result<Json<Item>, ApiError> {
    find_visible::<R>(&store, &id, &caller).await.map(Json)
}

/// POST /api/<collection> - ownership and bookkeeping fields come from the server
pub async fn create<R: Resource>(
    State(store): State<Store>,
    caller: AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let Json(payload) = payload.map_err(invalid_body)?;
    let fields = record::sanitize(payload)?;

    let owner = R::is_user_owned().then_some(caller.id.as_str());
    let created = store.create(R::NAME, record::new_item(fields, owner)).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/<collection>/:id - `userId`/`createdBy` in the body are ignored
pub async fn update<R: Resource>(
    State(store): State<Store>,
    Path(id): Path<String>,
    caller: AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Item>, ApiError> {
    find_visible::<R>(&store, &id, &caller).await?;

    let Json(payload) = payload.map_err(invalid_body)?;
    let patch = record::update_patch(record::sanitize(payload)?);

    // Gone between the lookup and the write: same answer as never existing
    let merged = store
        .update(R::NAME, &id, patch)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(merged))
}

/// DELETE /api/<collection>/:id
pub async fn delete<R: Resource>(
    State(store): State<Store>,
    Path(id): Path<String>,
    caller: AuthUser,
) -> Result<Json<Value>, ApiError> {
    find_visible::<R>(&store, &id, &caller).await?;

    if !store.remove(R::NAME, &id).await? {
        return Err(not_found());
    }

    Ok(Json(json!({ "ok": true })))
}
