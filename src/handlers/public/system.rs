// handlers/public/system.rs - GET / and GET /health

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::database::Store;
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::resources::COLLECTIONS;

pub async fn root() -> ApiResponse<Value> {
    let collections: Vec<Value> = COLLECTIONS
        .iter()
        .map(|(name, ownership)| {
            json!({
                "name": name,
                "path": format!("/api/{}", name),
                "ownership": ownership,
            })
        })
        .collect();

    ApiResponse::success(json!({
        "name": "Heartline API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "auth": "/auth/register, /auth/login (public - token acquisition)",
            "whoami": "/api/auth/whoami (protected)",
            "resources": "/api/:collection[/:id]",
        },
        "collections": collections,
    }))
}

pub async fn health(State(store): State<Store>) -> Result<Json<Value>, ApiError> {
    store.ping().await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        ApiError::service_unavailable("Datastore unavailable")
    })?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "datastore": "ok"
        }
    })))
}
