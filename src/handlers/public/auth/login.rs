// handlers/public/auth/login.rs - POST /auth/login handler

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use serde::Deserialize;

use super::AuthPayload;
use crate::auth::{users, AuthError};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

/**
 * POST /auth/login - Exchange name + password for a JWT
 *
 * Unknown names and wrong passwords get the same 401.
 */
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<AuthPayload> {
    let Json(request) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    let user = users::find_by_name(state.store.as_ref(), request.name.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let valid = state
        .keys
        .verify_password(request.password, user.password_hash.clone())
        .await?;
    if !valid {
        tracing::warn!("Failed login for account {}", user.id);
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.keys.issue(&user.id, &user.name)?;

    Ok(ApiResponse::success(AuthPayload {
        token,
        expires_in: state.keys.expiry_hours() * 3600,
        user: user.into(),
    }))
}
