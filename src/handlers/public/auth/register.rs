// handlers/public/auth/register.rs - POST /auth/register handler

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use serde::Deserialize;

use super::AuthPayload;
use crate::auth::users::{self, NewUser};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub female_name: Option<String>,
    #[serde(default)]
    pub male_name: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Account name: explicit `name`, else "<female> & <male>" when both are given
fn account_name(request: &RegisterRequest) -> Option<String> {
    non_empty(request.name.clone()).or_else(|| {
        match (
            non_empty(request.female_name.clone()),
            non_empty(request.male_name.clone()),
        ) {
            (Some(female), Some(male)) => Some(format!("{} & {}", female, male)),
            _ => None,
        }
    })
}

/**
 * POST /auth/register - Create an account and sign it in
 *
 * Input: `{ name, password, femaleName?, maleName? }`
 * Output (201): `{ success: true, data: { token, user, expires_in } }`
 */
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<AuthPayload> {
    let Json(request) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    let name = account_name(&request)
        .ok_or_else(|| ApiError::invalid_field("name", "Name is required"))?;

    let password = request.password.clone().unwrap_or_default();
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::invalid_field(
            "password",
            format!("Password must be at least {} characters long", MIN_PASSWORD_LEN),
        ));
    }

    let password_hash = state.keys.hash_password(password).await?;

    let store = state.store.as_ref();
    let _guard = state.registrations.lock().await;
    if users::find_by_name(store, &name).await?.is_some() {
        return Err(ApiError::conflict(format!("Account '{}' already exists", name)));
    }

    let user = users::create_user(
        store,
        NewUser {
            name,
            password_hash,
            female_name: non_empty(request.female_name),
            male_name: non_empty(request.male_name),
        },
    )
    .await?;

    let token = state.keys.issue(&user.id, &user.name)?;
    tracing::info!("Registered account {} ({})", user.name, user.id);

    Ok(ApiResponse::created(AuthPayload {
        token,
        expires_in: state.keys.expiry_hours() * 3600,
        user: user.into(),
    }))
}
