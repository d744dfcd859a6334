// handlers/protected/auth/whoami.rs - GET /api/auth/whoami handler

use axum::extract::{Extension, State};

use crate::auth::users::{self, UserInfo};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// Current account for the bearer token. A valid token whose account has
/// since disappeared is treated as unauthenticated.
pub async fn whoami_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<UserInfo> {
    let user = users::find_by_id(state.store.as_ref(), &caller.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;

    Ok(ApiResponse::success(user.into()))
}
