use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{AuthError, JwtKeys};
use crate::error::ApiError;

/// Caller identity resolved from the bearer token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
}

/// Resolve the caller from an `Authorization: Bearer <jwt>` header
pub fn authenticate(headers: &HeaderMap, keys: &JwtKeys) -> Result<AuthUser, AuthError> {
    let token = extract_jwt_from_headers(headers)?;
    let claims = keys.verify(token)?;

    Ok(AuthUser {
        id: claims.sub,
        name: claims.name,
    })
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_str = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::MalformedHeader),
    }
}

/// Middleware for route groups where every endpoint needs a caller.
/// Rejects with 401 before the handler runs and injects `AuthUser`.
pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(request.headers(), &keys).map_err(|e| {
        tracing::warn!("Rejected request to {}: {}", request.uri().path(), e);
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Handlers whose auth requirement depends on the resource type take
/// `AuthUser` (or `Result<AuthUser, ApiError>`) as an extractor instead of
/// sitting behind `require_auth`.
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let keys = JwtKeys::from_ref(state);
        authenticate(&parts.headers, &keys).map_err(|e| {
            tracing::warn!("Rejected request to {}: {}", parts.uri.path(), e);
            ApiError::from(e)
        })
    }
}
