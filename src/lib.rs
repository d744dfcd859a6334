pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod resources;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, Environment};
use crate::handlers::{protected, public};
use crate::state::AppState;

/// Build the full HTTP application around an already-constructed state
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = DefaultBodyLimit::max(state.config.api.max_request_size_bytes);

    Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        // Public auth routes
        .merge(auth_public_routes())
        // Protected account routes
        .merge(auth_routes(&state))
        // Resource collections, auth decided per collection
        .merge(resources::routes())
        // Global middleware
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami_get))
        .route_layer(axum::middleware::from_fn_with_state(
            state.keys.clone(),
            middleware::require_auth,
        ))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let security = &config.security;

    if !security.enable_cors {
        return CorsLayer::new();
    }
    if config.environment == Environment::Development || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
