use std::sync::Arc;

use axum::extract::FromRef;
use tokio::sync::Mutex;

use crate::auth::JwtKeys;
use crate::config::AppConfig;
use crate::database::Store;

/// Everything a handler may depend on, constructed once at startup and
/// passed into the router.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub keys: JwtKeys,
    pub config: Arc<AppConfig>,
    /// Held across the name check and insert so account names stay unique
    pub registrations: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store) -> Self {
        Self {
            keys: JwtKeys::new(&config.security),
            store,
            config: Arc::new(config),
            registrations: Arc::new(Mutex::new(())),
        }
    }
}

impl FromRef<AppState> for Store {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}
