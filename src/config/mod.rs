use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Signing secret used when none is configured outside production
pub const DEV_JWT_SECRET: &str = "heartline-development-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub datastore: DatastoreConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatastoreBackend {
    JsonFile,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatastoreConfig {
    pub backend: DatastoreBackend,
    /// `None` keeps the JSON store in memory only
    pub data_file: Option<PathBuf>,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a non-default value in production")]
    InsecureJwtSecret,

    #[error("DATABASE_URL is required for the postgres datastore")]
    MissingDatabaseUrl,

    #[error("bcrypt cost {0} is outside 4..=31")]
    InvalidBcryptCost(u32),

    #[error("unknown datastore backend '{0}' (expected 'json' or 'postgres')")]
    UnknownBackend(String),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build config from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Server overrides
        if let Some(v) = lookup("HEARTLINE_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("HEARTLINE_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Datastore overrides
        if let Some(v) = lookup("DATASTORE_BACKEND") {
            self.datastore.backend = match v.to_ascii_lowercase().as_str() {
                "json" | "json_file" | "file" => DatastoreBackend::JsonFile,
                "postgres" | "postgresql" | "pg" => DatastoreBackend::Postgres,
                _ => return Err(ConfigError::UnknownBackend(v)),
            };
        }
        if let Some(v) = lookup("HEARTLINE_DATA_FILE") {
            self.datastore.data_file = if v.is_empty() { None } else { Some(PathBuf::from(v)) };
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.datastore.database_url = Some(v);
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.datastore.max_connections = v.parse().unwrap_or(self.datastore.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.datastore.connection_timeout = v.parse().unwrap_or(self.datastore.connection_timeout);
        }

        // API overrides
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = lookup("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }

        Ok(self)
    }

    /// Reject combinations the server can't safely start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment == Environment::Production
            && (self.security.jwt_secret.is_empty() || self.security.jwt_secret == DEV_JWT_SECRET)
        {
            return Err(ConfigError::InsecureJwtSecret);
        }
        if self.datastore.backend == DatastoreBackend::Postgres && self.datastore.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(self.security.bcrypt_cost));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            datastore: DatastoreConfig {
                backend: DatastoreBackend::JsonFile,
                data_file: Some(PathBuf::from("data/db.json")),
                database_url: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:5173".to_string(), "http://localhost:3000".to_string()],
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                bcrypt_cost: 10,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            datastore: DatastoreConfig {
                backend: DatastoreBackend::JsonFile,
                data_file: Some(PathBuf::from("data/db.json")),
                database_url: None,
                max_connections: 10,
                connection_timeout: 10,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.heartline.app".to_string()],
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24,
                bcrypt_cost: 12,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            datastore: DatastoreConfig {
                backend: DatastoreBackend::JsonFile,
                data_file: Some(PathBuf::from("data/db.json")),
                database_url: None,
                max_connections: 20,
                connection_timeout: 5,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://heartline.app".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                bcrypt_cost: 12,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.datastore.backend, DatastoreBackend::JsonFile);
        assert_eq!(config.security.jwt_secret, DEV_JWT_SECRET);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_requires_secret() {
        let config = AppConfig::from_lookup(lookup(&[("APP_ENV", "production")])).unwrap();
        assert!(config.is_production());
        assert_eq!(config.validate(), Err(ConfigError::InsecureJwtSecret));

        let config = AppConfig::from_lookup(lookup(&[
            ("APP_ENV", "prod"),
            ("JWT_SECRET", "a-real-secret"),
        ]))
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("HEARTLINE_DATA_FILE", ""),
            ("SECURITY_CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("SECURITY_BCRYPT_COST", "4"),
            ("API_MAX_REQUEST_SIZE_BYTES", "not-a-number"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.datastore.data_file, None);
        assert_eq!(config.security.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.security.bcrypt_cost, 4);
        // Unparseable values keep the preset
        assert_eq!(config.api.max_request_size_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_postgres_backend_needs_url() {
        let config = AppConfig::from_lookup(lookup(&[("DATASTORE_BACKEND", "postgres")])).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::MissingDatabaseUrl));

        let err = AppConfig::from_lookup(lookup(&[("DATASTORE_BACKEND", "redis")])).unwrap_err();
        assert_eq!(err, ConfigError::UnknownBackend("redis".to_string()));
    }
}
