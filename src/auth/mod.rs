pub mod users;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingCredentials,

    #[error("Authorization header must use Bearer token format")]
    MalformedHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

/// Signing material plus the settings needed to mint tokens
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_hours: u64,
    bcrypt_cost: u32,
}

impl JwtKeys {
    pub fn new(security: &SecurityConfig) -> Self {
        let secret = security.jwt_secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            expiry_hours: security.jwt_expiry_hours,
            bcrypt_cost: security.bcrypt_cost,
        }
    }

    pub fn expiry_hours(&self) -> u64 {
        self.expiry_hours
    }

    pub fn issue(&self, user_id: &str, name: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            name: name.to_string(),
            exp: (now + Duration::hours(self.expiry_hours as i64)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// bcrypt is CPU-bound, so it runs off the async workers
    pub async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    pub async fn verify_password(&self, password: String, hash: String) -> Result<bool, AuthError> {
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn keys() -> JwtKeys {
        let mut config = AppConfig::development();
        config.security.bcrypt_cost = 4;
        JwtKeys::new(&config.security)
    }

    #[test]
    fn issued_tokens_verify() {
        let keys = keys();
        let token = keys.issue("user-1", "Ana & Ben").unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.name, "Ana & Ben");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let mut other = AppConfig::development();
        other.security.jwt_secret = "someone-else".to_string();
        let token = JwtKeys::new(&other.security).issue("user-1", "x").unwrap();

        assert!(matches!(keys().verify(&token), Err(AuthError::InvalidToken(_))));
        assert!(matches!(keys().verify("not.a.jwt"), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let keys = keys();
        let claims = Claims {
            sub: "user-1".to_string(),
            name: "x".to_string(),
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
            iat: (Utc::now() - Duration::hours(3)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert!(matches!(keys.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn password_hash_round_trip() {
        let keys = keys();
        let hash = keys.hash_password("secret123".to_string()).await.unwrap();
        assert_ne!(hash, "secret123");
        assert!(keys.verify_password("secret123".to_string(), hash.clone()).await.unwrap());
        assert!(!keys.verify_password("wrong".to_string(), hash).await.unwrap());
    }
}
