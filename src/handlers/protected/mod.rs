// handlers/protected/mod.rs - Handlers mounted behind `require_auth`

pub mod auth;
