// handlers/public/mod.rs - Handlers that never require credentials

pub mod auth;
pub mod system;
