// handlers/mod.rs - Handler tiers
//
// public    no credentials (/, /health, /auth/*)
// protected bearer JWT required (/api/auth/*)
// resource  generic collection CRUD; auth policy depends on the collection

pub mod protected;
pub mod public;
pub mod resource;
