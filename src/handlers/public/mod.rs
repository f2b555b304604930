// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, token rotation and liveness probes.

pub mod auth;
mod health;

pub use health::health;
