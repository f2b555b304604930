// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (access token + active user).
// Route wiring lives in app.rs; each tier only exposes handler functions.

pub mod protected;
pub mod public;
