// handlers/protected/mod.rs - Protected handlers (access token required)
//
// Every handler here runs behind jwt_auth_middleware and
// validate_user_middleware, and reads owned data only through the caller's
// Scope.

pub mod dashboard;
pub mod notifications;
pub mod projects;
pub mod skills;
pub mod users;
