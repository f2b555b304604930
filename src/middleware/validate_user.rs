use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::access::Scope;
use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;

/// The caller's user row, loaded after JWT authentication
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Middleware that loads the user named by the access token.
/// Deleted and inactive users are rejected as unauthenticated.
pub async fn validate_user_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    let user = state.store.find_user(auth_user.user_id).await?.ok_or_else(|| {
        tracing::warn!("User validation failed: user {} no longer exists", auth_user.user_id);
        ApiError::unauthorized("User not found")
    })?;

    if !user.is_active {
        tracing::warn!("User validation failed: user {} is inactive", user.id);
        return Err(ApiError::unauthorized("User is inactive"));
    }

    tracing::debug!("User validation successful: {} ({})", user.email, user.id);

    request.extensions_mut().insert(Scope::of(user.id));
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided."))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Scope {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Scope>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided."))
    }
}
