// handlers/public/auth/refresh.rs - POST /api/auth/token/refresh handler

use axum::extract::State;

use crate::api::payload::RefreshPayload;
use crate::app::AppState;
use crate::auth::{AuthError, TokenKind, TokenPair};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};

/// Rotate a refresh token: the presented token is revoked and a fresh pair
/// is issued. A token can be rotated at most once.
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshPayload>,
) -> ApiResult<TokenPair> {
    let claims = state.tokens.validate(&payload.refresh, TokenKind::Refresh)?;

    let user = state
        .store
        .find_user(claims.user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    if !state.store.revoke_token(user.id, claims.jti, claims.expires_at()).await? {
        tracing::warn!("Revoked refresh token {} presented for user {}", claims.jti, user.id);
        return Err(AuthError::Revoked.into());
    }

    Ok(ApiResponse::success(state.tokens.issue_pair(user.id)?))
}
