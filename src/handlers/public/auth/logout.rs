// handlers/public/auth/logout.rs - POST /api/auth/logout handler

use axum::{body::Bytes, extract::State};

use crate::api::format::Detail;
use crate::api::payload::LogoutPayload;
use crate::app::AppState;
use crate::auth::TokenKind;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// Always succeeds. A supplied, still-valid refresh token is revoked.
pub async fn logout(State(state): State<AppState>, body: Bytes) -> ApiResult<Detail> {
    let payload: LogoutPayload = if body.iter().all(u8::is_ascii_whitespace) {
        LogoutPayload::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::invalid_json(e.to_string()))?
    };

    if let Some(token) = payload.refresh {
        match state.tokens.validate(&token, TokenKind::Refresh) {
            Ok(claims) => {
                if state.store.find_user(claims.user_id).await?.is_some() {
                    state
                        .store
                        .revoke_token(claims.user_id, claims.jti, claims.expires_at())
                        .await?;
                }
            }
            Err(e) => tracing::debug!("Logout with unusable refresh token: {}", e),
        }
    }

    Ok(ApiResponse::success(Detail::new("Logged out successfully")))
}
