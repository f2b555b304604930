// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::extract::State;

use crate::api::format::LoginResponse;
use crate::api::payload::{normalize_email, LoginPayload};
use crate::app::AppState;
use crate::auth::verify_password_async;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};

/// Verify credentials and issue an access/refresh pair.
///
/// Unknown email, wrong password and inactive accounts are reported
/// identically.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginPayload>,
) -> ApiResult<LoginResponse> {
    let invalid = || ApiError::validation_error("Invalid email or password", None);
    let email = normalize_email(&payload.email);

    let user = state.store.find_user_by_email(&email).await?.ok_or_else(invalid)?;

    if !user.is_active || !verify_password_async(user.password_hash.clone(), payload.password).await {
        tracing::warn!("Failed login for user {}", user.id);
        return Err(invalid());
    }

    let tokens = state.tokens.issue_pair(user.id)?;
    tracing::info!("User {} logged in", user.id);

    Ok(ApiResponse::success(LoginResponse {
        tokens,
        user: user.into(),
    }))
}
