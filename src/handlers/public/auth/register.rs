// handlers/public/auth/register.rs - POST /api/auth/register handler

use axum::extract::State;

use crate::api::format::RegisteredUser;
use crate::api::payload::{normalize_email, RegisterPayload};
use crate::app::AppState;
use crate::auth::{hash_password_async, validate_password_strength};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::store::NewUser;

/// Create an account. No tokens are issued; the client logs in afterwards.
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterPayload>,
) -> ApiResult<RegisteredUser> {
    payload
        .validate_passwords_match()
        .map_err(|msg| ApiError::field_error("password", msg))?;
    validate_password_strength(&payload.password)
        .map_err(|problems| ApiError::field_error("password", problems.join(" ")))?;

    let password_hash = hash_password_async(payload.password).await?;
    let user = state
        .store
        .create_user(NewUser {
            email: normalize_email(&payload.email),
            name: payload.name.trim().to_string(),
            password_hash,
            is_staff: false,
        })
        .await?;

    tracing::info!("Registered user {} ({})", user.email, user.id);
    Ok(ApiResponse::created(user.into()))
}
