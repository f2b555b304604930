// handlers/protected/users/password.rs - POST /api/users/change-password

use axum::extract::State;

use crate::api::format::Detail;
use crate::api::payload::ChangePasswordPayload;
use crate::app::AppState;
use crate::auth::{hash_password_async, validate_password_strength, verify_password_async};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, ValidatedJson};

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordPayload>,
) -> ApiResult<Detail> {
    if !verify_password_async(user.password_hash.clone(), payload.old_password).await {
        return Err(ApiError::field_error("old_password", "Wrong password"));
    }
    validate_password_strength(&payload.new_password)
        .map_err(|problems| ApiError::field_error("new_password", problems.join(" ")))?;

    state
        .store
        .set_password(user.id, &hash_password_async(payload.new_password).await?)
        .await?;

    tracing::info!("User {} changed password", user.id);
    Ok(ApiResponse::success(Detail::new("Password updated successfully")))
}
