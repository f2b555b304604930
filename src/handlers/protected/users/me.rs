// handlers/protected/users/me.rs - GET/PUT/PATCH/DELETE /api/users/me

use axum::extract::State;

use crate::api::format::UserProfile;
use crate::api::payload::ProfilePayload;
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, ValidatedJson};

pub async fn me_get(CurrentUser(user): CurrentUser) -> ApiResult<UserProfile> {
    Ok(ApiResponse::success(user.into()))
}

/// PUT and PATCH behave alike: only `name` and `avatar` are writable.
pub async fn me_update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<ProfilePayload>,
) -> ApiResult<UserProfile> {
    let user = state.store.update_profile(user.id, payload.into()).await?;
    Ok(ApiResponse::success(user.into()))
}

/// Delete the account and everything it owns.
pub async fn me_delete(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<()> {
    state.store.delete_user(user.id).await?;
    tracing::info!("Deleted user {} ({})", user.email, user.id);
    Ok(ApiResponse::no_content())
}
