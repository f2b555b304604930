// handlers/protected/notifications.rs - /api/notifications resource

use axum::extract::{Path, State};

use crate::access::Scope;
use crate::api::format::{Status, UnreadCount};
use crate::app::AppState;
use crate::database::models::Notification;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/notifications - newest first
pub async fn list(State(state): State<AppState>, scope: Scope) -> ApiResult<Vec<Notification>> {
    Ok(ApiResponse::success(state.store.list_notifications(&scope).await?))
}

/// DELETE /api/notifications - clear all
pub async fn clear(State(state): State<AppState>, scope: Scope) -> ApiResult<Status> {
    let removed = state.store.clear_notifications(&scope).await?;
    tracing::debug!("Cleared {} notifications for user {}", removed, scope.user_id());
    Ok(ApiResponse::success(Status::new("cleared")))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(State(state): State<AppState>, scope: Scope) -> ApiResult<UnreadCount> {
    let unread = state.store.unread_count(&scope).await?;
    Ok(ApiResponse::success(UnreadCount { unread }))
}

/// PATCH /api/notifications/:id/read
pub async fn mark_read(State(state): State<AppState>, scope: Scope, Path(id): Path<i64>) -> ApiResult<Status> {
    state.store.mark_read(&scope, id).await?;
    Ok(ApiResponse::success(Status::new("read")))
}

/// POST /api/notifications/mark-all-read
pub async fn mark_all_read(State(state): State<AppState>, scope: Scope) -> ApiResult<Status> {
    let updated = state.store.mark_all_read(&scope).await?;
    tracing::debug!("Marked {} notifications read for user {}", updated, scope.user_id());
    Ok(ApiResponse::success(Status::new("all read")))
}

/// DELETE /api/notifications/:id
pub async fn destroy(State(state): State<AppState>, scope: Scope, Path(id): Path<i64>) -> ApiResult<()> {
    state.store.delete_notification(&scope, id).await?;
    Ok(ApiResponse::no_content())
}
