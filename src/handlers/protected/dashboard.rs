// handlers/protected/dashboard.rs - /api/dashboard/* read-only views

use axum::extract::State;

use crate::access::Scope;
use crate::app::AppState;
use crate::dashboard::{self, ActivityItem, DashboardStats, ProgressReport};
use crate::middleware::{ApiResponse, ApiResult};

pub async fn stats(State(state): State<AppState>, scope: Scope) -> ApiResult<DashboardStats> {
    Ok(ApiResponse::success(dashboard::stats(state.store.as_ref(), &scope).await?))
}

pub async fn activity(State(state): State<AppState>, scope: Scope) -> ApiResult<Vec<ActivityItem>> {
    Ok(ApiResponse::success(dashboard::activity(state.store.as_ref(), &scope).await?))
}

pub async fn progress(State(state): State<AppState>, scope: Scope) -> ApiResult<ProgressReport> {
    Ok(ApiResponse::success(dashboard::progress(state.store.as_ref(), &scope).await?))
}
