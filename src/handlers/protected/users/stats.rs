// handlers/protected/users/stats.rs - GET /api/users/stats

use axum::extract::State;

use crate::access::Scope;
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::store::UserCounts;

pub async fn stats(State(state): State<AppState>, scope: Scope) -> ApiResult<UserCounts> {
    Ok(ApiResponse::success(state.store.user_counts(&scope).await?))
}
