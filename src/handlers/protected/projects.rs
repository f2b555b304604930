// handlers/protected/projects.rs - /api/projects resource and milestone toggle

use axum::extract::{Path, State};

use crate::access::Scope;
use crate::api::format::{MilestoneToggled, ProjectView};
use crate::api::payload::{ProjectPatch, ProjectPayload};
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::observer::CreationEvent;
use crate::store::ProjectInput;

/// GET /api/projects
pub async fn list(State(state): State<AppState>, scope: Scope) -> ApiResult<Vec<ProjectView>> {
    let records = state.store.list_projects(&scope).await?;
    Ok(ApiResponse::success(records.into_iter().map(ProjectView::from).collect()))
}

/// POST /api/projects - with optional nested milestones and skill ids
pub async fn create(
    State(state): State<AppState>,
    scope: Scope,
    ValidatedJson(payload): ValidatedJson<ProjectPayload>,
) -> ApiResult<ProjectView> {
    let record = state.store.create_project(&scope, ProjectInput::from(payload)).await?;
    tracing::info!("User {} created project {}", scope.user_id(), record.project.id);

    state.observers.created(CreationEvent::project(&record.project)).await;

    Ok(ApiResponse::created(record.into()))
}

/// GET /api/projects/:id
pub async fn show(State(state): State<AppState>, scope: Scope, Path(id): Path<i64>) -> ApiResult<ProjectView> {
    Ok(ApiResponse::success(state.store.get_project(&scope, id).await?.into()))
}

/// PUT /api/projects/:id - milestones are replaced wholesale when present
pub async fn update(
    State(state): State<AppState>,
    scope: Scope,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<ProjectPayload>,
) -> ApiResult<ProjectView> {
    let record = state.store.update_project(&scope, id, payload.into()).await?;
    Ok(ApiResponse::success(record.into()))
}

/// PATCH /api/projects/:id
pub async fn partial_update(
    State(state): State<AppState>,
    scope: Scope,
    Path(id): Path<i64>,
    ValidatedJson(patch): ValidatedJson<ProjectPatch>,
) -> ApiResult<ProjectView> {
    let record = state.store.update_project(&scope, id, patch.into()).await?;
    Ok(ApiResponse::success(record.into()))
}

/// DELETE /api/projects/:id - milestones go with it
pub async fn destroy(State(state): State<AppState>, scope: Scope, Path(id): Path<i64>) -> ApiResult<()> {
    state.store.delete_project(&scope, id).await?;
    Ok(ApiResponse::no_content())
}

/// PATCH /api/projects/:project_id/milestones/:milestone_id - flip completion
pub async fn toggle_milestone(
    State(state): State<AppState>,
    scope: Scope,
    Path((project_id, milestone_id)): Path<(i64, i64)>,
) -> ApiResult<MilestoneToggled> {
    let milestone = state.store.toggle_milestone(&scope, project_id, milestone_id).await?;
    Ok(ApiResponse::success(milestone.into()))
}
