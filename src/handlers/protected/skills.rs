// handlers/protected/skills.rs - /api/skills resource

use axum::extract::{Path, State};

use crate::access::Scope;
use crate::api::payload::{SkillPatch, SkillPayload};
use crate::app::AppState;
use crate::database::models::Skill;
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::observer::CreationEvent;

/// GET /api/skills - caller's skills, newest first
pub async fn list(State(state): State<AppState>, scope: Scope) -> ApiResult<Vec<Skill>> {
    Ok(ApiResponse::success(state.store.list_skills(&scope).await?))
}

/// POST /api/skills
pub async fn create(
    State(state): State<AppState>,
    scope: Scope,
    ValidatedJson(payload): ValidatedJson<SkillPayload>,
) -> ApiResult<Skill> {
    let skill = state.store.create_skill(&scope, payload.into()).await?;
    tracing::info!("User {} added skill {}", scope.user_id(), skill.id);

    // Runs after the write has committed; failures are logged by the pipeline
    state.observers.created(CreationEvent::skill(&skill)).await;

    Ok(ApiResponse::created(skill))
}

/// GET /api/skills/:id
pub async fn show(State(state): State<AppState>, scope: Scope, Path(id): Path<i64>) -> ApiResult<Skill> {
    Ok(ApiResponse::success(state.store.get_skill(&scope, id).await?))
}

/// PUT /api/skills/:id - full update; an omitted `years_of_experience` is kept
pub async fn update(
    State(state): State<AppState>,
    scope: Scope,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<SkillPayload>,
) -> ApiResult<Skill> {
    Ok(ApiResponse::success(state.store.update_skill(&scope, id, payload.into()).await?))
}

/// PATCH /api/skills/:id
pub async fn partial_update(
    State(state): State<AppState>,
    scope: Scope,
    Path(id): Path<i64>,
    ValidatedJson(patch): ValidatedJson<SkillPatch>,
) -> ApiResult<Skill> {
    Ok(ApiResponse::success(state.store.update_skill(&scope, id, patch.into()).await?))
}

/// DELETE /api/skills/:id
pub async fn destroy(State(state): State<AppState>, scope: Scope, Path(id): Path<i64>) -> ApiResult<()> {
    state.store.delete_skill(&scope, id).await?;
    Ok(ApiResponse::no_content())
}
