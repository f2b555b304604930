//! Persistence seam for users and the resources they own.
//!
//! Every operation on an owned resource takes the caller's [`Scope`] first;
//! implementations must apply it as a pre-filter on the query itself.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::access::{AccessError, Scope};
use crate::dashboard::{CategoryCount, DashboardStats, MilestoneTally};
use crate::database::manager::DatabaseError;
use crate::database::models::{
    Milestone, Notification, Proficiency, Project, ProjectStatus, Skill, SkillCategory, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("user with this email already exists: {0}")]
    DuplicateEmail(String),

    #[error("user not found: {0}")]
    UserNotFound(i64),

    /// Skill ids that are absent from the caller's scope.
    #[error("unknown skills: {0:?}")]
    UnknownSkills(Vec<i64>),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(DatabaseError::Sqlx(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_staff: bool,
}

/// `None` leaves a field untouched; `avatar: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub avatar: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserCounts {
    pub skills: i64,
    pub projects: i64,
    pub notifications: i64,
}

#[derive(Debug, Clone)]
pub struct SkillInput {
    pub name: String,
    pub category: SkillCategory,
    pub proficiency: Proficiency,
    pub years_of_experience: i32,
}

#[derive(Debug, Clone, Default)]
pub struct SkillChanges {
    pub name: Option<String>,
    pub category: Option<SkillCategory>,
    pub proficiency: Option<Proficiency>,
    pub years_of_experience: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct MilestoneInput {
    pub title: String,
    pub is_completed: bool,
}

#[derive(Debug, Clone)]
pub struct ProjectInput {
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub skill_ids: Vec<i64>,
    pub milestones: Vec<MilestoneInput>,
}

/// Partial project update. `skill_ids` and `milestones` replace the current
/// sets wholesale when present.
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub skill_ids: Option<Vec<i64>>,
    pub milestones: Option<Vec<MilestoneInput>>,
}

/// A project together with its milestones (creation order) and skill links.
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub project: Project,
    pub skill_ids: Vec<i64>,
    pub milestones: Vec<Milestone>,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Liveness probe of the backing storage.
    async fn ping(&self) -> StoreResult<()>;

    // Users
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: i64) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> StoreResult<User>;
    async fn set_password(&self, id: i64, password_hash: &str) -> StoreResult<()>;
    /// Removes the user and everything it owns.
    async fn delete_user(&self, id: i64) -> StoreResult<()>;
    async fn user_counts(&self, scope: &Scope) -> StoreResult<UserCounts>;

    /// Records a refresh token as revoked. Returns `false` when it already was.
    async fn revoke_token(&self, user_id: i64, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<bool>;

    // Skills
    async fn list_skills(&self, scope: &Scope) -> StoreResult<Vec<Skill>>;
    async fn get_skill(&self, scope: &Scope, id: i64) -> StoreResult<Skill>;
    async fn create_skill(&self, scope: &Scope, input: SkillInput) -> StoreResult<Skill>;
    async fn update_skill(&self, scope: &Scope, id: i64, changes: SkillChanges) -> StoreResult<Skill>;
    async fn delete_skill(&self, scope: &Scope, id: i64) -> StoreResult<()>;
    async fn recent_skills(&self, scope: &Scope, limit: usize) -> StoreResult<Vec<Skill>>;
    /// Non-empty categories only, in category order.
    async fn skills_by_category(&self, scope: &Scope) -> StoreResult<Vec<CategoryCount>>;

    // Projects and milestones
    async fn list_projects(&self, scope: &Scope) -> StoreResult<Vec<ProjectRecord>>;
    async fn get_project(&self, scope: &Scope, id: i64) -> StoreResult<ProjectRecord>;
    async fn create_project(&self, scope: &Scope, input: ProjectInput) -> StoreResult<ProjectRecord>;
    async fn update_project(&self, scope: &Scope, id: i64, changes: ProjectChanges) -> StoreResult<ProjectRecord>;
    async fn delete_project(&self, scope: &Scope, id: i64) -> StoreResult<()>;
    /// Flips `is_completed` atomically and returns the milestone afterwards.
    async fn toggle_milestone(&self, scope: &Scope, project_id: i64, milestone_id: i64) -> StoreResult<Milestone>;
    async fn recent_projects(&self, scope: &Scope, limit: usize) -> StoreResult<Vec<Project>>;
    /// One row per owned project, including projects without milestones.
    async fn milestone_tallies(&self, scope: &Scope) -> StoreResult<Vec<MilestoneTally>>;
    async fn dashboard_stats(&self, scope: &Scope) -> StoreResult<DashboardStats>;

    // Notifications
    async fn create_notification(&self, scope: &Scope, title: &str, message: &str) -> StoreResult<Notification>;
    async fn list_notifications(&self, scope: &Scope) -> StoreResult<Vec<Notification>>;
    async fn recent_notifications(&self, scope: &Scope, limit: usize) -> StoreResult<Vec<Notification>>;
    async fn unread_count(&self, scope: &Scope) -> StoreResult<i64>;
    async fn mark_read(&self, scope: &Scope, id: i64) -> StoreResult<()>;
    async fn mark_all_read(&self, scope: &Scope) -> StoreResult<u64>;
    async fn delete_notification(&self, scope: &Scope, id: i64) -> StoreResult<()>;
    async fn clear_notifications(&self, scope: &Scope) -> StoreResult<u64>;
}
