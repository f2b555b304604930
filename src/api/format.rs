//! Wire shapes for responses.
//!
//! Projects and milestones use the frontend's field aliases (`userId`,
//! `startDate`, `completed`, ...); every other resource serializes its model
//! directly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::auth::TokenPair;
use crate::database::models::{Milestone, ProjectStatus, User};
use crate::store::ProjectRecord;

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            avatar: user.avatar,
        }
    }
}

/// Returned by registration; carries no tokens.
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub email: String,
    pub name: String,
}

impl From<User> for RegisteredUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct Detail {
    pub detail: &'static str,
}

impl Detail {
    pub fn new(detail: &'static str) -> Self {
        Self { detail }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub status: &'static str,
}

impl Status {
    pub fn new(status: &'static str) -> Self {
        Self { status }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MilestoneToggled {
    pub status: &'static str,
    pub is_completed: bool,
}

impl From<Milestone> for MilestoneToggled {
    fn from(milestone: Milestone) -> Self {
        Self {
            status: "updated",
            is_completed: milestone.is_completed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MilestoneView {
    pub id: i64,
    pub title: String,
    pub completed: bool,
}

impl From<Milestone> for MilestoneView {
    fn from(milestone: Milestone) -> Self {
        Self {
            id: milestone.id,
            title: milestone.title,
            completed: milestone.is_completed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
    pub skills: Vec<i64>,
    pub milestones: Vec<MilestoneView>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProjectRecord> for ProjectView {
    fn from(record: ProjectRecord) -> Self {
        let ProjectRecord {
            project,
            skill_ids,
            milestones,
        } = record;
        Self {
            id: project.id,
            user_id: project.user_id,
            title: project.title,
            description: project.description,
            status: project.status,
            skills: skill_ids,
            milestones: milestones.into_iter().map(MilestoneView::from).collect(),
            start_date: project.start_date,
            end_date: project.end_date,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Project;

    #[test]
    fn project_view_uses_frontend_aliases() {
        let now = Utc::now();
        let record = ProjectRecord {
            project: Project {
                id: 3,
                user_id: 7,
                title: "Portfolio".into(),
                description: String::new(),
                status: ProjectStatus::InProgress,
                start_date: NaiveDate::from_ymd_opt(2025, 1, 2),
                end_date: None,
                created_at: now,
                updated_at: now,
            },
            skill_ids: vec![1, 2],
            milestones: vec![Milestone {
                id: 9,
                project_id: 3,
                title: "design".into(),
                is_completed: true,
                created_at: now,
            }],
        };

        let value = serde_json::to_value(ProjectView::from(record)).unwrap();
        assert_eq!(value["userId"], 7);
        assert_eq!(value["status"], "in_progress");
        assert_eq!(value["startDate"], "2025-01-02");
        assert!(value["endDate"].is_null());
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["skills"], serde_json::json!([1, 2]));
        assert_eq!(value["milestones"][0], serde_json::json!({"id": 9, "title": "design", "completed": true}));
    }

    #[test]
    fn login_response_flattens_tokens() {
        let value = serde_json::to_value(LoginResponse {
            tokens: TokenPair {
                access: "a".into(),
                refresh: "r".into(),
            },
            user: UserProfile {
                id: 1,
                email: "a@example.com".into(),
                name: "A".into(),
                avatar: None,
            },
        })
        .unwrap();
        assert_eq!(value["access"], "a");
        assert_eq!(value["refresh"], "r");
        assert_eq!(value["user"]["email"], "a@example.com");
    }
}
