use std::time::Duration;

use async_trait::async_trait;

use crate::database::models::{Project, Skill};
use crate::observer::error::ObserverError;

/// A resource that was just created and committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationEvent {
    SkillCreated { owner_id: i64, skill_id: i64, name: String },
    ProjectCreated { owner_id: i64, project_id: i64, title: String },
}

impl CreationEvent {
    pub fn skill(skill: &Skill) -> Self {
        CreationEvent::SkillCreated {
            owner_id: skill.user_id,
            skill_id: skill.id,
            name: skill.name.clone(),
        }
    }

    pub fn project(project: &Project) -> Self {
        CreationEvent::ProjectCreated {
            owner_id: project.user_id,
            project_id: project.id,
            title: project.title.clone(),
        }
    }

    pub fn owner_id(&self) -> i64 {
        match self {
            CreationEvent::SkillCreated { owner_id, .. } | CreationEvent::ProjectCreated { owner_id, .. } => *owner_id,
        }
    }
}

/// Reacts to creation events after the creating write has committed.
///
/// Failures are reported to the pipeline, which logs them; they never reach
/// the request that caused the event.
#[async_trait]
pub trait CreationObserver: Send + Sync {
    /// Observer name for logging and debugging
    fn name(&self) -> &'static str;

    /// Execution timeout (default 5 seconds)
    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn on_created(&self, event: &CreationEvent) -> Result<(), ObserverError>;
}
