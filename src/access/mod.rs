//! Ownership scoping for every user-owned resource.
//!
//! Every read or write of a skill, project, milestone or notification is
//! resolved through a [`Scope`] built from the authenticated caller. Rows are
//! filtered by owner *before* they are looked up, so a row that belongs to
//! someone else and a row that does not exist produce the same
//! [`AccessError::NotFound`].

use std::fmt;

use thiserror::Error;

use crate::database::models::{Notification, Project, Skill};

/// The resource types guarded by ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Skill,
    Project,
    Milestone,
    Notification,
}

impl ResourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Skill => "Skill",
            ResourceKind::Project => "Project",
            ResourceKind::Milestone => "Milestone",
            ResourceKind::Notification => "Notification",
        }
    }

    /// SQL predicate restricting rows of this kind to one owner.
    ///
    /// The owner id is always bound as `$1`. Skills, projects and
    /// notifications carry `user_id` directly; milestones are owned through
    /// their project.
    pub fn owner_predicate(&self) -> &'static str {
        match self {
            ResourceKind::Skill | ResourceKind::Project | ResourceKind::Notification => "user_id = $1",
            ResourceKind::Milestone => "project_id IN (SELECT id FROM projects WHERE user_id = $1)",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// Missing and foreign rows are deliberately indistinguishable.
    #[error("{0} not found.")]
    NotFound(ResourceKind),
}

/// Rows that belong to exactly one user.
pub trait Owned {
    fn owner_id(&self) -> i64;
}

impl Owned for Skill {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

impl Owned for Project {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

impl Owned for Notification {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

/// The authenticated caller's view of the data: only rows it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    user_id: i64,
}

impl Scope {
    pub fn of(user_id: i64) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Pre-filter predicate for in-process row sets.
    pub fn admits<T: Owned>(&self, row: &T) -> bool {
        row.owner_id() == self.user_id
    }

    /// Collapse a lookup made inside this scope into a uniform outcome.
    pub fn resolve<T>(&self, kind: ResourceKind, row: Option<T>) -> Result<T, AccessError> {
        row.ok_or(AccessError::NotFound(kind))
    }

    /// Same as [`Scope::resolve`] for operations that only report whether a
    /// scoped row was affected.
    pub fn require(&self, kind: ResourceKind, affected: bool) -> Result<(), AccessError> {
        if affected {
            Ok(())
        } else {
            Err(AccessError::NotFound(kind))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Proficiency, SkillCategory};
    use chrono::Utc;

    fn skill(owner: i64) -> Skill {
        Skill {
            id: 1,
            user_id: owner,
            name: "Rust".to_string(),
            category: SkillCategory::Backend,
            proficiency: Proficiency::Advanced,
            years_of_experience: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admits_only_owned_rows() {
        let scope = Scope::of(7);
        assert!(scope.admits(&skill(7)));
        assert!(!scope.admits(&skill(8)));
    }

    #[test]
    fn foreign_and_missing_rows_share_one_error() {
        let scope = Scope::of(7);
        let foreign = Some(skill(8)).filter(|s| scope.admits(s));
        let missing: Option<Skill> = None;

        let a = scope.resolve(ResourceKind::Skill, foreign).unwrap_err();
        let b = scope.resolve(ResourceKind::Skill, missing).unwrap_err();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "Skill not found.");
    }

    #[test]
    fn require_maps_unaffected_to_not_found() {
        let scope = Scope::of(1);
        assert!(scope.require(ResourceKind::Notification, true).is_ok());
        assert_eq!(
            scope.require(ResourceKind::Notification, false),
            Err(AccessError::NotFound(ResourceKind::Notification))
        );
    }

    #[test]
    fn milestones_are_owned_through_projects() {
        assert!(ResourceKind::Milestone.owner_predicate().contains("FROM projects"));
        assert_eq!(ResourceKind::Skill.owner_predicate(), "user_id = $1");
    }
}
