use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    MilestoneInput, NewUser, ProfileChanges, ProjectChanges, ProjectInput, ProjectRecord, SkillChanges, SkillInput,
    Store, StoreError, StoreResult, UserCounts,
};
use crate::access::{ResourceKind, Scope};
use crate::dashboard::{count_by_category, CategoryCount, DashboardStats, MilestoneTally};
use crate::database::models::{Milestone, Notification, Project, ProjectStatus, Skill, User};

#[derive(Default)]
struct Sequences {
    users: i64,
    skills: i64,
    projects: i64,
    milestones: i64,
    notifications: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Default)]
struct Tables {
    seq: Sequences,
    users: BTreeMap<i64, User>,
    skills: BTreeMap<i64, Skill>,
    projects: BTreeMap<i64, Project>,
    /// project id -> linked skill ids
    project_skills: BTreeMap<i64, BTreeSet<i64>>,
    milestones: BTreeMap<i64, Milestone>,
    notifications: BTreeMap<i64, Notification>,
    revoked: HashMap<Uuid, (i64, DateTime<Utc>)>,
}

impl Tables {
    fn owned<'a, T: crate::access::Owned + Clone + 'a>(
        scope: &Scope,
        rows: impl Iterator<Item = &'a T>,
    ) -> Vec<T> {
        rows.filter(|row| scope.admits(*row)).cloned().collect()
    }

    fn project_record(&self, project: &Project) -> ProjectRecord {
        ProjectRecord {
            project: project.clone(),
            skill_ids: self
                .project_skills
                .get(&project.id)
                .map(|ids| ids.iter().copied().collect())
                .unwrap_or_default(),
            milestones: self
                .milestones
                .values()
                .filter(|m| m.project_id == project.id)
                .cloned()
                .collect(),
        }
    }

    /// Validates that every id names a skill in `scope`, deduplicated.
    fn owned_skill_ids(&self, scope: &Scope, ids: &[i64]) -> StoreResult<BTreeSet<i64>> {
        let mut missing: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| !self.skills.get(id).is_some_and(|s| scope.admits(s)))
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            missing.dedup();
            return Err(StoreError::UnknownSkills(missing));
        }
        Ok(ids.iter().copied().collect())
    }

    fn insert_milestones(&mut self, project_id: i64, milestones: Vec<MilestoneInput>, now: DateTime<Utc>) {
        for input in milestones {
            let id = next(&mut self.seq.milestones);
            self.milestones.insert(
                id,
                Milestone {
                    id,
                    project_id,
                    title: input.title,
                    is_completed: input.is_completed,
                    created_at: now,
                },
            );
        }
    }

    fn drop_project(&mut self, project_id: i64) {
        self.projects.remove(&project_id);
        self.project_skills.remove(&project_id);
        self.milestones.retain(|_, m| m.project_id != project_id);
    }
}

fn newest_first<T: Clone>(mut rows: Vec<T>, key: impl Fn(&T) -> (DateTime<Utc>, i64)) -> Vec<T> {
    rows.sort_by(|a, b| {
        let (a, b) = (key(a), key(b));
        b.0.cmp(&a.0).then(b.1.cmp(&a.1))
    });
    rows
}

/// In-process [`Store`] used by tests and database-less runs.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::DuplicateEmail(user.email));
        }
        let id = next(&mut t.seq.users);
        let row = User {
            id,
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            avatar: None,
            is_active: true,
            is_staff: user.is_staff,
            date_joined: Utc::now(),
        };
        t.users.insert(id, row.clone());
        Ok(row)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        let user = t.users.get_mut(&id).ok_or(StoreError::UserNotFound(id))?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(avatar) = changes.avatar {
            user.avatar = avatar;
        }
        Ok(user.clone())
    }

    async fn set_password(&self, id: i64, password_hash: &str) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let user = t.users.get_mut(&id).ok_or(StoreError::UserNotFound(id))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn delete_user(&self, id: i64) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if t.users.remove(&id).is_none() {
            return Err(StoreError::UserNotFound(id));
        }
        let projects: Vec<i64> = t.projects.values().filter(|p| p.user_id == id).map(|p| p.id).collect();
        for project_id in projects {
            t.drop_project(project_id);
        }
        let skills: BTreeSet<i64> = t.skills.values().filter(|s| s.user_id == id).map(|s| s.id).collect();
        t.skills.retain(|_, s| s.user_id != id);
        for links in t.project_skills.values_mut() {
            links.retain(|skill_id| !skills.contains(skill_id));
        }
        t.notifications.retain(|_, n| n.user_id != id);
        t.revoked.retain(|_, (user_id, _)| *user_id != id);
        Ok(())
    }

    async fn user_counts(&self, scope: &Scope) -> StoreResult<UserCounts> {
        let t = self.tables.read().await;
        Ok(UserCounts {
            skills: t.skills.values().filter(|s| scope.admits(*s)).count() as i64,
            projects: t.projects.values().filter(|p| scope.admits(*p)).count() as i64,
            notifications: t.notifications.values().filter(|n| scope.admits(*n)).count() as i64,
        })
    }

    async fn revoke_token(&self, user_id: i64, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let now = Utc::now();
        t.revoked.retain(|_, (_, expires)| *expires >= now);
        if t.revoked.contains_key(&jti) {
            return Ok(false);
        }
        t.revoked.insert(jti, (user_id, expires_at));
        Ok(true)
    }

    async fn list_skills(&self, scope: &Scope) -> StoreResult<Vec<Skill>> {
        let t = self.tables.read().await;
        Ok(newest_first(Tables::owned(scope, t.skills.values()), |s| (s.created_at, s.id)))
    }

    async fn get_skill(&self, scope: &Scope, id: i64) -> StoreResult<Skill> {
        let t = self.tables.read().await;
        let row = t.skills.get(&id).filter(|s| scope.admits(*s)).cloned();
        Ok(scope.resolve(ResourceKind::Skill, row)?)
    }

    async fn create_skill(&self, scope: &Scope, input: SkillInput) -> StoreResult<Skill> {
        let mut t = self.tables.write().await;
        let id = next(&mut t.seq.skills);
        let now = Utc::now();
        let skill = Skill {
            id,
            user_id: scope.user_id(),
            name: input.name,
            category: input.category,
            proficiency: input.proficiency,
            years_of_experience: input.years_of_experience,
            created_at: now,
            updated_at: now,
        };
        t.skills.insert(id, skill.clone());
        Ok(skill)
    }

    async fn update_skill(&self, scope: &Scope, id: i64, changes: SkillChanges) -> StoreResult<Skill> {
        let mut t = self.tables.write().await;
        let skill = t.skills.get_mut(&id).filter(|s| scope.admits(&**s));
        let skill = scope.resolve(ResourceKind::Skill, skill)?;
        if let Some(name) = changes.name {
            skill.name = name;
        }
        if let Some(category) = changes.category {
            skill.category = category;
        }
        if let Some(proficiency) = changes.proficiency {
            skill.proficiency = proficiency;
        }
        if let Some(years) = changes.years_of_experience {
            skill.years_of_experience = years;
        }
        skill.updated_at = Utc::now();
        Ok(skill.clone())
    }

    async fn delete_skill(&self, scope: &Scope, id: i64) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let owned = t.skills.get(&id).is_some_and(|s| scope.admits(s));
        scope.require(ResourceKind::Skill, owned)?;
        t.skills.remove(&id);
        for links in t.project_skills.values_mut() {
            links.remove(&id);
        }
        Ok(())
    }

    async fn recent_skills(&self, scope: &Scope, limit: usize) -> StoreResult<Vec<Skill>> {
        let mut rows = self.list_skills(scope).await?;
        rows.truncate(limit);
        Ok(rows)
    }

    async fn skills_by_category(&self, scope: &Scope) -> StoreResult<Vec<CategoryCount>> {
        let t = self.tables.read().await;
        Ok(count_by_category(&Tables::owned(scope, t.skills.values())))
    }

    async fn list_projects(&self, scope: &Scope) -> StoreResult<Vec<ProjectRecord>> {
        let t = self.tables.read().await;
        let projects = newest_first(Tables::owned(scope, t.projects.values()), |p| (p.created_at, p.id));
        Ok(projects.iter().map(|p| t.project_record(p)).collect())
    }

    async fn get_project(&self, scope: &Scope, id: i64) -> StoreResult<ProjectRecord> {
        let t = self.tables.read().await;
        let row = t.projects.get(&id).filter(|p| scope.admits(*p));
        let project = scope.resolve(ResourceKind::Project, row)?;
        Ok(t.project_record(project))
    }

    async fn create_project(&self, scope: &Scope, input: ProjectInput) -> StoreResult<ProjectRecord> {
        let mut t = self.tables.write().await;
        let skill_ids = t.owned_skill_ids(scope, &input.skill_ids)?;

        let id = next(&mut t.seq.projects);
        let now = Utc::now();
        let project = Project {
            id,
            user_id: scope.user_id(),
            title: input.title,
            description: input.description,
            status: input.status,
            start_date: input.start_date,
            end_date: input.end_date,
            created_at: now,
            updated_at: now,
        };
        t.projects.insert(id, project.clone());
        if !skill_ids.is_empty() {
            t.project_skills.insert(id, skill_ids);
        }
        t.insert_milestones(id, input.milestones, now);
        Ok(t.project_record(&project))
    }

    async fn update_project(&self, scope: &Scope, id: i64, changes: ProjectChanges) -> StoreResult<ProjectRecord> {
        let mut t = self.tables.write().await;
        let owned = t.projects.get(&id).is_some_and(|p| scope.admits(p));
        scope.require(ResourceKind::Project, owned)?;
        let skill_ids = match &changes.skill_ids {
            Some(ids) => Some(t.owned_skill_ids(scope, ids)?),
            None => None,
        };

        let now = Utc::now();
        let project = {
            let project = scope.resolve(ResourceKind::Project, t.projects.get_mut(&id))?;
            if let Some(title) = changes.title {
                project.title = title;
            }
            if let Some(description) = changes.description {
                project.description = description;
            }
            if let Some(status) = changes.status {
                project.status = status;
            }
            if let Some(start_date) = changes.start_date {
                project.start_date = start_date;
            }
            if let Some(end_date) = changes.end_date {
                project.end_date = end_date;
            }
            project.updated_at = now;
            project.clone()
        };

        if let Some(skill_ids) = skill_ids {
            t.project_skills.insert(id, skill_ids);
        }
        if let Some(milestones) = changes.milestones {
            t.milestones.retain(|_, m| m.project_id != id);
            t.insert_milestones(id, milestones, now);
        }
        Ok(t.project_record(&project))
    }

    async fn delete_project(&self, scope: &Scope, id: i64) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let owned = t.projects.get(&id).is_some_and(|p| scope.admits(p));
        scope.require(ResourceKind::Project, owned)?;
        t.drop_project(id);
        Ok(())
    }

    async fn toggle_milestone(&self, scope: &Scope, project_id: i64, milestone_id: i64) -> StoreResult<Milestone> {
        let mut t = self.tables.write().await;
        let project_owned = t.projects.get(&project_id).is_some_and(|p| scope.admits(p));
        let milestone = t
            .milestones
            .get_mut(&milestone_id)
            .filter(|m| project_owned && m.project_id == project_id);
        let milestone = scope.resolve(ResourceKind::Milestone, milestone)?;
        milestone.is_completed = !milestone.is_completed;
        Ok(milestone.clone())
    }

    async fn recent_projects(&self, scope: &Scope, limit: usize) -> StoreResult<Vec<Project>> {
        let t = self.tables.read().await;
        let mut rows = newest_first(Tables::owned(scope, t.projects.values()), |p| (p.created_at, p.id));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn milestone_tallies(&self, scope: &Scope) -> StoreResult<Vec<MilestoneTally>> {
        let t = self.tables.read().await;
        Ok(t.projects
            .values()
            .filter(|p| scope.admits(*p))
            .map(|p| {
                let milestones: Vec<&Milestone> = t.milestones.values().filter(|m| m.project_id == p.id).collect();
                MilestoneTally {
                    project_id: p.id,
                    title: p.title.clone(),
                    total: milestones.len() as i64,
                    completed: milestones.iter().filter(|m| m.is_completed).count() as i64,
                }
            })
            .collect())
    }

    async fn dashboard_stats(&self, scope: &Scope) -> StoreResult<DashboardStats> {
        let t = self.tables.read().await;
        let projects = Tables::owned(scope, t.projects.values());
        Ok(DashboardStats {
            total_skills: t.skills.values().filter(|s| scope.admits(*s)).count() as i64,
            total_projects: projects.len() as i64,
            completed_projects: projects.iter().filter(|p| p.status == ProjectStatus::Completed).count() as i64,
        })
    }

    async fn create_notification(&self, scope: &Scope, title: &str, message: &str) -> StoreResult<Notification> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&scope.user_id()) {
            return Err(StoreError::UserNotFound(scope.user_id()));
        }
        let id = next(&mut t.seq.notifications);
        let row = Notification {
            id,
            user_id: scope.user_id(),
            title: title.to_string(),
            message: message.to_string(),
            is_read: false,
            created_at: Utc::now(),
        };
        t.notifications.insert(id, row.clone());
        Ok(row)
    }

    async fn list_notifications(&self, scope: &Scope) -> StoreResult<Vec<Notification>> {
        let t = self.tables.read().await;
        Ok(newest_first(Tables::owned(scope, t.notifications.values()), |n| (n.created_at, n.id)))
    }

    async fn recent_notifications(&self, scope: &Scope, limit: usize) -> StoreResult<Vec<Notification>> {
        let mut rows = self.list_notifications(scope).await?;
        rows.truncate(limit);
        Ok(rows)
    }

    async fn unread_count(&self, scope: &Scope) -> StoreResult<i64> {
        let t = self.tables.read().await;
        Ok(t.notifications.values().filter(|n| scope.admits(*n) && !n.is_read).count() as i64)
    }

    async fn mark_read(&self, scope: &Scope, id: i64) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let row = t.notifications.get_mut(&id).filter(|n| scope.admits(&**n));
        let row = scope.resolve(ResourceKind::Notification, row)?;
        row.is_read = true;
        Ok(())
    }

    async fn mark_all_read(&self, scope: &Scope) -> StoreResult<u64> {
        let mut t = self.tables.write().await;
        let mut updated = 0;
        for row in t.notifications.values_mut().filter(|n| scope.admits(&**n) && !n.is_read) {
            row.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete_notification(&self, scope: &Scope, id: i64) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let owned = t.notifications.get(&id).is_some_and(|n| scope.admits(n));
        scope.require(ResourceKind::Notification, owned)?;
        t.notifications.remove(&id);
        Ok(())
    }

    async fn clear_notifications(&self, scope: &Scope) -> StoreResult<u64> {
        let mut t = self.tables.write().await;
        let before = t.notifications.len();
        t.notifications.retain(|_, n| !scope.admits(&*n));
        Ok((before - t.notifications.len()) as u64)
    }
}
