use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::{
    MilestoneInput, NewUser, ProfileChanges, ProjectChanges, ProjectInput, ProjectRecord, SkillChanges, SkillInput,
    Store, StoreError, StoreResult, UserCounts,
};
use crate::access::{AccessError, ResourceKind, Scope};
use crate::dashboard::{CategoryCount, DashboardStats, MilestoneTally};
use crate::database::models::{Milestone, Notification, Project, Skill, SkillCategory, User};
use crate::database::DatabaseManager;

/// Postgres-backed [`Store`]. Owned rows are always selected through
/// [`ResourceKind::owner_predicate`] with the caller bound as `$1`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

/// `head WHERE <owner predicate> tail`, with the owner bound as `$1`.
fn scoped(kind: ResourceKind, head: &str, tail: &str) -> String {
    format!("{} WHERE {} {}", head, kind.owner_predicate(), tail)
        .trim_end()
        .to_string()
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn attach(&self, projects: Vec<Project>) -> StoreResult<Vec<ProjectRecord>> {
        let ids: Vec<i64> = projects.iter().map(|p| p.id).collect();

        let milestones: Vec<Milestone> =
            sqlx::query_as("SELECT * FROM milestones WHERE project_id = ANY($1) ORDER BY id")
                .bind(&ids)
                .fetch_all(&self.pool)
                .await?;
        let links: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT project_id, skill_id FROM project_skills WHERE project_id = ANY($1) ORDER BY skill_id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_project: HashMap<i64, Vec<Milestone>> = HashMap::new();
        for milestone in milestones {
            by_project.entry(milestone.project_id).or_default().push(milestone);
        }
        let mut skills: HashMap<i64, Vec<i64>> = HashMap::new();
        for (project_id, skill_id) in links {
            skills.entry(project_id).or_default().push(skill_id);
        }

        Ok(projects
            .into_iter()
            .map(|project| ProjectRecord {
                milestones: by_project.remove(&project.id).unwrap_or_default(),
                skill_ids: skills.remove(&project.id).unwrap_or_default(),
                project,
            })
            .collect())
    }

    async fn record(&self, project: Project) -> StoreResult<ProjectRecord> {
        let mut records = self.attach(vec![project]).await?;
        records
            .pop()
            .ok_or(StoreError::Access(AccessError::NotFound(ResourceKind::Project)))
    }
}

/// Rejects skill ids outside the caller's scope, returning the deduplicated set.
async fn owned_skill_ids(
    tx: &mut Transaction<'_, Postgres>,
    scope: &Scope,
    ids: &[i64],
) -> StoreResult<Vec<i64>> {
    let wanted: BTreeSet<i64> = ids.iter().copied().collect();
    let wanted: Vec<i64> = wanted.into_iter().collect();
    let found: Vec<(i64,)> = sqlx::query_as(&scoped(
        ResourceKind::Skill,
        "SELECT id FROM skills",
        "AND id = ANY($2)",
    ))
    .bind(scope.user_id())
    .bind(&wanted)
    .fetch_all(&mut **tx)
    .await?;

    let found: BTreeSet<i64> = found.into_iter().map(|(id,)| id).collect();
    let missing: Vec<i64> = wanted.iter().copied().filter(|id| !found.contains(id)).collect();
    if !missing.is_empty() {
        return Err(StoreError::UnknownSkills(missing));
    }
    Ok(wanted)
}

async fn replace_skills(tx: &mut Transaction<'_, Postgres>, project_id: i64, skill_ids: &[i64]) -> StoreResult<()> {
    sqlx::query("DELETE FROM project_skills WHERE project_id = $1")
        .bind(project_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("INSERT INTO project_skills (project_id, skill_id) SELECT $1, UNNEST($2::BIGINT[])")
        .bind(project_id)
        .bind(skill_ids)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn insert_milestones(
    tx: &mut Transaction<'_, Postgres>,
    project_id: i64,
    milestones: Vec<MilestoneInput>,
) -> StoreResult<Vec<Milestone>> {
    let mut inserted = Vec::with_capacity(milestones.len());
    for milestone in milestones {
        let row: Milestone =
            sqlx::query_as("INSERT INTO milestones (project_id, title, is_completed) VALUES ($1, $2, $3) RETURNING *")
                .bind(project_id)
                .bind(milestone.title)
                .bind(milestone.is_completed)
                .fetch_one(&mut **tx)
                .await?;
        inserted.push(row);
    }
    Ok(inserted)
}

fn map_user_write(err: sqlx::Error, email: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail(email.to_string()),
        _ => err.into(),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(DatabaseManager::health_check(&self.pool).await?)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as(
            "INSERT INTO users (email, name, password_hash, is_staff) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_user_write(e, &user.email))
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> StoreResult<User> {
        let (set_avatar, avatar) = match changes.avatar {
            Some(avatar) => (true, avatar),
            None => (false, None),
        };
        sqlx::query_as(
            "UPDATE users SET name = COALESCE($2, name), \
             avatar = CASE WHEN $3 THEN $4 ELSE avatar END \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(changes.name)
        .bind(set_avatar)
        .bind(avatar)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::UserNotFound(id))
    }

    async fn set_password(&self, id: i64, password_hash: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound(id));
        }
        Ok(())
    }

    async fn delete_user(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound(id));
        }
        debug!("Deleted user {} and owned rows", id);
        Ok(())
    }

    async fn user_counts(&self, scope: &Scope) -> StoreResult<UserCounts> {
        let (skills, projects, notifications): (i64, i64, i64) = sqlx::query_as(
            "SELECT (SELECT COUNT(*) FROM skills WHERE user_id = $1), \
                    (SELECT COUNT(*) FROM projects WHERE user_id = $1), \
                    (SELECT COUNT(*) FROM notifications WHERE user_id = $1)",
        )
        .bind(scope.user_id())
        .fetch_one(&self.pool)
        .await?;
        Ok(UserCounts { skills, projects, notifications })
    }

    async fn revoke_token(&self, user_id: i64, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<bool> {
        // Expired tokens fail signature validation anyway; their entries can go
        let purged = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < now()")
            .execute(&self.pool)
            .await?
            .rows_affected();
        if purged > 0 {
            tracing::debug!("Purged {} expired revoked tokens", purged);
        }

        let result = sqlx::query(
            "INSERT INTO revoked_tokens (jti, user_id, expires_at) VALUES ($1, $2, $3) ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_skills(&self, scope: &Scope) -> StoreResult<Vec<Skill>> {
        Ok(sqlx::query_as(&scoped(
            ResourceKind::Skill,
            "SELECT * FROM skills",
            "ORDER BY created_at DESC, id DESC",
        ))
        .bind(scope.user_id())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_skill(&self, scope: &Scope, id: i64) -> StoreResult<Skill> {
        let row = sqlx::query_as(&scoped(ResourceKind::Skill, "SELECT * FROM skills", "AND id = $2"))
            .bind(scope.user_id())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(scope.resolve(ResourceKind::Skill, row)?)
    }

    async fn create_skill(&self, scope: &Scope, input: SkillInput) -> StoreResult<Skill> {
        Ok(sqlx::query_as(
            "INSERT INTO skills (user_id, name, category, proficiency, years_of_experience) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(scope.user_id())
        .bind(input.name)
        .bind(input.category)
        .bind(input.proficiency)
        .bind(input.years_of_experience)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_skill(&self, scope: &Scope, id: i64, changes: SkillChanges) -> StoreResult<Skill> {
        let row = sqlx::query_as(&scoped(
            ResourceKind::Skill,
            "UPDATE skills SET name = COALESCE($3, name), category = COALESCE($4, category), \
             proficiency = COALESCE($5, proficiency), \
             years_of_experience = COALESCE($6, years_of_experience), updated_at = now()",
            "AND id = $2 RETURNING *",
        ))
        .bind(scope.user_id())
        .bind(id)
        .bind(changes.name)
        .bind(changes.category)
        .bind(changes.proficiency)
        .bind(changes.years_of_experience)
        .fetch_optional(&self.pool)
        .await?;
        Ok(scope.resolve(ResourceKind::Skill, row)?)
    }

    async fn delete_skill(&self, scope: &Scope, id: i64) -> StoreResult<()> {
        let result = sqlx::query(&scoped(ResourceKind::Skill, "DELETE FROM skills", "AND id = $2"))
            .bind(scope.user_id())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(scope.require(ResourceKind::Skill, result.rows_affected() > 0)?)
    }

    async fn recent_skills(&self, scope: &Scope, limit: usize) -> StoreResult<Vec<Skill>> {
        Ok(sqlx::query_as(&scoped(
            ResourceKind::Skill,
            "SELECT * FROM skills",
            "ORDER BY created_at DESC, id DESC LIMIT $2",
        ))
        .bind(scope.user_id())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn skills_by_category(&self, scope: &Scope) -> StoreResult<Vec<CategoryCount>> {
        let rows: Vec<(SkillCategory, i64)> = sqlx::query_as(&scoped(
            ResourceKind::Skill,
            "SELECT category, COUNT(*) FROM skills",
            "GROUP BY category ORDER BY category",
        ))
        .bind(scope.user_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect())
    }

    async fn list_projects(&self, scope: &Scope) -> StoreResult<Vec<ProjectRecord>> {
        let projects: Vec<Project> = sqlx::query_as(&scoped(
            ResourceKind::Project,
            "SELECT * FROM projects",
            "ORDER BY created_at DESC, id DESC",
        ))
        .bind(scope.user_id())
        .fetch_all(&self.pool)
        .await?;
        self.attach(projects).await
    }

    async fn get_project(&self, scope: &Scope, id: i64) -> StoreResult<ProjectRecord> {
        let row = sqlx::query_as(&scoped(ResourceKind::Project, "SELECT * FROM projects", "AND id = $2"))
            .bind(scope.user_id())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let project = scope.resolve(ResourceKind::Project, row)?;
        self.record(project).await
    }

    async fn create_project(&self, scope: &Scope, input: ProjectInput) -> StoreResult<ProjectRecord> {
        let mut tx = self.pool.begin().await?;
        let skill_ids = owned_skill_ids(&mut tx, scope, &input.skill_ids).await?;

        let project: Project = sqlx::query_as(
            "INSERT INTO projects (user_id, title, description, status, start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(scope.user_id())
        .bind(input.title)
        .bind(input.description)
        .bind(input.status)
        .bind(input.start_date)
        .bind(input.end_date)
        .fetch_one(&mut *tx)
        .await?;

        replace_skills(&mut tx, project.id, &skill_ids).await?;
        let milestones = insert_milestones(&mut tx, project.id, input.milestones).await?;
        tx.commit().await?;

        // Everything returned was written by this transaction; no re-read after commit
        Ok(ProjectRecord {
            project,
            skill_ids,
            milestones,
        })
    }

    async fn update_project(&self, scope: &Scope, id: i64, changes: ProjectChanges) -> StoreResult<ProjectRecord> {
        let mut tx = self.pool.begin().await?;

        let (set_start, start_date) = match changes.start_date {
            Some(date) => (true, date),
            None => (false, None),
        };
        let (set_end, end_date) = match changes.end_date {
            Some(date) => (true, date),
            None => (false, None),
        };
        let row: Option<Project> = sqlx::query_as(&scoped(
            ResourceKind::Project,
            "UPDATE projects SET title = COALESCE($3, title), description = COALESCE($4, description), \
             status = COALESCE($5, status), \
             start_date = CASE WHEN $6 THEN $7 ELSE start_date END, \
             end_date = CASE WHEN $8 THEN $9 ELSE end_date END, updated_at = now()",
            "AND id = $2 RETURNING *",
        ))
        .bind(scope.user_id())
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.status)
        .bind(set_start)
        .bind(start_date)
        .bind(set_end)
        .bind(end_date)
        .fetch_optional(&mut *tx)
        .await?;
        let project = scope.resolve(ResourceKind::Project, row)?;

        if let Some(ids) = changes.skill_ids {
            let skill_ids = owned_skill_ids(&mut tx, scope, &ids).await?;
            replace_skills(&mut tx, project.id, &skill_ids).await?;
        }
        if let Some(milestones) = changes.milestones {
            sqlx::query("DELETE FROM milestones WHERE project_id = $1")
                .bind(project.id)
                .execute(&mut *tx)
                .await?;
            insert_milestones(&mut tx, project.id, milestones).await?;
        }
        tx.commit().await?;

        self.record(project).await
    }

    async fn delete_project(&self, scope: &Scope, id: i64) -> StoreResult<()> {
        let result = sqlx::query(&scoped(ResourceKind::Project, "DELETE FROM projects", "AND id = $2"))
            .bind(scope.user_id())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(scope.require(ResourceKind::Project, result.rows_affected() > 0)?)
    }

    async fn toggle_milestone(&self, scope: &Scope, project_id: i64, milestone_id: i64) -> StoreResult<Milestone> {
        // Single statement: concurrent toggles serialize on the row lock.
        let row = sqlx::query_as(&scoped(
            ResourceKind::Milestone,
            "UPDATE milestones SET is_completed = NOT is_completed",
            "AND id = $2 AND project_id = $3 RETURNING *",
        ))
        .bind(scope.user_id())
        .bind(milestone_id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(scope.resolve(ResourceKind::Milestone, row)?)
    }

    async fn recent_projects(&self, scope: &Scope, limit: usize) -> StoreResult<Vec<Project>> {
        Ok(sqlx::query_as(&scoped(
            ResourceKind::Project,
            "SELECT * FROM projects",
            "ORDER BY created_at DESC, id DESC LIMIT $2",
        ))
        .bind(scope.user_id())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn milestone_tallies(&self, scope: &Scope) -> StoreResult<Vec<MilestoneTally>> {
        let rows: Vec<(i64, String, i64, i64)> = sqlx::query_as(
            "SELECT p.id, p.title, COUNT(m.id), COUNT(m.id) FILTER (WHERE m.is_completed) \
             FROM projects p LEFT JOIN milestones m ON m.project_id = p.id \
             WHERE p.user_id = $1 GROUP BY p.id ORDER BY p.id",
        )
        .bind(scope.user_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(project_id, title, total, completed)| MilestoneTally {
                project_id,
                title,
                total,
                completed,
            })
            .collect())
    }

    async fn dashboard_stats(&self, scope: &Scope) -> StoreResult<DashboardStats> {
        let (total_skills, total_projects, completed_projects): (i64, i64, i64) = sqlx::query_as(
            "SELECT (SELECT COUNT(*) FROM skills WHERE user_id = $1), COUNT(*), \
             COUNT(*) FILTER (WHERE status = 'completed') FROM projects WHERE user_id = $1",
        )
        .bind(scope.user_id())
        .fetch_one(&self.pool)
        .await?;
        Ok(DashboardStats {
            total_skills,
            total_projects,
            completed_projects,
        })
    }

    async fn create_notification(&self, scope: &Scope, title: &str, message: &str) -> StoreResult<Notification> {
        sqlx::query_as("INSERT INTO notifications (user_id, title, message) VALUES ($1, $2, $3) RETURNING *")
            .bind(scope.user_id())
            .bind(title)
            .bind(message)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match &err {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::UserNotFound(scope.user_id()),
                _ => err.into(),
            })
    }

    async fn list_notifications(&self, scope: &Scope) -> StoreResult<Vec<Notification>> {
        Ok(sqlx::query_as(&scoped(
            ResourceKind::Notification,
            "SELECT * FROM notifications",
            "ORDER BY created_at DESC, id DESC",
        ))
        .bind(scope.user_id())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn recent_notifications(&self, scope: &Scope, limit: usize) -> StoreResult<Vec<Notification>> {
        Ok(sqlx::query_as(&scoped(
            ResourceKind::Notification,
            "SELECT * FROM notifications",
            "ORDER BY created_at DESC, id DESC LIMIT $2",
        ))
        .bind(scope.user_id())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn unread_count(&self, scope: &Scope) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as(&scoped(
            ResourceKind::Notification,
            "SELECT COUNT(*) FROM notifications",
            "AND NOT is_read",
        ))
        .bind(scope.user_id())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn mark_read(&self, scope: &Scope, id: i64) -> StoreResult<()> {
        let result = sqlx::query(&scoped(
            ResourceKind::Notification,
            "UPDATE notifications SET is_read = TRUE",
            "AND id = $2",
        ))
        .bind(scope.user_id())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(scope.require(ResourceKind::Notification, result.rows_affected() > 0)?)
    }

    async fn mark_all_read(&self, scope: &Scope) -> StoreResult<u64> {
        let result = sqlx::query(&scoped(
            ResourceKind::Notification,
            "UPDATE notifications SET is_read = TRUE",
            "AND NOT is_read",
        ))
        .bind(scope.user_id())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, scope: &Scope, id: i64) -> StoreResult<()> {
        let result = sqlx::query(&scoped(ResourceKind::Notification, "DELETE FROM notifications", "AND id = $2"))
            .bind(scope.user_id())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(scope.require(ResourceKind::Notification, result.rows_affected() > 0)?)
    }

    async fn clear_notifications(&self, scope: &Scope) -> StoreResult<u64> {
        let result = sqlx::query(&scoped(ResourceKind::Notification, "DELETE FROM notifications", ""))
            .bind(scope.user_id())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
