//! Read-only dashboard views derived from a caller's skills, projects and
//! notifications. Nothing here is persisted.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::access::Scope;
use crate::database::models::{Notification, Project, Skill, SkillCategory};
use crate::store::{Store, StoreResult};

/// Candidates taken from each source before merging.
pub const RECENT_PER_KIND: usize = 5;

/// Entries kept after the merge.
pub const FEED_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_skills: i64,
    pub total_projects: i64,
    pub completed_projects: i64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Skill,
    Project,
    Notification,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActivityItem {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub message: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: SkillCategory,
    pub count: i64,
}

/// Milestone counts for one project, as read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneTally {
    pub project_id: i64,
    pub title: String,
    pub total: i64,
    pub completed: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProjectProgress {
    pub project_id: i64,
    pub title: String,
    pub progress: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProgressReport {
    pub skills_by_category: Vec<CategoryCount>,
    pub project_progress: Vec<ProjectProgress>,
}

/// Newest first; ties broken by the higher id.
fn newest_first(a: (DateTime<Utc>, i64), b: (DateTime<Utc>, i64)) -> Ordering {
    b.0.cmp(&a.0).then(b.1.cmp(&a.1))
}

fn newest<T: Clone>(rows: &[T], key: impl Fn(&T) -> (DateTime<Utc>, i64)) -> Vec<T> {
    let mut rows = rows.to_vec();
    rows.sort_by(|a, b| newest_first(key(a), key(b)));
    rows.truncate(RECENT_PER_KIND);
    rows
}

/// Merge the activity feed.
///
/// Each source is cut to its own [`RECENT_PER_KIND`] newest rows first, then
/// the at most fifteen candidates are sorted together and cut to
/// [`FEED_LIMIT`]. A row outside its source's top five never appears, even if
/// it is newer than everything kept from another source.
pub fn activity_feed(skills: &[Skill], projects: &[Project], notifications: &[Notification]) -> Vec<ActivityItem> {
    let skills = newest(skills, |s| (s.created_at, s.id));
    let projects = newest(projects, |p| (p.created_at, p.id));
    let notifications = newest(notifications, |n| (n.created_at, n.id));

    let mut items: Vec<ActivityItem> = Vec::with_capacity(RECENT_PER_KIND * 3);
    items.extend(skills.into_iter().map(|s| ActivityItem {
        kind: ActivityKind::Skill,
        message: format!("Added skill {}", s.name),
        date: s.created_at,
    }));
    items.extend(projects.into_iter().map(|p| ActivityItem {
        kind: ActivityKind::Project,
        message: format!("Created project {}", p.title),
        date: p.created_at,
    }));
    items.extend(notifications.into_iter().map(|n| ActivityItem {
        kind: ActivityKind::Notification,
        message: n.title,
        date: n.created_at,
    }));

    // Stable: equal dates keep skill, project, notification order.
    items.sort_by(|a, b| b.date.cmp(&a.date));
    items.truncate(FEED_LIMIT);
    items
}

/// Completed share of milestones as a whole percentage, truncated toward zero.
/// A project without milestones has progress 0.
pub fn progress_percent(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    completed * 100 / total
}

pub fn project_progress(tallies: Vec<MilestoneTally>) -> Vec<ProjectProgress> {
    tallies
        .into_iter()
        .map(|t| ProjectProgress {
            progress: progress_percent(t.completed, t.total),
            project_id: t.project_id,
            title: t.title,
        })
        .collect()
}

/// Group skills by category. Empty categories are not emitted.
pub fn count_by_category(skills: &[Skill]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<SkillCategory, i64> = BTreeMap::new();
    for skill in skills {
        *counts.entry(skill.category).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect()
}

pub async fn stats(store: &dyn Store, scope: &Scope) -> StoreResult<DashboardStats> {
    store.dashboard_stats(scope).await
}

pub async fn activity(store: &dyn Store, scope: &Scope) -> StoreResult<Vec<ActivityItem>> {
    let (skills, projects, notifications) = tokio::try_join!(
        store.recent_skills(scope, RECENT_PER_KIND),
        store.recent_projects(scope, RECENT_PER_KIND),
        store.recent_notifications(scope, RECENT_PER_KIND),
    )?;
    Ok(activity_feed(&skills, &projects, &notifications))
}

pub async fn progress(store: &dyn Store, scope: &Scope) -> StoreResult<ProgressReport> {
    let (skills_by_category, tallies) = tokio::try_join!(
        store.skills_by_category(scope),
        store.milestone_tallies(scope),
    )?;
    Ok(ProgressReport {
        skills_by_category,
        project_progress: project_progress(tallies),
    })
}
