//! Request bodies and their validation rules.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use validator::Validate;

use crate::database::models::{Proficiency, ProjectStatus, SkillCategory};
use crate::store::{MilestoneInput, ProfileChanges, ProjectChanges, ProjectInput, SkillChanges, SkillInput};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
/// Pair with `#[serde(default)]`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Strips surrounding whitespace before any validation runs.
fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|s| s.trim().to_string())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// Auth

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub name: String,
    pub password: String,
    pub password2: Option<String>,
}

impl RegisterPayload {
    /// `password2` is optional; when given it must match.
    pub fn validate_passwords_match(&self) -> Result<(), &'static str> {
        match &self.password2 {
            Some(confirm) if !confirm.is_empty() && *confirm != self.password => Err("Passwords do not match"),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshPayload {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub refresh: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutPayload {
    pub refresh: Option<String>,
}

// Users

#[derive(Debug, Deserialize, Validate)]
pub struct ProfilePayload {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar: Option<Option<String>>,
}

impl From<ProfilePayload> for ProfileChanges {
    fn from(payload: ProfilePayload) -> Self {
        Self {
            name: payload.name,
            avatar: payload.avatar,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordPayload {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub old_password: String,
    pub new_password: String,
}

// Skills

#[derive(Debug, Deserialize, Validate)]
pub struct SkillPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub category: SkillCategory,
    pub proficiency: Proficiency,
    /// Optional; 0 on create, left unchanged on update when omitted.
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub years_of_experience: Option<i32>,
}

impl From<SkillPayload> for SkillInput {
    fn from(payload: SkillPayload) -> Self {
        Self {
            name: payload.name,
            category: payload.category,
            proficiency: payload.proficiency,
            years_of_experience: payload.years_of_experience.unwrap_or(0),
        }
    }
}

impl From<SkillPayload> for SkillChanges {
    fn from(payload: SkillPayload) -> Self {
        Self {
            name: Some(payload.name),
            category: Some(payload.category),
            proficiency: Some(payload.proficiency),
            years_of_experience: payload.years_of_experience,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SkillPatch {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub category: Option<SkillCategory>,
    pub proficiency: Option<Proficiency>,
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub years_of_experience: Option<i32>,
}

impl From<SkillPatch> for SkillChanges {
    fn from(patch: SkillPatch) -> Self {
        Self {
            name: patch.name,
            category: patch.category,
            proficiency: patch.proficiency,
            years_of_experience: patch.years_of_experience,
        }
    }
}

// Projects

#[derive(Debug, Deserialize, Validate)]
pub struct MilestonePayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default, alias = "is_completed")]
    pub completed: bool,
}

impl From<MilestonePayload> for MilestoneInput {
    fn from(payload: MilestonePayload) -> Self {
        Self {
            title: payload.title,
            is_completed: payload.completed,
        }
    }
}

fn milestones(payloads: Vec<MilestonePayload>) -> Vec<MilestoneInput> {
    payloads.into_iter().map(MilestoneInput::from).collect()
}

/// Create and full-update body. `status` falls back to planned; `skills`
/// and `milestones` are only replaced on update when present.
#[derive(Debug, Deserialize, Validate)]
pub struct ProjectPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default, rename = "startDate", alias = "start_date", deserialize_with = "double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, rename = "endDate", alias = "end_date", deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    pub skills: Option<Vec<i64>>,
    #[validate(nested)]
    pub milestones: Option<Vec<MilestonePayload>>,
}

impl From<ProjectPayload> for ProjectInput {
    fn from(payload: ProjectPayload) -> Self {
        Self {
            title: payload.title,
            description: payload.description.unwrap_or_default(),
            status: payload.status,
            start_date: payload.start_date.flatten(),
            end_date: payload.end_date.flatten(),
            skill_ids: payload.skills.unwrap_or_default(),
            milestones: milestones(payload.milestones.unwrap_or_default()),
        }
    }
}

impl From<ProjectPayload> for ProjectChanges {
    fn from(payload: ProjectPayload) -> Self {
        Self {
            title: Some(payload.title),
            description: payload.description,
            status: Some(payload.status),
            start_date: payload.start_date,
            end_date: payload.end_date,
            skill_ids: payload.skills,
            milestones: payload.milestones.map(milestones),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProjectPatch {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    #[serde(default, rename = "startDate", alias = "start_date", deserialize_with = "double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, rename = "endDate", alias = "end_date", deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    pub skills: Option<Vec<i64>>,
    #[validate(nested)]
    pub milestones: Option<Vec<MilestonePayload>>,
}

impl From<ProjectPatch> for ProjectChanges {
    fn from(patch: ProjectPatch) -> Self {
        Self {
            title: patch.title,
            description: patch.description,
            status: patch.status,
            start_date: patch.start_date,
            end_date: patch.end_date,
            skill_ids: patch.skills,
            milestones: patch.milestones.map(milestones),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn project_defaults_to_planned_without_collections() {
        let payload: ProjectPayload = serde_json::from_value(json!({"title": "Portfolio"})).unwrap();
        assert!(payload.validate().is_ok());
        let input = ProjectInput::from(payload);
        assert_eq!(input.status, ProjectStatus::Planned);
        assert!(input.skill_ids.is_empty());
        assert!(input.milestones.is_empty());
    }

    #[test]
    fn project_dates_accept_aliases_and_null() {
        let payload: ProjectPatch =
            serde_json::from_value(json!({"startDate": "2025-03-01", "end_date": null})).unwrap();
        assert_eq!(payload.start_date, Some(NaiveDate::from_ymd_opt(2025, 3, 1)));
        assert_eq!(payload.end_date, Some(None));

        let untouched: ProjectPatch = serde_json::from_value(json!({})).unwrap();
        assert_eq!(untouched.start_date, None);
    }

    #[test]
    fn milestone_completed_maps_to_is_completed() {
        let payload: MilestonePayload = serde_json::from_value(json!({"title": "ship", "completed": true})).unwrap();
        assert!(MilestoneInput::from(payload).is_completed);
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let payload: SkillPayload = serde_json::from_value(json!({
            "name": "", "category": "backend", "proficiency": "advanced", "years_of_experience": -1
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("years_of_experience"));
    }

    #[test]
    fn unknown_category_is_a_deserialization_error() {
        let result: Result<SkillPayload, _> =
            serde_json::from_value(json!({"name": "Cooking", "category": "kitchen", "proficiency": "beginner"}));
        assert!(result.is_err());
    }

    #[test]
    fn nested_milestone_titles_are_validated() {
        let payload: ProjectPayload =
            serde_json::from_value(json!({"title": "x", "milestones": [{"title": ""}]})).unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn emails_are_trimmed_before_validation() {
        let payload: RegisterPayload =
            serde_json::from_value(json!({"email": "  Alice@Example.com ", "password": "s3cure-enough"})).unwrap();
        assert_eq!(payload.email, "Alice@Example.com");
        assert!(payload.validate().is_ok());

        let login: LoginPayload =
            serde_json::from_value(json!({"email": "\tbob@example.com\n", "password": "x"})).unwrap();
        assert!(login.validate().is_ok());
    }

    #[test]
    fn full_skill_update_keeps_omitted_experience() {
        let body = json!({"name": "Rust", "category": "backend", "proficiency": "advanced"});

        let changes = SkillChanges::from(serde_json::from_value::<SkillPayload>(body.clone()).unwrap());
        assert_eq!(changes.years_of_experience, None);
        assert_eq!(changes.name.as_deref(), Some("Rust"));

        let input = SkillInput::from(serde_json::from_value::<SkillPayload>(body).unwrap());
        assert_eq!(input.years_of_experience, 0);
    }

    #[test]
    fn password_confirmation_is_optional() {
        let mut payload: RegisterPayload =
            serde_json::from_value(json!({"email": "a@example.com", "password": "s3cure-enough"})).unwrap();
        assert!(payload.validate_passwords_match().is_ok());
        payload.password2 = Some("different".into());
        assert_eq!(payload.validate_passwords_match(), Err("Passwords do not match"));
    }
}
