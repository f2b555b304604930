pub mod notification;
pub mod project;
pub mod skill;
pub mod user;

pub use notification::Notification;
pub use project::{Milestone, Project, ProjectStatus};
pub use skill::{Proficiency, Skill, SkillCategory};
pub use user::User;
