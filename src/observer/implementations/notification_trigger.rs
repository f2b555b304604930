use std::sync::Arc;

use async_trait::async_trait;

use crate::access::Scope;
use crate::observer::error::ObserverError;
use crate::observer::traits::{CreationEvent, CreationObserver};
use crate::store::Store;

pub const SKILL_CREATED_TITLE: &str = "New Skill Added";
pub const PROJECT_CREATED_TITLE: &str = "New Project Created";

/// Title and message of the notification announcing `event`.
pub fn notification_for(event: &CreationEvent) -> (&'static str, String) {
    match event {
        CreationEvent::SkillCreated { name, .. } => (SKILL_CREATED_TITLE, format!("You added {}", name)),
        CreationEvent::ProjectCreated { title, .. } => {
            (PROJECT_CREATED_TITLE, format!("Project '{}' was created", title))
        }
    }
}

/// Appends one notification to the owner of every created skill or project
pub struct NotificationTrigger {
    store: Arc<dyn Store>,
}

impl NotificationTrigger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CreationObserver for NotificationTrigger {
    fn name(&self) -> &'static str {
        "notification_trigger"
    }

    async fn on_created(&self, event: &CreationEvent) -> Result<(), ObserverError> {
        let (title, message) = notification_for(event);
        let scope = Scope::of(event.owner_id());
        let notification = self.store.create_notification(&scope, title, &message).await?;

        tracing::debug!(
            "Notification {} created for user {}",
            notification.id,
            scope.user_id()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, NewUser};

    #[test]
    fn templates_interpolate_resource_names() {
        let (title, message) = notification_for(&CreationEvent::SkillCreated {
            owner_id: 1,
            skill_id: 2,
            name: "Rust".to_string(),
        });
        assert_eq!(title, "New Skill Added");
        assert_eq!(message, "You added Rust");

        let (title, message) = notification_for(&CreationEvent::ProjectCreated {
            owner_id: 1,
            project_id: 2,
            title: "SkillSync".to_string(),
        });
        assert_eq!(title, "New Project Created");
        assert_eq!(message, "Project 'SkillSync' was created");
    }

    #[tokio::test]
    async fn writes_notification_for_the_owner() {
        let store = Arc::new(MemoryStore::new());
        let user = store
            .create_user(NewUser {
                email: "a@example.com".to_string(),
                name: "A".to_string(),
                password_hash: "x".to_string(),
                is_staff: false,
            })
            .await
            .unwrap();

        let trigger = NotificationTrigger::new(store.clone());
        trigger
            .on_created(&CreationEvent::ProjectCreated {
                owner_id: user.id,
                project_id: 10,
                title: "Portfolio".to_string(),
            })
            .await
            .unwrap();

        let notes = store.list_notifications(&Scope::of(user.id)).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, PROJECT_CREATED_TITLE);
        assert_eq!(notes[0].message, "Project 'Portfolio' was created");
        assert!(!notes[0].is_read);
    }
}
