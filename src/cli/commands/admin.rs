use serde_json::json;

use crate::api::payload::normalize_email;
use crate::auth::{hash_password, validate_password_strength};
use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::store::{NewUser, PgStore, Store};

/// Create a staff user directly in the database.
pub async fn handle(
    config: &AppConfig,
    email: &str,
    name: &str,
    password: &str,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    validate_password_strength(password).map_err(|problems| anyhow::anyhow!(problems.join(" ")))?;

    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::migrate(&pool).await?;
    let store = PgStore::new(pool);

    let user = store
        .create_user(NewUser {
            email: normalize_email(email),
            name: name.to_string(),
            password_hash: hash_password(password)?,
            is_staff: true,
        })
        .await?;

    output_success(
        &output_format,
        &format!("Created admin {}", user.email),
        Some(json!({ "id": user.id, "email": user.email })),
    )
}
