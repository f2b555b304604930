use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

use super::AuthError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "password123", "12345678", "123456789", "1234567890", "qwerty123", "qwertyuiop",
    "iloveyou", "sunshine", "princess", "football", "baseball", "welcome1", "admin123", "letmein1", "abc12345",
    "trustno1", "passw0rd", "11111111", "00000000", "superman", "starwars", "whatever", "dragon123",
];

/// Generates a new password hash using argon2.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Uses argon2 to verify the password hash against the provided password.
pub fn verify_password(password_hash: &str, password: &str) -> bool {
    let hash = match PasswordHash::new(password_hash) {
        Ok(hash) => hash,
        Err(err) => {
            tracing::error!("failed to parse password hash: {}", err);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok()
}

/// [`hash_password`] on the blocking pool, off the async worker threads.
pub async fn hash_password_async(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?
}

/// [`verify_password`] on the blocking pool. A failed task never verifies.
pub async fn verify_password_async(password_hash: String, password: String) -> bool {
    match tokio::task::spawn_blocking(move || verify_password(&password_hash, &password)).await {
        Ok(verified) => verified,
        Err(err) => {
            tracing::error!("password verification task failed: {}", err);
            false
        }
    }
}

/// Returns every rule the password breaks; empty means acceptable.
pub fn validate_password_strength(password: &str) -> Result<(), Vec<&'static str>> {
    let mut problems = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push("This password is too short. It must contain at least 8 characters.");
    }
    if COMMON_PASSWORDS.contains(&password.to_lowercase().as_str()) {
        problems.push("This password is too common.");
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.");
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "correct horse"));
        assert!(!verify_password(&hash, "wrong horse"));
    }

    #[tokio::test]
    async fn hashing_runs_on_the_blocking_pool() {
        let hash = hash_password_async("correct horse".to_string()).await.unwrap();
        assert!(verify_password_async(hash.clone(), "correct horse".to_string()).await);
        assert!(!verify_password_async(hash, "wrong horse".to_string()).await);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("not-a-phc-string", "anything"));
    }

    #[test]
    fn strength_rules() {
        assert!(validate_password_strength("s3cure-enough").is_ok());

        let problems = validate_password_strength("1234567").unwrap_err();
        assert_eq!(problems.len(), 2);

        let problems = validate_password_strength("Password").unwrap_err();
        assert_eq!(problems, vec!["This password is too common."]);

        assert!(validate_password_strength("99999999999").is_err());
    }
}
