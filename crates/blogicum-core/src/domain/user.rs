use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Longest username accepted at registration.
pub const USERNAME_MAX_LEN: usize = 150;

/// User entity - an account that can author posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new regular user with generated ID and timestamps.
    pub fn new(username: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            username,
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name shown next to the user's content; falls back to the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// Usernames are 1-150 characters of letters, digits and `@.+-_`.
    pub fn validate_username(username: &str) -> Result<(), DomainError> {
        if username.is_empty() || username.chars().count() > USERNAME_MAX_LEN {
            return Err(DomainError::Validation(format!(
                "Username must be between 1 and {USERNAME_MAX_LEN} characters"
            )));
        }
        let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
        if !username.chars().all(allowed) {
            return Err(DomainError::Validation(
                "Username may contain only letters, digits and @/./+/-/_".to_string(),
            ));
        }
        Ok(())
    }
}

/// Editable profile fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileChanges {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl ProfileChanges {
    pub fn apply_to(self, user: &mut User) {
        user.username = self.username;
        user.email = self.email;
        user.first_name = self.first_name;
        user.last_name = self.last_name;
        user.updated_at = Utc::now();
    }
}
