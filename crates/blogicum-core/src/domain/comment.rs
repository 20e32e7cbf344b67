use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::User;
use crate::error::DomainError;

/// Comment entity - a reader's reply attached to exactly one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: Uuid, author_id: Uuid, text: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            post_id,
            author_id,
            text,
            created_at: Utc::now(),
        }
    }

    pub fn validate_text(text: &str) -> Result<(), DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::Validation(
                "comment text must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A comment with its author loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    pub comment: Comment,
    pub author: User,
}
