use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Category, Location, User};
use crate::error::DomainError;

/// Longest accepted post title.
pub const TITLE_MAX_LEN: usize = 256;

/// Post entity - a blog entry, possibly scheduled or hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub text: String,
    /// Moment the post becomes visible to everyone else. May be in the future.
    pub pub_date: DateTime<Utc>,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub is_published: bool,
    /// Path of the attached image, relative to the media root.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post owned by `author_id` from a validated draft.
    pub fn new(author_id: Uuid, draft: PostDraft) -> Self {
        Self {
            id: Uuid::now_v7(),
            author_id,
            title: draft.title,
            text: draft.text,
            pub_date: draft.pub_date,
            category_id: draft.category_id,
            location_id: draft.location_id,
            is_published: draft.is_published,
            image: None,
            created_at: Utc::now(),
        }
    }

    /// Overwrite the editable fields. Author, image and creation time stay.
    pub fn apply(&mut self, draft: PostDraft) {
        self.title = draft.title;
        self.text = draft.text;
        self.pub_date = draft.pub_date;
        self.category_id = draft.category_id;
        self.location_id = draft.location_id;
        self.is_published = draft.is_published;
    }
}

/// Editable fields of a post, as submitted by its author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub is_published: bool,
}

impl PostDraft {
    /// Field-level checks. Referenced category/location are checked by the service.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Vec::new();
        let title = self.title.trim();
        if title.is_empty() {
            errors.push("title must not be empty".to_string());
        } else if title.chars().count() > TITLE_MAX_LEN {
            errors.push(format!("title must be at most {TITLE_MAX_LEN} characters"));
        }
        if self.text.trim().is_empty() {
            errors.push("text must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors.join(", ")))
        }
    }
}

/// A post loaded together with everything a listing or detail page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostView {
    pub post: Post,
    pub author: User,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comment_count: u64,
}
