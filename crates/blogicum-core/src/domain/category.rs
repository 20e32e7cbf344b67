use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Thematic section posts can be filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(slug: String, title: String, description: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            slug,
            title,
            description,
            is_published: true,
            created_at: Utc::now(),
        }
    }
}
