//! Visibility and ownership rules for posts and comments.
//!
//! Every function here is pure: the caller supplies the entity, the viewer
//! and the current time. Reading and mutating are gated by different checks
//! with different failure outcomes:
//!
//! - a failed [`can_view`] must be reported as "not found", so the existence
//!   of hidden content never leaks;
//! - a failed [`can_mutate`] sends the caller back to the post's detail view
//!   instead of raising an error.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Comment, Post, User};

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub is_superuser: bool,
}

impl Actor {
    pub fn new(user_id: Uuid, is_superuser: bool) -> Self {
        Self {
            user_id,
            is_superuser,
        }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.is_superuser)
    }
}

/// Content that belongs to exactly one user.
pub trait Ownable {
    fn id(&self) -> Uuid;
    fn author_id(&self) -> Uuid;
}

impl Ownable for Post {
    fn id(&self) -> Uuid {
        self.id
    }

    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Ownable for Comment {
    fn id(&self) -> Uuid {
        self.id
    }

    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

/// Whether anyone may see the post.
///
/// `category` must be the post's own category (`None` when it has none).
/// An uncategorized post only needs its own flag and date to qualify.
pub fn is_public(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.is_published && post.pub_date <= now && category.is_none_or(|c| c.is_published)
}

/// Whether `viewer` may read the post. Superusers get no extra read rights.
pub fn can_view(
    post: &Post,
    category: Option<&Category>,
    viewer: Option<&Actor>,
    now: DateTime<Utc>,
) -> bool {
    viewer.is_some_and(|v| v.user_id == post.author_id) || is_public(post, category, now)
}

/// Whether `actor` may edit or delete the entity.
pub fn can_mutate<E: Ownable + ?Sized>(entity: &E, actor: &Actor) -> bool {
    actor.user_id == entity.author_id() || actor.is_superuser
}
