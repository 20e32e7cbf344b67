use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Comment, CommentView, Location, Post, PostView, User};
use crate::error::RepoError;

use super::TransactionManager;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn create(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. Fails with `NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, cascading to what it owns.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their (unique) username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Delete every account that is not a superuser. Returns the number removed.
    async fn delete_non_superusers(&self) -> Result<u64, RepoError>;
}

/// Category repository.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    /// Published categories ordered by title.
    async fn list_published(&self) -> Result<Vec<Category>, RepoError>;

    async fn delete_all(&self) -> Result<u64, RepoError>;
}

/// Location repository.
#[async_trait]
pub trait LocationRepository: BaseRepository<Location, Uuid> {
    async fn find_by_name(&self, name: &str) -> Result<Option<Location>, RepoError>;

    async fn delete_all(&self) -> Result<u64, RepoError>;
}

/// Which posts a listing may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    /// Only posts that are public at the given instant.
    Public { now: DateTime<Utc> },
    /// Every post regardless of flags and dates.
    All,
}

/// Selection criteria for post listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostFilter {
    pub scope: PostScope,
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

impl PostFilter {
    pub fn public(now: DateTime<Utc>) -> Self {
        Self {
            scope: PostScope::Public { now },
            author_id: None,
            category_id: None,
        }
    }

    pub fn all() -> Self {
        Self {
            scope: PostScope::All,
            author_id: None,
            category_id: None,
        }
    }

    pub fn by_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn in_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// Post repository.
///
/// Listings are ordered by `pub_date` descending, then by id ascending, and
/// carry the number of comments on each post.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError>;

    async fn list(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PostView>, RepoError>;

    /// Load a single post with its author, category, location and comment count.
    async fn find_view(&self, id: Uuid) -> Result<Option<PostView>, RepoError>;

    async fn delete_all(&self) -> Result<u64, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments of a post, oldest first, with their authors.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, RepoError>;

    async fn delete_all(&self) -> Result<u64, RepoError>;
}

/// Bundle of every repository the application works with.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub transactions: Arc<dyn TransactionManager>,
}
