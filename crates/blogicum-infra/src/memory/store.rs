//! In-memory store - used when no database is configured, and in tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blogicum_core::access;
use blogicum_core::domain::{Category, Comment, CommentView, Location, Post, PostView, User};
use blogicum_core::error::RepoError;
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostFilter,
    PostRepository, PostScope, RepoTransaction, Repositories, TransactionManager,
    UserRepository,
};

/// A record kept in one of the store's tables.
pub trait Row: Clone + Send + Sync + 'static {
    fn key(&self) -> Uuid;
}

impl Row for User {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Row for Category {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Row for Location {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Row for Post {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Row for Comment {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// Rows in insertion order, one vector per entity.
#[derive(Clone, Default)]
pub struct Tables {
    users: Vec<User>,
    categories: Vec<Category>,
    locations: Vec<Location>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

fn retain_key<T: Row>(rows: &mut Vec<T>, id: Uuid) -> bool {
    let before = rows.len();
    rows.retain(|r| r.key() != id);
    rows.len() != before
}

/// Per-entity table access plus the integrity rules a database would enforce.
pub trait Table<T: Row> {
    fn rows(&self) -> &Vec<T>;
    fn rows_mut(&mut self) -> &mut Vec<T>;

    /// Unique and foreign-key checks for a row about to be written.
    fn check(&self, _row: &T) -> Result<(), RepoError> {
        Ok(())
    }

    /// Remove a row and whatever depends on it.
    fn remove(&mut self, id: Uuid) -> bool {
        retain_key(self.rows_mut(), id)
    }
}

impl Table<User> for Tables {
    fn rows(&self) -> &Vec<User> {
        &self.users
    }

    fn rows_mut(&mut self) -> &mut Vec<User> {
        &mut self.users
    }

    fn check(&self, row: &User) -> Result<(), RepoError> {
        if self
            .users
            .iter()
            .any(|u| u.username == row.username && u.id != row.id)
        {
            return Err(RepoError::Constraint(format!(
                "username '{}' already exists",
                row.username
            )));
        }
        Ok(())
    }

    fn remove(&mut self, id: Uuid) -> bool {
        let owned_posts: Vec<Uuid> = self
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        self.comments
            .retain(|c| c.author_id != id && !owned_posts.contains(&c.post_id));
        self.posts.retain(|p| p.author_id != id);
        retain_key(&mut self.users, id)
    }
}

impl Table<Category> for Tables {
    fn rows(&self) -> &Vec<Category> {
        &self.categories
    }

    fn rows_mut(&mut self) -> &mut Vec<Category> {
        &mut self.categories
    }

    fn check(&self, row: &Category) -> Result<(), RepoError> {
        if self
            .categories
            .iter()
            .any(|c| c.slug == row.slug && c.id != row.id)
        {
            return Err(RepoError::Constraint(format!(
                "category slug '{}' already exists",
                row.slug
            )));
        }
        Ok(())
    }

    fn remove(&mut self, id: Uuid) -> bool {
        for post in self.posts.iter_mut().filter(|p| p.category_id == Some(id)) {
            post.category_id = None;
        }
        retain_key(&mut self.categories, id)
    }
}

impl Table<Location> for Tables {
    fn rows(&self) -> &Vec<Location> {
        &self.locations
    }

    fn rows_mut(&mut self) -> &mut Vec<Location> {
        &mut self.locations
    }

    fn check(&self, row: &Location) -> Result<(), RepoError> {
        if self
            .locations
            .iter()
            .any(|l| l.name == row.name && l.id != row.id)
        {
            return Err(RepoError::Constraint(format!(
                "location '{}' already exists",
                row.name
            )));
        }
        Ok(())
    }

    fn remove(&mut self, id: Uuid) -> bool {
        for post in self.posts.iter_mut().filter(|p| p.location_id == Some(id)) {
            post.location_id = None;
        }
        retain_key(&mut self.locations, id)
    }
}

impl Table<Post> for Tables {
    fn rows(&self) -> &Vec<Post> {
        &self.posts
    }

    fn rows_mut(&mut self) -> &mut Vec<Post> {
        &mut self.posts
    }

    fn check(&self, row: &Post) -> Result<(), RepoError> {
        if !self.users.iter().any(|u| u.id == row.author_id) {
            return Err(RepoError::Constraint("post author does not exist".to_string()));
        }
        if let Some(category_id) = row.category_id {
            if !self.categories.iter().any(|c| c.id == category_id) {
                return Err(RepoError::Constraint("post category does not exist".to_string()));
            }
        }
        if let Some(location_id) = row.location_id {
            if !self.locations.iter().any(|l| l.id == location_id) {
                return Err(RepoError::Constraint("post location does not exist".to_string()));
            }
        }
        Ok(())
    }

    fn remove(&mut self, id: Uuid) -> bool {
        self.comments.retain(|c| c.post_id != id);
        retain_key(&mut self.posts, id)
    }
}

impl Table<Comment> for Tables {
    fn rows(&self) -> &Vec<Comment> {
        &self.comments
    }

    fn rows_mut(&mut self) -> &mut Vec<Comment> {
        &mut self.comments
    }

    fn check(&self, row: &Comment) -> Result<(), RepoError> {
        if !self.posts.iter().any(|p| p.id == row.post_id) {
            return Err(RepoError::Constraint("comment post does not exist".to_string()));
        }
        if !self.users.iter().any(|u| u.id == row.author_id) {
            return Err(RepoError::Constraint("comment author does not exist".to_string()));
        }
        Ok(())
    }
}

impl Tables {
    fn post_matches(&self, post: &Post, filter: &PostFilter) -> bool {
        if filter.author_id.is_some_and(|id| id != post.author_id) {
            return false;
        }
        if filter.category_id.is_some() && filter.category_id != post.category_id {
            return false;
        }
        match filter.scope {
            PostScope::All => true,
            PostScope::Public { now } => {
                let category = post
                    .category_id
                    .and_then(|id| self.categories.iter().find(|c| c.id == id));
                access::is_public(post, category, now)
            }
        }
    }

    /// Matching posts, newest `pub_date` first, ties by id.
    fn filtered_posts(&self, filter: &PostFilter) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self
            .posts
            .iter()
            .filter(|p| self.post_matches(p, filter))
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(a.id.cmp(&b.id)));
        posts
    }

    fn view(&self, post: &Post) -> Option<PostView> {
        let author = self.users.iter().find(|u| u.id == post.author_id)?.clone();
        let category = post
            .category_id
            .and_then(|id| self.categories.iter().find(|c| c.id == id).cloned());
        let location = post
            .location_id
            .and_then(|id| self.locations.iter().find(|l| l.id == id).cloned());
        let comment_count = self.comments.iter().filter(|c| c.post_id == post.id).count() as u64;

        Some(PostView {
            post: post.clone(),
            author,
            category,
            location,
            comment_count,
        })
    }
}

/// In-memory implementation of every repository port.
///
/// Cloning is cheap and shares the underlying tables.
/// Note: Data is lost on process restart.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository bundle backed by this store.
    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(self.clone()),
            categories: Arc::new(self.clone()),
            locations: Arc::new(self.clone()),
            posts: Arc::new(self.clone()),
            comments: Arc::new(self.clone()),
            transactions: Arc::new(self.clone()),
        }
    }
}

#[async_trait]
impl TransactionManager for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn RepoTransaction>, RepoError> {
        let snapshot = self.tables.read().await.clone();
        Ok(Box::new(MemoryTransaction {
            target: self.tables.clone(),
            staged: InMemoryStore {
                tables: Arc::new(RwLock::new(snapshot)),
            },
        }))
    }
}

/// Works on a private copy of the tables; `commit` swaps the copy in.
///
/// Writes made to the target by others while the transaction is open are
/// overwritten on commit.
struct MemoryTransaction {
    target: Arc<RwLock<Tables>>,
    staged: InMemoryStore,
}

#[async_trait]
impl RepoTransaction for MemoryTransaction {
    fn repositories(&self) -> Repositories {
        self.staged.repositories()
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let staged = self.staged.tables.read().await.clone();
        *self.target.write().await = staged;
        Ok(())
    }
}

#[async_trait]
impl<T> BaseRepository<T, Uuid> for InMemoryStore
where
    T: Row,
    Tables: Table<T>,
{
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        let tables = self.tables.read().await;
        Ok(Table::<T>::rows(&*tables)
            .iter()
            .find(|r| r.key() == id)
            .cloned())
    }

    async fn create(&self, entity: T) -> Result<T, RepoError> {
        let mut tables = self.tables.write().await;
        if Table::<T>::rows(&*tables)
            .iter()
            .any(|r| r.key() == entity.key())
        {
            return Err(RepoError::Constraint("duplicate primary key".to_string()));
        }
        Table::<T>::check(&*tables, &entity)?;
        Table::<T>::rows_mut(&mut *tables).push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: T) -> Result<T, RepoError> {
        let mut tables = self.tables.write().await;
        Table::<T>::check(&*tables, &entity)?;
        let slot = Table::<T>::rows_mut(&mut *tables)
            .iter_mut()
            .find(|r| r.key() == entity.key())
            .ok_or(RepoError::NotFound)?;
        *slot = entity.clone();
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if Table::<T>::remove(&mut *tables, id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn delete_non_superusers(&self) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;
        let ids: Vec<Uuid> = tables
            .users
            .iter()
            .filter(|u| !u.is_superuser)
            .map(|u| u.id)
            .collect();
        for id in &ids {
            Table::<User>::remove(&mut *tables, *id);
        }
        Ok(ids.len() as u64)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn list_published(&self) -> Result<Vec<Category>, RepoError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables
            .categories
            .iter()
            .filter(|c| c.is_published)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }

    async fn delete_all(&self) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;
        for post in tables.posts.iter_mut() {
            post.category_id = None;
        }
        let removed = tables.categories.len() as u64;
        tables.categories.clear();
        Ok(removed)
    }
}

#[async_trait]
impl LocationRepository for InMemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Location>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.locations.iter().find(|l| l.name == name).cloned())
    }

    async fn delete_all(&self) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;
        for post in tables.posts.iter_mut() {
            post.location_id = None;
        }
        let removed = tables.locations.len() as u64;
        tables.locations.clear();
        Ok(removed)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .filter(|p| tables.post_matches(p, filter))
            .count() as u64)
    }

    async fn list(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PostView>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .filtered_posts(filter)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .filter_map(|p| tables.view(p))
            .collect())
    }

    async fn find_view(&self, id: Uuid) -> Result<Option<PostView>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| tables.view(p)))
    }

    async fn delete_all(&self) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;
        let removed = tables.posts.len() as u64;
        tables.posts.clear();
        tables.comments.clear();
        Ok(removed)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<CommentView> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                let author = tables.users.iter().find(|u| u.id == c.author_id)?.clone();
                Some(CommentView {
                    comment: c.clone(),
                    author,
                })
            })
            .collect();
        comments.sort_by(|a, b| {
            a.comment
                .created_at
                .cmp(&b.comment.created_at)
                .then(a.comment.id.cmp(&b.comment.id))
        });
        Ok(comments)
    }

    async fn delete_all(&self) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;
        let removed = tables.comments.len() as u64;
        tables.comments.clear();
        Ok(removed)
    }
}
