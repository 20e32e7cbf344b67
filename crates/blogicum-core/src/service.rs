//! Blog use cases: feeds, post detail, and post/comment mutations.
//!
//! The service loads data through the repository ports and applies the
//! rules from [`crate::access`]. Read denials come back as
//! [`DomainError::NotFound`]; mutation denials come back as
//! [`Mutation::RedirectToPost`] so the boundary can send the caller to the
//! post's detail view.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::access::{self, Actor};
use crate::domain::{
    Category, Comment, CommentView, Post, PostDraft, PostView, ProfileChanges, User,
};
use crate::error::DomainError;
use crate::pagination::{Page, Paginator};
use crate::ports::{PostFilter, Repositories};

/// Result of an edit or delete attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<T> {
    Applied(T),
    /// The actor may not change this content; show them the post instead.
    RedirectToPost(Uuid),
}

impl<T> Mutation<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied(_))
    }
}

/// Use-case layer shared by every request handler.
#[derive(Clone)]
pub struct BlogService {
    repos: Repositories,
    paginator: Paginator,
}

impl BlogService {
    pub fn new(repos: Repositories, paginator: Paginator) -> Self {
        Self { repos, paginator }
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    /// Load the user behind a session. A session for a deleted account is rejected.
    pub async fn current_user(&self, user_id: Uuid) -> Result<User, DomainError> {
        self.repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::Unauthorized)
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(self.repos.users.find_by_username(username).await?)
    }

    /// Store a new account. The username must be valid and not taken.
    pub async fn register(&self, user: User) -> Result<User, DomainError> {
        User::validate_username(&user.username)?;
        self.ensure_username_free(&user.username, user.id).await?;

        let user = self.repos.users.create(user).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Edit the caller's own profile.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<User, DomainError> {
        let mut user = self.current_user(user_id).await?;
        User::validate_username(&changes.username)?;
        self.ensure_username_free(&changes.username, user_id).await?;

        changes.apply_to(&mut user);
        let user = self.repos.users.update(user).await?;
        tracing::info!(%user_id, username = %user.username, "Profile updated");
        Ok(user)
    }

    /// Published categories for the navigation menu, ordered by title.
    pub async fn menu_categories(&self) -> Result<Vec<Category>, DomainError> {
        Ok(self.repos.categories.list_published().await?)
    }

    /// Home feed: every public post, newest first.
    pub async fn home_feed(
        &self,
        page: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Page<PostView>, DomainError> {
        self.list_page(&PostFilter::public(now), page).await
    }

    /// Public posts of a published category.
    ///
    /// Unknown and unpublished categories are both reported as not found.
    pub async fn category_feed(
        &self,
        slug: &str,
        page: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(Category, Page<PostView>), DomainError> {
        let category = self
            .repos
            .categories
            .find_by_slug(slug)
            .await?
            .filter(|c| c.is_published)
            .ok_or_else(|| DomainError::not_found("category", slug))?;

        let filter = PostFilter::public(now).in_category(category.id);
        let posts = self.list_page(&filter, page).await?;
        Ok((category, posts))
    }

    /// Posts on a user's profile. The owner sees all of their posts,
    /// everyone else only the public ones.
    pub async fn profile_feed(
        &self,
        username: &str,
        viewer: Option<&Actor>,
        page: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(User, Page<PostView>), DomainError> {
        let profile = self
            .repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;

        let is_owner = viewer.is_some_and(|v| v.user_id == profile.id);
        let filter = if is_owner {
            PostFilter::all().by_author(profile.id)
        } else {
            PostFilter::public(now).by_author(profile.id)
        };

        tracing::debug!(%username, is_owner, "Listing profile posts");
        let posts = self.list_page(&filter, page).await?;
        Ok((profile, posts))
    }

    /// A post with its comments, if the viewer may read it.
    pub async fn post_detail(
        &self,
        post_id: Uuid,
        viewer: Option<&Actor>,
        now: DateTime<Utc>,
    ) -> Result<(PostView, Vec<CommentView>), DomainError> {
        let view = self.visible_post(post_id, viewer, now).await?;
        let comments = self.repos.comments.list_for_post(post_id).await?;
        Ok((view, comments))
    }

    /// Create a post authored by `actor`.
    pub async fn create_post(
        &self,
        actor: &Actor,
        draft: PostDraft,
    ) -> Result<PostView, DomainError> {
        self.validate_draft(&draft).await?;
        let post = self
            .repos
            .posts
            .create(Post::new(actor.user_id, draft))
            .await?;
        tracing::info!(post_id = %post.id, author_id = %actor.user_id, "Post created");
        self.stored_view(post.id).await
    }

    pub async fn update_post(
        &self,
        actor: &Actor,
        post_id: Uuid,
        draft: PostDraft,
    ) -> Result<Mutation<PostView>, DomainError> {
        let mut post = self.find_post(post_id).await?;
        if !access::can_mutate(&post, actor) {
            return Ok(Mutation::RedirectToPost(post_id));
        }

        self.validate_draft(&draft).await?;
        post.apply(draft);
        self.repos.posts.update(post).await?;
        tracing::info!(%post_id, actor_id = %actor.user_id, "Post updated");
        Ok(Mutation::Applied(self.stored_view(post_id).await?))
    }

    /// Delete a post together with its comments.
    pub async fn delete_post(
        &self,
        actor: &Actor,
        post_id: Uuid,
    ) -> Result<Mutation<()>, DomainError> {
        let post = self.find_post(post_id).await?;
        if !access::can_mutate(&post, actor) {
            return Ok(Mutation::RedirectToPost(post_id));
        }

        self.repos.posts.delete(post_id).await?;
        tracing::info!(%post_id, actor_id = %actor.user_id, "Post deleted");
        Ok(Mutation::Applied(()))
    }

    /// Comment on a post the actor is able to read.
    pub async fn add_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        text: String,
        now: DateTime<Utc>,
    ) -> Result<Comment, DomainError> {
        self.visible_post(post_id, Some(actor), now).await?;
        Comment::validate_text(&text)?;

        let comment = self
            .repos
            .comments
            .create(Comment::new(post_id, actor.user_id, text))
            .await?;
        tracing::info!(%post_id, comment_id = %comment.id, "Comment added");
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        comment_id: Uuid,
        text: String,
    ) -> Result<Mutation<CommentView>, DomainError> {
        let mut comment = self.find_comment(post_id, comment_id).await?;
        if !access::can_mutate(&comment, actor) {
            return Ok(Mutation::RedirectToPost(post_id));
        }

        Comment::validate_text(&text)?;
        comment.text = text;
        let comment = self.repos.comments.update(comment).await?;
        let author = self
            .repos
            .users
            .find_by_id(comment.author_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", comment.author_id))?;
        Ok(Mutation::Applied(CommentView { comment, author }))
    }

    pub async fn delete_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Mutation<()>, DomainError> {
        let comment = self.find_comment(post_id, comment_id).await?;
        if !access::can_mutate(&comment, actor) {
            return Ok(Mutation::RedirectToPost(post_id));
        }

        self.repos.comments.delete(comment_id).await?;
        tracing::info!(%post_id, %comment_id, "Comment deleted");
        Ok(Mutation::Applied(()))
    }

    async fn ensure_username_free(&self, username: &str, owner: Uuid) -> Result<(), DomainError> {
        match self.repos.users.find_by_username(username).await? {
            Some(existing) if existing.id != owner => Err(DomainError::Duplicate(format!(
                "username '{username}' is already taken"
            ))),
            _ => Ok(()),
        }
    }

    async fn list_page(
        &self,
        filter: &PostFilter,
        page: Option<&str>,
    ) -> Result<Page<PostView>, DomainError> {
        let total = self.repos.posts.count(filter).await?;
        let window = self.paginator.window(page, total);
        let items = self
            .repos
            .posts
            .list(filter, window.offset, window.limit)
            .await?;
        Ok(Page::new(items, window, total))
    }

    async fn visible_post(
        &self,
        post_id: Uuid,
        viewer: Option<&Actor>,
        now: DateTime<Utc>,
    ) -> Result<PostView, DomainError> {
        self.repos
            .posts
            .find_view(post_id)
            .await?
            .filter(|v| access::can_view(&v.post, v.category.as_ref(), viewer, now))
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    /// A post as stored, for callers who already passed an ownership check.
    async fn stored_view(&self, post_id: Uuid) -> Result<PostView, DomainError> {
        self.repos
            .posts
            .find_view(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Post, DomainError> {
        self.repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    /// A comment addressed through a post it does not belong to does not exist.
    async fn find_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Comment, DomainError> {
        self.find_post(post_id).await?;
        self.repos
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(|| DomainError::not_found("comment", comment_id))
    }

    async fn validate_draft(&self, draft: &PostDraft) -> Result<(), DomainError> {
        draft.validate()?;

        if let Some(category_id) = draft.category_id {
            if self.repos.categories.find_by_id(category_id).await?.is_none() {
                return Err(DomainError::Validation(format!(
                    "unknown category {category_id}"
                )));
            }
        }
        if let Some(location_id) = draft.location_id {
            if self.repos.locations.find_by_id(location_id).await?.is_none() {
                return Err(DomainError::Validation(format!(
                    "unknown location {location_id}"
                )));
            }
        }
        Ok(())
    }
}
