//! `seed-demo`: fills the blog with demo users, categories, posts and comments.

mod data;
mod images;


use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};

use blogicum_core::domain::{Category, Comment, Location, Post, PostDraft, User};
use blogicum_core::ports::Repositories;

pub use images::{HttpFetcher, RemoteFetcher};

use crate::state::AppState;

/// What a seed run produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub categories: usize,
    pub locations: usize,
    pub posts: usize,
    pub comments: usize,
    pub images: usize,
}

/// Seed demo data. Unless `keep` is set, existing content and every
/// non-superuser account are removed first.
///
/// All database writes happen in one transaction: if any of them fails,
/// the previous data is left as it was. Image problems never abort the run;
/// the post is stored without an image.
pub async fn seed_demo(
    state: &AppState,
    fetcher: &dyn RemoteFetcher,
    keep: bool,
) -> Result<SeedReport> {
    let txn = state
        .service
        .repositories()
        .transactions
        .begin()
        .await
        .context("starting seed transaction")?;

    let (report, stored) = {
        let repos = txn.repositories();
        seed_into(state, &repos, fetcher, keep).await?
    };

    txn.commit().await.context("committing demo data")?;

    if !keep {
        prune_images(&state.media_root, &stored).await?;
    }

    tracing::info!(?report, "Demo data seeded");
    Ok(report)
}

/// Demo login credentials, for the console.
pub fn demo_accounts() -> String {
    data::USERS
        .iter()
        .map(|u| format!("{}/{}", u.username, u.password))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Returns the report and the image paths the new posts point at.
async fn seed_into(
    state: &AppState,
    repos: &Repositories,
    fetcher: &dyn RemoteFetcher,
    keep: bool,
) -> Result<(SeedReport, Vec<String>)> {
    if !keep {
        clear_data(repos).await?;
    }

    let users = create_users(state, repos).await?;
    let categories = create_categories(repos).await?;
    let locations = create_locations(repos).await?;
    let posts = create_posts(state, repos, fetcher, &users, &categories, &locations).await?;
    let comments = create_comments(repos, &posts, &users).await?;

    let stored: Vec<String> = posts.iter().filter_map(|p| p.image.clone()).collect();
    let report = SeedReport {
        users: users.len(),
        categories: categories.len(),
        locations: locations.len(),
        posts: posts.len(),
        comments,
        images: stored.len(),
    };
    Ok((report, stored))
}

async fn clear_data(repos: &Repositories) -> Result<()> {
    let comments = repos.comments.delete_all().await?;
    let posts = repos.posts.delete_all().await?;
    let categories = repos.categories.delete_all().await?;
    let locations = repos.locations.delete_all().await?;
    let users = repos.users.delete_non_superusers().await?;
    tracing::info!(comments, posts, categories, locations, users, "Existing data cleared");
    Ok(())
}

/// Remove post images that no stored post refers to any more.
async fn prune_images(media_root: &Path, keep: &[String]) -> Result<()> {
    let dir = media_root.join(images::POSTS_IMAGES_DIR);
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("reading {}", dir.display())),
    };

    while let Some(entry) = entries.next_entry().await? {
        let relative = format!(
            "{}/{}",
            images::POSTS_IMAGES_DIR,
            entry.file_name().to_string_lossy()
        );
        if !keep.contains(&relative) {
            tokio::fs::remove_file(entry.path())
                .await
                .with_context(|| format!("removing {}", entry.path().display()))?;
        }
    }
    Ok(())
}

/// Get or create each demo account, resetting its profile and password.
async fn create_users(
    state: &AppState,
    repos: &Repositories,
) -> Result<HashMap<&'static str, User>> {
    let mut users = HashMap::new();

    for demo in data::USERS {
        let password_hash = state
            .passwords
            .hash(demo.password)
            .with_context(|| format!("hashing password for {}", demo.username))?;

        let existing = repos.users.find_by_username(demo.username).await?;
        let is_new = existing.is_none();
        let mut user =
            existing.unwrap_or_else(|| User::new(demo.username.to_string(), String::new()));

        user.password_hash = password_hash;
        user.first_name = demo.first_name.to_string();
        user.last_name = demo.last_name.to_string();
        user.email = format!("{}@blogicum.local", demo.username);
        user.is_superuser = demo.is_superuser;
        user.updated_at = Utc::now();

        let user = if is_new {
            repos.users.create(user).await?
        } else {
            repos.users.update(user).await?
        };
        users.insert(demo.username, user);
    }
    Ok(users)
}

/// Existing categories are reused as they are.
async fn create_categories(repos: &Repositories) -> Result<HashMap<&'static str, Category>> {
    let mut categories = HashMap::new();
    for demo in data::CATEGORIES {
        let category = match repos.categories.find_by_slug(demo.slug).await? {
            Some(category) => category,
            None => {
                repos
                    .categories
                    .create(Category::new(
                        demo.slug.to_string(),
                        demo.title.to_string(),
                        demo.description.to_string(),
                    ))
                    .await?
            }
        };
        categories.insert(demo.slug, category);
    }
    Ok(categories)
}

async fn create_locations(repos: &Repositories) -> Result<HashMap<&'static str, Location>> {
    let mut locations = HashMap::new();
    for &name in data::LOCATIONS {
        let location = match repos.locations.find_by_name(name).await? {
            Some(location) => location,
            None => repos.locations.create(Location::new(name.to_string())).await?,
        };
        locations.insert(name, location);
    }
    Ok(locations)
}

async fn create_posts(
    state: &AppState,
    repos: &Repositories,
    fetcher: &dyn RemoteFetcher,
    users: &HashMap<&'static str, User>,
    categories: &HashMap<&'static str, Category>,
    locations: &HashMap<&'static str, Location>,
) -> Result<Vec<Post>> {
    let now = Utc::now();
    let mut posts = Vec::with_capacity(data::POSTS.len());

    for (index, demo) in data::POSTS.iter().enumerate() {
        let number = index + 1;
        let author = users
            .get(demo.author)
            .with_context(|| format!("unknown demo author {}", demo.author))?;

        let draft = PostDraft {
            title: demo.title.to_string(),
            text: demo.text.to_string(),
            pub_date: now - TimeDelta::days(demo.days_ago),
            category_id: categories.get(demo.category).map(|c| c.id),
            location_id: locations.get(demo.location).map(|l| l.id),
            is_published: demo.is_published,
        };
        let mut post = repos.posts.create(Post::new(author.id, draft)).await?;

        let image_url = match (demo.image_url, demo.article_url) {
            (Some(url), _) => Some(url.to_string()),
            (None, Some(article)) => images::article_image(fetcher, article).await,
            (None, None) => None,
        };
        if let Some(url) = image_url {
            let stored = images::store_post_image(
                fetcher,
                &url,
                number,
                &state.media_root,
                &state.static_root,
            )
            .await;
            if stored.is_some() {
                post.image = stored;
                post = repos.posts.update(post).await?;
            }
        }

        posts.push(post);
    }
    Ok(posts)
}

async fn create_comments(
    repos: &Repositories,
    posts: &[Post],
    users: &HashMap<&'static str, User>,
) -> Result<usize> {
    let mut created = 0;
    for (index, post) in posts.iter().take(data::COMMENTED_POSTS).enumerate() {
        for commenter in data::COMMENTERS {
            let author_id = users
                .get(commenter)
                .with_context(|| format!("unknown demo commenter {commenter}"))?
                .id;
            repos
                .comments
                .create(Comment::new(
                    post.id,
                    author_id,
                    data::comment_text(commenter, index + 1),
                ))
                .await?;
            created += 1;
        }
    }
    Ok(created)
}
