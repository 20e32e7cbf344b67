use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use blogicum_core::access::Actor;
use blogicum_core::domain::{Category, Comment, Post, PostDraft, ProfileChanges, User};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::Paginator;
use blogicum_core::ports::{BaseRepository, PostFilter, Repositories};
use blogicum_core::service::Mutation;
use blogicum_core::{BlogService, DomainError};

use super::InMemoryStore;

fn now() -> DateTime<Utc> {
    "2025-03-01T12:00:00Z".parse().unwrap()
}

fn draft(title: &str, pub_date: DateTime<Utc>, category_id: Option<Uuid>) -> PostDraft {
    PostDraft {
        title: title.to_string(),
        text: "Body".to_string(),
        pub_date,
        category_id,
        location_id: None,
        is_published: true,
    }
}

struct Fixture {
    repos: Repositories,
    service: BlogService,
}

impl Fixture {
    fn new() -> Self {
        let repos = InMemoryStore::new().repositories();
        let service = BlogService::new(repos.clone(), Paginator::new(10));
        Self { repos, service }
    }

    async fn user(&self, username: &str, is_superuser: bool) -> User {
        let mut user = User::new(username.to_string(), "hash".to_string());
        user.is_superuser = is_superuser;
        self.repos.users.create(user).await.unwrap()
    }

    async fn category(&self, slug: &str, is_published: bool) -> Category {
        let mut category = Category::new(slug.to_string(), slug.to_uppercase(), String::new());
        category.is_published = is_published;
        self.repos.categories.create(category).await.unwrap()
    }

    async fn post(&self, author: &User, draft: PostDraft) -> Post {
        self.repos
            .posts
            .create(Post::new(author.id, draft))
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn home_feed_is_newest_first_and_public_only() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;
    let hidden = fx.category("hidden", false).await;

    let older = fx
        .post(&marta, draft("older", now() - TimeDelta::days(2), None))
        .await;
    let newer = fx
        .post(&marta, draft("newer", now() - TimeDelta::days(1), None))
        .await;
    fx.post(&marta, draft("future", now() + TimeDelta::days(1), None))
        .await;
    fx.post(
        &marta,
        draft("in hidden", now() - TimeDelta::days(1), Some(hidden.id)),
    )
    .await;
    let mut unpublished = draft("draft", now() - TimeDelta::days(3), None);
    unpublished.is_published = false;
    fx.post(&marta, unpublished).await;

    let page = fx.service.home_feed(None, now()).await.unwrap();
    let ids: Vec<Uuid> = page.items.iter().map(|v| v.post.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn listing_order_ignores_insertion_order() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;

    let day1 = fx
        .post(&marta, draft("day 1", now() - TimeDelta::days(3), None))
        .await;
    let day3 = fx
        .post(&marta, draft("day 3", now() - TimeDelta::days(1), None))
        .await;
    let day2 = fx
        .post(&marta, draft("day 2", now() - TimeDelta::days(2), None))
        .await;

    let page = fx.service.home_feed(None, now()).await.unwrap();
    let ids: Vec<Uuid> = page.items.iter().map(|v| v.post.id).collect();
    assert_eq!(ids, vec![day3.id, day2.id, day1.id]);
}

#[tokio::test]
async fn equal_pub_dates_are_ordered_by_id() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;
    let same = now() - TimeDelta::days(1);

    let mut high = Post::new(marta.id, draft("high", same, None));
    high.id = Uuid::from_u128(2);
    let mut low = Post::new(marta.id, draft("low", same, None));
    low.id = Uuid::from_u128(1);
    fx.repos.posts.create(high).await.unwrap();
    fx.repos.posts.create(low).await.unwrap();

    let page = fx.service.home_feed(None, now()).await.unwrap();
    let titles: Vec<&str> = page.items.iter().map(|v| v.post.title.as_str()).collect();
    assert_eq!(titles, vec!["low", "high"]);
}

#[tokio::test]
async fn listings_carry_comment_counts() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;
    let olga = fx.user("olga", false).await;

    let busy = fx
        .post(&marta, draft("busy", now() - TimeDelta::days(1), None))
        .await;
    fx.post(&marta, draft("quiet", now() - TimeDelta::days(2), None))
        .await;
    for text in ["first", "second"] {
        fx.repos
            .comments
            .create(Comment::new(busy.id, olga.id, text.to_string()))
            .await
            .unwrap();
    }

    let page = fx.service.home_feed(None, now()).await.unwrap();
    let counts: Vec<(&str, u64)> = page
        .items
        .iter()
        .map(|v| (v.post.title.as_str(), v.comment_count))
        .collect();
    assert_eq!(counts, vec![("busy", 2), ("quiet", 0)]);

    let (_, own) = fx
        .service
        .profile_feed("marta", Some(&Actor::from(&marta)), None, now())
        .await
        .unwrap();
    assert_eq!(own.items[0].comment_count, 2);
}

#[tokio::test]
async fn home_feed_pages_clamp_to_range() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;
    for n in 0..25 {
        fx.post(
            &marta,
            draft(&format!("post {n}"), now() - TimeDelta::hours(n + 1), None),
        )
        .await;
    }

    let first = fx.service.home_feed(Some("1"), now()).await.unwrap();
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.items[0].post.title, "post 0");
    assert_eq!(first.num_pages, 3);

    let third = fx.service.home_feed(Some("3"), now()).await.unwrap();
    assert_eq!(third.items.len(), 5);
    assert!(!third.has_next());

    let beyond = fx.service.home_feed(Some("99"), now()).await.unwrap();
    assert_eq!(beyond.number, 3);
    assert_eq!(beyond.items.len(), 5);
}

#[tokio::test]
async fn unpublished_category_page_is_not_found() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;
    let hidden = fx.category("hidden", false).await;
    fx.post(&marta, draft("p", now() - TimeDelta::days(1), Some(hidden.id)))
        .await;

    let err = fx
        .service
        .category_feed("hidden", None, now())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));

    let err = fx
        .service
        .category_feed("missing", None, now())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn category_feed_lists_only_its_public_posts() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;
    let frontend = fx.category("frontend", true).await;
    let career = fx.category("career", true).await;

    let listed = fx
        .post(&marta, draft("css", now() - TimeDelta::days(1), Some(frontend.id)))
        .await;
    fx.post(&marta, draft("cv", now() - TimeDelta::days(1), Some(career.id)))
        .await;
    fx.post(&marta, draft("soon", now() + TimeDelta::days(1), Some(frontend.id)))
        .await;

    let (category, page) = fx
        .service
        .category_feed("frontend", None, now())
        .await
        .unwrap();
    assert_eq!(category.id, frontend.id);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].post.id, listed.id);
}

#[tokio::test]
async fn profile_owner_sees_hidden_posts() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;
    let olga = fx.user("olga", false).await;

    fx.post(&marta, draft("public", now() - TimeDelta::days(1), None))
        .await;
    fx.post(&marta, draft("scheduled", now() + TimeDelta::days(1), None))
        .await;

    let owner = Actor::from(&marta);
    let (_, own) = fx
        .service
        .profile_feed("marta", Some(&owner), None, now())
        .await
        .unwrap();
    assert_eq!(own.total, 2);
    assert_eq!(own.items[0].post.title, "scheduled");

    let stranger = Actor::from(&olga);
    let (_, theirs) = fx
        .service
        .profile_feed("marta", Some(&stranger), None, now())
        .await
        .unwrap();
    assert_eq!(theirs.total, 1);

    let (_, anonymous) = fx
        .service
        .profile_feed("marta", None, None, now())
        .await
        .unwrap();
    assert_eq!(anonymous.total, 1);
}

#[tokio::test]
async fn hidden_post_detail_is_not_found_for_others() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;
    let admin = fx.user("admin", true).await;
    let post = fx
        .post(&marta, draft("scheduled", now() + TimeDelta::days(1), None))
        .await;

    let (view, comments) = fx
        .service
        .post_detail(post.id, Some(&Actor::from(&marta)), now())
        .await
        .unwrap();
    assert_eq!(view.post.id, post.id);
    assert!(comments.is_empty());

    for viewer in [None, Some(Actor::from(&admin))] {
        let err = fx
            .service
            .post_detail(post.id, viewer.as_ref(), now())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}

#[tokio::test]
async fn non_owner_edit_redirects_to_post() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;
    let olga = fx.user("olga", false).await;
    let admin = fx.user("admin", true).await;
    let post = fx
        .post(&marta, draft("original", now() - TimeDelta::days(1), None))
        .await;

    let outcome = fx
        .service
        .update_post(
            &Actor::from(&olga),
            post.id,
            draft("hijacked", now(), None),
        )
        .await
        .unwrap();
    assert_eq!(outcome, Mutation::RedirectToPost(post.id));
    let stored = fx.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "original");

    let outcome = fx
        .service
        .update_post(&Actor::from(&admin), post.id, draft("moderated", now(), None))
        .await
        .unwrap();
    assert!(outcome.is_applied());

    let outcome = fx
        .service
        .delete_post(&Actor::from(&olga), post.id)
        .await
        .unwrap();
    assert_eq!(outcome, Mutation::RedirectToPost(post.id));

    let outcome = fx
        .service
        .delete_post(&Actor::from(&marta), post.id)
        .await
        .unwrap();
    assert!(outcome.is_applied());
}

#[tokio::test]
async fn deleting_post_removes_its_comments() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;
    let olga = fx.user("olga", false).await;
    let post = fx
        .post(&marta, draft("p", now() - TimeDelta::days(1), None))
        .await;

    let comment = fx
        .service
        .add_comment(&Actor::from(&olga), post.id, "First!".to_string(), now())
        .await
        .unwrap();

    let (view, comments) = fx.service.post_detail(post.id, None, now()).await.unwrap();
    assert_eq!(view.comment_count, 1);
    assert_eq!(comments[0].author.username, "olga");

    fx.service
        .delete_post(&Actor::from(&marta), post.id)
        .await
        .unwrap();
    let gone: Option<Comment> = fx.repos.comments.find_by_id(comment.id).await.unwrap();
    assert!(gone.is_none());
}

#[tokio::test]
async fn comment_mutations_follow_ownership() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;
    let olga = fx.user("olga", false).await;
    let post = fx
        .post(&marta, draft("p", now() - TimeDelta::days(1), None))
        .await;
    let comment = fx
        .service
        .add_comment(&Actor::from(&olga), post.id, "Hello".to_string(), now())
        .await
        .unwrap();

    // The post author does not own the comment.
    let outcome = fx
        .service
        .update_comment(&Actor::from(&marta), post.id, comment.id, "Edited".to_string())
        .await
        .unwrap();
    assert_eq!(outcome, Mutation::RedirectToPost(post.id));

    let outcome = fx
        .service
        .update_comment(&Actor::from(&olga), post.id, comment.id, "Edited".to_string())
        .await
        .unwrap();
    let Mutation::Applied(updated) = outcome else {
        panic!("owner edit should apply");
    };
    assert_eq!(updated.comment.text, "Edited");
    assert_eq!(updated.author.id, olga.id);
}

#[tokio::test]
async fn comment_addressed_through_wrong_post_is_not_found() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;
    let first = fx
        .post(&marta, draft("a", now() - TimeDelta::days(1), None))
        .await;
    let second = fx
        .post(&marta, draft("b", now() - TimeDelta::days(1), None))
        .await;
    let comment = fx
        .service
        .add_comment(&Actor::from(&marta), first.id, "Mine".to_string(), now())
        .await
        .unwrap();

    let err = fx
        .service
        .delete_comment(&Actor::from(&marta), second.id, comment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn cannot_comment_on_hidden_post() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;
    let olga = fx.user("olga", false).await;
    let post = fx
        .post(&marta, draft("soon", now() + TimeDelta::days(1), None))
        .await;

    let err = fx
        .service
        .add_comment(&Actor::from(&olga), post.id, "Early".to_string(), now())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn create_post_rejects_unknown_category() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;

    let err = fx
        .service
        .create_post(&Actor::from(&marta), draft("p", now(), Some(Uuid::now_v7())))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn usernames_are_unique() {
    let fx = Fixture::new();
    fx.user("marta", false).await;

    let err = fx
        .repos
        .users
        .create(User::new("marta".to_string(), "hash".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Constraint(_)));
}

#[tokio::test]
async fn removing_category_keeps_posts_uncategorized() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;
    let gadgets = fx.category("gadgets", true).await;
    let post = fx
        .post(&marta, draft("phone", now() - TimeDelta::days(1), Some(gadgets.id)))
        .await;

    fx.repos.categories.delete(gadgets.id).await.unwrap();

    let stored = fx.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.category_id, None);
    assert_eq!(
        fx.repos.posts.count(&PostFilter::public(now())).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn deleting_non_superusers_cascades() {
    let fx = Fixture::new();
    let admin = fx.user("admin", true).await;
    let marta = fx.user("marta", false).await;
    let post = fx
        .post(&marta, draft("p", now() - TimeDelta::days(1), None))
        .await;
    fx.service
        .add_comment(&Actor::from(&admin), post.id, "Nice".to_string(), now())
        .await
        .unwrap();

    assert_eq!(fx.repos.users.delete_non_superusers().await.unwrap(), 1);
    assert_eq!(fx.repos.posts.count(&PostFilter::all()).await.unwrap(), 0);
    assert!(fx.repos.users.find_by_id(admin.id).await.unwrap().is_some());
    assert!(fx.repos.comments.list_for_post(post.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn menu_lists_published_categories_by_title() {
    let fx = Fixture::new();
    fx.category("gadgets", true).await;
    fx.category("career", true).await;
    fx.category("drafts", false).await;

    let menu = fx.service.menu_categories().await.unwrap();
    let slugs: Vec<&str> = menu.iter().map(|c| c.slug.as_str()).collect();
    assert_eq!(slugs, vec!["career", "gadgets"]);
}

#[tokio::test]
async fn register_rejects_taken_and_invalid_usernames() {
    let fx = Fixture::new();
    fx.service
        .register(User::new("olga".to_string(), "hash".to_string()))
        .await
        .unwrap();

    let err = fx
        .service
        .register(User::new("olga".to_string(), "hash".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Duplicate(_)));

    let err = fx
        .service
        .register(User::new("bad name".to_string(), "hash".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn profile_edit_keeps_usernames_unique() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;
    fx.user("olga", false).await;

    let changes = |username: &str| ProfileChanges {
        username: username.to_string(),
        first_name: "Marta".to_string(),
        ..ProfileChanges::default()
    };

    let err = fx
        .service
        .update_profile(marta.id, changes("olga"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Duplicate(_)));

    let updated = fx
        .service
        .update_profile(marta.id, changes("marta"))
        .await
        .unwrap();
    assert_eq!(updated.display_name(), "Marta");
}

#[tokio::test]
async fn transaction_writes_apply_only_on_commit() {
    let fx = Fixture::new();
    let marta = fx.user("marta", false).await;

    let txn = fx.repos.transactions.begin().await.unwrap();
    {
        let scoped = txn.repositories();
        scoped.users.create(User::new("olga".into(), "hash".into())).await.unwrap();
        scoped.users.delete(marta.id).await.unwrap();
        assert!(fx.repos.users.find_by_username("olga").await.unwrap().is_none());
    }
    drop(txn);
    assert!(fx.repos.users.find_by_username("marta").await.unwrap().is_some());
    assert!(fx.repos.users.find_by_username("olga").await.unwrap().is_none());

    let txn = fx.repos.transactions.begin().await.unwrap();
    txn.repositories()
        .users
        .create(User::new("olga".into(), "hash".into()))
        .await
        .unwrap();
    txn.commit().await.unwrap();
    assert!(fx.repos.users.find_by_username("olga").await.unwrap().is_some());
}
