use blogicum_core::domain::{Category, Post};
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, PostFilter, PostRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};

use crate::database::entity::{category, post, user};
use crate::database::postgres_repo::{PostgresCategoryRepository, PostgresPostRepository};

fn post_model(id: uuid::Uuid, author_id: uuid::Uuid) -> post::Model {
    let now = chrono::Utc::now();
    post::Model {
        id,
        author_id,
        title: "Test Post".to_owned(),
        text: "Content".to_owned(),
        pub_date: now.into(),
        category_id: None,
        location_id: None,
        is_published: true,
        image: None,
        created_at: now.into(),
    }
}

fn user_model(id: uuid::Uuid) -> user::Model {
    let now = chrono::Utc::now();
    user::Model {
        id,
        username: "marta".to_owned(),
        email: "marta@blogicum.local".to_owned(),
        first_name: "Marta".to_owned(),
        last_name: String::new(),
        password_hash: "hash".to_owned(),
        is_superuser: false,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = uuid::Uuid::now_v7();
    let author_id = uuid::Uuid::now_v7();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(post_id, author_id)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = result.expect("post should be found");
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, post_id);
    assert_eq!(post.author_id, author_id);
}

#[tokio::test]
async fn test_find_view_attaches_author_and_comment_count() {
    let post_id = uuid::Uuid::now_v7();
    let author_id = uuid::Uuid::now_v7();

    // Queries run in order: post, authors, comment counts.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(post_id, author_id)]])
        .append_query_results([vec![user_model(author_id)]])
        .append_query_results([vec![std::collections::BTreeMap::from([
            ("post_id".to_owned(), sea_orm::Value::from(post_id)),
            ("comment_count".to_owned(), sea_orm::Value::from(3i64)),
        ])]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let view = repo.find_view(post_id).await.unwrap().expect("view");

    assert_eq!(view.author.username, "marta");
    assert_eq!(view.comment_count, 3);
    assert!(view.category.is_none());
}

#[tokio::test]
async fn test_empty_listing_skips_hydration() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let views = repo
        .list(&PostFilter::public(chrono::Utc::now()), 0, 10)
        .await
        .unwrap();

    assert!(views.is_empty());
}

#[tokio::test]
async fn test_unknown_category_slug() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<category::Model>::new()])
        .into_connection();

    let repo = PostgresCategoryRepository::new(db);
    let result = repo.find_by_slug("missing").await.unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_delete_missing_category_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresCategoryRepository::new(db);
    let result = BaseRepository::<Category, uuid::Uuid>::delete(&repo, uuid::Uuid::now_v7()).await;

    assert!(matches!(
        result,
        Err(blogicum_core::error::RepoError::NotFound)
    ));
}

/// SQL of every statement the mock received, values inlined.
fn logged_sql(db: DatabaseConnection) -> Vec<String> {
    db.into_transaction_log()
        .iter()
        .flat_map(|txn| txn.statements().iter().map(|stmt| stmt.to_string()))
        .collect()
}

#[tokio::test]
async fn test_public_listing_checks_post_and_category_flags() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());
    repo.list(&PostFilter::public(chrono::Utc::now()), 20, 10)
        .await
        .unwrap();

    let sql = logged_sql(db);
    assert_eq!(sql.len(), 1);
    let query = &sql[0];
    assert!(query.contains(r#"LEFT JOIN "categories""#), "{query}");
    assert!(query.contains(r#""posts"."is_published" = "#), "{query}");
    assert!(query.contains(r#""posts"."pub_date" <= "#), "{query}");
    assert!(
        query.contains(r#""posts"."category_id" IS NULL OR "categories"."is_published" = "#),
        "{query}"
    );
    assert!(
        query.contains(r#"ORDER BY "posts"."pub_date" DESC, "posts"."id" ASC"#),
        "{query}"
    );
    assert!(query.contains("LIMIT 10 OFFSET 20"), "{query}");
}

#[tokio::test]
async fn test_own_listing_skips_visibility_filters() {
    let author_id = uuid::Uuid::now_v7();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());
    repo.list(&PostFilter::all().by_author(author_id), 0, 10)
        .await
        .unwrap();

    let sql = logged_sql(db);
    let query = &sql[0];
    assert!(!query.contains("JOIN"), "{query}");
    assert!(!query.contains("is_published"), "{query}");
    assert!(query.contains(&format!(r#""posts"."author_id" = '{author_id}'"#)), "{query}");
    assert!(
        query.contains(r#"ORDER BY "posts"."pub_date" DESC, "posts"."id" ASC"#),
        "{query}"
    );
}

#[tokio::test]
async fn test_transaction_repositories_share_one_transaction() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<category::Model>::new()])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 2,
        }])
        .into_connection();

    let repos = super::transaction::repositories_on(db.clone());
    let txn = repos.transactions.begin().await.unwrap();
    {
        let scoped = txn.repositories();
        assert!(scoped.categories.find_by_slug("travel").await.unwrap().is_none());
        assert_eq!(scoped.comments.delete_all().await.unwrap(), 2);
    }
    txn.commit().await.unwrap();

    let log = db.into_transaction_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].statements().len(), 4);
    assert_eq!(log[0].statements()[0].sql, "BEGIN");
    assert_eq!(log[0].statements()[3].sql, "COMMIT");
}

#[tokio::test]
async fn test_commit_with_live_repositories_fails() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let repos = super::transaction::repositories_on(db);
    let txn = repos.transactions.begin().await.unwrap();
    let _scoped = txn.repositories();

    assert!(matches!(
        txn.commit().await,
        Err(blogicum_core::error::RepoError::Query(_))
    ));
}
