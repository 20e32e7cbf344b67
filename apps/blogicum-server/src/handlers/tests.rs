use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{TimeDelta, Utc};
use serde_json::{Value, json};

use blogicum_core::domain::Category;
use blogicum_infra::{InMemoryStore, JwtConfig};
use blogicum_shared::PageResponse;
use blogicum_shared::dto::{AuthResponse, PostDetailResponse, PostResponse};

use super::configure_routes;
use crate::middleware::auth::SESSION_COOKIE;
use crate::observability::{REQUEST_ID_HEADER, RequestIdMiddleware};
use crate::state::AppState;

fn test_state() -> AppState {
    let jwt = JwtConfig {
        secret: "handler-test-secret".to_string(),
        ..JwtConfig::default()
    };
    let root = std::env::temp_dir().join("blogicum-handler-tests");
    AppState::with_repositories(
        InMemoryStore::new().repositories(),
        10,
        jwt,
        root.join("media"),
        root.join("static"),
    )
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .wrap(RequestIdMiddleware)
                .configure(configure_routes),
        )
        .await
    };
}

macro_rules! register {
    ($app:expr, $username:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({ "username": $username, "password": "password123" }))
            .to_request();
        let auth: AuthResponse = test::call_and_read_body_json(&$app, req).await;
        format!("Bearer {}", auth.access_token)
    }};
}

macro_rules! create_post {
    ($app:expr, $token:expr, $body:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header((header::AUTHORIZATION, $token.as_str()))
            .set_json($body)
            .to_request();
        let post: PostResponse = test::call_and_read_body_json(&$app, req).await;
        post
    }};
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> Option<String> {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

#[actix_web::test]
async fn health_echoes_request_id() {
    let state = test_state();
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/api/health")
        .insert_header((REQUEST_ID_HEADER, "abc-123"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(REQUEST_ID_HEADER).unwrap(),
        "abc-123"
    );
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["request_id"], "abc-123");
}

#[actix_web::test]
async fn register_sets_session_cookie_and_rejects_duplicates() {
    let state = test_state();
    let app = app!(state);

    let body = json!({ "username": "marta", "password": "password123" });
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap();
    assert!(cookie.http_only().unwrap_or(false));

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn short_password_is_rejected() {
    let state = test_state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "marta", "password": "short" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn login_checks_password() {
    let state = test_state();
    let app = app!(state);
    register!(app, "marta");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "marta", "password": "wrong-password" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "marta", "password": "password123" }))
        .to_request();
    let auth: AuthResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(auth.user.username, "marta");
    assert_eq!(auth.token_type, "Bearer");
}

#[actix_web::test]
async fn session_cookie_authenticates() {
    let state = test_state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "marta", "password": "password123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap()
        .into_owned();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .cookie(cookie)
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["username"], "marta");
}

#[actix_web::test]
async fn anonymous_mutation_is_unauthorized() {
    let state = test_state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .set_json(json!({ "title": "t", "text": "x" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn hidden_post_is_visible_to_its_author_only() {
    let state = test_state();
    let app = app!(state);
    let marta = register!(app, "marta");
    let olga = register!(app, "olga");

    let post = create_post!(
        app,
        marta,
        json!({ "title": "Draft", "text": "Not yet", "is_published": false })
    );
    let uri = format!("/api/posts/{}", post.id);

    let req = test::TestRequest::get().uri(&uri).to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, olga.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("detail").is_none());

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, marta.as_str()))
        .to_request();
    let detail: PostDetailResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail.post.title, "Draft");
}

#[actix_web::test]
async fn scheduled_post_stays_out_of_the_feed() {
    let state = test_state();
    let app = app!(state);
    let marta = register!(app, "marta");

    create_post!(app, marta, json!({ "title": "Now", "text": "x" }));
    create_post!(
        app,
        marta,
        json!({
            "title": "Later",
            "text": "x",
            "pub_date": Utc::now() + TimeDelta::days(1),
        })
    );

    let req = test::TestRequest::get().uri("/api/posts").to_request();
    let page: PageResponse<PostResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].title, "Now");

    let req = test::TestRequest::get()
        .uri("/api/profile/marta")
        .insert_header((header::AUTHORIZATION, marta.as_str()))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["posts"]["total"], 2);
}

#[actix_web::test]
async fn foreign_edit_redirects_to_post() {
    let state = test_state();
    let app = app!(state);
    let marta = register!(app, "marta");
    let olga = register!(app, "olga");

    let post = create_post!(app, marta, json!({ "title": "Mine", "text": "x" }));
    let uri = format!("/api/posts/{}", post.id);

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, olga.as_str()))
        .set_json(json!({ "title": "Hijacked", "text": "y" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).as_deref(), Some(uri.as_str()));

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, olga.as_str()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, marta.as_str()))
        .set_json(json!({ "title": "Edited", "text": "y" }))
        .to_request();
    let edited: PostResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(edited.title, "Edited");

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, marta.as_str()))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );
}

#[actix_web::test]
async fn unpublished_category_is_not_found() {
    let state = test_state();
    let categories = state.service.repositories().categories.clone();
    let mut hidden = Category::new("hidden".into(), "Hidden".into(), String::new());
    hidden.is_published = false;
    categories.create(hidden).await.unwrap();
    categories
        .create(Category::new("travel".into(), "Travel".into(), String::new()))
        .await
        .unwrap();
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/api/categories/hidden")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::get()
        .uri("/api/categories/travel")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["category"]["slug"], "travel");

    let req = test::TestRequest::get().uri("/api/categories").to_request();
    let menu: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(menu.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn own_profile_redirects_to_username() {
    let state = test_state();
    let app = app!(state);
    let marta = register!(app, "marta");

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header((header::AUTHORIZATION, marta.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).as_deref(), Some("/api/profile/marta"));
}

#[actix_web::test]
async fn out_of_range_page_clamps() {
    let state = test_state();
    let app = app!(state);
    let marta = register!(app, "marta");

    for n in 0..12 {
        create_post!(
            app,
            marta,
            json!({
                "title": format!("Post {n}"),
                "text": "x",
                "pub_date": Utc::now() - TimeDelta::minutes(n),
            })
        );
    }

    let req = test::TestRequest::get()
        .uri("/api/posts?page=99")
        .to_request();
    let page: PageResponse<PostResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.page, 2);
    assert_eq!(page.num_pages, 2);
    assert_eq!(page.items.len(), 2);
    assert!(!page.has_next);

    let req = test::TestRequest::get()
        .uri("/api/posts?page=abc")
        .to_request();
    let page: PageResponse<PostResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.page, 1);
    assert_eq!(page.items.len(), 10);
    assert_eq!(page.items[0].title, "Post 0");
}

#[actix_web::test]
async fn comments_are_addressed_through_their_post() {
    let state = test_state();
    let app = app!(state);
    let marta = register!(app, "marta");
    let olga = register!(app, "olga");

    let first = create_post!(app, marta, json!({ "title": "First", "text": "x" }));
    let second = create_post!(app, marta, json!({ "title": "Second", "text": "x" }));

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/comments", first.id))
        .insert_header((header::AUTHORIZATION, olga.as_str()))
        .set_json(json!({ "text": "Nice" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let comment: Value = test::read_body_json(resp).await;
    let comment_id = comment["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{}/comments/{comment_id}", second.id))
        .insert_header((header::AUTHORIZATION, olga.as_str()))
        .set_json(json!({ "text": "Moved" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let comment_uri = format!("/api/posts/{}/comments/{comment_id}", first.id);
    let req = test::TestRequest::delete()
        .uri(&comment_uri)
        .insert_header((header::AUTHORIZATION, marta.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let post_uri = format!("/api/posts/{}", first.id);
    assert_eq!(location(&resp).as_deref(), Some(post_uri.as_str()));

    let req = test::TestRequest::get().uri(&post_uri).to_request();
    let detail: PostDetailResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail.post.comment_count, 1);
    assert_eq!(detail.comments[0].author.username, "olga");
}

#[actix_web::test]
async fn malformed_json_is_bad_request() {
    let state = test_state();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                crate::middleware::error::AppError::BadRequest(err.to_string()).into()
            }))
            .wrap(RequestIdMiddleware)
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
