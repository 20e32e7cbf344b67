//! Post feed, detail and mutation handlers.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use uuid::Uuid;

use blogicum_core::domain::PostDraft;
use blogicum_core::service::Mutation;
use blogicum_shared::dto::{PostDetailResponse, PostRequest};

use super::views::{PageQuery, comment_view_response, page_response, post_response, redirect_to_post};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn draft(req: PostRequest) -> PostDraft {
    PostDraft {
        title: req.title,
        text: req.text,
        pub_date: req.pub_date.unwrap_or_else(Utc::now),
        category_id: req.category_id,
        location_id: req.location_id,
        is_published: req.is_published,
    }
}

/// GET /api/posts?page=
pub async fn home_feed(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state.service.home_feed(query.page(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(page_response(page)))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let view = state
        .service
        .create_post(&identity.actor(), draft(body.into_inner()))
        .await?;
    Ok(HttpResponse::Created().json(post_response(view)))
}

/// GET /api/posts/{id}
pub async fn post_detail(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let (view, comments) = state
        .service
        .post_detail(path.into_inner(), viewer.actor().as_ref(), Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post: post_response(view),
        comments: comments.into_iter().map(comment_view_response).collect(),
    }))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    match state
        .service
        .update_post(&identity.actor(), path.into_inner(), draft(body.into_inner()))
        .await?
    {
        Mutation::Applied(view) => Ok(HttpResponse::Ok().json(post_response(view))),
        Mutation::RedirectToPost(id) => Ok(redirect_to_post(id)),
    }
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    match state
        .service
        .delete_post(&identity.actor(), path.into_inner())
        .await?
    {
        Mutation::Applied(()) => Ok(HttpResponse::NoContent().finish()),
        Mutation::RedirectToPost(id) => Ok(redirect_to_post(id)),
    }
}
