//! Comment handlers. Comments are always addressed through their post.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use uuid::Uuid;

use blogicum_core::service::Mutation;
use blogicum_shared::dto::CommentRequest;

use super::views::{comment_response, comment_view_response, redirect_to_post};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/posts/{id}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let comment = state
        .service
        .add_comment(
            &identity.actor(),
            path.into_inner(),
            body.into_inner().text,
            Utc::now(),
        )
        .await?;

    Ok(HttpResponse::Created().json(comment_response(comment, &identity.user)))
}

/// PUT /api/posts/{id}/comments/{comment_id}
pub async fn update_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();

    match state
        .service
        .update_comment(&identity.actor(), post_id, comment_id, body.into_inner().text)
        .await?
    {
        Mutation::Applied(view) => Ok(HttpResponse::Ok().json(comment_view_response(view))),
        Mutation::RedirectToPost(id) => Ok(redirect_to_post(id)),
    }
}

/// DELETE /api/posts/{id}/comments/{comment_id}
pub async fn delete_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();

    match state
        .service
        .delete_comment(&identity.actor(), post_id, comment_id)
        .await?
    {
        Mutation::Applied(()) => Ok(HttpResponse::NoContent().finish()),
        Mutation::RedirectToPost(id) => Ok(redirect_to_post(id)),
    }
}
