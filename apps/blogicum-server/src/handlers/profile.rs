//! Profile pages and profile editing.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use blogicum_core::domain::ProfileChanges;
use blogicum_shared::dto::{ProfileResponse, UpdateProfileRequest};

use super::views::{PageQuery, page_response, redirect, user_response};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/profile - the caller's own profile page.
pub async fn own_profile(identity: Identity) -> HttpResponse {
    redirect(&format!("/api/profile/{}", identity.user.username))
}

/// PUT /api/profile
pub async fn update_profile(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let changes = ProfileChanges {
        username: req.username.trim().to_string(),
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
    };

    let user = state
        .service
        .update_profile(identity.user.id, changes)
        .await?;
    Ok(HttpResponse::Ok().json(user_response(&user)))
}

/// GET /api/profile/{username}?page=
pub async fn profile(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let (user, posts) = state
        .service
        .profile_feed(&path, viewer.actor().as_ref(), query.page(), Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        profile: user_response(&user),
        posts: page_response(posts),
    }))
}
