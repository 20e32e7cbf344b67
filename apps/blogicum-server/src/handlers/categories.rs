//! Category menu and category feed.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use blogicum_shared::dto::{CategoryPostsResponse, CategoryResponse};

use super::views::{PageQuery, category_response, page_response};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/categories
pub async fn list_categories(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let categories: Vec<CategoryResponse> = state
        .service
        .menu_categories()
        .await?
        .iter()
        .map(category_response)
        .collect();

    Ok(HttpResponse::Ok().json(categories))
}

/// GET /api/categories/{slug}?page=
pub async fn category_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let (category, posts) = state
        .service
        .category_feed(&path, query.page(), Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(CategoryPostsResponse {
        category: category_response(&category),
        posts: page_response(posts),
    }))
}
