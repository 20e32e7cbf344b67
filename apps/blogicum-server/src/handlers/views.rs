//! Domain to DTO conversions.

use actix_web::HttpResponse;
use actix_web::http::header;
use serde::Deserialize;
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, CommentView, Location, PostView, User};
use blogicum_core::pagination::Page;
use blogicum_shared::PageResponse;
use blogicum_shared::dto::{
    CategoryResponse, CommentResponse, LocationResponse, PostResponse, UserResponse,
};

/// `?page=` query parameter, passed through raw so junk input clamps instead of failing.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> Option<&str> {
        self.page.as_deref()
    }
}

/// Send the caller to a post's detail view.
pub fn redirect_to_post(post_id: Uuid) -> HttpResponse {
    redirect(&format!("/api/posts/{post_id}"))
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        display_name: user.display_name(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        created_at: user.created_at,
    }
}

pub fn category_response(category: &Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        slug: category.slug.clone(),
        title: category.title.clone(),
        description: category.description.clone(),
    }
}

fn location_response(location: &Location) -> LocationResponse {
    LocationResponse {
        id: location.id,
        name: location.name.clone(),
    }
}

pub fn post_response(view: PostView) -> PostResponse {
    PostResponse {
        id: view.post.id,
        title: view.post.title,
        text: view.post.text,
        pub_date: view.post.pub_date,
        is_published: view.post.is_published,
        author: user_response(&view.author),
        category: view.category.as_ref().map(category_response),
        location: view.location.as_ref().map(location_response),
        image: view.post.image,
        comment_count: view.comment_count,
        created_at: view.post.created_at,
    }
}

pub fn comment_response(comment: Comment, author: &User) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        text: comment.text,
        author: user_response(author),
        created_at: comment.created_at,
    }
}

pub fn comment_view_response(view: CommentView) -> CommentResponse {
    comment_response(view.comment, &view.author)
}

pub fn page_response(page: Page<PostView>) -> PageResponse<PostResponse> {
    let has_next = page.has_next();
    let has_previous = page.has_previous();
    let page = page.map(post_response);

    PageResponse {
        items: page.items,
        page: page.number,
        num_pages: page.num_pages,
        total: page.total,
        has_next,
        has_previous,
    }
}
