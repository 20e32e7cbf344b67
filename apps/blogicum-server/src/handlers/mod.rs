//! HTTP handlers and route configuration.

mod auth;
mod categories;
mod comments;
mod health;
mod posts;
mod profile;
mod views;

#[cfg(test)]
mod tests;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/logout", web::post().to(auth::logout))
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::home_feed))
                    .route("", web::post().to(posts::create_post))
                    .route("/{id}", web::get().to(posts::post_detail))
                    .route("/{id}", web::put().to(posts::update_post))
                    .route("/{id}", web::delete().to(posts::delete_post))
                    .route("/{id}/comments", web::post().to(comments::add_comment))
                    .route(
                        "/{id}/comments/{comment_id}",
                        web::put().to(comments::update_comment),
                    )
                    .route(
                        "/{id}/comments/{comment_id}",
                        web::delete().to(comments::delete_comment),
                    ),
            )
            .service(
                web::scope("/categories")
                    .route("", web::get().to(categories::list_categories))
                    .route("/{slug}", web::get().to(categories::category_posts)),
            )
            .service(
                web::scope("/profile")
                    .route("", web::get().to(profile::own_profile))
                    .route("", web::put().to(profile::update_profile))
                    .route("/{username}", web::get().to(profile::profile)),
            ),
    );
}
