//! Account handlers: registration, login, logout.

use actix_web::{HttpResponse, web};

use blogicum_core::domain::User;
use blogicum_core::ports::AuthError;
use blogicum_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest};

use super::views::user_response;
use crate::middleware::auth::{Identity, expired_session_cookie, session_cookie};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const PASSWORD_MIN_LEN: usize = 8;

/// Issue a token for `user` and return it both as a cookie and in the body.
fn start_session(
    state: &AppState,
    user: &User,
    mut response: actix_web::HttpResponseBuilder,
) -> AppResult<HttpResponse> {
    let token = state.tokens.generate_token(user.id, &user.username)?;
    let expires_in = state.tokens.expiration_seconds();

    Ok(response
        .cookie(session_cookie(token.clone(), expires_in))
        .json(AuthResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: expires_in.max(0) as u64,
            user: user_response(user),
        }))
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.password.chars().count() < PASSWORD_MIN_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }
    if !req.email.is_empty() && !req.email.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    let password_hash = state.passwords.hash(&req.password)?;

    let mut user = User::new(req.username.trim().to_string(), password_hash);
    user.email = req.email;
    user.first_name = req.first_name;
    user.last_name = req.last_name;

    let user = state.service.register(user).await?;
    start_session(&state, &user, HttpResponse::Created())
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .service
        .find_user(req.username.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !state.passwords.verify(&req.password, &user.password_hash)? {
        tracing::info!(username = %user.username, "Failed login attempt");
        return Err(AuthError::InvalidCredentials.into());
    }

    tracing::info!(user_id = %user.id, "User logged in");
    start_session(&state, &user, HttpResponse::Ok())
}

/// POST /api/auth/logout
pub async fn logout() -> HttpResponse {
    HttpResponse::NoContent()
        .cookie(expired_session_cookie())
        .finish()
}

/// GET /api/auth/me
pub async fn me(identity: Identity) -> HttpResponse {
    HttpResponse::Ok().json(user_response(&identity.user))
}
