//! Session extractors.

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::LocalBoxFuture;

use blogicum_core::access::Actor;
use blogicum_core::domain::User;
use blogicum_core::ports::AuthError;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Name of the cookie that carries the session token.
pub const SESSION_COOKIE: &str = "blogicum_session";

/// The logged-in user, loaded fresh from storage on every request.
///
/// Use this in handlers to require a session:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
}

impl Identity {
    pub fn actor(&self) -> Actor {
        Actor::from(&self.user)
    }
}

/// Session cookie for a freshly issued token.
pub fn session_cookie(token: String, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(max_age_seconds))
        .finish()
}

/// Cookie that makes the browser drop the session.
pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// Token from the session cookie, or else from `Authorization: Bearer`.
fn session_token(req: &HttpRequest) -> Result<String, AuthError> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Ok(cookie.value().to_string());
    }

    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;
    let value = header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = session_token(req);

        Box::pin(async move {
            let Some(state) = state else {
                tracing::error!("AppState not found in app data");
                return Err(AppError::Internal("Server configuration error".to_string()));
            };

            let claims = state.tokens.validate_token(&token?)?;
            let user = state.service.current_user(claims.user_id).await?;
            Ok(Identity { user })
        })
    }
}

/// Optional identity extractor - anonymous when there is no valid session.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn actor(&self) -> Option<Actor> {
        self.0.as_ref().map(Identity::actor)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let identity = Identity::from_request(req, payload);

        Box::pin(async move { Ok(OptionalIdentity(identity.await.ok())) })
    }
}
