use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::convert::Infallible;
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    models::User,
    repository::RepositoryState,
};

/// Name of the session cookie issued at login.
pub const SESSION_COOKIE: &str = "session";

/// SessionUser
///
/// The resolved identity of an authenticated request: the full user record
/// plus the session token that produced it. This is the request-scoped
/// context the handlers receive instead of any ambient session state; the
/// gate helpers below are the tier/role predicates.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user: User,
    pub token: Uuid,
}

impl SessionUser {
    /// Gate: tier must be member or admin, otherwise `Forbidden`.
    pub fn require_member(&self) -> Result<(), ApiError> {
        if self.user.membership_status.is_member_or_above() {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "You must be a member to access this resource",
            ))
        }
    }

    /// Gate: the admin flag must be set, otherwise `Forbidden`.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.user.is_admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin access required"))
        }
    }
}

/// SessionUser Extractor Implementation
///
/// Makes `SessionUser` usable as a handler argument. Resolution order:
/// 1. Read the `session` cookie and parse it as a UUID token.
/// 2. Look the token up in the sessions table (expired rows are ignored) and
///    load the owning user.
///
/// Rejection: `ApiError::Unauthorized` (401) on any failure, which is what
/// the route-layer auth middleware relies on for the authenticated and admin
/// routers.
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);

        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar.get(SESSION_COOKIE).ok_or(ApiError::Unauthorized)?;
        let token = Uuid::parse_str(cookie.value()).map_err(|_| ApiError::Unauthorized)?;

        let user = repo
            .find_session_user(token)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok(SessionUser { user, token })
    }
}

/// MaybeSessionUser
///
/// Optional variant for routes that serve anonymous requesters too (message
/// listing, registration, logout). Never rejects: any resolution failure
/// simply yields `None`.
#[derive(Debug, Clone)]
pub struct MaybeSessionUser(pub Option<SessionUser>);

impl MaybeSessionUser {
    /// The requester passed to the visibility filter, if any.
    pub fn requester(&self) -> Option<&User> {
        self.0.as_ref().map(|s| &s.user)
    }
}

impl<S> FromRequestParts<S> for MaybeSessionUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeSessionUser(
            SessionUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}

/// Builds the session cookie set at login: HttpOnly, SameSite=Lax, scoped to
/// the whole site, `Secure` in production, expiring with the session TTL.
pub fn session_cookie(token: Uuid, config: &AppConfig) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token.to_string());
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_secure(config.env == Env::Production);
    cookie.set_max_age(time::Duration::hours(config.session_ttl_hours));
    cookie
}

/// The removal counterpart, matching name and path so browsers drop it.
pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie
}
