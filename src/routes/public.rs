use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session. The message listing still resolves
/// the session cookie when present (`MaybeSessionUser`) so logged-in members
/// get unredacted author names; everything else here is the identity
/// gateway.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness check for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /api/users/register
        // Account creation; replies with the redacted view of the new user.
        .route("/api/users/register", post(handlers::register_user))
        // POST /api/users/login
        // Credential check; sets the session cookie on success.
        .route("/api/users/login", post(handlers::login_user))
        // POST /api/users/logout
        // Deliberately public: logging out without a session is still a 200,
        // so this must not sit behind the auth middleware.
        .route("/api/users/logout", post(handlers::logout_user))
        // GET /api/messages
        // The board itself, readable by anyone; author identity is redacted
        // per the requester's tier.
        .route("/api/messages", get(handlers::get_messages))
}
