use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes requiring a valid session. The router is wrapped by the session
/// middleware in `create_router`, so every handler here can rely on the
/// `SessionUser` extractor succeeding.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/users/me
        // The caller's own record; self lookup always reveals the full
        // field set regardless of tier.
        .route("/api/users/me", get(handlers::get_me))
        // POST /api/messages
        // Posts a message as the session user.
        .route("/api/messages", post(handlers::create_message))
}
