use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, patch},
};

/// Admin Router Module
///
/// Moderation endpoints. The session middleware layered in `create_router`
/// guarantees authentication; the `require_admin` gate inside each handler
/// enforces the admin flag, answering 403 for everyone else.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // PATCH /api/users/membership/{user_id}
        // Promotes or demotes a user's membership tier.
        .route(
            "/api/users/membership/{user_id}",
            patch(handlers::update_membership),
        )
        // DELETE /api/messages/{message_id}
        // Removes any message from the board.
        .route(
            "/api/messages/{message_id}",
            delete(handlers::delete_message),
        )
}
