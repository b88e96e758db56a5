use crate::models::{MembershipStatus, MessageRow, NewUser, Session, User};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, keeping the
/// handlers (and the visibility filter) ignorant of the concrete store. The
/// trait object (`Arc<dyn Repository>`) is shared through `AppState`, which is
/// also what lets the test suite swap in a mock implementation.
///
/// Errors are surfaced as `sqlx::Error` and converted at the handler boundary,
/// where a unique violation becomes `Conflict` and everything else a 500.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;
    async fn create_user(&self, new_user: NewUser) -> Result<User, sqlx::Error>;
    /// Admin-only tier change. Returns `None` when the user does not exist.
    async fn set_membership_status(
        &self,
        id: Uuid,
        status: MembershipStatus,
    ) -> Result<Option<User>, sqlx::Error>;

    // --- Sessions ---
    async fn create_session(&self, user_id: Uuid, ttl_hours: i64) -> Result<Session, sqlx::Error>;
    /// Resolves a session token to its user, ignoring expired rows.
    async fn find_session_user(&self, token: Uuid) -> Result<Option<User>, sqlx::Error>;
    /// Returns true if a session row was actually removed.
    async fn delete_session(&self, token: Uuid) -> Result<bool, sqlx::Error>;

    // --- Messages ---
    /// All messages with their author, newest first.
    async fn list_messages(&self) -> Result<Vec<MessageRow>, sqlx::Error>;
    async fn create_message(
        &self,
        user_id: Uuid,
        title: &str,
        text: &str,
    ) -> Result<MessageRow, sqlx::Error>;
    /// Admin-only delete. Returns true if a row was removed.
    async fn delete_message(&self, id: i64) -> Result<bool, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, membership_status, is_admin, created_at";

const MESSAGE_WITH_AUTHOR_COLUMNS: &str = "m.id, m.title, m.text, m.created_at, \
     u.id AS author_id, u.first_name AS author_first_name, \
     u.last_name AS author_last_name, u.membership_status AS author_membership_status";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    /// create_user
    ///
    /// `membership_status` and `is_admin` come from the column defaults
    /// ('regular', false). A concurrent duplicate registration trips the
    /// unique index on `email` and surfaces as a unique-violation error.
    async fn create_user(&self, new_user: NewUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (id, email, password_hash, first_name, last_name) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(new_user.email)
            .bind(new_user.password_hash)
            .bind(new_user.first_name)
            .bind(new_user.last_name)
            .fetch_one(&self.pool)
            .await
    }

    async fn set_membership_status(
        &self,
        id: Uuid,
        status: MembershipStatus,
    ) -> Result<Option<User>, sqlx::Error> {
        // Tier changes to/from 'admin' keep is_admin in sync, so the admin
        // gate and the tier never disagree.
        let query = format!(
            "UPDATE users SET membership_status = $2, \
             is_admin = ($2 = 'admin'::membership_status) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_session(&self, user_id: Uuid, ttl_hours: i64) -> Result<Session, sqlx::Error> {
        let expires_at = Utc::now() + Duration::hours(ttl_hours);
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3) \
             RETURNING token, user_id, created_at, expires_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn find_session_user(&self, token: Uuid) -> Result<Option<User>, sqlx::Error> {
        // Expired rows are simply ignored rather than eagerly deleted.
        let query =
            "SELECT u.id, u.email, u.password_hash, u.first_name, u.last_name, \
             u.membership_status, u.is_admin, u.created_at \
             FROM sessions s JOIN users u ON u.id = s.user_id \
             WHERE s.token = $1 AND s.expires_at > NOW()";
        sqlx::query_as::<_, User>(query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_session(&self, token: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_messages(&self) -> Result<Vec<MessageRow>, sqlx::Error> {
        let query = format!(
            "SELECT {MESSAGE_WITH_AUTHOR_COLUMNS} FROM messages m \
             JOIN users u ON u.id = m.user_id \
             ORDER BY m.created_at DESC, m.id DESC"
        );
        sqlx::query_as::<_, MessageRow>(&query)
            .fetch_all(&self.pool)
            .await
    }

    /// create_message
    ///
    /// Inserts and re-joins with `users` in one round trip via a CTE so the
    /// handler can return the created message with its author attached.
    async fn create_message(
        &self,
        user_id: Uuid,
        title: &str,
        text: &str,
    ) -> Result<MessageRow, sqlx::Error> {
        let query = format!(
            "WITH m AS (\
               INSERT INTO messages (title, text, user_id) VALUES ($1, $2, $3) \
               RETURNING id, title, text, user_id, created_at\
             ) \
             SELECT {MESSAGE_WITH_AUTHOR_COLUMNS} FROM m JOIN users u ON u.id = m.user_id"
        );
        sqlx::query_as::<_, MessageRow>(&query)
            .bind(title)
            .bind(text)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn delete_message(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
