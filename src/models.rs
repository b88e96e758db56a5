use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;

// --- Core Application Schemas (Mapped to Database) ---

/// MembershipStatus
///
/// The membership tier controlling author visibility and some write
/// permissions. Stored as the PostgreSQL enum `membership_status` and
/// serialized lowercase on the wire (`"regular"`, `"member"`, `"admin"`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, TS, ToSchema, Default,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "membership_status", rename_all = "lowercase")]
#[ts(export)]
pub enum MembershipStatus {
    #[default]
    Regular,
    Member,
    Admin,
}

impl MembershipStatus {
    /// True for the tiers allowed to see author names.
    pub fn is_member_or_above(self) -> bool {
        matches!(self, MembershipStatus::Member | MembershipStatus::Admin)
    }
}

impl FromStr for MembershipStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(MembershipStatus::Regular),
            "member" => Ok(MembershipStatus::Member),
            "admin" => Ok(MembershipStatus::Admin),
            _ => Err(ApiError::Validation("Invalid membership status".to_string())),
        }
    }
}

/// User
///
/// The canonical identity record stored in the `users` table. The password
/// hash never leaves the server: it is skipped on serialization, and every
/// outward-facing response goes through `visibility::reveal` anyway.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub membership_status: MembershipStatus,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// NewUser
///
/// Insertion payload for the `users` table, built by the register handler
/// after validation and password hashing. New users always start at the
/// `regular` tier with `is_admin = false` (database defaults).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// Session
///
/// A server-side session row. The `token` is an opaque v4 UUID carried in the
/// `session` cookie; rows past `expires_at` are treated as absent.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Author
///
/// The subset of a user's record attached to a message before redaction.
/// Never serialized directly; `visibility::redact_author` turns it into an
/// `AuthorView` appropriate for the requester.
#[derive(Debug, Clone, Default)]
pub struct Author {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub membership_status: MembershipStatus,
}

/// MessageRow
///
/// A message joined with its author, as fetched from the database. The author
/// columns are aliased `author_*` in the repository queries.
#[derive(Debug, Clone, FromRow, Default)]
pub struct MessageRow {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_first_name: String,
    pub author_last_name: String,
    pub author_membership_status: MembershipStatus,
}

impl MessageRow {
    pub fn author(&self) -> Author {
        Author {
            id: self.author_id,
            first_name: self.author_first_name.clone(),
            last_name: self.author_last_name.clone(),
            membership_status: self.author_membership_status,
        }
    }
}

// --- Response Schemas (Output) ---

/// PublicUserView
///
/// The redacted view of a user returned by every user-facing endpoint.
/// `first_name`/`last_name` are present only when the requester's tier (or a
/// self lookup) permits, and `None` fields are omitted from the JSON entirely
/// so regular-tier requesters never see the keys at all.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PublicUserView {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub membership_status: MembershipStatus,
    pub is_admin: bool,
}

/// AuthorView
///
/// The author snippet embedded in each listed message. Unlike
/// `PublicUserView` it never carries `is_admin`; for non-member requesters it
/// degrades to `{id, membershipStatus}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuthorView {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub membership_status: MembershipStatus,
}

/// MessageWithAuthor
///
/// A message as returned to clients, with the embedded author already
/// redacted for the requester.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MessageWithAuthor {
    pub id: i64,
    pub title: String,
    pub text: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub author: AuthorView,
}

/// MessageResponse
///
/// Plain confirmation body (`{"message": "..."}`) used by logout and delete.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for POST /api/users/register. The password is hashed with
/// Argon2 before it ever reaches the repository.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterRequest {
    /// Mirrors the original validation chain: valid email shape, password of
    /// at least 6 characters, both names non-empty after trimming.
    pub fn validate(&self) -> Result<(), ApiError> {
        if !is_valid_email(self.email.trim()) {
            return Err(ApiError::Validation("Invalid email address".to_string()));
        }
        if self.password.len() < 6 {
            return Err(ApiError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }
        if self.first_name.trim().is_empty() {
            return Err(ApiError::Validation("First name is required".to_string()));
        }
        if self.last_name.trim().is_empty() {
            return Err(ApiError::Validation("Last name is required".to_string()));
        }
        Ok(())
    }

    /// Lowercased, trimmed email used for storage and lookups.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

/// Email shape check: exactly one `@` separating non-empty local and domain
/// parts, no whitespace anywhere.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    }
}

/// LoginRequest
///
/// Input payload for POST /api/users/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// CreateMessageRequest
///
/// Input payload for POST /api/messages. Title is constrained to 1-100
/// characters and the text must be non-empty, both after trimming.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateMessageRequest {
    pub title: String,
    pub text: String,
}

impl CreateMessageRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let title = self.title.trim();
        if title.is_empty() || title.chars().count() > 100 {
            return Err(ApiError::Validation(
                "Title must be between 1 and 100 characters".to_string(),
            ));
        }
        if self.text.trim().is_empty() {
            return Err(ApiError::Validation("Text is required".to_string()));
        }
        Ok(())
    }
}

/// UpdateMembershipRequest
///
/// Input payload for PATCH /api/users/membership/{user_id}. The tier arrives
/// as a raw string so an unknown value yields a 400 with a clear message
/// instead of a body-deserialization rejection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateMembershipRequest {
    pub membership_status: String,
}
