use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use chrono::Utc;
use members_only::{
    AppState,
    auth::{MaybeSessionUser, SessionUser},
    config::AppConfig,
    error::ApiError,
    models::{MembershipStatus, MessageRow, NewUser, Session, User},
    repository::Repository,
};
use std::sync::Arc;
use uuid::Uuid;

// --- Mock Repository for Session Resolution ---

#[derive(Default)]
struct MockSessionRepo {
    user_to_return: Option<User>,
}

#[async_trait]
impl Repository for MockSessionRepo {
    async fn find_session_user(&self, _token: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self.user_to_return.clone())
    }

    // Placeholders for the unused trait methods.
    async fn find_user_by_email(&self, _email: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(None)
    }
    async fn create_user(&self, _new_user: NewUser) -> Result<User, sqlx::Error> {
        Ok(User::default())
    }
    async fn set_membership_status(
        &self,
        _id: Uuid,
        _status: MembershipStatus,
    ) -> Result<Option<User>, sqlx::Error> {
        Ok(None)
    }
    async fn create_session(
        &self,
        user_id: Uuid,
        _ttl_hours: i64,
    ) -> Result<Session, sqlx::Error> {
        Ok(Session {
            token: Uuid::new_v4(),
            user_id,
            created_at: Utc::now(),
            expires_at: Utc::now(),
        })
    }
    async fn delete_session(&self, _token: Uuid) -> Result<bool, sqlx::Error> {
        Ok(false)
    }
    async fn list_messages(&self) -> Result<Vec<MessageRow>, sqlx::Error> {
        Ok(vec![])
    }
    async fn create_message(
        &self,
        _user_id: Uuid,
        _title: &str,
        _text: &str,
    ) -> Result<MessageRow, sqlx::Error> {
        Ok(MessageRow::default())
    }
    async fn delete_message(&self, _id: i64) -> Result<bool, sqlx::Error> {
        Ok(false)
    }
}

// --- Helper Functions ---

const TEST_USER_ID: Uuid = Uuid::from_u128(1);
const TEST_TOKEN: Uuid = Uuid::from_u128(42);

fn create_app_state(repo: MockSessionRepo) -> AppState {
    AppState {
        repo: Arc::new(repo),
        config: AppConfig::default(),
    }
}

fn test_user(status: MembershipStatus, is_admin: bool) -> User {
    User {
        id: TEST_USER_ID,
        email: "session@example.com".to_string(),
        membership_status: status,
        is_admin,
        ..User::default()
    }
}

/// Builds request Parts, optionally with a Cookie header.
fn get_request_parts(cookie: Option<&str>) -> Parts {
    let mut builder = Request::builder()
        .method(Method::GET)
        .uri("/".parse::<Uri>().unwrap());
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let (parts, _) = builder.body(axum::body::Body::empty()).unwrap().into_parts();
    parts
}

// --- Extractor Tests ---

#[tokio::test]
async fn test_session_resolved_from_valid_cookie() {
    let app_state = create_app_state(MockSessionRepo {
        user_to_return: Some(test_user(MembershipStatus::Member, false)),
    });

    let mut parts = get_request_parts(Some(&format!("session={TEST_TOKEN}")));

    let session = SessionUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();

    assert_eq!(session.user.id, TEST_USER_ID);
    assert_eq!(session.token, TEST_TOKEN);
    assert_eq!(session.user.membership_status, MembershipStatus::Member);
}

#[tokio::test]
async fn test_missing_cookie_rejected() {
    let app_state = create_app_state(MockSessionRepo::default());

    let mut parts = get_request_parts(None);

    let result = SessionUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(result.unwrap_err(), ApiError::Unauthorized));
}

#[tokio::test]
async fn test_malformed_token_rejected() {
    let app_state = create_app_state(MockSessionRepo {
        user_to_return: Some(test_user(MembershipStatus::Member, false)),
    });

    let mut parts = get_request_parts(Some("session=not-a-uuid"));

    let result = SessionUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(result.unwrap_err(), ApiError::Unauthorized));
}

#[tokio::test]
async fn test_expired_or_unknown_session_rejected() {
    // The repository ignores expired rows, so "expired" and "unknown" both
    // resolve to None here.
    let app_state = create_app_state(MockSessionRepo {
        user_to_return: None,
    });

    let mut parts = get_request_parts(Some(&format!("session={TEST_TOKEN}")));

    let result = SessionUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(result.unwrap_err(), ApiError::Unauthorized));
}

#[tokio::test]
async fn test_maybe_session_user_never_rejects() {
    let app_state = create_app_state(MockSessionRepo::default());

    let mut parts = get_request_parts(None);

    let MaybeSessionUser(session) = MaybeSessionUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();

    assert!(session.is_none());
}

// --- Gate Predicate Tests ---

#[test]
fn test_require_member_rejects_regular_tier() {
    let session = SessionUser {
        user: test_user(MembershipStatus::Regular, false),
        token: TEST_TOKEN,
    };

    assert!(matches!(
        session.require_member().unwrap_err(),
        ApiError::Forbidden(_)
    ));
}

#[test]
fn test_require_member_allows_member_and_admin() {
    for tier in [MembershipStatus::Member, MembershipStatus::Admin] {
        let session = SessionUser {
            user: test_user(tier, false),
            token: TEST_TOKEN,
        };
        assert!(session.require_member().is_ok());
    }
}

#[test]
fn test_require_admin_checks_flag_not_tier() {
    // Tier 'admin' without the flag is not enough; the flag alone is.
    let tier_only = SessionUser {
        user: test_user(MembershipStatus::Admin, false),
        token: TEST_TOKEN,
    };
    assert!(matches!(
        tier_only.require_admin().unwrap_err(),
        ApiError::Forbidden(_)
    ));

    let flagged = SessionUser {
        user: test_user(MembershipStatus::Regular, true),
        token: TEST_TOKEN,
    };
    assert!(flagged.require_admin().is_ok());
}
