use crate::{
    AppState,
    auth::{self, MaybeSessionUser, SessionUser},
    error::{ApiError, ApiResult},
    models::{
        CreateMessageRequest, LoginRequest, MembershipStatus, MessageResponse, MessageWithAuthor,
        NewUser, PublicUserView, RegisterRequest, UpdateMembershipRequest,
    },
    password, visibility,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

// --- User Handlers ---

/// register_user
///
/// [Public Route] Creates a new account at the `regular` tier.
///
/// The response goes through the visibility filter with whoever is making the
/// request as the requester, so an anonymous registration sees the redacted
/// view of the account it just created. The pre-insert email lookup gives the
/// friendly `Conflict` path; the unique index on `users.email` backstops the
/// race, and that violation also maps to `Conflict`.
#[utoipa::path(
    post,
    path = "/api/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = PublicUserView),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_user(
    requester: MaybeSessionUser,
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<PublicUserView>)> {
    payload.validate()?;

    let email = payload.normalized_email();
    if state.repo.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict);
    }

    let password_hash = password::hash_password(&payload.password)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

    let user = state
        .repo
        .create_user(NewUser {
            email,
            password_hash,
            first_name: payload.first_name.trim().to_string(),
            last_name: payload.last_name.trim().to_string(),
        })
        .await?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(visibility::reveal(&user, requester.requester())),
    ))
}

/// login_user
///
/// [Public Route] Credential check and session establishment.
///
/// Both an unknown email and a wrong password answer with the same 401 so the
/// endpoint cannot be used to enumerate accounts. On success a session row is
/// created and its token set as the `session` cookie; the body is the
/// self-revealing view (requester == subject).
#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, session cookie set", body = PublicUserView),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<PublicUserView>)> {
    let email = payload.email.trim().to_lowercase();
    let user = state
        .repo
        .find_user_by_email(&email)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let valid = password::verify_password(&payload.password, &user.password_hash)
        .map_err(|_| ApiError::Unauthorized)?;
    if !valid {
        return Err(ApiError::Unauthorized);
    }

    let session = state
        .repo
        .create_session(user.id, state.config.session_ttl_hours)
        .await?;

    tracing::info!(user_id = %user.id, "user logged in");

    let jar = jar.add(auth::session_cookie(session.token, &state.config));
    Ok((jar, Json(visibility::reveal(&user, Some(&user)))))
}

/// logout_user
///
/// [Public Route] Ends the session, if there is one. Tolerant of missing or
/// stale cookies: logging out while not logged in is still a 200, matching
/// the original contract.
#[utoipa::path(
    post,
    path = "/api/users/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse))
)]
pub async fn logout_user(
    session: MaybeSessionUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<MessageResponse>)> {
    if let Some(session) = session.0 {
        state.repo.delete_session(session.token).await?;
    }

    let jar = jar.remove(auth::expired_session_cookie());
    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

/// get_me
///
/// [Authenticated Route] The caller's own record. Self lookup always reveals
/// the full field set, whatever the caller's tier.
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Own profile", body = PublicUserView),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn get_me(session: SessionUser) -> Json<PublicUserView> {
    Json(visibility::reveal(&session.user, Some(&session.user)))
}

/// update_membership
///
/// [Admin Route] Changes a user's membership tier.
///
/// The tier arrives as a raw string and is parsed explicitly so an unknown
/// value is a 400 with "Invalid membership status" rather than a body
/// rejection. The admin requester sees the updated record unredacted.
#[utoipa::path(
    patch,
    path = "/api/users/membership/{user_id}",
    params(("user_id" = Uuid, Path, description = "User to update")),
    request_body = UpdateMembershipRequest,
    responses(
        (status = 200, description = "Updated", body = PublicUserView),
        (status = 400, description = "Invalid membership status"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_membership(
    session: SessionUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateMembershipRequest>,
) -> ApiResult<Json<PublicUserView>> {
    session.require_admin()?;

    let status: MembershipStatus = payload.membership_status.parse()?;

    let updated = state
        .repo
        .set_membership_status(user_id, status)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    tracing::info!(user_id = %updated.id, status = ?status, "membership updated");

    Ok(Json(visibility::reveal(&updated, Some(&session.user))))
}

// --- Message Handlers ---

/// get_messages
///
/// [Public Route] All messages, newest first, each author redacted for the
/// requester's tier (anonymous requesters get the minimal author snippet).
#[utoipa::path(
    get,
    path = "/api/messages",
    responses((status = 200, description = "Message board", body = [MessageWithAuthor]))
)]
pub async fn get_messages(
    requester: MaybeSessionUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<MessageWithAuthor>>> {
    let rows = state.repo.list_messages().await?;
    let requester = requester.requester();
    Ok(Json(
        rows.into_iter()
            .map(|row| visibility::redact_message(row, requester))
            .collect(),
    ))
}

/// create_message
///
/// [Authenticated Route] Posts a new message. The author is always the
/// session user; the created message comes back with its author redacted for
/// that same user.
#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = CreateMessageRequest,
    responses(
        (status = 201, description = "Created", body = MessageWithAuthor),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn create_message(
    session: SessionUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateMessageRequest>,
) -> ApiResult<(StatusCode, Json<MessageWithAuthor>)> {
    payload.validate()?;

    let row = state
        .repo
        .create_message(
            session.user.id,
            payload.title.trim(),
            payload.text.trim(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(visibility::redact_message(row, Some(&session.user))),
    ))
}

/// delete_message
///
/// [Admin Route] Removes a message by id. Non-admins get 403 before the
/// repository is ever consulted; a missing id is 404.
#[utoipa::path(
    delete,
    path = "/api/messages/{message_id}",
    params(("message_id" = i64, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Message not found")
    )
)]
pub async fn delete_message(
    session: SessionUser,
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    session.require_admin()?;

    if state.repo.delete_message(message_id).await? {
        tracing::info!(message_id, admin_id = %session.user.id, "message deleted");
        Ok(Json(MessageResponse {
            message: "Message deleted successfully".to_string(),
        }))
    } else {
        Err(ApiError::NotFound("Message not found"))
    }
}
