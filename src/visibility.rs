//! Authorization-aware data visibility.
//!
//! The single place where user records are narrowed into what a given
//! requester is allowed to see. Handlers never hand a raw `User` (or a
//! message's author columns) to the serializer; they pass through `reveal` or
//! `redact_author` first, keyed on the requester's membership tier.

use crate::models::{Author, AuthorView, MessageRow, MessageWithAuthor, PublicUserView, User};

/// reveal
///
/// Maps (subject, requester) to the redacted `PublicUserView`.
///
/// Rules:
/// - Anonymous or regular-tier requesters get `{id, membershipStatus,
///   isAdmin}` with the name fields absent.
/// - Member- and admin-tier requesters additionally get `firstName` and
///   `lastName`.
/// - Self lookup is an explicit special case: when the requester *is* the
///   subject ("/me", login), the full view is always returned regardless of
///   tier.
pub fn reveal(subject: &User, requester: Option<&User>) -> PublicUserView {
    let is_self = requester.is_some_and(|r| r.id == subject.id);
    let show_names =
        is_self || requester.is_some_and(|r| r.membership_status.is_member_or_above());

    PublicUserView {
        id: subject.id,
        first_name: show_names.then(|| subject.first_name.clone()),
        last_name: show_names.then(|| subject.last_name.clone()),
        membership_status: subject.membership_status,
        is_admin: subject.is_admin,
    }
}

/// redact_author
///
/// Same tier rule applied to the author snippet embedded in a message. For an
/// anonymous or regular-tier requester the snippet degrades to
/// `{id, membershipStatus}`; there is no self case here because the snippet
/// never carries more than names anyway.
pub fn redact_author(author: &Author, requester: Option<&User>) -> AuthorView {
    let show_names = requester.is_some_and(|r| r.membership_status.is_member_or_above());

    AuthorView {
        id: author.id,
        first_name: show_names.then(|| author.first_name.clone()),
        last_name: show_names.then(|| author.last_name.clone()),
        membership_status: author.membership_status,
    }
}

/// redact_message
///
/// Turns a joined database row into the client-facing shape, redacting the
/// embedded author for the requester.
pub fn redact_message(row: MessageRow, requester: Option<&User>) -> MessageWithAuthor {
    let author = redact_author(&row.author(), requester);
    MessageWithAuthor {
        id: row.id,
        title: row.title,
        text: row.text,
        created_at: row.created_at,
        author,
    }
}
