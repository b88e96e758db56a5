/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated
/// modules. Access control is applied explicitly at the module level via
/// Axum layers, so a protected endpoint cannot be exposed by accident.

/// Routes accessible to all clients, anonymous included. Handlers that take
/// a requester use `MaybeSessionUser` and redact accordingly.
pub mod public;

/// Routes behind the `SessionUser` extractor middleware. Requires a valid,
/// unexpired session cookie.
pub mod authenticated;

/// Routes restricted to admins. The session middleware authenticates; the
/// handlers enforce the admin flag.
pub mod admin;
