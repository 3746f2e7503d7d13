//! Session cookie handling and the role guards.
//!
//! [`session_middleware`] resolves the `session` cookie into an [`AuthContext`]
//! request extension. The guards read that extension and bounce anyone without
//! the right role back to the login page.

use super::AppState;
use crate::core::session::resolve_session;
use crate::entities::Role;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::{Redirect, Response},
};
use tracing::{debug, error};

pub const SESSION_COOKIE: &str = "session";

/// The logged-in user behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub role: Role,
    /// Teacher username or student id
    pub identity: String,
    pub token: String,
}

/// Reads one cookie value from the request headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str, ttl_hours: i64) -> Option<HeaderValue> {
    let max_age = ttl_hours.saturating_mul(3600);
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}"
    ))
    .ok()
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
#[must_use]
pub fn expired_cookie() -> HeaderValue {
    HeaderValue::from_static("session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// Attaches an [`AuthContext`] to requests that carry a live session.
///
/// Never rejects: unknown, expired or unreadable sessions just leave the
/// request anonymous.
pub async fn session_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if let Some(token) = cookie_value(request.headers(), SESSION_COOKIE) {
        match resolve_session(&state.db, &token).await {
            Ok(Some(identity)) => {
                request.extensions_mut().insert(AuthContext {
                    role: identity.role,
                    identity: identity.identity,
                    token,
                });
            }
            Ok(None) => debug!("Unknown or expired session cookie"),
            Err(e) => error!(error = %e, "Failed to resolve session"),
        }
    }
    next.run(request).await
}

fn context_with_role(parts: &Parts, role: Role) -> Result<AuthContext, Redirect> {
    parts
        .extensions
        .get::<AuthContext>()
        .filter(|ctx| ctx.role == role)
        .cloned()
        .ok_or_else(|| Redirect::to("/"))
}

macro_rules! role_guard {
    ($(#[$doc:meta])* $name:ident, $role:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name(pub AuthContext);

        impl<S> FromRequestParts<S> for $name
        where
            S: Send + Sync,
        {
            type Rejection = Redirect;

            async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
                context_with_role(parts, $role).map(Self)
            }
        }
    };
}

role_guard!(
    /// Admits only the `admin` account logged in as admin.
    AdminSession,
    Role::Admin
);
role_guard!(
    /// Admits teachers.
    TeacherSession,
    Role::Teacher
);
role_guard!(
    /// Admits students.
    StudentSession,
    Role::Student
);
