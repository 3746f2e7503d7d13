//! Login, logout and liveness.

use crate::core::{auth::authenticate, session};
use crate::entities::Role;
use crate::errors::Result;
use crate::web::{
    AppState,
    session::{SESSION_COOKIE, cookie_value, expired_cookie, session_cookie},
};
use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};

/// Missing fields deserialize as blank and fail like any other bad login.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub user_type: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub message: &'static str,
    pub user_types: [&'static str; 3],
}

const fn dashboard_path(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin",
        Role::Teacher => "/teacher",
        Role::Student => "/student/dashboard",
    }
}

pub async fn login_page() -> Json<LoginPage> {
    Json(LoginPage {
        message: "POST user_type, username and password to log in",
        user_types: ["admin", "teacher", "student"],
    })
}

/// Verifies the form, opens a session and redirects to the role's dashboard.
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Response> {
    let identity = authenticate(&state.db, &form.user_type, form.username.trim(), &form.password).await?;
    let ttl_hours = state.config.auth.session_ttl_hours;
    let created = session::create_session(&state.db, &identity, ttl_hours).await?;

    let mut response = Redirect::to(dashboard_path(identity.role)).into_response();
    if let Some(cookie) = session_cookie(&created.token, ttl_hours) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

/// Ends the session, if any, and returns to the login page.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = cookie_value(&headers, SESSION_COOKIE) {
        match session::end_session(&state.db, &token).await {
            Ok(()) => info!("Logged out"),
            Err(e) => error!(error = %e, "Failed to delete session"),
        }
    }
    let mut response = Redirect::to("/").into_response();
    response.headers_mut().insert(header::SET_COOKIE, expired_cookie());
    response
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
