//! HTTP layer - axum router, session middleware, role guards and handlers.
//!
//! Handlers stay thin: they pull the identity from a role guard, call into
//! [`crate::core`] and serialize the result. Flash-style messages are sent as a
//! [`Notice`] in the JSON body.

pub mod error;
pub mod handlers;
pub mod session;

use crate::config::AppConfig;
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Danger,
}

/// A one-off message for the user, the JSON counterpart of a flash message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Danger,
            message: message.into(),
        }
    }
}

/// Builds the application router.
pub fn create_router(state: AppState) -> Router {
    use handlers::{admin, auth, student, teacher};

    let admin_routes = Router::new()
        .route("/", get(admin::dashboard))
        .route("/teachers", get(admin::list_teachers).post(admin::add_teacher))
        .route("/teachers/{username}", delete(admin::remove_teacher))
        .route("/students", get(admin::list_students).post(admin::add_student))
        .route(
            "/students/{id}",
            put(admin::update_student).delete(admin::remove_student),
        )
        .route("/class-options", get(admin::class_options))
        .route("/subjects", get(admin::list_subjects).post(admin::add_subject))
        .route("/subjects/{id}", delete(admin::remove_subject))
        .route(
            "/allocations",
            get(admin::list_allocations).post(admin::allocate_subject),
        )
        .route("/allocations/{id}", delete(admin::remove_allocation))
        .route("/reports", post(admin::class_report))
        .route("/reports/{file_type}", post(admin::download_class_report))
        .route("/password", post(admin::change_password));

    let teacher_routes = Router::new()
        .route("/", get(teacher::dashboard))
        .route(
            "/attendance",
            get(teacher::roster).post(teacher::save_attendance),
        )
        .route("/reports", post(teacher::class_report))
        .route("/reports/{file_type}", post(teacher::download_class_report))
        .route("/password", post(teacher::change_password));

    let student_routes = Router::new()
        .route("/dashboard", get(student::dashboard))
        .route("/report/{file_type}", get(student::download_report))
        .route("/password", post(student::change_password));

    Router::new()
        .route("/", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/health", get(auth::health))
        .nest("/admin", admin_routes)
        .nest("/teacher", teacher_routes)
        .nest("/student", student_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
