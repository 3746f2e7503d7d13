//! Teacher handlers - own allocations, attendance marking and class reports.
//!
//! Every allocation id coming from a teacher is checked against their own
//! allocations before anything is read or written.

use super::{PasswordForm, ReportResponse, parse_id};
use crate::core::{
    allocation::{AllocationDetail, allocation_for_teacher, allocations_for_teacher},
    attendance::{self, Roster, parse_date, parse_status_fields},
    report::{self, ClassReport},
    teacher,
};
use crate::errors::{Error, Result};
use crate::export::{self, ExportFile, FileType, ReportName};
use crate::web::{AppState, Notice, session::TeacherSession};
use axum::{
    Form, Json,
    extract::{Path, Query, State},
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub username: String,
    pub allocations: Vec<AllocationDetail>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RosterQuery {
    pub alloc_id: Option<String>,
    /// `YYYY-MM-DD`, today when omitted
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AllocationForm {
    pub alloc_id: String,
}

#[derive(Debug, Serialize)]
pub struct ClassReportView {
    pub allocation: AllocationDetail,
    #[serde(flatten)]
    pub report: ClassReport,
}

pub async fn dashboard(TeacherSession(ctx): TeacherSession, State(state): State<AppState>) -> Result<Json<Dashboard>> {
    let allocations = allocations_for_teacher(&state.db, &ctx.identity).await?;
    Ok(Json(Dashboard {
        username: ctx.identity,
        allocations,
    }))
}

pub async fn roster(
    TeacherSession(ctx): TeacherSession,
    State(state): State<AppState>,
    Query(query): Query<RosterQuery>,
) -> Result<Json<Roster>> {
    let date = match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(value) => parse_date(value)?,
        None => Local::now().date_naive(),
    };
    let allocation_id = parse_id(query.alloc_id.as_deref().unwrap_or_default(), "alloc_id")?;
    let roster = attendance::fetch_roster(&state.db, allocation_id, &ctx.identity, date).await?;
    Ok(Json(roster))
}

/// Saves a marking form: `alloc_id`, `date` and one `status_<student id>` per student.
pub async fn save_attendance(
    TeacherSession(ctx): TeacherSession,
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Json<Notice>> {
    let field = |name: &'static str| form.get(name).map_or("", String::as_str);
    let allocation_id = parse_id(field("alloc_id"), "alloc_id")?;
    let date_value = field("date").trim();
    if date_value.is_empty() {
        return Err(Error::MissingField { field: "date" });
    }
    let date = parse_date(date_value)?;

    let entries = parse_status_fields(&form)?;
    if entries.is_empty() {
        return Err(Error::MissingField { field: "status" });
    }

    attendance::mark_attendance(&state.db, allocation_id, &ctx.identity, date, &entries).await?;
    Ok(Json(Notice::success(format!(
        "Attendance for {date} saved/updated successfully!"
    ))))
}

async fn report_for(state: &AppState, username: &str, form: &AllocationForm) -> Result<ClassReportView> {
    let allocation_id = parse_id(&form.alloc_id, "alloc_id")?;
    let allocation = allocation_for_teacher(&state.db, allocation_id, username).await?;
    let report = report::class_report(&state.db, &allocation.class(), allocation.subject_id).await?;
    Ok(ClassReportView { allocation, report })
}

pub async fn class_report(
    TeacherSession(ctx): TeacherSession,
    State(state): State<AppState>,
    Form(form): Form<AllocationForm>,
) -> Result<Json<ReportResponse<ClassReportView>>> {
    let view = report_for(&state, &ctx.identity, &form).await?;
    let notice = if view.report.total_classes == 0 {
        Some(Notice::info("No attendance marked."))
    } else if view.report.rows.is_empty() {
        Some(Notice::warning("No students found."))
    } else {
        None
    };
    Ok(Json(ReportResponse { data: view, notice }))
}

pub async fn download_class_report(
    TeacherSession(ctx): TeacherSession,
    State(state): State<AppState>,
    Path(file_type): Path<String>,
    Form(form): Form<AllocationForm>,
) -> Result<ExportFile> {
    let file_type: FileType = file_type.parse()?;
    let view = report_for(&state, &ctx.identity, &form).await?;
    let name = ReportName::teacher_class(&view.allocation.class(), &view.allocation.subject_code);

    let file = export::export(file_type, &view.report.to_table(), &name)?;
    info!(filename = %file.filename, "Class report exported");
    Ok(file)
}

pub async fn change_password(
    TeacherSession(ctx): TeacherSession,
    State(state): State<AppState>,
    Form(form): Form<PasswordForm>,
) -> Result<Json<Notice>> {
    teacher::change_teacher_password(&state.db, &ctx.identity, &form.new_password).await?;
    Ok(Json(Notice::success("Password changed successfully")))
}
