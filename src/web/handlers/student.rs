//! Student handlers - the attendance dashboard and its export.

use super::PasswordForm;
use crate::core::{
    report::{self, StudentSummary},
    student,
};
use crate::errors::Result;
use crate::export::{self, ExportFile, FileType, ReportName};
use crate::web::{AppState, Notice, session::StudentSession};
use axum::{
    Form, Json,
    extract::{Path, State},
};
use tracing::info;

pub async fn dashboard(StudentSession(ctx): StudentSession, State(state): State<AppState>) -> Result<Json<StudentSummary>> {
    Ok(Json(report::student_summary(&state.db, &ctx.identity).await?))
}

pub async fn download_report(
    StudentSession(ctx): StudentSession,
    State(state): State<AppState>,
    Path(file_type): Path<String>,
) -> Result<ExportFile> {
    let file_type: FileType = file_type.parse()?;
    let records = report::student_records(&state.db, &ctx.identity).await?;
    let name = ReportName::student(&ctx.identity);

    let file = export::export(file_type, &report::records_table(&records), &name)?;
    info!(filename = %file.filename, "Student report exported");
    Ok(file)
}

pub async fn change_password(
    StudentSession(ctx): StudentSession,
    State(state): State<AppState>,
    Form(form): Form<PasswordForm>,
) -> Result<Json<Notice>> {
    student::change_student_password(&state.db, &ctx.identity, &form.new_password).await?;
    Ok(Json(Notice::success("Password changed successfully")))
}
