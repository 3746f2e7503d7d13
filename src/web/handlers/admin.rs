//! Admin handlers - account, roster, subject and allocation management plus class reports.

use super::{PasswordForm, ReportResponse, parse_id};
use crate::core::{
    allocation::{self, AllocationDetail, NewAllocation},
    filter::{StudentFilter, TeacherFilter},
    report::{self, ClassReport, Overview},
    student::{self, ClassKey, ClassOptions, NewStudent, StudentUpdate},
    subject, teacher,
};
use crate::entities::{StudentModel, SubjectModel, TeacherModel};
use crate::errors::Result;
use crate::export::{self, ExportFile, FileType, ReportName};
use crate::web::{AppState, Notice, session::AdminSession};
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TeacherForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubjectForm {
    pub subject_code: String,
    pub subject_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ClassOptionsQuery {
    pub year: Option<String>,
}

/// Class report selection. The semester defaults to `1` when omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportForm {
    pub year: String,
    pub semester: Option<String>,
    pub section: String,
    pub subject_id: String,
}

/// Allocation form; the subject id arrives as text like every other form value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AllocationForm {
    pub teacher_username: String,
    pub subject_id: String,
    pub year: String,
    pub semester: String,
    pub section: String,
}

impl AllocationForm {
    fn into_allocation(self) -> Result<NewAllocation> {
        Ok(NewAllocation {
            subject_id: parse_id(&self.subject_id, "subject_id")?,
            teacher_username: self.teacher_username,
            year: self.year,
            semester: self.semester,
            section: self.section,
        })
    }
}

impl ReportForm {
    fn selection(&self) -> Result<(ClassKey, i64)> {
        let semester = self
            .semester
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("1");
        let class = ClassKey::new(&self.year, semester, &self.section)?;
        let subject_id = parse_id(&self.subject_id, "subject_id")?;
        Ok((class, subject_id))
    }
}

fn empty_report_notice(report: &ClassReport) -> Option<Notice> {
    if report.total_classes == 0 {
        Some(Notice::info("No attendance records found."))
    } else if report.rows.is_empty() {
        Some(Notice::warning("No students found."))
    } else {
        None
    }
}

pub async fn dashboard(AdminSession(_): AdminSession, State(state): State<AppState>) -> Result<Json<Overview>> {
    Ok(Json(report::overview(&state.db).await?))
}

pub async fn list_teachers(
    AdminSession(_): AdminSession,
    State(state): State<AppState>,
    Query(filter): Query<TeacherFilter>,
) -> Result<Json<Vec<TeacherModel>>> {
    Ok(Json(teacher::list_teachers(&state.db, &filter).await?))
}

pub async fn add_teacher(
    AdminSession(_): AdminSession,
    State(state): State<AppState>,
    Form(form): Form<TeacherForm>,
) -> Result<(StatusCode, Json<Notice>)> {
    let created = teacher::add_teacher(&state.db, &form.username, &form.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(Notice::success(format!(
            "Teacher '{}' added successfully!",
            created.username
        ))),
    ))
}

pub async fn remove_teacher(
    AdminSession(_): AdminSession,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Notice>> {
    teacher::remove_teacher(&state.db, &username).await?;
    Ok(Json(Notice::success(format!(
        "Teacher '{username}' removed successfully!"
    ))))
}

pub async fn list_students(
    AdminSession(_): AdminSession,
    State(state): State<AppState>,
    Query(filter): Query<StudentFilter>,
) -> Result<Json<Vec<StudentModel>>> {
    Ok(Json(student::list_students(&state.db, &filter).await?))
}

pub async fn add_student(
    AdminSession(_): AdminSession,
    State(state): State<AppState>,
    Form(form): Form<NewStudent>,
) -> Result<(StatusCode, Json<Notice>)> {
    let created = student::add_student(&state.db, form).await?;
    Ok((
        StatusCode::CREATED,
        Json(Notice::success(format!(
            "Student {} added successfully!",
            created.id
        ))),
    ))
}

pub async fn update_student(
    AdminSession(_): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<StudentUpdate>,
) -> Result<Json<Notice>> {
    student::update_student(&state.db, &id, form).await?;
    Ok(Json(Notice::success(format!(
        "Student '{id}' updated successfully!"
    ))))
}

pub async fn remove_student(
    AdminSession(_): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Notice>> {
    student::remove_student(&state.db, &id).await?;
    Ok(Json(Notice::success(format!(
        "Student '{id}' removed successfully!"
    ))))
}

pub async fn class_options(
    AdminSession(_): AdminSession,
    State(state): State<AppState>,
    Query(query): Query<ClassOptionsQuery>,
) -> Result<Json<ClassOptions>> {
    let year = query.year.as_deref().map(str::trim).filter(|y| !y.is_empty());
    Ok(Json(student::class_options(&state.db, year).await?))
}

pub async fn list_subjects(
    AdminSession(_): AdminSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<SubjectModel>>> {
    Ok(Json(subject::list_subjects(&state.db).await?))
}

pub async fn add_subject(
    AdminSession(_): AdminSession,
    State(state): State<AppState>,
    Form(form): Form<SubjectForm>,
) -> Result<(StatusCode, Json<Notice>)> {
    let created = subject::add_subject(&state.db, &form.subject_code, &form.subject_name).await?;
    Ok((
        StatusCode::CREATED,
        Json(Notice::success(format!(
            "Subject '{}' added successfully!",
            created.name
        ))),
    ))
}

pub async fn remove_subject(
    AdminSession(_): AdminSession,
    State(state): State<AppState>,
    Path(subject_id): Path<i64>,
) -> Result<Json<Notice>> {
    subject::remove_subject(&state.db, subject_id).await?;
    Ok(Json(Notice::success(
        "Subject and related data removed successfully!",
    )))
}

pub async fn list_allocations(
    AdminSession(_): AdminSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<AllocationDetail>>> {
    Ok(Json(allocation::list_allocations(&state.db).await?))
}

pub async fn allocate_subject(
    AdminSession(_): AdminSession,
    State(state): State<AppState>,
    Form(form): Form<AllocationForm>,
) -> Result<(StatusCode, Json<Notice>)> {
    allocation::allocate_subject(&state.db, form.into_allocation()?).await?;
    Ok((
        StatusCode::CREATED,
        Json(Notice::success("Subject allocated successfully!")),
    ))
}

pub async fn remove_allocation(
    AdminSession(_): AdminSession,
    State(state): State<AppState>,
    Path(allocation_id): Path<i64>,
) -> Result<Json<Notice>> {
    allocation::remove_allocation(&state.db, allocation_id).await?;
    Ok(Json(Notice::success("Allocation removed successfully!")))
}

pub async fn class_report(
    AdminSession(_): AdminSession,
    State(state): State<AppState>,
    Form(form): Form<ReportForm>,
) -> Result<Json<ReportResponse<ClassReport>>> {
    let (class, subject_id) = form.selection()?;
    let report = report::class_report(&state.db, &class, subject_id).await?;
    Ok(Json(ReportResponse {
        notice: empty_report_notice(&report),
        data: report,
    }))
}

pub async fn download_class_report(
    AdminSession(_): AdminSession,
    State(state): State<AppState>,
    Path(file_type): Path<String>,
    Form(form): Form<ReportForm>,
) -> Result<ExportFile> {
    let file_type: FileType = file_type.parse()?;
    let (class, subject_id) = form.selection()?;

    let report = report::class_report(&state.db, &class, subject_id).await?;
    let subject = subject::get_subject(&state.db, subject_id).await?;
    let name = ReportName::admin_class(&class, subject.as_ref().map(|s| s.code.as_str()));

    let file = export::export(file_type, &report.to_table(), &name)?;
    info!(filename = %file.filename, "Class report exported");
    Ok(file)
}

pub async fn change_password(
    AdminSession(ctx): AdminSession,
    State(state): State<AppState>,
    Form(form): Form<PasswordForm>,
) -> Result<Json<Notice>> {
    teacher::change_teacher_password(&state.db, &ctx.identity, &form.new_password).await?;
    Ok(Json(Notice::success("Password changed successfully")))
}
