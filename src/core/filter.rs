//! Typed filters for the admin listing endpoints.
//!
//! Filters deserialize straight from query strings. Blank values mean "no
//! constraint", and every predicate is bound as a parameter by the query builder.

use crate::entities::{student, teacher};
use crate::core::auth::ADMIN_USERNAME;
use sea_orm::{ColumnTrait, Condition};
use serde::Deserialize;

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Narrows the student list by cohort and a free-text search on id or name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentFilter {
    pub year: Option<String>,
    pub semester: Option<String>,
    pub section: Option<String>,
    pub search: Option<String>,
}

impl StudentFilter {
    /// True when no field constrains the result.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        non_blank(self.year.as_ref()).is_none()
            && non_blank(self.semester.as_ref()).is_none()
            && non_blank(self.section.as_ref()).is_none()
            && non_blank(self.search.as_ref()).is_none()
    }

    #[must_use]
    pub fn to_condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(year) = non_blank(self.year.as_ref()) {
            condition = condition.add(student::Column::Year.eq(year));
        }
        if let Some(semester) = non_blank(self.semester.as_ref()) {
            condition = condition.add(student::Column::Semester.eq(semester));
        }
        if let Some(section) = non_blank(self.section.as_ref()) {
            condition = condition.add(student::Column::Section.eq(section));
        }
        if let Some(search) = non_blank(self.search.as_ref()) {
            condition = condition.add(
                Condition::any()
                    .add(student::Column::Id.contains(search))
                    .add(student::Column::Name.contains(search)),
            );
        }
        condition
    }
}

/// Narrows the teacher list by username. The admin account is always excluded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeacherFilter {
    pub search: Option<String>,
}

impl TeacherFilter {
    #[must_use]
    pub fn to_condition(&self) -> Condition {
        let mut condition = Condition::all().add(teacher::Column::Username.ne(ADMIN_USERNAME));
        if let Some(search) = non_blank(self.search.as_ref()) {
            condition = condition.add(teacher::Column::Username.contains(search));
        }
        condition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Student;
    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

    fn sql_for(filter: &StudentFilter) -> String {
        Student::find()
            .filter(filter.to_condition())
            .build(DbBackend::Sqlite)
            .to_string()
    }

    #[test]
    fn test_empty_filter_adds_no_predicates() {
        let filter = StudentFilter::default();
        assert!(filter.is_empty());
        let sql = sql_for(&filter);
        assert!(sql.ends_with("WHERE TRUE"), "{sql}");
        for predicate in [r#""students"."year""#, r#""students"."semester""#, r#""students"."section""#, "LIKE"] {
            assert!(!sql.contains(predicate), "{sql}");
        }
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let filter = StudentFilter {
            year: Some("  ".to_string()),
            search: Some(String::new()),
            ..Default::default()
        };
        assert!(filter.is_empty());
    }

    #[test]
    fn test_cohort_and_search_compose() {
        let filter = StudentFilter {
            year: Some("2".to_string()),
            section: Some("A".to_string()),
            search: Some("ash".to_string()),
            ..Default::default()
        };
        let sql = sql_for(&filter);
        assert!(sql.contains(r#""students"."year" = '2'"#));
        assert!(sql.contains(r#""students"."section" = 'A'"#));
        assert!(sql.contains("LIKE '%ash%'"));
        assert!(sql.contains(" OR "));
        assert!(!sql.contains(r#""students"."semester" ="#));
    }

    #[test]
    fn test_teacher_filter_excludes_admin() {
        use crate::entities::Teacher;
        let sql = Teacher::find()
            .filter(TeacherFilter::default().to_condition())
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.contains(r#""teachers"."username" <> 'admin'"#));
    }
}
