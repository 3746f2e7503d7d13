//! Report export - encodes a [`Table`] as CSV, an XLSX workbook or a PDF with a chart.

pub mod chart;
pub mod csv;
pub mod pdf;
pub mod xlsx;

use crate::core::student::ClassKey;
use crate::errors::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Column headers plus string cells, the common input of every encoder.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Columns whose cells are written as numbers where the format has them
    #[serde(skip)]
    pub numeric: Vec<bool>,
}

impl Table {
    #[must_use]
    pub fn new(columns: &[&str], rows: Vec<Vec<String>>) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            numeric: vec![false; columns.len()],
            rows,
        }
    }

    /// Marks the named columns as numeric.
    #[must_use]
    pub fn with_numeric(mut self, names: &[&str]) -> Self {
        for name in names {
            if let Some(index) = self.column_index(name) {
                self.numeric[index] = true;
            }
        }
        self
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of one column, in row order. Short rows yield nothing for it.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a str> + 'a> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().filter_map(move |row| row.get(index).map(String::as_str)))
    }

    #[must_use]
    pub fn is_numeric(&self, index: usize) -> bool {
        self.numeric.get(index).copied().unwrap_or(false)
    }
}

/// Output format requested in the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Csv,
    Xlsx,
    Pdf,
}

impl FileType {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
        }
    }

    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Pdf => "application/pdf",
        }
    }
}

impl FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            "pdf" => Ok(Self::Pdf),
            other => Err(Error::InvalidFileType {
                file_type: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Download name (without extension) and chart heading of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportName {
    pub stem: String,
    pub chart_title: String,
}

impl ReportName {
    /// Falls back to `SUB` when the subject no longer exists.
    #[must_use]
    pub fn admin_class(class: &ClassKey, subject_code: Option<&str>) -> Self {
        let code = subject_code.unwrap_or("SUB");
        Self {
            stem: format!(
                "{}_Sem{}_{}_{code}_attendance",
                class.year, class.semester, class.section
            ),
            chart_title: format!("{} {} - {code}", class.year, class.section),
        }
    }

    #[must_use]
    pub fn teacher_class(class: &ClassKey, subject_code: &str) -> Self {
        Self {
            stem: format!(
                "{}_Sem{}_{}_{subject_code}",
                class.year, class.semester, class.section
            ),
            chart_title: format!("{} Sem {} {}", class.year, class.semester, class.section),
        }
    }

    #[must_use]
    pub fn student(student_id: &str) -> Self {
        Self {
            stem: format!("{student_id}_full_attendance"),
            chart_title: format!("Attendance Report for {student_id}"),
        }
    }
}

/// An encoded report ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Encodes `table` in the requested format.
#[instrument(skip(table), fields(rows = table.rows.len()))]
pub fn export(file_type: FileType, table: &Table, name: &ReportName) -> Result<ExportFile> {
    let bytes = match file_type {
        FileType::Csv => csv::write_csv(table).into_bytes(),
        FileType::Xlsx => xlsx::write_workbook(table)?,
        FileType::Pdf => pdf::write_pdf(table, &name.chart_title)?,
    };
    debug!(bytes = bytes.len(), "Report encoded");
    Ok(ExportFile {
        filename: format!("{}.{}", name.stem, file_type.extension()),
        content_type: file_type.content_type(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class() -> ClassKey {
        ClassKey {
            year: "2".to_string(),
            semester: "1".to_string(),
            section: "A".to_string(),
        }
    }

    #[test]
    fn test_file_type_parsing() {
        assert_eq!("csv".parse::<FileType>().ok(), Some(FileType::Csv));
        assert_eq!("xlsx".parse::<FileType>().ok(), Some(FileType::Xlsx));
        assert_eq!("pdf".parse::<FileType>().ok(), Some(FileType::Pdf));
        assert!(matches!(
            "docx".parse::<FileType>(),
            Err(Error::InvalidFileType { .. })
        ));
    }

    #[test]
    fn test_report_names() {
        let admin = ReportName::admin_class(&class(), Some("CS201"));
        assert_eq!(admin.stem, "2_Sem1_A_CS201_attendance");
        assert_eq!(admin.chart_title, "2 A - CS201");

        let orphan = ReportName::admin_class(&class(), None);
        assert_eq!(orphan.stem, "2_Sem1_A_SUB_attendance");

        let teacher = ReportName::teacher_class(&class(), "CS201");
        assert_eq!(teacher.stem, "2_Sem1_A_CS201");
        assert_eq!(teacher.chart_title, "2 Sem 1 A");

        let student = ReportName::student("S1");
        assert_eq!(student.stem, "S1_full_attendance");
        assert_eq!(student.chart_title, "Attendance Report for S1");
    }

    #[test]
    fn test_export_sets_filename_and_mime() -> Result<()> {
        let table = Table::new(&["Date", "Subject", "Status"], Vec::new());
        let name = ReportName::student("S1");

        let csv = export(FileType::Csv, &table, &name)?;
        assert_eq!(csv.filename, "S1_full_attendance.csv");
        assert_eq!(csv.content_type, "text/csv");

        let xlsx = export(FileType::Xlsx, &table, &name)?;
        assert_eq!(
            xlsx.content_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert!(xlsx.bytes.starts_with(b"PK"));

        let pdf = export(FileType::Pdf, &table, &name)?;
        assert_eq!(pdf.filename, "S1_full_attendance.pdf");
        assert!(pdf.bytes.starts_with(b"%PDF"));
        Ok(())
    }

    #[test]
    fn test_table_columns_and_numeric_flags() {
        let table = Table::new(
            &["Name", "Attendance %"],
            vec![vec!["Asha".to_string(), "100.00".to_string()]],
        )
        .with_numeric(&["Attendance %", "Missing"]);

        assert!(!table.is_numeric(0));
        assert!(table.is_numeric(1));
        let values: Vec<&str> = table
            .column("Attendance %")
            .map(|cells| cells.collect())
            .unwrap_or_default();
        assert_eq!(values, vec!["100.00"]);
        assert!(table.column("Status").is_none());
    }
}
