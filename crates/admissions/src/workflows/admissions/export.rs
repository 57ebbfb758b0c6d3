use chrono::{Local, NaiveDate};
use serde::Serialize;

use super::domain::Application;

pub const EXPORT_HEADER: &str = "Name,Class,Type,Parent,Phone,Email,Status,Date";

/// How the `Date` column renders the creation date (calendar day in the local time zone).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateStyle {
    /// `1/1/2024`
    #[default]
    UsShort,
    /// `2024-01-01`
    Iso,
}

impl DateStyle {
    fn render(self, date: NaiveDate) -> String {
        match self {
            DateStyle::UsShort => date.format("%-m/%-d/%Y").to_string(),
            DateStyle::Iso => date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// A generated download: file name plus CSV text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFile {
    pub filename: String,
    pub contents: String,
    pub rows: usize,
}

pub fn export_filename(today: NaiveDate) -> String {
    format!("applications-{}.csv", today.format("%Y-%m-%d"))
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quoted(value)
    } else {
        value.to_string()
    }
}

fn export_line(application: &Application, style: DateStyle) -> String {
    let student = &application.student;
    let parent = &application.parent;
    [
        quoted(&student.full_name()),
        cell(&student.class_applying.to_uppercase()),
        cell(student.student_type.label()),
        quoted(&parent.name),
        cell(&parent.phone),
        cell(&parent.email),
        cell(application.status.label()),
        cell(&style.render(application.created_at.with_timezone(&Local).date_naive())),
    ]
    .join(",")
}

/// Serialise applications in the given order. An empty input yields the header only.
pub fn export_applications<'a, I>(applications: I, today: NaiveDate, style: DateStyle) -> ExportFile
where
    I: IntoIterator<Item = &'a Application>,
{
    let mut contents = String::from(EXPORT_HEADER);
    contents.push('\n');
    let mut rows = 0;
    for application in applications {
        contents.push_str(&export_line(application, style));
        contents.push('\n');
        rows += 1;
    }

    ExportFile {
        filename: export_filename(today),
        contents,
        rows,
    }
}
