//! Flat rows as returned by the hosted tables, and their validation into domain records.
//!
//! Backend rows arrive with every column optional and every value as text. Nothing past this
//! module touches an unchecked column: conversion either yields a fully typed record or a
//! [`RowError`] naming the offending column.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{
    Application, ApplicationDocuments, ApplicationId, ApplicationNote, ApplicationStatus,
    ApplicationSubmission, DocumentRef, EmergencyContact, NoteId, ParentContact, PriorSchool,
    StaffId, StudentDetails, StudentType,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("column '{0}' is missing or blank")]
    Missing(&'static str),
    #[error("column '{column}' has invalid value '{value}'")]
    Invalid { column: &'static str, value: String },
    #[error("row payload is malformed: {0}")]
    Malformed(String),
}

/// Applications table row, column for column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationRow {
    pub id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub student_first_name: Option<String>,
    pub student_last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
    pub class_applying: Option<String>,
    pub student_type: Option<String>,
    pub parent_name: Option<String>,
    pub parent_relationship: Option<String>,
    pub parent_phone: Option<String>,
    pub parent_email: Option<String>,
    pub parent_address: Option<String>,
    pub parent_occupation: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_relationship: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub previous_school: Option<String>,
    pub previous_class: Option<String>,
    pub previous_results: Option<String>,
    pub birth_certificate_url: Option<String>,
    pub passport_photo_url: Option<String>,
    pub previous_results_url: Option<String>,
    pub status: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub admin_notes: Option<String>,
}

/// Application notes table row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteRow {
    pub id: Option<String>,
    pub application_id: Option<String>,
    pub staff_id: Option<String>,
    pub note: Option<String>,
    pub created_at: Option<String>,
}

fn required(value: &Option<String>, column: &'static str) -> Result<String, RowError> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(RowError::Missing(column)),
    }
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn timestamp(value: &str, column: &'static str) -> Result<DateTime<Utc>, RowError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| RowError::Invalid {
            column,
            value: value.to_string(),
        })
}

fn date(value: &str, column: &'static str) -> Result<NaiveDate, RowError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| RowError::Invalid {
        column,
        value: value.to_string(),
    })
}

impl ApplicationRow {
    /// Validate the applicant columns only; used for form payloads and fixture imports.
    pub fn to_submission(&self) -> Result<ApplicationSubmission, RowError> {
        let student_type = required(&self.student_type, "student_type")?;
        let student_type =
            student_type
                .parse::<StudentType>()
                .map_err(|_| RowError::Invalid {
                    column: "student_type",
                    value: student_type.clone(),
                })?;

        Ok(ApplicationSubmission {
            student: StudentDetails {
                first_name: required(&self.student_first_name, "student_first_name")?,
                last_name: required(&self.student_last_name, "student_last_name")?,
                date_of_birth: date(
                    &required(&self.date_of_birth, "date_of_birth")?,
                    "date_of_birth",
                )?,
                gender: required(&self.gender, "gender")?,
                nationality: required(&self.nationality, "nationality")?,
                class_applying: required(&self.class_applying, "class_applying")?,
                student_type,
            },
            parent: ParentContact {
                name: required(&self.parent_name, "parent_name")?,
                relationship: required(&self.parent_relationship, "parent_relationship")?,
                phone: required(&self.parent_phone, "parent_phone")?,
                email: required(&self.parent_email, "parent_email")?,
                address: required(&self.parent_address, "parent_address")?,
                occupation: optional(&self.parent_occupation),
            },
            emergency: EmergencyContact {
                name: required(&self.emergency_contact_name, "emergency_contact_name")?,
                relationship: required(
                    &self.emergency_contact_relationship,
                    "emergency_contact_relationship",
                )?,
                phone: required(&self.emergency_contact_phone, "emergency_contact_phone")?,
            },
            prior_school: PriorSchool {
                name: required(&self.previous_school, "previous_school")?,
                last_class_completed: required(&self.previous_class, "previous_class")?,
                results_summary: optional(&self.previous_results),
            },
            documents: ApplicationDocuments {
                birth_certificate: optional(&self.birth_certificate_url).map(DocumentRef),
                passport_photo: optional(&self.passport_photo_url).map(DocumentRef),
                previous_results: optional(&self.previous_results_url).map(DocumentRef),
            },
        })
    }
}

impl TryFrom<ApplicationRow> for Application {
    type Error = RowError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let submission = row.to_submission()?;
        let id = ApplicationId(required(&row.id, "id")?);
        let created_at = timestamp(&required(&row.created_at, "created_at")?, "created_at")?;
        let updated_at = match optional(&row.updated_at) {
            Some(raw) => timestamp(&raw, "updated_at")?,
            None => created_at,
        };

        let status = match optional(&row.status) {
            Some(raw) => raw
                .parse::<ApplicationStatus>()
                .map_err(|_| RowError::Invalid {
                    column: "status",
                    value: raw.clone(),
                })?,
            None => ApplicationStatus::default(),
        };

        let reviewed_by = optional(&row.reviewed_by).map(StaffId);
        let reviewed_at = optional(&row.reviewed_at)
            .map(|raw| timestamp(&raw, "reviewed_at"))
            .transpose()?;
        if reviewed_by.is_some() != reviewed_at.is_some() {
            let column = if reviewed_by.is_some() {
                "reviewed_at"
            } else {
                "reviewed_by"
            };
            return Err(RowError::Missing(column));
        }

        let mut application = Application::from_submission(id, submission, created_at);
        application.updated_at = updated_at;
        application.status = status;
        application.reviewed_by = reviewed_by;
        application.reviewed_at = reviewed_at;
        application.admin_notes = optional(&row.admin_notes);
        Ok(application)
    }
}

impl From<&Application> for ApplicationRow {
    fn from(application: &Application) -> Self {
        let student = &application.student;
        let parent = &application.parent;
        let documents = &application.documents;
        Self {
            id: Some(application.id.0.clone()),
            created_at: Some(application.created_at.to_rfc3339()),
            updated_at: Some(application.updated_at.to_rfc3339()),
            student_first_name: Some(student.first_name.clone()),
            student_last_name: Some(student.last_name.clone()),
            date_of_birth: Some(student.date_of_birth.format("%Y-%m-%d").to_string()),
            gender: Some(student.gender.clone()),
            nationality: Some(student.nationality.clone()),
            class_applying: Some(student.class_applying.clone()),
            student_type: Some(student.student_type.label().to_string()),
            parent_name: Some(parent.name.clone()),
            parent_relationship: Some(parent.relationship.clone()),
            parent_phone: Some(parent.phone.clone()),
            parent_email: Some(parent.email.clone()),
            parent_address: Some(parent.address.clone()),
            parent_occupation: parent.occupation.clone(),
            emergency_contact_name: Some(application.emergency.name.clone()),
            emergency_contact_relationship: Some(application.emergency.relationship.clone()),
            emergency_contact_phone: Some(application.emergency.phone.clone()),
            previous_school: Some(application.prior_school.name.clone()),
            previous_class: Some(application.prior_school.last_class_completed.clone()),
            previous_results: application.prior_school.results_summary.clone(),
            birth_certificate_url: documents.birth_certificate.as_ref().map(|doc| doc.0.clone()),
            passport_photo_url: documents.passport_photo.as_ref().map(|doc| doc.0.clone()),
            previous_results_url: documents.previous_results.as_ref().map(|doc| doc.0.clone()),
            status: Some(application.status.label().to_string()),
            reviewed_by: application.reviewed_by.as_ref().map(|staff| staff.0.clone()),
            reviewed_at: application.reviewed_at.map(|at| at.to_rfc3339()),
            admin_notes: application.admin_notes.clone(),
        }
    }
}

impl TryFrom<NoteRow> for ApplicationNote {
    type Error = RowError;

    fn try_from(row: NoteRow) -> Result<Self, Self::Error> {
        Ok(ApplicationNote {
            id: NoteId(required(&row.id, "id")?),
            application_id: ApplicationId(required(&row.application_id, "application_id")?),
            author: StaffId(required(&row.staff_id, "staff_id")?),
            body: required(&row.note, "note")?,
            created_at: timestamp(&required(&row.created_at, "created_at")?, "created_at")?,
        })
    }
}

/// Validate a JSON array of application rows, stopping at the first bad row.
pub fn decode_applications(payload: Value) -> Result<Vec<Application>, RowError> {
    let rows: Vec<ApplicationRow> =
        serde_json::from_value(payload).map_err(|err| RowError::Malformed(err.to_string()))?;
    rows.into_iter().map(Application::try_from).collect()
}

/// Validate a JSON array of note rows.
pub fn decode_notes(payload: Value) -> Result<Vec<ApplicationNote>, RowError> {
    let rows: Vec<NoteRow> =
        serde_json::from_value(payload).map_err(|err| RowError::Malformed(err.to_string()))?;
    rows.into_iter().map(ApplicationNote::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> Value {
        json!({
            "id": "app-1",
            "created_at": "2024-01-01T08:30:00Z",
            "student_first_name": "Amina",
            "student_last_name": "K",
            "date_of_birth": "2011-05-04",
            "gender": "female",
            "nationality": "Ugandan",
            "class_applying": "s1",
            "student_type": "day",
            "parent_name": "Joyce K",
            "parent_relationship": "mother",
            "parent_phone": "0750000000",
            "parent_email": "a@x.com",
            "parent_address": "Plot 4, Kampala",
            "emergency_contact_name": "Peter K",
            "emergency_contact_relationship": "uncle",
            "emergency_contact_phone": "0770000000",
            "previous_school": "Hillside Primary",
            "previous_class": "p7",
            "passport_photo_url": "applications/app-1/photo.jpg"
        })
    }

    #[test]
    fn valid_row_defaults_status_to_pending() {
        let applications = decode_applications(json!([row()])).expect("row decodes");
        let application = &applications[0];
        assert_eq!(application.status, ApplicationStatus::Pending);
        assert_eq!(application.updated_at, application.created_at);
        assert!(application.documents.birth_certificate.is_none());
        assert_eq!(
            application.documents.passport_photo,
            Some(DocumentRef("applications/app-1/photo.jpg".to_string()))
        );
    }

    #[test]
    fn unknown_status_names_the_column() {
        let mut payload = row();
        payload["status"] = json!("waitlisted");
        match decode_applications(json!([payload])) {
            Err(RowError::Invalid { column, value }) => {
                assert_eq!(column, "status");
                assert_eq!(value, "waitlisted");
            }
            other => panic!("expected invalid status, got {other:?}"),
        }
    }

    #[test]
    fn blank_required_column_is_rejected() {
        let mut payload = row();
        payload["parent_email"] = json!("   ");
        assert_eq!(
            decode_applications(json!([payload])),
            Err(RowError::Missing("parent_email"))
        );
    }

    #[test]
    fn reviewer_without_timestamp_is_rejected() {
        let mut payload = row();
        payload["status"] = json!("approved");
        payload["reviewed_by"] = json!("staff-1");
        assert_eq!(
            decode_applications(json!([payload])),
            Err(RowError::Missing("reviewed_at"))
        );
    }

    #[test]
    fn non_array_payload_is_malformed() {
        assert!(matches!(
            decode_applications(json!({ "id": "app-1" })),
            Err(RowError::Malformed(_))
        ));
    }

    #[test]
    fn row_conversion_preserves_review_fields() {
        let mut payload = row();
        payload["status"] = json!("under_review");
        payload["reviewed_by"] = json!("staff-9");
        payload["reviewed_at"] = json!("2024-01-03T10:00:00+03:00");
        let application = decode_applications(json!([payload]))
            .expect("decodes")
            .remove(0);

        let back = ApplicationRow::from(&application);
        assert_eq!(back.status.as_deref(), Some("under_review"));
        assert_eq!(back.reviewed_by.as_deref(), Some("staff-9"));
        let again = Application::try_from(back).expect("round trip");
        assert_eq!(again, application);
    }

    #[test]
    fn note_rows_require_a_body() {
        let payload = json!([{
            "id": "note-1",
            "application_id": "app-1",
            "staff_id": "staff-1",
            "note": "  ",
            "created_at": "2024-01-02T09:00:00Z"
        }]);
        assert_eq!(decode_notes(payload), Err(RowError::Missing("note")));
    }
}
