use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for threaded review notes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub String);

/// Reference to a staff member held by the external staff table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(pub String);

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Staff identity used to attribute notes and status changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub display_name: String,
}

/// Review status tracked for every application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Pending,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown application status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.label() == normalized)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

/// Status dropdown on the staff list: everything, or one exact status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ApplicationStatus),
}

impl StatusFilter {
    pub fn admits(self, status: ApplicationStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(expected) => expected == status,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Only(status) => status.label(),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == "all" {
            return Ok(StatusFilter::All);
        }
        trimmed.parse().map(StatusFilter::Only)
    }
}

/// Boarding arrangement requested for the student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentType {
    Day,
    Boarding,
}

impl StudentType {
    pub const fn label(self) -> &'static str {
        match self {
            StudentType::Day => "day",
            StudentType::Boarding => "boarding",
        }
    }
}

impl FromStr for StudentType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(StudentType::Day),
            "boarding" => Ok(StudentType::Boarding),
            other => Err(format!("unknown student type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentDetails {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub nationality: String,
    pub class_applying: String,
    pub student_type: StudentType,
}

impl StudentDetails {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentContact {
    pub name: String,
    pub relationship: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub relationship: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorSchool {
    pub name: String,
    pub last_class_completed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_summary: Option<String>,
}

/// Pointer to an uploaded file in the document bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentRef(pub String);

/// The three optional uploads collected by the public form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDocuments {
    #[serde(default)]
    pub birth_certificate: Option<DocumentRef>,
    #[serde(default)]
    pub passport_photo: Option<DocumentRef>,
    #[serde(default)]
    pub previous_results: Option<DocumentRef>,
}

/// Payload collected by the public admissions form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub student: StudentDetails,
    pub parent: ParentContact,
    pub emergency: EmergencyContact,
    pub prior_school: PriorSchool,
    #[serde(default)]
    pub documents: ApplicationDocuments,
}

/// A stored admission application: applicant payload plus review fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub student: StudentDetails,
    pub parent: ParentContact,
    pub emergency: EmergencyContact,
    pub prior_school: PriorSchool,
    pub documents: ApplicationDocuments,
    pub status: ApplicationStatus,
    pub reviewed_by: Option<StaffId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub admin_notes: Option<String>,
}

impl Application {
    /// Fresh record for a submission; review fields start empty.
    pub fn from_submission(
        id: ApplicationId,
        submission: ApplicationSubmission,
        now: DateTime<Utc>,
    ) -> Self {
        let ApplicationSubmission {
            student,
            parent,
            emergency,
            prior_school,
            documents,
        } = submission;

        Self {
            id,
            created_at: now,
            updated_at: now,
            student,
            parent,
            emergency,
            prior_school,
            documents,
            status: ApplicationStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            admin_notes: None,
        }
    }

    /// Apply a status change. Every status accepts every target.
    pub fn apply(&mut self, change: &StatusChange) {
        self.status = change.status;
        self.reviewed_by = Some(change.reviewed_by.clone());
        self.reviewed_at = Some(change.reviewed_at);
        self.updated_at = change.reviewed_at;
    }
}

/// Single-row write issued when staff relabel an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: ApplicationStatus,
    pub reviewed_by: StaffId,
    pub reviewed_at: DateTime<Utc>,
}

/// Immutable threaded remark attached by staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationNote {
    pub id: NoteId,
    pub application_id: ApplicationId,
    pub author: StaffId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Note joined with the author's display name for the detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoredNote {
    #[serde(flatten)]
    pub note: ApplicationNote,
    pub author_name: Option<String>,
}
