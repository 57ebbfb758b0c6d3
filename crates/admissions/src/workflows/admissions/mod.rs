//! Admission application intake and the staff review workflow.
//!
//! Applications are submitted once by the public form and then relabelled by staff through a
//! permissive status table: any status may move to any other. Staff work from a list that is
//! loaded once and searched, filtered and paged locally, open a detail view with threaded notes,
//! and export the filtered set as CSV.

pub mod board;
pub mod domain;
pub mod export;
pub mod import;
pub mod listing;
pub mod notes;
pub mod repository;
pub mod router;
pub mod rows;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use board::{Notification, NotificationLevel, ReviewBoard};
pub use domain::{
    Application, ApplicationDocuments, ApplicationId, ApplicationNote, ApplicationStatus,
    ApplicationSubmission, AuthoredNote, DocumentRef, EmergencyContact, NoteId, ParentContact,
    PriorSchool, StaffId, StaffMember, StatusChange, StatusFilter, StudentDetails, StudentType,
    UnknownStatus,
};
pub use export::{export_applications, DateStyle, ExportFile, EXPORT_HEADER};
pub use import::{ApplicationImporter, ImportError, NoteImporter};
pub use listing::{filter_applications, paginate, ApplicationQuery, Page, PAGE_SIZE};
pub use notes::{NoteBody, NoteValidationError};
pub use repository::{ApplicationRepository, NoteRepository, RepositoryError};
pub use router::application_router;
pub use rows::{decode_applications, decode_notes, ApplicationRow, NoteRow, RowError};
pub use service::{ApplicationDetail, ApplicationReviewService, ReviewError};
pub use session::ReviewSession;
