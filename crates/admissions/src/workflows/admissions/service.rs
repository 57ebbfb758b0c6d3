use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    Application, ApplicationId, ApplicationNote, ApplicationStatus, ApplicationSubmission,
    AuthoredNote, NoteId, StatusChange,
};
use super::export::{export_applications, DateStyle, ExportFile};
use super::listing::{filter_applications, paginate, ApplicationQuery, Page};
use super::notes::{NoteBody, NoteValidationError};
use super::repository::{ApplicationRepository, NoteRepository, RepositoryError};
use super::session::ReviewSession;

/// Service composing the application and note stores behind the review workflow.
pub struct ApplicationReviewService<R, N> {
    applications: Arc<R>,
    notes: Arc<N>,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static NOTE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

fn next_note_id() -> NoteId {
    let id = NOTE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    NoteId(format!("note-{id:06}"))
}

/// Application plus its threaded notes, loaded fresh for the detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationDetail {
    pub application: Application,
    pub notes: Vec<AuthoredNote>,
}

impl<R, N> ApplicationReviewService<R, N>
where
    R: ApplicationRepository + 'static,
    N: NoteRepository + 'static,
{
    pub fn new(applications: Arc<R>, notes: Arc<N>) -> Self {
        Self {
            applications,
            notes,
        }
    }

    /// Store a public form submission as a new `pending` application.
    pub fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<Application, ReviewError> {
        let application = Application::from_submission(next_application_id(), submission, Utc::now());
        let stored = self.applications.insert(application).inspect_err(|err| {
            warn!(error = %err, "failed to store application submission");
        })?;
        info!(application_id = %stored.id, "application submitted");
        Ok(stored)
    }

    /// Every application, newest first.
    pub fn load_applications(&self) -> Result<Vec<Application>, ReviewError> {
        let applications = self.applications.list_newest_first().inspect_err(|err| {
            warn!(error = %err, "failed to load applications");
        })?;
        Ok(applications)
    }

    pub fn list_page(
        &self,
        query: &ApplicationQuery,
        page: usize,
    ) -> Result<Page<Application>, ReviewError> {
        let applications = self.load_applications()?;
        let matches = filter_applications(&applications, query)
            .into_iter()
            .cloned()
            .collect();
        Ok(paginate(matches, page))
    }

    /// Relabel an application. Any status may move to any other status.
    pub fn transition(
        &self,
        session: &ReviewSession,
        id: &ApplicationId,
        target: ApplicationStatus,
    ) -> Result<Application, ReviewError> {
        let change = StatusChange {
            status: target,
            reviewed_by: session.staff_id.clone(),
            reviewed_at: Utc::now(),
        };

        let updated = self
            .applications
            .update_review(id, change)
            .map_err(|err| ReviewError::from_repository(err, id))
            .inspect_err(|err| {
                warn!(application_id = %id, status = target.label(), error = %err, "status change failed");
            })?;

        info!(
            application_id = %id,
            status = target.label(),
            staff_id = %session.staff_id,
            "application status changed"
        );
        Ok(updated)
    }

    pub fn open_detail(&self, id: &ApplicationId) -> Result<ApplicationDetail, ReviewError> {
        let application = self
            .applications
            .fetch(id)?
            .ok_or_else(|| ReviewError::NotFound(id.clone()))?;
        let notes = self.notes.list_for(id)?;
        Ok(ApplicationDetail { application, notes })
    }

    pub fn notes_for(&self, id: &ApplicationId) -> Result<Vec<AuthoredNote>, ReviewError> {
        Ok(self.notes.list_for(id)?)
    }

    /// Append a threaded note and return the refreshed list, newest first.
    ///
    /// Blank input and unknown applications are rejected before anything is written.
    pub fn append_note(
        &self,
        session: &ReviewSession,
        id: &ApplicationId,
        raw_body: &str,
    ) -> Result<Vec<AuthoredNote>, ReviewError> {
        let body = NoteBody::parse(raw_body)?;
        if self.applications.fetch(id)?.is_none() {
            warn!(application_id = %id, "note rejected for unknown application");
            return Err(ReviewError::NotFound(id.clone()));
        }
        let note = ApplicationNote {
            id: next_note_id(),
            application_id: id.clone(),
            author: session.staff_id.clone(),
            body: body.into_inner(),
            created_at: Utc::now(),
        };

        let stored = self.notes.insert(note).inspect_err(|err| {
            warn!(application_id = %id, error = %err, "failed to add note");
        })?;
        info!(application_id = %id, note_id = %stored.id.0, "note added");

        self.notes_for(id)
    }

    /// Overwrite the single `admin_notes` field. Blank input clears it.
    pub fn set_admin_notes(
        &self,
        id: &ApplicationId,
        admin_notes: Option<&str>,
    ) -> Result<Application, ReviewError> {
        let admin_notes = admin_notes
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        let updated = self
            .applications
            .update_admin_notes(id, admin_notes, Utc::now())
            .map_err(|err| ReviewError::from_repository(err, id))?;
        info!(application_id = %id, "admin notes updated");
        Ok(updated)
    }

    /// Load, filter and serialise every matching application, across all pages.
    pub fn export_filtered(
        &self,
        query: &ApplicationQuery,
        today: NaiveDate,
        style: DateStyle,
    ) -> Result<ExportFile, ReviewError> {
        let applications = self.load_applications()?;
        let matches = filter_applications(&applications, query);
        let file = export_applications(matches, today, style);
        info!(rows = file.rows, filename = %file.filename, "applications exported");
        Ok(file)
    }
}

/// Error raised by the review service.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error(transparent)]
    Validation(#[from] NoteValidationError),
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ReviewError {
    fn from_repository(err: RepositoryError, id: &ApplicationId) -> Self {
        match err {
            RepositoryError::NotFound => ReviewError::NotFound(id.clone()),
            other => ReviewError::Repository(other),
        }
    }
}
