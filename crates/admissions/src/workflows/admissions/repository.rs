use chrono::{DateTime, Utc};

use super::domain::{Application, ApplicationId, ApplicationNote, AuthoredNote, StatusChange};

/// Storage abstraction over the hosted applications table.
///
/// Every write is a single-row update; the backend provides no transactions beyond that and
/// concurrent writers resolve as last-write-wins.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    /// All rows ordered by creation time, newest first.
    fn list_newest_first(&self) -> Result<Vec<Application>, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    /// Write `status`, `reviewed_by` and `reviewed_at`, returning the updated row.
    fn update_review(
        &self,
        id: &ApplicationId,
        change: StatusChange,
    ) -> Result<Application, RepositoryError>;
    fn update_admin_notes(
        &self,
        id: &ApplicationId,
        admin_notes: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError>;
}

/// Storage abstraction over the application notes table.
pub trait NoteRepository: Send + Sync {
    fn insert(&self, note: ApplicationNote) -> Result<ApplicationNote, RepositoryError>;
    /// Notes for one application, newest first, joined with the author's display name.
    fn list_for(&self, application_id: &ApplicationId)
        -> Result<Vec<AuthoredNote>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
