use admissions::error::AppError;
use admissions::workflows::admissions::notes::sort_newest_first;
use admissions::workflows::admissions::{
    Application, ApplicationId, ApplicationImporter, ApplicationNote, ApplicationRepository,
    ApplicationReviewService, AuthoredNote, NoteImporter, NoteRepository, RepositoryError,
    ReviewError, StaffId, StaffMember, StatusChange,
};
use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type InMemoryReviewService =
    ApplicationReviewService<InMemoryApplicationRepository, InMemoryNoteRepository>;

/// Process-local stand-in for the hosted applications table.
#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, Application>>>,
}

impl InMemoryApplicationRepository {
    fn update_with(
        &self,
        id: &ApplicationId,
        apply: impl FnOnce(&mut Application),
    ) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let application = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        apply(application);
        Ok(application.clone())
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn list_newest_first(&self) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut applications: Vec<Application> = guard.values().cloned().collect();
        applications.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| right.id.cmp(&left.id))
        });
        Ok(applications)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update_review(
        &self,
        id: &ApplicationId,
        change: StatusChange,
    ) -> Result<Application, RepositoryError> {
        self.update_with(id, |application| application.apply(&change))
    }

    fn update_admin_notes(
        &self,
        id: &ApplicationId,
        admin_notes: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError> {
        self.update_with(id, |application| {
            application.admin_notes = admin_notes;
            application.updated_at = updated_at;
        })
    }
}

/// Process-local notes table joined against a registered staff list.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNoteRepository {
    notes: Arc<Mutex<Vec<ApplicationNote>>>,
    staff: Arc<RwLock<HashMap<StaffId, String>>>,
}

impl InMemoryNoteRepository {
    pub(crate) fn register_staff(&self, member: StaffMember) {
        self.staff
            .write()
            .expect("staff lock poisoned")
            .insert(member.id, member.display_name);
    }
}

impl NoteRepository for InMemoryNoteRepository {
    fn insert(&self, note: ApplicationNote) -> Result<ApplicationNote, RepositoryError> {
        let mut guard = self.notes.lock().expect("note mutex poisoned");
        guard.push(note.clone());
        Ok(note)
    }

    fn list_for(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<AuthoredNote>, RepositoryError> {
        let guard = self.notes.lock().expect("note mutex poisoned");
        let staff = self.staff.read().expect("staff lock poisoned");
        let mut notes: Vec<AuthoredNote> = guard
            .iter()
            .rev()
            .filter(|note| &note.application_id == application_id)
            .map(|note| AuthoredNote {
                note: note.clone(),
                author_name: staff.get(&note.author).cloned(),
            })
            .collect();
        sort_newest_first(&mut notes);
        Ok(notes)
    }
}

pub(crate) struct InMemoryStores {
    pub(crate) applications: Arc<InMemoryApplicationRepository>,
    pub(crate) notes: Arc<InMemoryNoteRepository>,
}

impl InMemoryStores {
    pub(crate) fn new() -> Self {
        Self {
            applications: Arc::new(InMemoryApplicationRepository::default()),
            notes: Arc::new(InMemoryNoteRepository::default()),
        }
    }

    pub(crate) fn service(&self) -> InMemoryReviewService {
        ApplicationReviewService::new(self.applications.clone(), self.notes.clone())
    }

    /// Load application rows from a fixture file. Rows already present are skipped.
    pub(crate) fn seed_from_path(&self, path: &Path) -> Result<usize, AppError> {
        let applications = ApplicationImporter::from_path(path)?;
        let loaded = seed_applications(self.applications.as_ref(), applications)
            .map_err(ReviewError::from)?;
        info!(path = %path.display(), loaded, "seeded applications from fixtures");
        Ok(loaded)
    }

    /// Load note rows from a fixture file. Notes whose application is not stored are skipped.
    pub(crate) fn seed_notes_from_path(&self, path: &Path) -> Result<usize, AppError> {
        let notes = NoteImporter::from_path(path)?;
        let loaded = seed_notes(self.applications.as_ref(), self.notes.as_ref(), notes)
            .map_err(ReviewError::from)?;
        info!(path = %path.display(), loaded, "seeded notes from fixtures");
        Ok(loaded)
    }
}

/// Insert fixture applications, skipping ids that already exist.
pub(crate) fn seed_applications<R: ApplicationRepository>(
    repository: &R,
    applications: Vec<Application>,
) -> Result<usize, RepositoryError> {
    let mut loaded = 0;
    for application in applications {
        match repository.insert(application) {
            Ok(_) => loaded += 1,
            Err(RepositoryError::Conflict) => {}
            Err(err) => return Err(err),
        }
    }
    Ok(loaded)
}

pub(crate) fn seed_notes<R: ApplicationRepository, N: NoteRepository>(
    applications: &R,
    notes: &N,
    fixtures: Vec<ApplicationNote>,
) -> Result<usize, RepositoryError> {
    let mut loaded = 0;
    for note in fixtures {
        if applications.fetch(&note.application_id)?.is_none() {
            warn!(
                application_id = %note.application_id,
                note_id = %note.id.0,
                "skipping note for unknown application"
            );
            continue;
        }
        notes.insert(note)?;
        loaded += 1;
    }
    Ok(loaded)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
