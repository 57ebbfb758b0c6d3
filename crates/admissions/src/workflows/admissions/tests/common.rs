use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::workflows::admissions::domain::{
    Application, ApplicationDocuments, ApplicationId, ApplicationNote, ApplicationStatus,
    ApplicationSubmission, AuthoredNote, EmergencyContact, ParentContact, PriorSchool, StaffId,
    StatusChange, StudentDetails, StudentType,
};
use crate::workflows::admissions::notes::sort_newest_first;
use crate::workflows::admissions::repository::{
    ApplicationRepository, NoteRepository, RepositoryError,
};
use crate::workflows::admissions::{ApplicationReviewService, ReviewSession};

pub(super) fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        student: StudentDetails {
            first_name: "Amina".to_string(),
            last_name: "K".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2011, 5, 4).expect("valid"),
            gender: "female".to_string(),
            nationality: "Ugandan".to_string(),
            class_applying: "s1".to_string(),
            student_type: StudentType::Day,
        },
        parent: ParentContact {
            name: "Joyce K".to_string(),
            relationship: "mother".to_string(),
            phone: "0750000000".to_string(),
            email: "a@x.com".to_string(),
            address: "Plot 4, Kampala Road".to_string(),
            occupation: Some("Nurse".to_string()),
        },
        emergency: EmergencyContact {
            name: "Peter K".to_string(),
            relationship: "uncle".to_string(),
            phone: "0770000000".to_string(),
        },
        prior_school: PriorSchool {
            name: "Hillside Primary".to_string(),
            last_class_completed: "p7".to_string(),
            results_summary: Some("Division 1".to_string()),
        },
        documents: ApplicationDocuments::default(),
    }
}

pub(super) fn amina() -> Application {
    Application::from_submission(
        ApplicationId("app-amina".to_string()),
        submission(),
        at("2024-01-01T09:00:00Z"),
    )
}

/// Application with the searchable fields overridden.
pub(super) fn applicant(
    id: &str,
    first: &str,
    last: &str,
    email: &str,
    phone: &str,
    status: ApplicationStatus,
    created_at: &str,
) -> Application {
    let mut application = amina();
    application.id = ApplicationId(id.to_string());
    application.student.first_name = first.to_string();
    application.student.last_name = last.to_string();
    application.parent.email = email.to_string();
    application.parent.phone = phone.to_string();
    application.parent.name = format!("Parent of {first}");
    application.status = status;
    application.created_at = at(created_at);
    application.updated_at = application.created_at;
    application
}

/// `count` applications cycling through the statuses, newest first by index.
pub(super) fn cohort(count: usize) -> Vec<Application> {
    (0..count)
        .map(|index| {
            let status = ApplicationStatus::ALL[index % ApplicationStatus::ALL.len()];
            let created = at("2024-03-01T00:00:00Z") - chrono::Duration::hours(index as i64);
            let mut application = applicant(
                &format!("app-{index:03}"),
                &format!("Student{index}"),
                "Okello",
                &format!("parent{index}@school.test"),
                &format!("07000000{index:02}"),
                status,
                "2024-03-01T00:00:00Z",
            );
            application.created_at = created;
            application.updated_at = created;
            application
        })
        .collect()
}

pub(super) fn session() -> ReviewSession {
    ReviewSession::new("staff-1").with_display_name("Grace Nambi")
}

#[derive(Default, Clone)]
pub(super) struct MemoryApplications {
    pub(super) records: Arc<Mutex<Vec<Application>>>,
}

impl MemoryApplications {
    pub(super) fn seeded(applications: Vec<Application>) -> Self {
        Self {
            records: Arc::new(Mutex::new(applications)),
        }
    }
}

impl ApplicationRepository for MemoryApplications {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.id == application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(application.clone());
        Ok(application)
    }

    fn list_newest_first(&self) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut applications: Vec<Application> = guard.iter().rev().cloned().collect();
        applications.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(applications)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|application| &application.id == id).cloned())
    }

    fn update_review(
        &self,
        id: &ApplicationId,
        change: StatusChange,
    ) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let application = guard
            .iter_mut()
            .find(|application| &application.id == id)
            .ok_or(RepositoryError::NotFound)?;
        application.apply(&change);
        Ok(application.clone())
    }

    fn update_admin_notes(
        &self,
        id: &ApplicationId,
        admin_notes: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let application = guard
            .iter_mut()
            .find(|application| &application.id == id)
            .ok_or(RepositoryError::NotFound)?;
        application.admin_notes = admin_notes;
        application.updated_at = updated_at;
        Ok(application.clone())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotes {
    notes: Arc<Mutex<Vec<ApplicationNote>>>,
    staff: Arc<HashMap<StaffId, String>>,
    inserts: Arc<AtomicUsize>,
}

impl MemoryNotes {
    pub(super) fn with_staff(staff: &[(&str, &str)]) -> Self {
        let staff = staff
            .iter()
            .map(|(id, name)| (StaffId(id.to_string()), name.to_string()))
            .collect();
        Self {
            staff: Arc::new(staff),
            ..Self::default()
        }
    }

    pub(super) fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

impl NoteRepository for MemoryNotes {
    fn insert(&self, note: ApplicationNote) -> Result<ApplicationNote, RepositoryError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.notes
            .lock()
            .expect("note mutex poisoned")
            .push(note.clone());
        Ok(note)
    }

    fn list_for(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<AuthoredNote>, RepositoryError> {
        let guard = self.notes.lock().expect("note mutex poisoned");
        let mut notes: Vec<AuthoredNote> = guard
            .iter()
            .rev()
            .filter(|note| &note.application_id == application_id)
            .map(|note| AuthoredNote {
                note: note.clone(),
                author_name: self.staff.get(&note.author).cloned(),
            })
            .collect();
        sort_newest_first(&mut notes);
        Ok(notes)
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _application: Application) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_newest_first(&self) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_review(
        &self,
        _id: &ApplicationId,
        _change: StatusChange,
    ) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_admin_notes(
        &self,
        _id: &ApplicationId,
        _admin_notes: Option<String>,
        _updated_at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl NoteRepository for UnavailableRepository {
    fn insert(&self, _note: ApplicationNote) -> Result<ApplicationNote, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_for(
        &self,
        _application_id: &ApplicationId,
    ) -> Result<Vec<AuthoredNote>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Reads succeed from the wrapped store; every write fails.
#[derive(Default, Clone)]
pub(super) struct ReadOnly<T>(pub(super) T);

impl ApplicationRepository for ReadOnly<MemoryApplications> {
    fn insert(&self, _application: Application) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn list_newest_first(&self) -> Result<Vec<Application>, RepositoryError> {
        self.0.list_newest_first()
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.0.fetch(id)
    }

    fn update_review(
        &self,
        _id: &ApplicationId,
        _change: StatusChange,
    ) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn update_admin_notes(
        &self,
        _id: &ApplicationId,
        _admin_notes: Option<String>,
        _updated_at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }
}

impl NoteRepository for ReadOnly<MemoryNotes> {
    fn insert(&self, _note: ApplicationNote) -> Result<ApplicationNote, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn list_for(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<AuthoredNote>, RepositoryError> {
        self.0.list_for(application_id)
    }
}

pub(super) type MemoryService = ApplicationReviewService<MemoryApplications, MemoryNotes>;

pub(super) fn build_service(
    applications: Vec<Application>,
) -> (MemoryService, Arc<MemoryApplications>, Arc<MemoryNotes>) {
    let repository = Arc::new(MemoryApplications::seeded(applications));
    let notes = Arc::new(MemoryNotes::with_staff(&[("staff-1", "Grace Nambi")]));
    let service = ApplicationReviewService::new(repository.clone(), notes.clone());
    (service, repository, notes)
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json payload")
}
