//! Staff review board: the list, detail and export state behind the admin screen.
//!
//! The board loads the application list once per activation and does all searching, filtering
//! and paging locally. Storage failures never escape; they become a notification and leave the
//! board as it was.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use super::domain::{Application, ApplicationId, ApplicationStatus, StatusFilter};
use super::export::{export_applications, DateStyle, ExportFile};
use super::listing::{clamp_page, filter_applications, paginate, ApplicationQuery, Page};
use super::notes::NoteBody;
use super::repository::{ApplicationRepository, NoteRepository};
use super::service::{ApplicationDetail, ApplicationReviewService, ReviewError};
use super::session::ReviewSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Non-blocking message shown to staff after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

pub struct ReviewBoard<R, N> {
    service: Arc<ApplicationReviewService<R, N>>,
    session: ReviewSession,
    applications: Vec<Application>,
    query: ApplicationQuery,
    page: usize,
    loading: bool,
    detail: Option<ApplicationDetail>,
    notifications: Vec<Notification>,
}

impl<R, N> ReviewBoard<R, N>
where
    R: ApplicationRepository + 'static,
    N: NoteRepository + 'static,
{
    pub fn new(service: Arc<ApplicationReviewService<R, N>>, session: ReviewSession) -> Self {
        Self {
            service,
            session,
            applications: Vec::new(),
            query: ApplicationQuery::default(),
            page: 1,
            loading: false,
            detail: None,
            notifications: Vec::new(),
        }
    }

    pub fn session(&self) -> &ReviewSession {
        &self.session
    }

    /// Load the full list. A failed read leaves the list empty; there is no retry.
    pub fn activate(&mut self) {
        self.loading = true;
        match self.service.load_applications() {
            Ok(applications) => {
                debug!(count = applications.len(), "review board loaded");
                self.applications = applications;
            }
            Err(err) => {
                self.applications.clear();
                self.notify_failure("Failed to load applications", &err);
            }
        }
        let total = self.filtered().len();
        self.page = clamp_page(self.page, total);
        self.loading = false;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn query(&self) -> &ApplicationQuery {
        &self.query
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
        self.page = 1;
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.query.status = status;
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        let total = self.filtered().len();
        self.page = clamp_page(page, total);
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Every record matching the current query, across all pages.
    pub fn filtered(&self) -> Vec<&Application> {
        filter_applications(&self.applications, &self.query)
    }

    pub fn visible_page(&self) -> Page<&Application> {
        paginate(self.filtered(), self.page)
    }

    pub fn detail(&self) -> Option<&ApplicationDetail> {
        self.detail.as_ref()
    }

    /// Open the detail view, fetching notes fresh for this application.
    pub fn open(&mut self, id: &ApplicationId) {
        match self.service.open_detail(id) {
            Ok(detail) => self.detail = Some(detail),
            Err(err) => self.notify_failure("Failed to load application", &err),
        }
    }

    pub fn close(&mut self) {
        self.detail = None;
    }

    /// Relabel the open application and merge the updated row into local state.
    pub fn change_status(&mut self, target: ApplicationStatus) {
        let Some(id) = self.detail.as_ref().map(|detail| detail.application.id.clone()) else {
            return;
        };

        match self.service.transition(&self.session, &id, target) {
            Ok(updated) => {
                self.merge(updated);
                self.notifications.push(Notification::success(format!(
                    "Status updated to {}",
                    target.label()
                )));
            }
            Err(err) => self.notify_failure("Failed to update status", &err),
        }
    }

    /// Append a note to the open application. Blank input is ignored without a write.
    pub fn append_note(&mut self, body: &str) {
        let Some(id) = self.detail.as_ref().map(|detail| detail.application.id.clone()) else {
            return;
        };
        if NoteBody::parse(body).is_err() {
            return;
        }

        match self.service.append_note(&self.session, &id, body) {
            Ok(notes) => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.notes = notes;
                }
                self.notifications.push(Notification::success("Note added"));
            }
            Err(err) => self.notify_failure("Failed to add note", &err),
        }
    }

    pub fn save_admin_notes(&mut self, admin_notes: Option<&str>) {
        let Some(id) = self.detail.as_ref().map(|detail| detail.application.id.clone()) else {
            return;
        };

        match self.service.set_admin_notes(&id, admin_notes) {
            Ok(updated) => {
                self.merge(updated);
                self.notifications.push(Notification::success("Notes saved"));
            }
            Err(err) => self.notify_failure("Failed to save notes", &err),
        }
    }

    pub fn export(&self, today: NaiveDate, style: DateStyle) -> ExportFile {
        export_applications(self.filtered(), today, style)
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn merge(&mut self, updated: Application) {
        if let Some(existing) = self
            .applications
            .iter_mut()
            .find(|application| application.id == updated.id)
        {
            *existing = updated.clone();
        }
        if let Some(detail) = self.detail.as_mut() {
            if detail.application.id == updated.id {
                detail.application = updated;
            }
        }
    }

    fn notify_failure(&mut self, context: &str, err: &ReviewError) {
        self.notifications
            .push(Notification::error(format!("{context}: {err}")));
    }
}
