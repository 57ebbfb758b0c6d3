use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationId, ApplicationStatus, StatusFilter};
use super::export::DateStyle;
use super::listing::ApplicationQuery;
use super::repository::{ApplicationRepository, NoteRepository, RepositoryError};
use super::rows::ApplicationRow;
use super::service::{ApplicationReviewService, ReviewError};
use super::session::ReviewSession;

pub const STAFF_ID_HEADER: &str = "x-staff-id";
pub const STAFF_NAME_HEADER: &str = "x-staff-name";

/// Router builder exposing the public submission endpoint and the staff review endpoints.
pub fn application_router<R, N>(service: Arc<ApplicationReviewService<R, N>>) -> Router
where
    R: ApplicationRepository + 'static,
    N: NoteRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/admissions/applications",
            post(submit_handler::<R, N>).get(list_handler::<R, N>),
        )
        .route(
            "/api/v1/admissions/applications/export",
            get(export_handler::<R, N>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id",
            get(detail_handler::<R, N>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/status",
            post(status_handler::<R, N>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/notes",
            post(note_handler::<R, N>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/admin-notes",
            put(admin_notes_handler::<R, N>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) page: Option<usize>,
    #[serde(default)]
    pub(crate) iso_dates: Option<bool>,
}

impl ListParams {
    fn query(&self) -> Result<ApplicationQuery, Response> {
        let status = match self.status.as_deref() {
            Some(raw) => raw
                .parse::<StatusFilter>()
                .map_err(|err| error_response(StatusCode::BAD_REQUEST, err.to_string()))?,
            None => StatusFilter::All,
        };
        Ok(ApplicationQuery::new(
            self.search.clone().unwrap_or_default(),
            status,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusRequest {
    pub(crate) status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteRequest {
    pub(crate) body: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdminNotesRequest {
    #[serde(default)]
    pub(crate) admin_notes: Option<String>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({ "error": message.into() });
    (status, axum::Json(payload)).into_response()
}

/// HTTP status for a review failure. Shared with `AppError` so both surfaces agree.
pub(crate) fn review_status(err: &ReviewError) -> StatusCode {
    match err {
        ReviewError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ReviewError::NotFound(_) | ReviewError::Repository(RepositoryError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        ReviewError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ReviewError::Repository(RepositoryError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn review_error_response(err: ReviewError) -> Response {
    error_response(review_status(&err), err.to_string())
}

fn staff_session(headers: &HeaderMap) -> Result<ReviewSession, Response> {
    let header_value = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());
    ReviewSession::from_parts(header_value(STAFF_ID_HEADER), header_value(STAFF_NAME_HEADER))
        .ok_or_else(|| {
            error_response(
                StatusCode::UNAUTHORIZED,
                format!("missing {STAFF_ID_HEADER} header"),
            )
        })
}

pub(crate) async fn submit_handler<R, N>(
    State(service): State<Arc<ApplicationReviewService<R, N>>>,
    axum::Json(row): axum::Json<ApplicationRow>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NoteRepository + 'static,
{
    let submission = match row.to_submission() {
        Ok(submission) => submission,
        Err(err) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
    };

    match service.submit(submission) {
        Ok(application) => (StatusCode::CREATED, axum::Json(application)).into_response(),
        Err(ReviewError::Repository(RepositoryError::Conflict)) => {
            error_response(StatusCode::CONFLICT, "application already exists")
        }
        Err(other) => review_error_response(other),
    }
}

pub(crate) async fn list_handler<R, N>(
    State(service): State<Arc<ApplicationReviewService<R, N>>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NoteRepository + 'static,
{
    if let Err(response) = staff_session(&headers) {
        return response;
    }
    let query = match params.query() {
        Ok(query) => query,
        Err(response) => return response,
    };

    match service.list_page(&query, params.page.unwrap_or(1)) {
        Ok(page) => (StatusCode::OK, axum::Json(page)).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn export_handler<R, N>(
    State(service): State<Arc<ApplicationReviewService<R, N>>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NoteRepository + 'static,
{
    if let Err(response) = staff_session(&headers) {
        return response;
    }
    let query = match params.query() {
        Ok(query) => query,
        Err(response) => return response,
    };
    let style = if params.iso_dates.unwrap_or(false) {
        DateStyle::Iso
    } else {
        DateStyle::UsShort
    };

    match service.export_filtered(&query, Local::now().date_naive(), style) {
        Ok(file) => (
            StatusCode::OK,
            [
                (
                    header::CONTENT_TYPE,
                    mime::TEXT_CSV_UTF_8.as_ref().to_string(),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file.filename),
                ),
            ],
            file.contents,
        )
            .into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn detail_handler<R, N>(
    State(service): State<Arc<ApplicationReviewService<R, N>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NoteRepository + 'static,
{
    if let Err(response) = staff_session(&headers) {
        return response;
    }

    match service.open_detail(&ApplicationId(application_id)) {
        Ok(detail) => (StatusCode::OK, axum::Json(detail)).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn status_handler<R, N>(
    State(service): State<Arc<ApplicationReviewService<R, N>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<StatusRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NoteRepository + 'static,
{
    let session = match staff_session(&headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let target = match request.status.parse::<ApplicationStatus>() {
        Ok(target) => target,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
    };

    match service.transition(&session, &ApplicationId(application_id), target) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn note_handler<R, N>(
    State(service): State<Arc<ApplicationReviewService<R, N>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<NoteRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NoteRepository + 'static,
{
    let session = match staff_session(&headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    match service.append_note(&session, &ApplicationId(application_id), &request.body) {
        Ok(notes) => (StatusCode::CREATED, axum::Json(notes)).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn admin_notes_handler<R, N>(
    State(service): State<Arc<ApplicationReviewService<R, N>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<AdminNotesRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NoteRepository + 'static,
{
    if let Err(response) = staff_session(&headers) {
        return response;
    }

    match service.set_admin_notes(
        &ApplicationId(application_id),
        request.admin_notes.as_deref(),
    ) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(err) => review_error_response(err),
    }
}
