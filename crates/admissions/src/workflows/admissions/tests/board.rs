use super::common::*;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::workflows::admissions::domain::{ApplicationId, ApplicationStatus, StatusFilter};
use crate::workflows::admissions::export::DateStyle;
use crate::workflows::admissions::{
    ApplicationReviewService, NotificationLevel, ReviewBoard,
};

fn board_with(
    applications: Vec<crate::workflows::admissions::Application>,
) -> (
    ReviewBoard<MemoryApplications, MemoryNotes>,
    Arc<MemoryApplications>,
    Arc<MemoryNotes>,
) {
    let (service, repository, notes) = build_service(applications);
    let mut board = ReviewBoard::new(Arc::new(service), session());
    board.activate();
    (board, repository, notes)
}

#[test]
fn activation_loads_newest_first_and_clears_loading() {
    let (board, _, _) = board_with(cohort(3).into_iter().rev().collect());

    assert!(!board.is_loading());
    let ids: Vec<&str> = board
        .applications()
        .iter()
        .map(|application| application.id.0.as_str())
        .collect();
    assert_eq!(ids, vec!["app-000", "app-001", "app-002"]);
    assert!(board.notifications().is_empty());
}

#[test]
fn failed_load_leaves_empty_list_and_notifies() {
    let service = ApplicationReviewService::new(
        Arc::new(UnavailableRepository),
        Arc::new(UnavailableRepository),
    );
    let mut board = ReviewBoard::new(Arc::new(service), session());
    board.activate();

    assert!(board.applications().is_empty());
    assert!(!board.is_loading());
    assert_eq!(board.visible_page().total, 0);
    let notifications = board.drain_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Error);
    assert!(board.notifications().is_empty());
}

#[test]
fn filtering_resets_to_first_page_without_reloading() {
    let (mut board, repository, _) = board_with(cohort(25));
    board.set_page(3);
    assert_eq!(board.page(), 3);
    assert_eq!(board.visible_page().items.len(), 5);

    repository
        .records
        .lock()
        .expect("repository mutex poisoned")
        .clear();

    board.set_status_filter(StatusFilter::Only(ApplicationStatus::Rejected));
    assert_eq!(board.page(), 1);
    let page = board.visible_page();
    assert_eq!(page.total, 6);
    assert!(page
        .items
        .iter()
        .all(|application| application.status == ApplicationStatus::Rejected));

    board.set_search("student1");
    assert_eq!(board.page(), 1);
    assert!(board.visible_page().total > 0);
}

#[test]
fn set_page_clamps_to_available_pages() {
    let (mut board, _, _) = board_with(cohort(12));
    board.set_page(0);
    assert_eq!(board.page(), 1);
    board.set_page(9);
    assert_eq!(board.page(), 2);
    assert_eq!(board.visible_page().items.len(), 2);
}

#[test]
fn status_change_updates_list_and_detail_immediately() {
    let (mut board, _, _) = board_with(cohort(3));
    let id = ApplicationId("app-001".to_string());
    board.open(&id);

    board.change_status(ApplicationStatus::Approved);

    let detail = board.detail().expect("detail open");
    assert_eq!(detail.application.status, ApplicationStatus::Approved);
    assert!(detail.application.reviewed_at.is_some());
    let listed = board
        .applications()
        .iter()
        .find(|application| application.id == id)
        .expect("listed");
    assert_eq!(listed.status, ApplicationStatus::Approved);
    assert_eq!(board.notifications()[0].level, NotificationLevel::Success);
}

#[test]
fn failed_status_change_keeps_prior_state() {
    let seeded = MemoryApplications::seeded(cohort(2));
    let service = ApplicationReviewService::new(
        Arc::new(ReadOnly(seeded)),
        Arc::new(MemoryNotes::default()),
    );
    let mut board = ReviewBoard::new(Arc::new(service), session());
    board.activate();
    let id = ApplicationId("app-000".to_string());
    board.open(&id);
    let before = board.detail().cloned();

    board.change_status(ApplicationStatus::Rejected);

    assert_eq!(board.detail().cloned(), before);
    assert_eq!(board.applications()[0].status, ApplicationStatus::Pending);
    let notifications = board.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Error);
}

#[test]
fn blank_note_is_ignored_without_notification() {
    let (mut board, _, notes) = board_with(cohort(1));
    board.open(&ApplicationId("app-000".to_string()));

    board.append_note("    ");

    assert_eq!(notes.insert_count(), 0);
    assert!(board.detail().expect("open").notes.is_empty());
    assert!(board.notifications().is_empty());
}

#[test]
fn appended_note_refreshes_detail_notes() {
    let (mut board, _, notes) = board_with(cohort(1));
    board.open(&ApplicationId("app-000".to_string()));

    board.append_note("Results slip looks genuine");
    board.append_note("Parent confirmed boarding");

    assert_eq!(notes.insert_count(), 2);
    let detail = board.detail().expect("open");
    assert_eq!(detail.notes.len(), 2);
    assert_eq!(detail.notes[0].note.body, "Parent confirmed boarding");
}

#[test]
fn failed_note_write_notifies_and_keeps_notes() {
    let service = ApplicationReviewService::new(
        Arc::new(MemoryApplications::seeded(cohort(1))),
        Arc::new(ReadOnly(MemoryNotes::default())),
    );
    let mut board = ReviewBoard::new(Arc::new(service), session());
    board.activate();
    board.open(&ApplicationId("app-000".to_string()));

    board.append_note("Will not be stored");

    assert!(board.detail().expect("open").notes.is_empty());
    assert_eq!(board.notifications()[0].level, NotificationLevel::Error);
}

#[test]
fn opening_missing_application_notifies_and_keeps_previous_detail() {
    let (mut board, _, _) = board_with(cohort(2));
    board.open(&ApplicationId("app-000".to_string()));
    board.open(&ApplicationId("app-404".to_string()));

    assert_eq!(
        board.detail().expect("still open").application.id.0,
        "app-000"
    );
    assert_eq!(board.notifications()[0].level, NotificationLevel::Error);
}

#[test]
fn actions_without_open_detail_do_nothing() {
    let (mut board, _, notes) = board_with(cohort(1));
    board.change_status(ApplicationStatus::Approved);
    board.append_note("orphan");

    assert_eq!(board.applications()[0].status, ApplicationStatus::Pending);
    assert_eq!(notes.insert_count(), 0);
    assert!(board.notifications().is_empty());
}

#[test]
fn admin_notes_merge_into_detail() {
    let (mut board, _, _) = board_with(cohort(1));
    board.open(&ApplicationId("app-000".to_string()));
    board.save_admin_notes(Some("Fees waiver requested"));

    assert_eq!(
        board
            .detail()
            .expect("open")
            .application
            .admin_notes
            .as_deref(),
        Some("Fees waiver requested")
    );
}

#[test]
fn export_uses_filtered_set_not_current_page() {
    let (mut board, _, _) = board_with(cohort(48));
    board.set_status_filter(StatusFilter::Only(ApplicationStatus::Approved));
    assert_eq!(board.visible_page().items.len(), 10);
    assert_eq!(board.filtered().len(), 12);

    let today = NaiveDate::from_ymd_opt(2024, 3, 2).expect("valid date");
    let file = board.export(today, DateStyle::UsShort);
    assert_eq!(file.rows, 12);
    assert_eq!(file.contents.lines().count(), 13);
}
