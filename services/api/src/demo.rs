use crate::infra::{InMemoryApplicationRepository, InMemoryNoteRepository, InMemoryStores};
use admissions::error::AppError;
use admissions::workflows::admissions::{
    Application, ApplicationDocuments, ApplicationQuery, ApplicationStatus, ApplicationSubmission,
    DateStyle, DocumentRef, EmergencyContact, NotificationLevel, ParentContact, PriorSchool,
    ReviewBoard, ReviewSession, StaffId, StaffMember, StatusFilter, StudentDetails, StudentType,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

const DEMO_STAFF_ID: &str = "staff-demo";
const DEMO_STAFF_NAME: &str = "Demo Reviewer";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Application fixture CSV. Sample submissions are used when omitted.
    #[arg(long)]
    pub(crate) fixtures: Option<PathBuf>,
    /// Note fixtures (CSV or JSON rows) loaded after the applications.
    #[arg(long)]
    pub(crate) note_fixtures: Option<PathBuf>,
    /// Override the export date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Write export dates as YYYY-MM-DD instead of M/D/YYYY.
    #[arg(long)]
    pub(crate) iso_dates: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Application fixture CSV to export from
    #[arg(long)]
    pub(crate) fixtures: PathBuf,
    /// Case-insensitive match on student name or parent email, substring match on parent phone
    #[arg(long, default_value = "")]
    pub(crate) search: String,
    /// Status to keep (pending, under_review, approved, rejected or all)
    #[arg(long, default_value = "all", value_parser = parse_status_filter)]
    pub(crate) status: StatusFilter,
    /// Output file. Defaults to applications-<date>.csv in the working directory.
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
    /// Override the export date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Write dates as YYYY-MM-DD instead of M/D/YYYY.
    #[arg(long)]
    pub(crate) iso_dates: bool,
}

fn parse_status_filter(raw: &str) -> Result<StatusFilter, String> {
    raw.parse::<StatusFilter>()
        .map_err(|_| format!("unknown status '{raw}'"))
}

fn date_style(iso_dates: bool) -> DateStyle {
    if iso_dates {
        DateStyle::Iso
    } else {
        DateStyle::UsShort
    }
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let ExportArgs {
        fixtures,
        search,
        status,
        out,
        today,
        iso_dates,
    } = args;

    let stores = InMemoryStores::new();
    stores.seed_from_path(&fixtures)?;
    let service = stores.service();

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let query = ApplicationQuery::new(search, status);
    let file = service.export_filtered(&query, today, date_style(iso_dates))?;

    let destination = out.unwrap_or_else(|| PathBuf::from(&file.filename));
    std::fs::write(&destination, &file.contents)?;
    println!(
        "Exported {} application(s) with status {} to {}",
        file.rows,
        status.label(),
        destination.display()
    );
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        fixtures,
        note_fixtures,
        today,
        iso_dates,
    } = args;

    let reviewer = StaffMember {
        id: StaffId(DEMO_STAFF_ID.to_string()),
        display_name: DEMO_STAFF_NAME.to_string(),
    };
    let stores = InMemoryStores::new();
    stores.notes.register_staff(reviewer.clone());
    let service = Arc::new(stores.service());

    match fixtures {
        Some(path) => {
            let loaded = stores.seed_from_path(&path)?;
            println!("Loaded {} application(s) from {}", loaded, path.display());
        }
        None => {
            for submission in demo_submissions() {
                service.submit(submission)?;
            }
            println!("Loaded sample submissions (no fixture CSV provided)");
        }
    }
    if let Some(path) = note_fixtures {
        let loaded = stores.seed_notes_from_path(&path)?;
        println!("Loaded {} note(s) from {}", loaded, path.display());
    }

    let session = ReviewSession::from(reviewer);
    let mut board = ReviewBoard::new(service.clone(), session);
    board.activate();
    render_board(&board);

    let Some(newest) = board.applications().first().map(|application| application.id.clone())
    else {
        println!("\nNo applications to review");
        return Ok(());
    };

    println!("\nReviewing {}", newest);
    board.open(&newest);
    board.change_status(ApplicationStatus::UnderReview);
    board.append_note("Called the parent to confirm the documents on file.");
    board.save_admin_notes(Some("Interview to be scheduled."));

    if let Some(detail) = board.detail() {
        render_application(&detail.application);
        println!("  Notes:");
        for authored in &detail.notes {
            println!(
                "    [{}] {}: {}",
                authored.note.created_at.format("%Y-%m-%d %H:%M"),
                authored.author_name.as_deref().unwrap_or("Unknown staff"),
                authored.note.body
            );
        }
    }

    for notification in board.drain_notifications() {
        let marker = match notification.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Error => "error",
        };
        println!("  ({marker}) {}", notification.message);
    }

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let file = board.export(today, date_style(iso_dates));
    println!("\nExport {} ({} row(s))", file.filename, file.rows);
    print!("{}", file.contents);
    Ok(())
}

fn render_board(board: &ReviewBoard<InMemoryApplicationRepository, InMemoryNoteRepository>) {
    let page = board.visible_page();
    println!(
        "\nApplications: {} total, page {} of {}",
        page.total, page.page, page.page_count
    );
    for application in &page.items {
        println!(
            "  {:<10} {:<24} {:<6} {:<9} {}",
            application.id.0,
            application.student.full_name(),
            application.student.class_applying.to_uppercase(),
            application.student.student_type.label(),
            application.status
        );
    }
    match (page.has_previous(), page.has_next()) {
        (false, false) => {}
        (true, true) => println!("  (more on previous and next pages)"),
        (true, false) => println!("  (more on previous pages)"),
        (false, true) => println!("  (more on next pages)"),
    }
}

fn render_application(application: &Application) {
    println!(
        "  {} ({}, {})",
        application.student.full_name(),
        application.student.class_applying.to_uppercase(),
        application.student.student_type.label()
    );
    println!(
        "  Parent: {} ({}) {} / {}",
        application.parent.name,
        application.parent.relationship,
        application.parent.phone,
        application.parent.email
    );
    println!(
        "  Previous school: {}, completed {}",
        application.prior_school.name, application.prior_school.last_class_completed
    );
    println!("  Status: {}", application.status);
    if let (Some(reviewer), Some(reviewed_at)) = (&application.reviewed_by, application.reviewed_at)
    {
        println!(
            "  Reviewed by {} at {}",
            reviewer,
            reviewed_at.format("%Y-%m-%d %H:%M")
        );
    }
    if let Some(admin_notes) = &application.admin_notes {
        println!("  Admin notes: {}", admin_notes);
    }
}

fn demo_submissions() -> Vec<ApplicationSubmission> {
    vec![
        demo_submission(
            ("Amina", "Kato"),
            "s1",
            StudentType::Day,
            ("Joyce Kato", "0750000000", "joyce.kato@example.com"),
        ),
        demo_submission(
            ("Brian", "Ssemanda"),
            "s2",
            StudentType::Boarding,
            ("Ruth Ssemanda", "0772333444", "ruth@example.com"),
        ),
        demo_submission(
            ("Claire", "Akello"),
            "s1",
            StudentType::Day,
            ("Akello, James", "0701555666", "akello@example.com"),
        ),
    ]
}

fn demo_submission(
    (first_name, last_name): (&str, &str),
    class_applying: &str,
    student_type: StudentType,
    (parent_name, parent_phone, parent_email): (&str, &str, &str),
) -> ApplicationSubmission {
    ApplicationSubmission {
        student: StudentDetails {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2011, 5, 4).unwrap_or_default(),
            gender: "female".to_string(),
            nationality: "Ugandan".to_string(),
            class_applying: class_applying.to_string(),
            student_type,
        },
        parent: ParentContact {
            name: parent_name.to_string(),
            relationship: "parent".to_string(),
            phone: parent_phone.to_string(),
            email: parent_email.to_string(),
            address: "Kampala".to_string(),
            occupation: None,
        },
        emergency: EmergencyContact {
            name: "Peter Kato".to_string(),
            relationship: "uncle".to_string(),
            phone: "0770000000".to_string(),
        },
        prior_school: PriorSchool {
            name: "Hillside Primary".to_string(),
            last_class_completed: "p7".to_string(),
            results_summary: Some("Aggregate 8".to_string()),
        },
        documents: ApplicationDocuments {
            birth_certificate: Some(DocumentRef(format!(
                "documents/{}-birth-certificate.pdf",
                first_name.to_lowercase()
            ))),
            passport_photo: None,
            previous_results: None,
        },
    }
}
