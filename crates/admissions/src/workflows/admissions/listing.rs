//! Search, status filtering and pagination over an already-loaded application list.

use serde::Serialize;

use super::domain::{Application, StatusFilter};

pub const PAGE_SIZE: usize = 10;

/// Search box and status dropdown state from the staff list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationQuery {
    pub search: String,
    pub status: StatusFilter,
}

impl ApplicationQuery {
    pub fn new(search: impl Into<String>, status: StatusFilter) -> Self {
        Self {
            search: search.into(),
            status,
        }
    }

    /// Name and email match case-insensitively; the phone number matches verbatim.
    pub fn matches_search(&self, application: &Application) -> bool {
        let term = self.search.trim();
        if term.is_empty() {
            return true;
        }

        let lowered = term.to_lowercase();
        application
            .student
            .full_name()
            .to_lowercase()
            .contains(&lowered)
            || application.parent.email.to_lowercase().contains(&lowered)
            || application.parent.phone.contains(term)
    }

    pub fn matches(&self, application: &Application) -> bool {
        self.status.admits(application.status) && self.matches_search(application)
    }
}

/// Records passing both the search and status predicates, in input order.
pub fn filter_applications<'a>(
    applications: &'a [Application],
    query: &ApplicationQuery,
) -> Vec<&'a Application> {
    applications
        .iter()
        .filter(|application| query.matches(application))
        .collect()
}

/// One page of a filtered list. Pages are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_count: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count
    }
}

pub fn page_count(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE)
}

/// Clamp a requested page into `1..=max(page_count, 1)`.
pub fn clamp_page(requested: usize, total: usize) -> usize {
    requested.clamp(1, page_count(total).max(1))
}

pub fn paginate<T>(items: Vec<T>, requested: usize) -> Page<T> {
    let total = items.len();
    let page = clamp_page(requested, total);
    let items = items
        .into_iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect();

    Page {
        items,
        page,
        page_count: page_count(total),
        total,
    }
}
