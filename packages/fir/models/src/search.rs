//! Free-text filtering and page-wise slicing of FIR listings.

use serde::{Deserialize, Serialize};

use crate::FirRecord;

/// Number of FIRs shown per page.
pub const FIRS_PER_PAGE: usize = 6;

/// Whether `fir` matches the search `term`.
///
/// The term is matched case-insensitively as a substring of the id, the
/// complainant name, the incident type, or the location. An empty term
/// matches everything.
#[must_use]
pub fn matches(fir: &FirRecord, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }

    fir.id.to_string().contains(&term)
        || fir.complainant_name.to_lowercase().contains(&term)
        || fir.incident_type.to_lowercase().contains(&term)
        || fir.location.to_lowercase().contains(&term)
}

/// Keeps the FIRs that match `term`, preserving order.
#[must_use]
pub fn filter(firs: Vec<FirRecord>, term: &str) -> Vec<FirRecord> {
    firs.into_iter().filter(|f| matches(f, term)).collect()
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: usize,
    pub per_page: usize,
    pub total_count: usize,
    pub total_pages: usize,
}

/// Slices `items` into the 1-based `page` of size `per_page`.
///
/// Page numbers below 1 are treated as 1. Pages past the end are empty.
#[must_use]
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total_count = items.len();
    let total_pages = total_count.div_ceil(per_page);

    let items = items
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();

    Page {
        items,
        page,
        per_page,
        total_count,
        total_pages,
    }
}
