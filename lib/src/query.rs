// lib/src/query.rs
// Claim filtering and Django-style page selection for listings.

use serde::{Deserialize, Serialize};

use models::Claim;

use crate::config::DEFAULT_PER_PAGE;

/// Listing filters. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimQuery {
    /// Case-insensitive equality on status.
    pub status: Option<String>,
    /// Case-insensitive equality on insurer name.
    pub insurer: Option<String>,
    /// Case-insensitive substring over patient name, insurer name and claim number.
    pub search: Option<String>,
    /// Only claims carrying an active flag.
    #[serde(default)]
    pub flagged_only: bool,
}

impl ClaimQuery {
    pub fn matches(&self, claim: &Claim) -> bool {
        if let Some(status) = non_blank(&self.status) {
            if !claim.status.trim().eq_ignore_ascii_case(status) {
                return false;
            }
        }
        if let Some(insurer) = non_blank(&self.insurer) {
            if !claim.insurer_name.trim().eq_ignore_ascii_case(insurer) {
                return false;
            }
        }
        if let Some(search) = non_blank(&self.search) {
            let needle = search.to_lowercase();
            let hit = claim.patient_name.to_lowercase().contains(&needle)
                || claim.insurer_name.to_lowercase().contains(&needle)
                || claim.claim_id.to_string().contains(&needle);
            if !hit {
                return false;
            }
        }
        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served.
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// 1-based index of the first item on this page, 0 when empty.
    pub fn start_index(&self, per_page: usize) -> usize {
        if self.total == 0 {
            0
        } else {
            (self.number - 1) * per_page + 1
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Paginator { per_page: DEFAULT_PER_PAGE }
    }
}

impl Paginator {
    /// A zero page size is treated as one.
    pub fn new(per_page: usize) -> Self {
        Paginator { per_page: per_page.max(1) }
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn num_pages(&self, total: usize) -> usize {
        total.div_ceil(self.per_page).max(1)
    }

    /// Lenient page lookup: a missing or non-numeric page serves page 1, any
    /// other out-of-range number (past the end, zero, negative) serves the last page.
    pub fn get_page<T>(&self, items: Vec<T>, requested: Option<&str>) -> Page<T> {
        let total = items.len();
        let num_pages = self.num_pages(total);
        let number = match requested.map(str::trim).and_then(|raw| raw.parse::<i64>().ok()) {
            None => 1,
            Some(n) if n < 1 => num_pages,
            Some(n) => (n as usize).min(num_pages),
        };
        let items = items
            .into_iter()
            .skip((number - 1) * self.per_page)
            .take(self.per_page)
            .collect();
        Page { items, number, num_pages, total }
    }
}
