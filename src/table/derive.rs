//! The pure filter -> sort -> paginate pipeline behind every `Table`.

use crate::model::{Amount, Row};
use crate::table::ViewState;
use serde::Serialize;

/// Sums of `amount` over the whole filtered set (`all`) and over the current page (`page`).
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct Totals {
    all: Amount,
    page: Amount,
}

impl Totals {
    pub fn all(&self) -> Amount {
        self.all
    }

    pub fn page(&self) -> Amount {
        self.page
    }
}

/// One derived page of a table.
#[derive(Debug, Clone, Serialize)]
pub struct View<'a> {
    rows: Vec<&'a Row>,
    filtered_count: usize,
    page_count: usize,
    page_index: usize,
    totals: Totals,
}

impl<'a> View<'a> {
    /// The rows of the current page, filtered and sorted.
    pub fn rows(&self) -> &[&'a Row] {
        &self.rows
    }

    /// How many rows matched the filter, before pagination.
    pub fn filtered_count(&self) -> usize {
        self.filtered_count
    }

    /// Never less than one, even with nothing to show.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// The zero-based page shown, clamped into `0..page_count`.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// `max(1, ceil(filtered_count / page_size))`.
pub fn page_count(filtered_count: usize, page_size: usize) -> usize {
    filtered_count.div_ceil(page_size.max(1)).max(1)
}

/// Case-insensitive substring match on the description. An empty needle matches everything.
pub(super) fn matches(row: &Row, needle_lowercase: &str) -> bool {
    needle_lowercase.is_empty() || row.description().to_lowercase().contains(needle_lowercase)
}

/// Derives the current page of `rows` for `state`: filter, then a stable sort, then slice.
///
/// This is recomputed from scratch on every call. An out-of-range page index is clamped onto the
/// last page rather than producing an empty or out-of-bounds slice.
pub fn derive<'a>(rows: &'a [Row], state: &ViewState) -> View<'a> {
    let needle = state.filter_text().to_lowercase();
    let mut filtered: Vec<&Row> = rows.iter().filter(|r| matches(r, &needle)).collect();

    if let Some(sort) = state.sort() {
        // `sort_by` is stable
        filtered.sort_by(|a, b| sort.compare(a, b));
    }

    let filtered_count = filtered.len();
    let page_size = state.page_size();
    let page_count = page_count(filtered_count, page_size);
    let page_index = state.page_index().min(page_count - 1);
    let start = (page_index * page_size).min(filtered_count);
    let end = (start + page_size).min(filtered_count);

    let all: Amount = filtered.iter().map(|r| r.amount()).sum();
    let page_rows: Vec<&Row> = filtered[start..end].to_vec();
    let page: Amount = page_rows.iter().map(|r| r.amount()).sum();

    View {
        rows: page_rows,
        filtered_count,
        page_count,
        page_index,
        totals: Totals { all, page },
    }
}
