use crate::model::{ColumnKey, Row};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Rows per page when the caller does not say otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// The direction of an active sort. "No sort" is represented by the absence of a `Sort`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

serde_plain::derive_display_from_serialize!(SortDirection);
serde_plain::derive_fromstr_from_deserialize!(SortDirection);

impl SortDirection {
    /// The marker shown next to a sorted column's header.
    pub fn indicator(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// How repeated toggles of the same column move through sort states.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortCycle {
    /// ascending -> descending -> unsorted -> ascending ...
    #[default]
    ThreeState,
    /// ascending -> descending -> ascending ...
    TwoState,
}

serde_plain::derive_display_from_serialize!(SortCycle);
serde_plain::derive_fromstr_from_deserialize!(SortCycle);

impl SortCycle {
    /// The sort that follows `current` when `key` is toggled.
    pub fn next(&self, current: Option<Sort>, key: ColumnKey) -> Option<Sort> {
        match current {
            Some(sort) if sort.key == key => match (sort.direction, self) {
                (SortDirection::Ascending, _) => Some(Sort::descending(key)),
                (SortDirection::Descending, SortCycle::ThreeState) => None,
                (SortDirection::Descending, SortCycle::TwoState) => Some(Sort::ascending(key)),
            },
            // A different column, or nothing sorted yet.
            _ => Some(Sort::ascending(key)),
        }
    }
}

/// The single active sort: a column and a direction.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Sort {
    key: ColumnKey,
    direction: SortDirection,
}

impl Sort {
    pub fn new(key: ColumnKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn ascending(key: ColumnKey) -> Self {
        Self::new(key, SortDirection::Ascending)
    }

    pub fn descending(key: ColumnKey) -> Self {
        Self::new(key, SortDirection::Descending)
    }

    pub fn key(&self) -> ColumnKey {
        self.key
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Orders two rows by this sort. Descending is the exact reverse of ascending, so equal rows
    /// stay equal and a stable sort keeps their relative order in both directions.
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        let ord = self.key.compare(a, b);
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

/// The interaction state a table owns: search text, sort and pagination cursor.
///
/// This belongs to a table instance, never to the rows, and survives the rows being replaced.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    filter_text: String,
    sort: Option<Sort>,
    page_index: usize,
    page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            filter_text: String::new(),
            sort: None,
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewState {
    /// A fresh state with the given page size. A page size of zero is treated as one.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn sort(&self) -> Option<Sort> {
        self.sort
    }

    /// The stored page index. It may point past the last page if the rows changed underneath it;
    /// `View::page_index` reports the clamped value.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size.max(1)
    }

    pub(super) fn set_filter_text(&mut self, text: String) {
        self.filter_text = text;
    }

    pub(super) fn set_sort(&mut self, sort: Option<Sort>) {
        self.sort = sort;
    }

    pub(super) fn set_page_index(&mut self, page_index: usize) {
        self.page_index = page_index;
    }

    pub(super) fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
    }
}
