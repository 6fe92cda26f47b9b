//! The tabular data engine behind the expenditure table.
//!
//! A `Table` owns a row collection, its column descriptors and a `ViewState`. Interactions such as
//! typing into the search box, clicking a column header or paging mutate the `ViewState`; the page
//! shown is always derived from scratch by [`derive`]: filter, then sort, then paginate.
//!
//! Everything here is synchronous and infallible. Malformed input was already normalized when the
//! rows were ingested.

mod derive;
mod state;

pub use derive::{derive, page_count, Totals, View};
pub use state::{Sort, SortCycle, SortDirection, ViewState, DEFAULT_PAGE_SIZE};

use crate::model::{ColumnKey, Columns, Row};
use tracing::{debug, trace};

/// A searchable, sortable, paginated view over an in-memory collection of rows.
#[derive(Debug, Clone)]
pub struct Table {
    rows: Vec<Row>,
    columns: Columns,
    state: ViewState,
    cycle: SortCycle,
}

impl Default for Table {
    fn default() -> Self {
        Self::new(Vec::<Row>::new(), Columns::default())
    }
}

impl Table {
    /// Creates a table with the default page size and the three-state sort cycle.
    pub fn new(rows: impl Into<Vec<Row>>, columns: Columns) -> Self {
        Self::with_options(rows, columns, DEFAULT_PAGE_SIZE, SortCycle::default())
    }

    pub fn with_options(
        rows: impl Into<Vec<Row>>,
        columns: Columns,
        page_size: usize,
        cycle: SortCycle,
    ) -> Self {
        let rows = rows.into();
        debug!(
            "Creating table with {} rows, {} columns, page size {page_size}, sort cycle {cycle}",
            rows.len(),
            columns.len()
        );
        Self {
            rows,
            columns,
            state: ViewState::with_page_size(page_size),
            cycle,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn sort_cycle(&self) -> SortCycle {
        self.cycle
    }

    /// Replaces the whole row collection, e.g. after a refresh. The `ViewState` is kept as it is;
    /// a page index that no longer exists is clamped when the view is derived.
    pub fn set_rows(&mut self, rows: impl Into<Vec<Row>>) {
        self.rows = rows.into();
        debug!("Replaced table rows, now {}", self.rows.len());
    }

    /// Sets the search text. Changing it moves back to the first page.
    pub fn set_filter_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.state.filter_text() {
            return;
        }
        trace!("Filter text changed to '{text}'");
        self.state.set_filter_text(text);
        self.state.set_page_index(0);
    }

    /// Advances the sort state of `key` through the table's `SortCycle`. Toggling a column that is
    /// not sortable, or not shown by this table, does nothing.
    pub fn toggle_sort(&mut self, key: ColumnKey) {
        if !self.can_sort(key) {
            debug!("Ignoring sort toggle on column '{key}'");
            return;
        }
        let next = self.cycle.next(self.state.sort(), key);
        trace!("Sort changed from {:?} to {next:?}", self.state.sort());
        self.state.set_sort(next);
    }

    /// Sets the sort state directly. `None` clears it.
    pub fn set_sort(&mut self, sort: Option<Sort>) {
        if let Some(s) = sort {
            if !self.can_sort(s.key()) {
                debug!("Ignoring sort on column '{}'", s.key());
                return;
            }
        }
        self.state.set_sort(sort);
    }

    fn can_sort(&self, key: ColumnKey) -> bool {
        self.columns.get(key).is_some_and(|c| c.is_sortable())
    }

    /// Sets the number of rows per page (zero is treated as one) and moves back to the first page.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.state.set_page_size(page_size);
        self.state.set_page_index(0);
    }

    /// Moves to `index`, clamped into `0..page_count`.
    pub fn set_page_index(&mut self, index: usize) {
        let clamped = index.min(self.page_count() - 1);
        if clamped != index {
            debug!("Page index {index} clamped to {clamped}");
        }
        self.state.set_page_index(clamped);
    }

    /// Moves to the next page. Does nothing on the last page.
    pub fn next_page(&mut self) {
        if self.can_next_page() {
            let next = self.current_page_index() + 1;
            self.state.set_page_index(next);
        } else {
            trace!("Already on the last page");
        }
    }

    /// Moves to the previous page. Does nothing on the first page.
    pub fn previous_page(&mut self) {
        if self.can_previous_page() {
            let previous = self.current_page_index() - 1;
            self.state.set_page_index(previous);
        } else {
            trace!("Already on the first page");
        }
    }

    pub fn can_next_page(&self) -> bool {
        self.current_page_index() + 1 < self.page_count()
    }

    pub fn can_previous_page(&self) -> bool {
        self.current_page_index() > 0
    }

    /// The number of pages the filtered rows span, at least one.
    pub fn page_count(&self) -> usize {
        page_count(self.filtered_count(), self.state.page_size())
    }

    /// How many rows match the current search text.
    pub fn filtered_count(&self) -> usize {
        let needle = self.state.filter_text().to_lowercase();
        self.rows
            .iter()
            .filter(|r| derive::matches(r, &needle))
            .count()
    }

    /// The page index actually shown, i.e. the stored one clamped onto the last page.
    fn current_page_index(&self) -> usize {
        self.state.page_index().min(self.page_count() - 1)
    }

    /// Derives the current page.
    pub fn view(&self) -> View<'_> {
        derive(&self.rows, &self.state)
    }

    /// The amount totals of the filtered set and of the current page.
    pub fn totals(&self) -> Totals {
        self.view().totals()
    }

    /// Finds a row by the textual form of its id, e.g. for the per-row "Open" action.
    pub fn row(&self, id: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.id().matches(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, Row, RowId, Rows};
    use crate::test::{coffee_rows, numbered_rows};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn ids(view: &View<'_>) -> Vec<RowId> {
        view.rows().iter().map(|r| r.id().clone()).collect()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_filter_is_case_insensitive_on_description() {
        let mut table = Table::new(coffee_rows(), Columns::default());
        table.set_filter_text("coffee");
        let view = table.view();
        assert_eq!(ids(&view), vec![RowId::Int(1), RowId::Int(3)]);
        assert_eq!(view.filtered_count(), 2);
        assert_eq!(table.totals().all().value(), dec("16.5"));
    }

    #[test]
    fn test_filter_ignores_other_fields() {
        let rows = vec![
            Row::new(1, "Lunch", Amount::lenient("10")).with_category("Coffee"),
            Row::new(2, "Snack", Amount::lenient("3")).with_notes("coffee"),
        ];
        let mut table = Table::new(rows, Columns::default());
        table.set_filter_text("COFFEE");
        assert_eq!(table.view().filtered_count(), 0);
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let mut table = Table::new(coffee_rows(), Columns::default());
        table.set_filter_text("rent");
        assert_eq!(table.view().filtered_count(), 1);
        table.set_filter_text("");
        assert_eq!(table.view().filtered_count(), 3);
    }

    #[test]
    fn test_filter_with_no_matches() {
        let mut table = Table::new(numbered_rows(25), Columns::default());
        table.set_filter_text("no such thing");
        let view = table.view();
        assert!(view.is_empty());
        assert_eq!(view.filtered_count(), 0);
        assert_eq!(view.page_count(), 1);
        assert!(view.totals().all().is_zero());
    }

    #[test]
    fn test_filter_resets_page() {
        let mut table = Table::new(numbered_rows(25), Columns::default());
        table.set_page_index(2);
        assert_eq!(table.state().page_index(), 2);

        // "Expense 2", "Expense 20" .. "Expense 25"
        table.set_filter_text("expense 2");
        assert_eq!(table.state().page_index(), 0);
        assert_eq!(table.view().filtered_count(), 7);
    }

    #[test]
    fn test_same_filter_text_keeps_page() {
        let mut table = Table::new(numbered_rows(25), Columns::default());
        table.set_filter_text("expense");
        table.set_page_index(1);
        table.set_filter_text("expense");
        assert_eq!(table.state().page_index(), 1);
    }

    #[test]
    fn test_filter_resets_page_to_first_with_three_matches() {
        let mut rows = numbered_rows(22);
        rows.push(Row::new(23, "Taxi to airport", Amount::lenient("40")));
        rows.push(Row::new(24, "Airport parking", Amount::lenient("25")));
        rows.push(Row::new(25, "AIRPORT lounge", Amount::lenient("30")));
        let mut table = Table::new(rows, Columns::default());
        table.set_page_index(2);
        assert_eq!(table.view().page_index(), 2);

        table.set_filter_text("airport");
        let view = table.view();
        assert_eq!(table.state().page_index(), 0);
        assert_eq!(view.page_count(), 1);
        assert_eq!(view.rows().len(), 3);
    }

    #[test]
    fn test_pagination_scenario() {
        let mut table = Table::new(numbered_rows(12), Columns::default());
        assert_eq!(table.page_count(), 2);
        assert_eq!(table.view().rows().len(), 10);
        assert!(!table.can_previous_page());

        table.next_page();
        assert_eq!(table.state().page_index(), 1);
        assert_eq!(table.view().rows().len(), 2);

        table.next_page();
        assert_eq!(table.state().page_index(), 1);

        table.previous_page();
        table.previous_page();
        assert_eq!(table.state().page_index(), 0);
    }

    #[test]
    fn test_set_page_index_clamps() {
        let mut table = Table::new(numbered_rows(12), Columns::default());
        table.set_page_index(7);
        assert_eq!(table.state().page_index(), 1);
    }

    #[test]
    fn test_page_size_change_resets_page() {
        let mut table = Table::new(numbered_rows(30), Columns::default());
        table.set_page_index(2);
        table.set_page_size(5);
        assert_eq!(table.state().page_index(), 0);
        assert_eq!(table.page_count(), 6);
        table.set_page_size(0);
        assert_eq!(table.state().page_size(), 1);
        assert_eq!(table.page_count(), 30);
    }

    #[test]
    fn test_view_never_exceeds_page_size() {
        for n in [0, 1, 9, 10, 11, 25, 100] {
            for size in [1, 3, 10, 50] {
                let mut table = Table::with_options(
                    numbered_rows(n),
                    Columns::default(),
                    size,
                    SortCycle::default(),
                );
                loop {
                    let view = table.view();
                    assert!(view.rows().len() <= size);
                    assert_eq!(view.page_count(), page_count(n, size));
                    assert!(view.page_index() < view.page_count());
                    if !table.can_next_page() {
                        break;
                    }
                    table.next_page();
                }
            }
        }
    }

    #[test]
    fn test_totals_all_and_page() {
        let mut table = Table::new(numbered_rows(12), Columns::default());
        // 1 + 2 + .. + 12
        assert_eq!(table.totals().all().value(), dec("78"));
        // 1 + 2 + .. + 10
        assert_eq!(table.totals().page().value(), dec("55"));
        table.next_page();
        assert_eq!(table.totals().all().value(), dec("78"));
        assert_eq!(table.totals().page().value(), dec("23"));
    }

    #[test]
    fn test_page_total_matches_view_rows() {
        let mut table = Table::new(numbered_rows(37), Columns::default());
        table.set_filter_text("3");
        table.toggle_sort(ColumnKey::Amount);
        table.toggle_sort(ColumnKey::Amount);
        let view = table.view();
        let expected: Amount = view.rows().iter().map(|r| r.amount()).sum();
        assert_eq!(view.totals().page(), expected);
    }

    #[test]
    fn test_malformed_amounts_count_as_zero() {
        let rows = Rows::from_json_str(
            r#"[{"id": 1, "description": "a", "amount": "abc"},
                {"id": 2, "description": "b"},
                {"id": 3, "description": "c", "amount": null},
                {"id": 4, "description": "d", "amount": "2.25"}]"#,
        )
        .unwrap();
        let table = Table::new(rows.into_vec(), Columns::default());
        assert_eq!(table.totals().all().value(), dec("2.25"));
    }

    #[test]
    fn test_overflowing_totals_saturate() {
        let rows = Rows::from_json_str(
            r#"[{"id": 1, "description": "a", "amount": "50000000000000000000000000000"},
                {"id": 2, "description": "b", "amount": "50000000000000000000000000000"}]"#,
        )
        .unwrap();
        let mut table = Table::new(rows.into_vec(), Columns::default());
        let view = table.view();
        assert_eq!(view.rows().len(), 2);
        assert_eq!(view.totals().all(), Amount::new(Decimal::MAX));
        assert_eq!(view.totals().page(), Amount::new(Decimal::MAX));

        table.set_page_size(1);
        assert_eq!(table.totals().all(), Amount::new(Decimal::MAX));
        assert_eq!(table.totals().page().value(), dec("50000000000000000000000000000"));
    }

    #[test]
    fn test_sort_is_stable() {
        let rows = vec![
            Row::new(1, "a", Amount::lenient("5")),
            Row::new(2, "b", Amount::lenient("1")),
            Row::new(3, "c", Amount::lenient("5")),
            Row::new(4, "d", Amount::lenient("1")),
            Row::new(5, "e", Amount::lenient("5")),
        ];
        let mut table = Table::new(rows, Columns::default());
        table.toggle_sort(ColumnKey::Amount);
        let asc: Vec<RowId> = ids(&table.view());
        assert_eq!(asc, [2, 4, 1, 3, 5].map(RowId::Int).to_vec());
        table.toggle_sort(ColumnKey::Amount);
        let desc: Vec<RowId> = ids(&table.view());
        assert_eq!(desc, [1, 3, 5, 2, 4].map(RowId::Int).to_vec());
        table.toggle_sort(ColumnKey::Amount);
        assert!(table.state().sort().is_none());
        assert_eq!(ids(&table.view()), [1, 2, 3, 4, 5].map(RowId::Int).to_vec());
    }

    #[test]
    fn test_sort_by_date() {
        let rows = vec![
            Row::new(1, "a", Amount::ZERO).with_date("2024-03-01"),
            Row::new(2, "b", Amount::ZERO).with_date("2023-12-31"),
            Row::new(3, "c", Amount::ZERO).with_date("2024-01-15"),
        ];
        let mut table = Table::new(rows, Columns::default());
        table.toggle_sort(ColumnKey::Date);
        assert_eq!(ids(&table.view()), [2, 3, 1].map(RowId::Int).to_vec());
    }

    #[test]
    fn test_only_one_sorted_column() {
        let mut table = Table::new(coffee_rows(), Columns::default());
        table.toggle_sort(ColumnKey::Amount);
        table.toggle_sort(ColumnKey::Amount);
        table.toggle_sort(ColumnKey::Description);
        assert_eq!(table.state().sort(), Some(Sort::ascending(ColumnKey::Description)));
    }

    #[test]
    fn test_toggle_unsortable_or_missing_column() {
        let mut table = Table::new(coffee_rows(), Columns::default());
        table.toggle_sort(ColumnKey::Actions);
        assert!(table.state().sort().is_none());
        // the default columns do not include notes
        table.toggle_sort(ColumnKey::Notes);
        assert!(table.state().sort().is_none());
        table.set_sort(Some(Sort::descending(ColumnKey::Notes)));
        assert!(table.state().sort().is_none());
    }

    #[test]
    fn test_two_state_cycle_never_clears() {
        let mut table =
            Table::with_options(coffee_rows(), Columns::default(), 10, SortCycle::TwoState);
        for _ in 0..5 {
            table.toggle_sort(ColumnKey::Date);
            assert!(table.state().sort().is_some());
        }
    }

    #[test]
    fn test_replacing_rows_keeps_state() {
        let mut table = Table::new(numbered_rows(30), Columns::default());
        table.set_filter_text("expense");
        table.toggle_sort(ColumnKey::Amount);
        table.set_page_index(2);

        table.set_rows(numbered_rows(12));
        assert_eq!(table.state().filter_text(), "expense");
        assert_eq!(table.state().sort(), Some(Sort::ascending(ColumnKey::Amount)));
        assert_eq!(table.state().page_index(), 2);

        // the stale index is clamped when deriving
        let view = table.view();
        assert_eq!(view.page_index(), 1);
        assert_eq!(view.rows().len(), 2);
        table.previous_page();
        assert_eq!(table.state().page_index(), 0);
    }

    #[test]
    fn test_empty_table() {
        let mut table = Table::default();
        table.next_page();
        table.previous_page();
        let view = table.view();
        assert!(view.is_empty());
        assert_eq!(view.page_count(), 1);
        assert!(table.totals().all().is_zero());
        assert!(table.totals().page().is_zero());
    }

    #[test]
    fn test_row_lookup() {
        let table = Table::new(coffee_rows(), Columns::default());
        assert_eq!(table.row("2").unwrap().description(), "Rent");
        assert!(table.row("9").is_none());
    }
}
