use crate::model::Row;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Represents the columns a table knows how to show.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKey {
    Date,
    Description,
    Category,
    Method,
    Amount,
    Notes,
    /// Not backed by a row field; renders the per-row action.
    Actions,
}

serde_plain::derive_display_from_serialize!(ColumnKey);
serde_plain::derive_fromstr_from_deserialize!(ColumnKey);

impl ColumnKey {
    /// Every column backed by row data can be sorted.
    pub fn is_sortable(&self) -> bool {
        !matches!(self, ColumnKey::Actions)
    }

    /// The text a cell shows when no custom formatter is given.
    pub fn default_cell(&self, row: &Row) -> String {
        match self {
            ColumnKey::Date => row.date().to_string(),
            ColumnKey::Description => row.description().to_string(),
            ColumnKey::Category => row.category().to_string(),
            ColumnKey::Method => row.method().to_string(),
            ColumnKey::Amount => row.amount().to_string(),
            ColumnKey::Notes => row.notes().unwrap_or_default().to_string(),
            ColumnKey::Actions => String::from("Open"),
        }
    }

    /// Compares two rows by this column in ascending order.
    ///
    /// Amounts compare numerically. Dates compare chronologically, with dates that do not parse
    /// ordered first. Text compares case-insensitively and missing notes order first.
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        match self {
            ColumnKey::Date => match (a.date_value(), b.date_value()) {
                (Some(x), Some(y)) => x.cmp(&y),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => a.date().cmp(b.date()),
            },
            ColumnKey::Description => cmp_text(a.description(), b.description()),
            ColumnKey::Category => cmp_text(a.category(), b.category()),
            ColumnKey::Method => cmp_text(a.method(), b.method()),
            ColumnKey::Amount => a.amount().value().cmp(&b.amount().value()),
            ColumnKey::Notes => match (a.notes(), b.notes()) {
                (Some(x), Some(y)) => cmp_text(x, y),
                (x, y) => x.is_some().cmp(&y.is_some()),
            },
            ColumnKey::Actions => Ordering::Equal,
        }
    }
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// A caller-supplied function that turns a row into the text of one cell.
pub type CellFormatter = Arc<dyn Fn(&Row) -> String + Send + Sync>;

/// Describes one column of a table: which field it shows, its header label and, optionally, how
/// its cells are formatted.
#[derive(Clone)]
pub struct Column {
    key: ColumnKey,
    label: String,
    formatter: Option<CellFormatter>,
}

impl Column {
    pub fn new(key: ColumnKey, label: impl Into<String>) -> Self {
        Self {
            key,
            label: label.into(),
            formatter: None,
        }
    }

    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&Row) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn key(&self) -> ColumnKey {
        self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_sortable(&self) -> bool {
        self.key.is_sortable()
    }

    /// The text of this column's cell for `row`.
    pub fn render(&self, row: &Row) -> String {
        match &self.formatter {
            Some(f) => f(row),
            None => self.key.default_cell(row),
        }
    }
}

impl Debug for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("formatter", &self.formatter.as_ref().map(|_| "custom"))
            .finish()
    }
}

/// The ordered set of columns a table shows.
#[derive(Debug, Clone)]
pub struct Columns(Vec<Column>);

impl Default for Columns {
    /// Date, Description, Category, Method, Amount and Actions.
    fn default() -> Self {
        Self(vec![
            Column::new(ColumnKey::Date, "Date"),
            Column::new(ColumnKey::Description, "Description"),
            Column::new(ColumnKey::Category, "Category"),
            Column::new(ColumnKey::Method, "Method"),
            Column::new(ColumnKey::Amount, "Amount"),
            Column::new(ColumnKey::Actions, "Actions"),
        ])
    }
}

impl Columns {
    pub fn new(columns: Vec<Column>) -> Self {
        Self(columns)
    }

    /// The expenditure page layout, which shows notes instead of the action column.
    pub fn expenditure() -> Self {
        Self(vec![
            Column::new(ColumnKey::Date, "Date"),
            Column::new(ColumnKey::Description, "Description"),
            Column::new(ColumnKey::Amount, "Amount ($)"),
            Column::new(ColumnKey::Category, "Category"),
            Column::new(ColumnKey::Method, "Payment Method"),
            Column::new(ColumnKey::Notes, "Notes"),
        ])
    }

    pub fn get(&self, key: ColumnKey) -> Option<&Column> {
        self.0.iter().find(|c| c.key() == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Column>> for Columns {
    fn from(value: Vec<Column>) -> Self {
        Columns(value)
    }
}
