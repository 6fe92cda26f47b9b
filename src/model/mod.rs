//! Types that represent the core data model, such as `Row`, `Amount` and `Column`.
mod amount;
mod column;
mod row;

pub use amount::{Amount, AmountError};
pub use column::{CellFormatter, Column, ColumnKey, Columns};
pub use row::{Row, RowId, Rows};
