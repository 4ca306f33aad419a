//! INSERT statement builder
//!
//! Turns a column list and a loosely shaped set of values (one scalar, a
//! flat list, or a list of rows) into `INSERT` statements, splitting large
//! inputs into statements of at most [`MAX_ROWS_PER_STATEMENT`] rows and
//! dispatching them to a [`pquery_core::Connection`].
//!
//! ```ignore
//! use pquery_insert::{insert, InsertOptions};
//!
//! insert(conn.as_ref(), "test", ["foo", "bar"], vec![vec!["a", "b"], vec!["c", "d"]], &InsertOptions::default()).await?;
//! ```

mod admin;
mod batch;
mod builder;
mod error;
mod render;
mod shape;
mod value;

#[cfg(test)]
mod test_helpers;

pub use admin::DatabaseAdmin;
pub use batch::{InsertOptions, MAX_ROWS_PER_STATEMENT, partition};
pub use builder::{BatchSummary, InsertOutcome, InsertPlan, insert};
pub use error::{ArityKind, InsertError, InsertResult};
pub use render::{build_row_group, build_value_groups, escape_string_literal, render_row, render_value};
pub use shape::{ValueShape, classify, to_rows, validate};
pub use value::{ColumnSpec, RawSqlExpression, SqlValue, ValueElement, ValueSpec};
