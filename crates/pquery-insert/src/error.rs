//! Insert builder errors

use pquery_core::PqueryError;
use thiserror::Error;

pub type InsertResult<T> = Result<T, InsertError>;

/// Which side of a row/column count mismatch has the surplus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArityKind {
    TooFewValues,
    TooManyValues,
}

impl ArityKind {
    /// Classify `found` values against `expected` columns. `None` when they match.
    pub fn compare(expected: usize, found: usize) -> Option<Self> {
        match found.cmp(&expected) {
            std::cmp::Ordering::Less => Some(ArityKind::TooFewValues),
            std::cmp::Ordering::Greater => Some(ArityKind::TooManyValues),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl std::fmt::Display for ArityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArityKind::TooFewValues => write!(f, "add values or remove columns"),
            ArityKind::TooManyValues => write!(f, "add columns or remove values"),
        }
    }
}

/// Errors raised while validating, building or dispatching an insert
#[derive(Debug, Error)]
pub enum InsertError {
    #[error("No columns defined")]
    MissingColumns,

    #[error("No values defined")]
    MissingValues,

    #[error("Row {row} has {found} values but {expected} columns were given ({kind})")]
    ArityMismatch {
        kind: ArityKind,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Values must be all scalars or all rows, not a mix of both")]
    InconsistentValueShapes,

    #[error("A single scalar value only works for single-column inserts, got {columns} columns")]
    ColumnValueShapeMismatch { columns: usize },

    #[error("Row {row} contains {value}, which has no SQL literal")]
    NonFiniteNumber { row: usize, value: String },

    #[error("Not a zero-argument function call: '{0}'")]
    InvalidRawExpression(String),

    #[error("Statement {batch} failed: {source}")]
    Execution {
        batch: usize,
        #[source]
        source: PqueryError,
    },
}

impl InsertError {
    pub(crate) fn arity(row: usize, expected: usize, found: usize) -> Option<Self> {
        ArityKind::compare(expected, found).map(|kind| InsertError::ArityMismatch {
            kind,
            row,
            expected,
            found,
        })
    }

    /// True for errors raised before anything was sent to the database
    pub fn is_validation(&self) -> bool {
        !matches!(self, InsertError::Execution { .. })
    }
}
