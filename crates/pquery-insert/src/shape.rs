//! Shape validation and row normalization

use crate::error::{InsertError, InsertResult};
use crate::value::{ColumnSpec, SqlValue, ValueElement, ValueSpec};


/// A value list after classification; every input maps to exactly one shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueShape {
    /// One value, one row, one column
    Scalar(SqlValue),
    /// Scalars only: one row per value for a single column, otherwise one row
    FlatList(Vec<SqlValue>),
    /// Rows only
    NestedList(Vec<Vec<SqlValue>>),
}

/// Check that columns and values are present and that the first row fits.
///
/// Only the first row is checked here; [`to_rows`] checks the rest.
pub fn validate(columns: &ColumnSpec, values: &ValueSpec) -> InsertResult<()> {
    if columns.is_empty() || columns.names().iter().any(|name| name.trim().is_empty()) {
        return Err(InsertError::MissingColumns);
    }

    let has_values = match values {
        ValueSpec::Scalar(value) => !value.is_blank(),
        ValueSpec::List(elements) => !elements.is_empty(),
    };
    if !has_values {
        return Err(InsertError::MissingValues);
    }

    match values {
        ValueSpec::List(elements) if columns.len() > 1 => match elements.first() {
            Some(ValueElement::Row(first)) => match InsertError::arity(0, columns.len(), first.len()) {
                Some(err) => Err(err),
                None => Ok(()),
            },
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

/// Sort a value list into scalars or rows, rejecting a mix of both.
pub fn classify(values: ValueSpec) -> InsertResult<ValueShape> {
    let elements = match values {
        ValueSpec::Scalar(value) => return Ok(ValueShape::Scalar(value)),
        ValueSpec::List(elements) => elements,
    };

    let row_count = elements
        .iter()
        .filter(|element| matches!(element, ValueElement::Row(_)))
        .count();

    if row_count == 0 {
        Ok(ValueShape::FlatList(
            elements
                .into_iter()
                .filter_map(|element| match element {
                    ValueElement::Scalar(value) => Some(value),
                    ValueElement::Row(_) => None,
                })
                .collect(),
        ))
    } else if row_count == elements.len() {
        Ok(ValueShape::NestedList(
            elements
                .into_iter()
                .filter_map(|element| match element {
                    ValueElement::Row(row) => Some(row),
                    ValueElement::Scalar(_) => None,
                })
                .collect(),
        ))
    } else {
        Err(InsertError::InconsistentValueShapes)
    }
}

/// Normalize a classified value list into rows whose arity equals the
/// column count. NaN and infinite floats have no SQL literal and are rejected.
pub fn to_rows(columns: &ColumnSpec, shape: ValueShape) -> InsertResult<Vec<Vec<SqlValue>>> {
    let rows = shape_rows(columns.len(), shape)?;
    for (index, row) in rows.iter().enumerate() {
        if let Some(value) = row.iter().find(|value| !value.is_finite()) {
            return Err(InsertError::NonFiniteNumber {
                row: index,
                value: value.to_string(),
            });
        }
    }
    Ok(rows)
}

fn shape_rows(width: usize, shape: ValueShape) -> InsertResult<Vec<Vec<SqlValue>>> {
    match shape {
        ValueShape::Scalar(value) if width == 1 => Ok(vec![vec![value]]),
        ValueShape::Scalar(_) => Err(InsertError::ColumnValueShapeMismatch { columns: width }),
        ValueShape::FlatList(values) if width == 1 => {
            Ok(values.into_iter().map(|value| vec![value]).collect())
        }
        ValueShape::FlatList(values) => match InsertError::arity(0, width, values.len()) {
            Some(err) => Err(err),
            None => Ok(vec![values]),
        },
        ValueShape::NestedList(rows) => {
            for (index, row) in rows.iter().enumerate() {
                if let Some(err) = InsertError::arity(index, width, row.len()) {
                    return Err(err);
                }
            }
            Ok(rows)
        }
    }
}
