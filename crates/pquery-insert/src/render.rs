//! SQL fragment rendering

use pquery_core::Value;

use crate::error::InsertResult;
use crate::shape::{classify, to_rows, validate};
use crate::value::{ColumnSpec, SqlValue, ValueSpec};


/// Escape a string for use inside a single-quoted MySQL literal.
pub fn escape_string_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("''"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Render one value. Literals are quoted and escaped; raw expressions and
/// `NULL` are emitted as-is.
pub fn render_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Raw(expr) => expr.as_str().to_string(),
        SqlValue::Literal(Value::Null) => "NULL".to_string(),
        SqlValue::Literal(Value::Bytes(bytes)) => {
            let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
            format!("X'{}'", hex)
        }
        SqlValue::Literal(Value::Bool(flag)) => if *flag { "'1'" } else { "'0'" }.to_string(),
        SqlValue::Literal(Value::DateTime(dt)) => {
            format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S%.6f"))
        }
        SqlValue::Literal(other) => format!("'{}'", escape_string_literal(&other.to_string())),
    }
}

/// `(v1, v2, ...)` for one row
pub fn render_row(row: &[SqlValue]) -> String {
    let rendered: Vec<String> = row.iter().map(render_value).collect();
    format!("({})", rendered.join(", "))
}

/// `(col1, col2, ...)`; column names are trusted identifiers and are not escaped
pub fn build_row_group(columns: &ColumnSpec) -> String {
    format!("({})", columns.names().join(", "))
}

/// Every row of `values` rendered and comma-joined, without batching.
pub fn build_value_groups(columns: &ColumnSpec, values: &ValueSpec) -> InsertResult<String> {
    validate(columns, values)?;
    let rows = to_rows(columns, classify(values.clone())?)?;
    Ok(render_rows(&rows))
}

pub(crate) fn render_rows(rows: &[Vec<SqlValue>]) -> String {
    rows.iter()
        .map(|row| render_row(row))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `INSERT [IGNORE] INTO <table> (<columns>) VALUES <rows>;`
pub(crate) fn insert_statement(
    table: &str,
    columns: &ColumnSpec,
    rows: &[Vec<SqlValue>],
    ignore_duplicates: bool,
) -> String {
    format!(
        "INSERT {}INTO {} {} VALUES {};",
        if ignore_duplicates { "IGNORE " } else { "" },
        table,
        build_row_group(columns),
        render_rows(rows)
    )
}
