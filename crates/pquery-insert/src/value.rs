//! Input model: column lists, scalar values and value shapes

use pquery_core::Value;
use regex::Regex;
use std::sync::LazyLock;

use crate::error::{InsertError, InsertResult};

static FUNCTION_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+\(\)$").expect("valid regex"));

/// Ordered, caller-trusted column names for an insert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSpec(Vec<String>);

impl ColumnSpec {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ColumnSpec {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for ColumnSpec {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<Vec<&str>> for ColumnSpec {
    fn from(names: Vec<&str>) -> Self {
        Self::new(names)
    }
}

impl From<Vec<String>> for ColumnSpec {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<&[&str]> for ColumnSpec {
    fn from(names: &[&str]) -> Self {
        Self::new(names.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for ColumnSpec {
    fn from(names: [&str; N]) -> Self {
        Self::new(names)
    }
}

/// SQL emitted verbatim instead of as a quoted literal.
///
/// Only a bare zero-argument function call such as `NOW()` or `UUID()` is
/// accepted, so a raw expression can name a database-side function but can
/// never carry arbitrary SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSqlExpression(String);

impl RawSqlExpression {
    pub fn new(expr: impl AsRef<str>) -> InsertResult<Self> {
        let expr = expr.as_ref().trim();
        if Self::is_function_call(expr) {
            Ok(Self(expr.to_string()))
        } else {
            Err(InsertError::InvalidRawExpression(expr.to_string()))
        }
    }

    /// Whether `text` is an identifier followed by `()`
    pub fn is_function_call(text: &str) -> bool {
        FUNCTION_CALL.is_match(text.trim())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RawSqlExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One value destined for one cell of an inserted row
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Rendered as an escaped, quoted literal (or `NULL`)
    Literal(Value),
    /// Rendered verbatim
    Raw(RawSqlExpression),
}

impl SqlValue {
    /// A raw function call such as `NOW()`
    pub fn raw(expr: impl AsRef<str>) -> InsertResult<Self> {
        RawSqlExpression::new(expr).map(SqlValue::Raw)
    }

    /// Turn a string literal that looks like `NAME()` into a raw expression.
    pub(crate) fn promote_function_call(self) -> Self {
        match self {
            SqlValue::Literal(Value::String(s)) if RawSqlExpression::is_function_call(&s) => {
                SqlValue::Raw(RawSqlExpression(s.trim().to_string()))
            }
            other => other,
        }
    }

    /// False only for NaN and infinite floats
    pub(crate) fn is_finite(&self) -> bool {
        match self {
            SqlValue::Literal(Value::Float64(v)) => v.is_finite(),
            SqlValue::Literal(Value::Float32(v)) => v.is_finite(),
            _ => true,
        }
    }

    /// NULL or the empty string
    pub(crate) fn is_blank(&self) -> bool {
        match self {
            SqlValue::Literal(Value::Null) => true,
            SqlValue::Literal(Value::String(s)) => s.is_empty(),
            _ => false,
        }
    }
}

impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Literal(value) => write!(f, "{}", value),
            SqlValue::Raw(expr) => write!(f, "{}", expr),
        }
    }
}

impl From<Value> for SqlValue {
    fn from(value: Value) -> Self {
        SqlValue::Literal(value)
    }
}

impl From<RawSqlExpression> for SqlValue {
    fn from(expr: RawSqlExpression) -> Self {
        SqlValue::Raw(expr)
    }
}

/// One entry of a value list: a lone scalar or a whole row
#[derive(Debug, Clone, PartialEq)]
pub enum ValueElement {
    Scalar(SqlValue),
    Row(Vec<SqlValue>),
}

impl From<SqlValue> for ValueElement {
    fn from(value: SqlValue) -> Self {
        ValueElement::Scalar(value)
    }
}

impl From<Vec<SqlValue>> for ValueElement {
    fn from(row: Vec<SqlValue>) -> Self {
        ValueElement::Row(row)
    }
}

/// The values handed to an insert, before classification
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSpec {
    /// A single value for a single-column, single-row insert
    Scalar(SqlValue),
    /// A list of scalars, rows, or (invalidly) both
    List(Vec<ValueElement>),
}

impl Default for ValueSpec {
    fn default() -> Self {
        ValueSpec::List(Vec::new())
    }
}

impl ValueSpec {
    /// A list of rows
    pub fn rows<R, V>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        ValueSpec::List(
            rows.into_iter()
                .map(|row| ValueElement::Row(row.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }

    /// A flat list of scalars
    pub fn flat<V: Into<SqlValue>>(values: impl IntoIterator<Item = V>) -> Self {
        ValueSpec::List(
            values
                .into_iter()
                .map(|v| ValueElement::Scalar(v.into()))
                .collect(),
        )
    }
}

impl From<SqlValue> for ValueSpec {
    fn from(value: SqlValue) -> Self {
        ValueSpec::Scalar(value)
    }
}

impl From<Vec<SqlValue>> for ValueSpec {
    fn from(values: Vec<SqlValue>) -> Self {
        ValueSpec::flat(values)
    }
}

impl From<Vec<Vec<SqlValue>>> for ValueSpec {
    fn from(rows: Vec<Vec<SqlValue>>) -> Self {
        ValueSpec::rows(rows)
    }
}

impl From<Vec<ValueElement>> for ValueSpec {
    fn from(elements: Vec<ValueElement>) -> Self {
        ValueSpec::List(elements)
    }
}

/// Conversions from plain Rust scalars into every input type.
macro_rules! impl_scalar_conversions {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::Literal(Value::from(value))
                }
            }

            impl From<$ty> for ValueElement {
                fn from(value: $ty) -> Self {
                    ValueElement::Scalar(value.into())
                }
            }

            impl From<Vec<$ty>> for ValueElement {
                fn from(row: Vec<$ty>) -> Self {
                    ValueElement::Row(row.into_iter().map(Into::into).collect())
                }
            }

            impl From<$ty> for ValueSpec {
                fn from(value: $ty) -> Self {
                    ValueSpec::Scalar(value.into())
                }
            }

            impl From<Vec<$ty>> for ValueSpec {
                fn from(values: Vec<$ty>) -> Self {
                    ValueSpec::flat(values)
                }
            }

            impl From<Vec<Vec<$ty>>> for ValueSpec {
                fn from(rows: Vec<Vec<$ty>>) -> Self {
                    ValueSpec::rows(rows)
                }
            }
        )*
    };
}

impl_scalar_conversions!(&str, String, i32, i64, f64, bool);

impl From<Value> for ValueElement {
    fn from(value: Value) -> Self {
        ValueElement::Scalar(value.into())
    }
}

impl From<RawSqlExpression> for ValueElement {
    fn from(expr: RawSqlExpression) -> Self {
        ValueElement::Scalar(expr.into())
    }
}

impl From<Value> for ValueSpec {
    fn from(value: Value) -> Self {
        ValueSpec::Scalar(value.into())
    }
}

impl From<RawSqlExpression> for ValueSpec {
    fn from(expr: RawSqlExpression) -> Self {
        ValueSpec::Scalar(expr.into())
    }
}
