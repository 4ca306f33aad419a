//! Statement assembly and dispatch

use futures::future::join_all;
use pquery_core::{Connection, StatementResult};

use crate::batch::{InsertOptions, partition};
use crate::error::{InsertError, InsertResult};
use crate::render::insert_statement;
use crate::shape::{classify, to_rows, validate};
use crate::value::{ColumnSpec, ValueSpec};

#[cfg(test)]
mod tests;

/// Aggregate result of a multi-row insert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of statements dispatched
    pub statements: usize,
    /// Number of rows rendered across all statements
    pub rows: usize,
    /// Rows the server reported as affected
    pub affected_rows: u64,
}

/// What an insert returns once every statement has completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A one-row insert: the driver's result, including any generated id
    Single(StatementResult),
    /// A multi-row insert
    Batched(BatchSummary),
}

impl InsertOutcome {
    pub fn affected_rows(&self) -> u64 {
        match self {
            InsertOutcome::Single(result) => result.affected_rows,
            InsertOutcome::Batched(summary) => summary.affected_rows,
        }
    }

    /// Generated auto-increment id; only known for one-row inserts
    pub fn last_insert_id(&self) -> Option<u64> {
        match self {
            InsertOutcome::Single(result) => result.last_insert_id,
            InsertOutcome::Batched(_) => None,
        }
    }
}

/// A validated insert, rendered into its statements but not yet sent.
#[derive(Debug, Clone)]
pub struct InsertPlan {
    table: String,
    row_count: usize,
    statements: Vec<String>,
}

impl InsertPlan {
    /// Validate and normalize the input, then render one statement per batch.
    ///
    /// Nothing is sent to the database here, so every shape error surfaces
    /// before the first statement is dispatched.
    pub fn new(
        table: impl Into<String>,
        columns: impl Into<ColumnSpec>,
        values: impl Into<ValueSpec>,
        options: &InsertOptions,
    ) -> InsertResult<Self> {
        let table = table.into();
        let columns = columns.into();
        let values = values.into();

        validate(&columns, &values)?;
        let mut rows = to_rows(&columns, classify(values)?)?;

        if options.detect_sql_functions {
            rows = rows
                .into_iter()
                .map(|row| row.into_iter().map(|value| value.promote_function_call()).collect())
                .collect();
        }

        let statements: Vec<String> = partition(&rows, options.batch_size)
            .map(|batch| insert_statement(&table, &columns, batch, options.ignore_duplicates))
            .collect();

        tracing::debug!(
            table = %table,
            columns = columns.len(),
            rows = rows.len(),
            statements = statements.len(),
            ignore_duplicates = options.ignore_duplicates,
            "insert plan built"
        );

        Ok(Self {
            table,
            row_count: rows.len(),
            statements,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Dispatch every statement concurrently and wait for all of them.
    ///
    /// A one-row plan returns the driver's result unchanged. For larger
    /// plans the first failing statement (in batch order) is reported;
    /// statements that already succeeded stay committed.
    pub async fn execute(self, conn: &dyn Connection) -> InsertResult<InsertOutcome> {
        if self.row_count == 1 {
            return conn
                .execute(&self.statements[0])
                .await
                .map(InsertOutcome::Single)
                .map_err(|source| {
                    tracing::warn!(table = %self.table, error = %source, "single-row insert failed");
                    InsertError::Execution { batch: 0, source }
                });
        }

        let results = join_all(self.statements.iter().map(|sql| conn.execute(sql))).await;

        let mut summary = BatchSummary {
            statements: self.statements.len(),
            rows: self.row_count,
            affected_rows: 0,
        };
        let mut first_failure = None;

        for (batch, result) in results.into_iter().enumerate() {
            match result {
                Ok(result) => summary.affected_rows += result.affected_rows,
                Err(source) => {
                    tracing::warn!(table = %self.table, batch, error = %source, "insert batch failed");
                    if first_failure.is_none() {
                        first_failure = Some(InsertError::Execution { batch, source });
                    }
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => {
                tracing::debug!(
                    table = %self.table,
                    statements = summary.statements,
                    affected_rows = summary.affected_rows,
                    "insert completed"
                );
                Ok(InsertOutcome::Batched(summary))
            }
        }
    }
}

/// Build and dispatch an insert in one call.
pub async fn insert(
    conn: &dyn Connection,
    table: &str,
    columns: impl Into<ColumnSpec>,
    values: impl Into<ValueSpec>,
    options: &InsertOptions,
) -> InsertResult<InsertOutcome> {
    InsertPlan::new(table, columns, values, options)?
        .execute(conn)
        .await
}
