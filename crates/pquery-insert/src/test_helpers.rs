//! In-memory connection for exercising the builder without a server.
//!
//! `RecordingConnection` keeps every statement it receives, reads generated
//! `INSERT` statements back into per-table rows, and answers
//! `SELECT * FROM <table>` from those rows. Canned results can be registered
//! for any other query.

use async_trait::async_trait;
use parking_lot::Mutex;
use pquery_core::{
    ColumnMeta, Connection, PqueryError, QueryResult, Result, Row, StatementResult, Value,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Default)]
struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

#[derive(Default)]
pub struct RecordingConnection {
    statements: Mutex<Vec<String>>,
    tables: Mutex<HashMap<String, Table>>,
    canned: Mutex<HashMap<String, QueryResult>>,
    fail_marker: Option<String>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every statement whose text contains `marker`
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::default()
        }
    }

    /// Answer `sql` with a single-column result
    pub fn with_canned(self, sql: &str, column: &str, values: Vec<Value>) -> Self {
        let columns = vec![column.to_string()];
        let mut result = QueryResult::empty();
        result.columns = vec![ColumnMeta {
            name: column.to_string(),
            ..ColumnMeta::default()
        }];
        result.rows = values
            .into_iter()
            .map(|value| Row::new(columns.clone(), vec![value]))
            .collect();
        self.canned.lock().insert(sql.to_string(), result);
        self
    }

    /// Every statement and query received, in arrival order
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().clone()
    }

    /// Rows stored for `table`
    pub fn rows(&self, table: &str) -> Vec<Vec<Value>> {
        self.tables
            .lock()
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    fn record(&self, sql: &str) -> Result<()> {
        self.statements.lock().push(sql.to_string());
        match &self.fail_marker {
            Some(marker) if sql.contains(marker.as_str()) => {
                Err(PqueryError::Query(format!("rejected statement containing '{}'", marker)))
            }
            _ => Ok(()),
        }
    }

    fn apply_insert(&self, sql: &str) -> Result<u64> {
        let (table, columns, rows) = parse_insert(sql)
            .ok_or_else(|| PqueryError::Query(format!("unparseable insert: {}", sql)))?;
        let count = rows.len() as u64;
        let mut tables = self.tables.lock();
        let entry = tables.entry(table).or_default();
        entry.columns = columns;
        entry.rows.extend(rows);
        Ok(count)
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    fn driver_name(&self) -> &str {
        "recording"
    }

    async fn execute(&self, sql: &str) -> Result<StatementResult> {
        self.record(sql)?;
        if sql.starts_with("INSERT") {
            let affected = self.apply_insert(sql)?;
            let id = self.next_id.fetch_add(affected, Ordering::SeqCst) + 1;
            return Ok(StatementResult::with_affected_rows(affected).with_last_insert_id(id));
        }
        Ok(StatementResult::default())
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        self.record(sql)?;
        if let Some(result) = self.canned.lock().get(sql) {
            return Ok(result.clone());
        }

        let mut result = QueryResult::empty();
        if let Some(table) = sql
            .strip_prefix("SELECT * FROM ")
            .map(|rest| rest.trim_end_matches(';').trim())
        {
            if let Some(stored) = self.tables.lock().get(table) {
                result.columns = stored
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(ordinal, name)| ColumnMeta {
                        name: name.clone(),
                        ordinal,
                        ..ColumnMeta::default()
                    })
                    .collect();
                result.rows = stored
                    .rows
                    .iter()
                    .map(|values| Row::new(stored.columns.clone(), values.clone()))
                    .collect();
            }
        }
        Ok(result)
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Parse `INSERT [IGNORE] INTO t (a, b) VALUES (..), (..);` back into values.
fn parse_insert(sql: &str) -> Option<(String, Vec<String>, Vec<Vec<Value>>)> {
    let rest = sql
        .strip_prefix("INSERT IGNORE INTO ")
        .or_else(|| sql.strip_prefix("INSERT INTO "))?;
    let (table, rest) = rest.split_once(" (")?;
    let (columns, rest) = rest.split_once(") VALUES ")?;
    let columns = columns.split(", ").map(str::to_string).collect();
    let body = rest.strip_suffix(';')?;

    let mut rows = Vec::new();
    let mut chars = body.chars().peekable();
    loop {
        while chars.next_if(|c| *c == ',' || *c == ' ').is_some() {}
        match chars.next() {
            Some('(') => {}
            None => break,
            Some(_) => return None,
        }

        let mut row = Vec::new();
        loop {
            while chars.next_if_eq(&' ').is_some() {}
            if chars.next_if_eq(&'\'').is_some() {
                let mut text = String::new();
                loop {
                    match chars.next()? {
                        '\\' => text.push(chars.next()?),
                        '\'' if chars.next_if_eq(&'\'').is_some() => text.push('\''),
                        '\'' => break,
                        other => text.push(other),
                    }
                }
                row.push(Value::String(text));
            } else {
                let mut token = String::new();
                let mut depth = 0usize;
                while let Some(&c) = chars.peek() {
                    match c {
                        '(' => depth += 1,
                        ')' if depth > 0 => depth -= 1,
                        ',' | ')' => break,
                        _ => {}
                    }
                    token.push(c);
                    chars.next();
                }
                row.push(match token.as_str() {
                    "NULL" => Value::Null,
                    _ => Value::String(token),
                });
            }

            match chars.next()? {
                ',' => continue,
                ')' => break,
                _ => return None,
            }
        }
        rows.push(row);
    }

    Some((table.to_string(), columns, rows))
}
