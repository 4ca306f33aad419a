//! Tests for statement assembly and dispatch

use super::*;
use crate::error::ArityKind;
use crate::test_helpers::RecordingConnection;
use crate::value::{RawSqlExpression, SqlValue};
use async_trait::async_trait;
use pquery_core::{QueryResult, Result, Value};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

async fn run(
    conn: &RecordingConnection,
    columns: impl Into<ColumnSpec>,
    values: impl Into<ValueSpec>,
) -> InsertResult<InsertOutcome> {
    insert(conn, "test", columns, values, &InsertOptions::default()).await
}

mod statement_text_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_single_scalar_insert() {
        let conn = RecordingConnection::new();
        let outcome = insert(&conn, "table", ["foo"], "Wow", &InsertOptions::default())
            .await
            .unwrap();

        assert_eq!(conn.statements(), vec!["INSERT INTO table (foo) VALUES ('Wow');"]);
        assert_eq!(outcome.last_insert_id(), Some(1));
        assert!(matches!(outcome, InsertOutcome::Single(_)));
    }

    #[tokio::test]
    async fn test_flat_list_single_column() {
        let conn = RecordingConnection::new();
        let outcome = run(&conn, ["foo"], vec!["Wow", "Amazing"]).await.unwrap();

        assert_eq!(
            conn.statements(),
            vec!["INSERT INTO test (foo) VALUES ('Wow'), ('Amazing');"]
        );
        assert_eq!(
            outcome,
            InsertOutcome::Batched(BatchSummary {
                statements: 1,
                rows: 2,
                affected_rows: 2,
            })
        );
    }

    #[tokio::test]
    async fn test_one_element_list_is_a_single_row_insert() {
        let conn = RecordingConnection::new();
        let outcome = run(&conn, ["foo"], vec!["Amazing"]).await.unwrap();

        assert!(matches!(outcome, InsertOutcome::Single(_)));
        assert_eq!(conn.statements(), vec!["INSERT INTO test (foo) VALUES ('Amazing');"]);
    }

    #[tokio::test]
    async fn test_nested_rows() {
        let conn = RecordingConnection::new();
        run(&conn, ["foo", "bar"], vec![vec!["Hello", "there"], vec!["General", "Kenobi"]])
            .await
            .unwrap();

        assert_eq!(
            conn.statements(),
            vec!["INSERT INTO test (foo, bar) VALUES ('Hello', 'there'), ('General', 'Kenobi');"]
        );
    }

    #[tokio::test]
    async fn test_ignore_duplicates() {
        let conn = RecordingConnection::new();
        let options = InsertOptions::new().with_ignore_duplicates(true);
        insert(&conn, "test", ["foo"], "Wow", &options).await.unwrap();

        assert_eq!(conn.statements(), vec!["INSERT IGNORE INTO test (foo) VALUES ('Wow');"]);
    }

    #[tokio::test]
    async fn test_function_calls_quoted_unless_detection_enabled() {
        let conn = RecordingConnection::new();
        run(&conn, ["created_at"], "NOW()").await.unwrap();

        let options = InsertOptions::new().with_detect_sql_functions(true);
        insert(&conn, "test", ["created_at"], "NOW()", &options).await.unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                "INSERT INTO test (created_at) VALUES ('NOW()');",
                "INSERT INTO test (created_at) VALUES (NOW());",
            ]
        );
    }

    #[tokio::test]
    async fn test_detection_applies_per_value() {
        let conn = RecordingConnection::new();
        let options = InsertOptions::new().with_detect_sql_functions(true);
        insert(&conn, "test", ["a", "b"], vec!["UUID()", "UUID() or not"], &options)
            .await
            .unwrap();

        assert_eq!(
            conn.statements(),
            vec!["INSERT INTO test (a, b) VALUES (UUID(), 'UUID() or not');"]
        );
    }

    #[tokio::test]
    async fn test_explicit_raw_expression() {
        let conn = RecordingConnection::new();
        let now = RawSqlExpression::new("CURRENT_TIMESTAMP()").unwrap();
        run(&conn, ["name", "at"], vec![SqlValue::from("x"), SqlValue::from(now)])
            .await
            .unwrap();

        assert_eq!(
            conn.statements(),
            vec!["INSERT INTO test (name, at) VALUES ('x', CURRENT_TIMESTAMP());"]
        );
    }
}

mod validation_tests {
    use super::*;

    #[tokio::test]
    async fn test_arity_mismatch_sends_nothing() {
        let conn = RecordingConnection::new();
        let err = run(&conn, ["foo", "bar"], vec![vec!["test"]]).await.unwrap_err();

        assert!(matches!(
            err,
            InsertError::ArityMismatch { kind: ArityKind::TooFewValues, .. }
        ));
        assert!(err.is_validation());
        assert!(conn.statements().is_empty());
    }

    #[tokio::test]
    async fn test_bad_row_past_first_batch_sends_nothing() {
        let conn = RecordingConnection::new();
        let mut rows: Vec<Vec<String>> = (0..20).map(|i| vec![i.to_string(), i.to_string()]).collect();
        rows.push(vec!["lonely".to_string()]);
        let options = InsertOptions::new().with_batch_size(5);

        let err = insert(&conn, "test", ["a", "b"], rows, &options).await.unwrap_err();

        assert!(matches!(err, InsertError::ArityMismatch { row: 20, .. }));
        assert!(conn.statements().is_empty());
    }

    #[tokio::test]
    async fn test_missing_columns() {
        let conn = RecordingConnection::new();
        let err = run(&conn, Vec::<String>::new(), "anything").await.unwrap_err();
        assert!(matches!(err, InsertError::MissingColumns));
    }

    #[tokio::test]
    async fn test_empty_column_name_sends_nothing() {
        let conn = RecordingConnection::new();

        let err = run(&conn, "", "x").await.unwrap_err();
        assert!(matches!(err, InsertError::MissingColumns));

        let err = run(&conn, ["foo", ""], vec!["a", "b"]).await.unwrap_err();
        assert!(matches!(err, InsertError::MissingColumns));
        assert!(conn.statements().is_empty());
    }

    #[tokio::test]
    async fn test_nan_sends_nothing() {
        let conn = RecordingConnection::new();
        let err = run(&conn, ["f"], f64::NAN).await.unwrap_err();

        assert!(matches!(err, InsertError::NonFiniteNumber { row: 0, .. }));
        assert!(err.is_validation());
        assert!(conn.statements().is_empty());
    }

    #[tokio::test]
    async fn test_missing_values() {
        let conn = RecordingConnection::new();
        let err = run(&conn, ["foo"], Vec::<String>::new()).await.unwrap_err();
        assert!(matches!(err, InsertError::MissingValues));
        assert!(conn.statements().is_empty());
    }
}

mod batching_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case::one_over(5001, vec![5000, 1])]
    #[case::two_and_a_bit(10001, vec![5000, 5000, 1])]
    #[tokio::test]
    async fn test_large_inserts_are_split(#[case] len: usize, #[case] expected: Vec<usize>) {
        let conn = RecordingConnection::new();
        let values: Vec<String> = (0..len).map(|i| format!("v{i}")).collect();

        let outcome = run(&conn, ["foo"], values).await.unwrap();

        let row_counts: Vec<usize> = conn
            .statements()
            .iter()
            .map(|sql| sql.matches("), (").count() + 1)
            .collect();
        assert_eq!(row_counts, expected);
        assert_eq!(outcome.affected_rows(), len as u64);
        assert_eq!(conn.rows("test").len(), len);
    }

    #[tokio::test]
    async fn test_plan_is_deterministic() {
        let values: Vec<String> = (0..12).map(|i| i.to_string()).collect();
        let options = InsertOptions::new().with_batch_size(5);

        let first = InsertPlan::new("t", ["c"], values.clone(), &options).unwrap();
        let second = InsertPlan::new("t", ["c"], values, &options).unwrap();

        assert_eq!(first.statements(), second.statements());
        assert_eq!(first.statements().len(), 3);
        assert_eq!(first.row_count(), 12);
        assert_eq!(first.table(), "t");
    }

    #[tokio::test]
    async fn test_failed_batch_reports_first_failure_after_all_dispatched() {
        let conn = RecordingConnection::failing_on("'poison'");
        let options = InsertOptions::new().with_batch_size(2);

        let err = insert(&conn, "test", ["foo"], vec!["a", "b", "poison", "d", "e"], &options)
            .await
            .unwrap_err();

        assert!(matches!(err, InsertError::Execution { batch: 1, .. }));
        assert!(!err.is_validation());
        assert_eq!(conn.statements().len(), 3);
        // no cross-batch rollback: the healthy batches stay written
        assert_eq!(conn.rows("test").len(), 3);
    }

    #[tokio::test]
    async fn test_single_row_failure_is_batch_zero() {
        let conn = RecordingConnection::failing_on("INSERT");
        let err = run(&conn, ["foo"], "Wow").await.unwrap_err();
        assert!(matches!(err, InsertError::Execution { batch: 0, .. }));
    }
}

/// Holds every `execute` for a moment and records peak concurrency
#[derive(Default)]
struct SlowConnection {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl Connection for SlowConnection {
    fn driver_name(&self) -> &str {
        "slow"
    }

    async fn execute(&self, _sql: &str) -> Result<StatementResult> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(StatementResult::with_affected_rows(1))
    }

    async fn query(&self, _sql: &str) -> Result<QueryResult> {
        Ok(QueryResult::empty())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

#[tokio::test]
async fn test_batches_are_dispatched_concurrently() {
    let conn = SlowConnection::default();
    let options = InsertOptions::new().with_batch_size(1);

    let outcome = insert(&conn, "test", ["foo"], vec!["a", "b", "c", "d"], &options)
        .await
        .unwrap();

    assert_eq!(outcome.affected_rows(), 4);
    assert_eq!(conn.peak.load(Ordering::SeqCst), 4);
}

mod round_trip_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_values_read_back_unchanged() {
        let conn = RecordingConnection::new();
        let rows = vec![
            vec!["alpha", "Bravo42"],
            vec!["O'Brien", r#"say "hi""#],
            vec![r"C:\temp\", "'; DROP TABLE test; --"],
        ];

        run(&conn, ["first", "second"], rows.clone()).await.unwrap();
        let result = conn.query("SELECT * FROM test;").await.unwrap();

        let read_back: Vec<Vec<String>> = result
            .rows
            .iter()
            .map(|row| row.values.iter().map(Value::to_string).collect())
            .collect();
        assert_eq!(read_back, rows);
        assert_eq!(
            result.rows[1].get_by_name("first").and_then(Value::as_str),
            Some("O'Brien")
        );
    }
}
