//! Connection trait

use crate::{QueryResult, Result, StatementResult};
use async_trait::async_trait;

/// A database connection the insert builder dispatches statements to.
///
/// Statements arrive as complete SQL text. Implementations must be safe to
/// call concurrently: one logical insert may issue several `execute` calls
/// at once against the same connection.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "mysql")
    fn driver_name(&self) -> &str;

    /// Execute a statement that modifies data (INSERT/UPDATE/DELETE/DDL)
    async fn execute(&self, sql: &str) -> Result<StatementResult>;

    /// Execute a query that returns rows (SELECT/SHOW)
    async fn query(&self, sql: &str) -> Result<QueryResult>;

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}
