//! MySQL connection implementation

use async_trait::async_trait;
use mysql_async::{
    Conn, Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, Row as MySqlRow, prelude::*,
};
use pquery_core::{
    ColumnMeta, Connection, PqueryError, QueryResult, Result, Row, StatementResult,
};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::convert::mysql_value_to_value;

/// Global Tokio runtime for MySQL operations.
///
/// mysql_async calls `tokio::spawn` internally for pool management and
/// networking, so every driver call is dispatched onto this runtime no matter
/// which executor is polling the connection.
fn get_mysql_runtime() -> &'static tokio::runtime::Runtime {
    static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("pquery-mysql-runtime")
            .build()
            .expect("Failed to create Tokio runtime for MySQL driver")
    })
}

/// MySQL connection wrapper
pub struct MySqlConnection {
    pool: Pool,
    closed: AtomicBool,
}

impl MySqlConnection {
    /// Connect to a MySQL database
    pub async fn connect(
        host: &str,
        port: u16,
        database: Option<&str>,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self> {
        tracing::info!(host = %host, port = %port, database = ?database, "connecting to MySQL database");

        let mut opts_builder = OptsBuilder::from_opts(Opts::default())
            .ip_or_hostname(host)
            .tcp_port(port);

        if let Some(db) = database {
            opts_builder = opts_builder.db_name(Some(db));
        }
        if let Some(u) = user {
            opts_builder = opts_builder.user(Some(u));
        }
        if let Some(p) = password {
            opts_builder = opts_builder.pass(Some(p));
        }

        // A single pooled connection keeps `USE` and `DATABASE()` consistent
        // across calls.
        let constraints = PoolConstraints::new(1, 1).ok_or_else(|| {
            PqueryError::Connection("Failed to configure MySQL pool constraints (min=1, max=1)".into())
        })?;

        let pool_opts = PoolOpts::default()
            .with_constraints(constraints)
            .with_reset_connection(false);
        opts_builder = opts_builder.pool_opts(pool_opts);

        let opts: Opts = opts_builder.into();

        let pool = get_mysql_runtime()
            .spawn(async move {
                let pool = Pool::new(opts);
                let _conn = pool.get_conn().await.map_err(|e| {
                    PqueryError::Connection(format!("Failed to connect to MySQL: {}", e))
                })?;
                Ok::<Pool, PqueryError>(pool)
            })
            .await
            .map_err(|e| {
                PqueryError::Connection(format!("MySQL connection task failed: {}", e))
            })??;

        tracing::info!(host = %host, port = %port, "MySQL connection established");
        Ok(Self {
            pool,
            closed: AtomicBool::new(false),
        })
    }

    /// Get a connection from the pool, dispatched on the MySQL Tokio runtime
    async fn get_conn(&self) -> Result<Conn> {
        if self.is_closed() {
            return Err(PqueryError::Connection("MySQL connection is closed".into()));
        }
        let pool = self.pool.clone();
        get_mysql_runtime()
            .spawn(async move { pool.get_conn().await })
            .await
            .map_err(|e| {
                PqueryError::Connection(format!("MySQL get_conn task failed: {}", e))
            })?
            .map_err(|e| PqueryError::Connection(format!("Failed to get MySQL connection: {}", e)))
    }
}

#[async_trait]
impl Connection for MySqlConnection {
    fn driver_name(&self) -> &str {
        "mysql"
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str) -> Result<StatementResult> {
        let mut conn = self.get_conn().await?;
        let sql = sql.to_string();

        let result = get_mysql_runtime()
            .spawn(async move {
                conn.query_drop(&sql).await.map_err(|e| {
                    PqueryError::Query(format!("Failed to execute statement: {}", e))
                })?;
                Ok::<StatementResult, PqueryError>(StatementResult {
                    affected_rows: conn.affected_rows(),
                    last_insert_id: conn.last_insert_id(),
                    warnings: conn.get_warnings(),
                })
            })
            .await
            .map_err(|e| PqueryError::Query(format!("MySQL execute task failed: {}", e)))??;

        tracing::debug!(
            affected_rows = result.affected_rows,
            last_insert_id = ?result.last_insert_id,
            warnings = result.warnings,
            "statement executed"
        );
        Ok(result)
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str) -> Result<QueryResult> {
        let start_time = std::time::Instant::now();
        let mut conn = self.get_conn().await?;
        let sql = sql.to_string();

        let (columns, rows) = get_mysql_runtime()
            .spawn(async move {
                let mysql_rows: Vec<MySqlRow> = conn.query(&sql).await.map_err(|e| {
                    PqueryError::Query(format!("Failed to execute query: {}", e))
                })?;

                let mut columns = Vec::new();
                let mut column_names = Vec::new();
                let mut column_types = Vec::new();

                if let Some(first_row) = mysql_rows.first() {
                    for (idx, col) in first_row.columns_ref().iter().enumerate() {
                        let name = col.name_str().to_string();
                        column_names.push(name.clone());
                        column_types.push(col.column_type());
                        columns.push(ColumnMeta {
                            name,
                            data_type: format!("{:?}", col.column_type()),
                            ordinal: idx,
                        });
                    }
                }

                let rows = mysql_rows
                    .into_iter()
                    .map(|mut mysql_row| {
                        let values = column_types
                            .iter()
                            .enumerate()
                            .map(|(idx, col_type)| {
                                let val = mysql_row.take(idx).unwrap_or(mysql_async::Value::NULL);
                                mysql_value_to_value(val, *col_type)
                            })
                            .collect();
                        Row::new(column_names.clone(), values)
                    })
                    .collect::<Vec<_>>();

                Ok::<(Vec<ColumnMeta>, Vec<Row>), PqueryError>((columns, rows))
            })
            .await
            .map_err(|e| PqueryError::Query(format!("MySQL query task failed: {}", e)))??;

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(
            row_count = rows.len(),
            execution_time_ms = execution_time_ms,
            "query executed successfully"
        );

        Ok(QueryResult {
            id: uuid::Uuid::new_v4(),
            columns,
            rows,
            execution_time_ms,
        })
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::info!("closing MySQL connection pool");
        let pool = self.pool.clone();
        get_mysql_runtime()
            .spawn(async move { pool.disconnect().await })
            .await
            .map_err(|e| {
                PqueryError::Connection(format!("MySQL close task failed: {}", e))
            })?
            .map_err(|e| {
                PqueryError::Connection(format!("Failed to close MySQL connection: {}", e))
            })?;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
