//! Subcommand implementations

use anyhow::{Context, bail};
use clap::Args;
use comfy_table::{Table, presets::UTF8_FULL};
use pquery_core::{ConnectionConfig, DatabaseDriver, HealthStatus, ping_database};
use pquery_driver_mysql::MySqlDriver;
use pquery_insert::{DatabaseAdmin, InsertOptions, InsertOutcome, InsertPlan, ValueSpec};
use serde::Serialize;


/// Arguments for `pquery insert`
#[derive(Args, Debug)]
pub struct InsertArgs {
    /// Target table
    pub table: String,

    /// Column to insert into (repeatable, in order)
    #[arg(short, long = "column", required = true)]
    pub columns: Vec<String>,

    /// A value; with one column every value becomes its own row,
    /// with several columns the values form a single row
    #[arg(long = "value", conflicts_with = "rows")]
    pub values: Vec<String>,

    /// A comma-separated row (repeatable)
    #[arg(short, long = "row")]
    pub rows: Vec<String>,

    /// Emit INSERT IGNORE
    #[arg(long)]
    pub ignore: bool,

    /// Send values shaped like NAME() as SQL function calls
    #[arg(long)]
    pub detect_functions: bool,

    /// Rows per statement
    #[arg(long, default_value_t = pquery_insert::MAX_ROWS_PER_STATEMENT)]
    pub batch_size: usize,

    /// Print the statements instead of running them
    #[arg(long)]
    pub dry_run: bool,
}

impl InsertArgs {
    pub fn options(&self) -> InsertOptions {
        InsertOptions::new()
            .with_ignore_duplicates(self.ignore)
            .with_detect_sql_functions(self.detect_functions)
            .with_batch_size(self.batch_size)
    }

    pub fn value_spec(&self) -> ValueSpec {
        if self.rows.is_empty() {
            ValueSpec::from(self.values.clone())
        } else {
            ValueSpec::rows(self.rows.iter().map(|row| row.split(',').map(str::to_string)))
        }
    }

    pub fn plan(&self) -> anyhow::Result<InsertPlan> {
        Ok(InsertPlan::new(
            self.table.as_str(),
            self.columns.clone(),
            self.value_spec(),
            &self.options(),
        )?)
    }
}

pub async fn insert(config: &ConnectionConfig, args: InsertArgs) -> anyhow::Result<()> {
    let plan = args.plan()?;

    if args.dry_run {
        for statement in plan.statements() {
            println!("{}", statement);
        }
        return Ok(());
    }

    let conn = MySqlDriver::new()
        .connect(config)
        .await
        .context("failed to connect")?;
    let outcome = plan.execute(conn.as_ref()).await;
    conn.close().await?;

    match outcome? {
        InsertOutcome::Single(result) => match result.last_insert_id {
            Some(id) => println!("inserted 1 row (id {})", id),
            None => println!("inserted {} row(s)", result.affected_rows),
        },
        InsertOutcome::Batched(summary) => println!(
            "inserted {} of {} row(s) in {} statement(s)",
            summary.affected_rows, summary.rows, summary.statements
        ),
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct PingReport {
    pub status: HealthStatus,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

pub async fn ping(config: &ConnectionConfig, json: bool) -> anyhow::Result<()> {
    let conn = MySqlDriver::new()
        .connect(config)
        .await
        .context("failed to connect")?;
    let result = ping_database(conn.as_ref()).await;
    conn.close().await?;

    let report = PingReport {
        status: HealthStatus::from_ping(&result),
        latency_ms: result.as_ref().ok().map(|d| d.as_millis() as u64),
        error: result.as_ref().err().map(|e| e.to_string()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match (&report.latency_ms, &report.error) {
            (Some(ms), _) => println!("{:?} ({} ms)", report.status, ms),
            (None, Some(err)) => println!("{:?}: {}", report.status, err),
            (None, None) => println!("{:?}", report.status),
        }
    }

    if !report.status.is_usable() {
        bail!("server is unreachable");
    }
    Ok(())
}

pub async fn databases(config: &ConnectionConfig, json: bool) -> anyhow::Result<()> {
    let conn = MySqlDriver::new()
        .connect(config)
        .await
        .context("failed to connect")?;
    let names = conn.list_databases().await;
    conn.close().await?;
    let names = names?;

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        println!("{}", database_table(&names));
    }
    Ok(())
}

pub fn database_table(names: &[String]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Database"]);
    for name in names {
        table.add_row(vec![name.as_str()]);
    }
    table
}
