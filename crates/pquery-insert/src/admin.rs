//! Database and table housekeeping on top of any [`Connection`]
//!
//! Names passed here are identifiers chosen by the caller and are placed into
//! the statement unquoted, the same way insert column names are. Only the
//! `select` filter value goes through literal escaping.

use async_trait::async_trait;
use pquery_core::{Connection, QueryResult, Result};

use crate::render::render_value;
use crate::value::SqlValue;


pub(crate) fn create_database_sql(name: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {};", name)
}

pub(crate) fn drop_database_sql(name: &str) -> String {
    format!("DROP DATABASE IF EXISTS {};", name)
}

pub(crate) fn drop_table_sql(name: &str) -> String {
    format!("DROP TABLE IF EXISTS {};", name)
}

pub(crate) fn use_database_sql(name: &str) -> String {
    format!("USE {};", name)
}

pub(crate) fn select_sql(selector: &str, table: &str, filter: Option<(&str, &SqlValue)>) -> String {
    match filter {
        Some((column, value)) => format!(
            "SELECT {} FROM {} WHERE {} = {};",
            selector,
            table,
            column,
            render_value(value)
        ),
        None => format!("SELECT {} FROM {};", selector, table),
    }
}

/// Administrative helpers available on every connection.
#[async_trait]
pub trait DatabaseAdmin: Connection {
    /// Create `name` unless it already exists
    async fn create_database(&self, name: &str) -> Result<()> {
        tracing::info!(database = %name, "creating database");
        self.execute(&create_database_sql(name)).await.map(|_| ())
    }

    /// Drop `name` if it exists
    async fn drop_database(&self, name: &str) -> Result<()> {
        tracing::info!(database = %name, "dropping database");
        self.execute(&drop_database_sql(name)).await.map(|_| ())
    }

    /// Drop table `name` in the current database if it exists
    async fn drop_table(&self, name: &str) -> Result<()> {
        tracing::info!(table = %name, "dropping table");
        self.execute(&drop_table_sql(name)).await.map(|_| ())
    }

    /// Every database visible to the connected user
    async fn list_databases(&self) -> Result<Vec<String>> {
        let result = self.query("SHOW DATABASES;").await?;
        Ok(result.first_column_strings())
    }

    /// The selected database, or `None` when no database is selected
    async fn current_database(&self) -> Result<Option<String>> {
        let result = self.query("SELECT DATABASE();").await?;
        Ok(result.first_column_strings().into_iter().next())
    }

    /// Tables in the selected database
    async fn list_tables(&self) -> Result<Vec<String>> {
        let result = self.query("SHOW TABLES;").await?;
        Ok(result.first_column_strings())
    }

    /// Switch the connection's default database
    async fn use_database(&self, name: &str) -> Result<()> {
        tracing::debug!(database = %name, "switching database");
        self.execute(&use_database_sql(name)).await.map(|_| ())
    }

    /// `SELECT <selector> FROM <table> [WHERE <column> = <value>]`
    async fn select(
        &self,
        selector: &str,
        table: &str,
        filter: Option<(&str, SqlValue)>,
    ) -> Result<QueryResult> {
        let sql = select_sql(selector, table, filter.as_ref().map(|(c, v)| (*c, v)));
        self.query(&sql).await
    }
}

impl<T: Connection + ?Sized> DatabaseAdmin for T {}
