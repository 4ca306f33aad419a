//! Database driver trait and connection configuration

use crate::{Connection, PqueryError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Connection lifecycle for a database backend.
///
/// `connect` hands out a live [`Connection`]; disconnecting is
/// [`Connection::close`]. `test_connection` is the credential check: it
/// connects, pings and closes again.
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Driver identifier (e.g., "mysql")
    fn name(&self) -> &'static str;

    /// Port used when the configuration leaves it at 0
    fn default_port(&self) -> Option<u16> {
        None
    }

    /// Open a connection
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;

    /// Verify that the configuration can reach the server
    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()> {
        let conn = self.connect(config).await?;
        let ping = crate::ping_database(conn.as_ref()).await;
        conn.close().await?;
        ping.map(|latency| {
            tracing::debug!(driver = self.name(), latency_ms = latency.as_millis() as u64, "connection test passed");
        })
        .map_err(|e| PqueryError::Connection(e.to_string()))
    }
}

/// Connection configuration
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Host address
    pub host: String,
    /// Port number (0 for the driver default)
    pub port: u16,
    /// Database to select after connecting
    pub database: Option<String>,
    /// Username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Additional connection parameters
    pub params: HashMap<String, String>,
}

impl ConnectionConfig {
    /// Create a configuration pointing at `host:port`
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            ..Self::default()
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// `PQUERY_HOST`, `PQUERY_PORT`, `PQUERY_DATABASE`, `PQUERY_USER` and
    /// `PQUERY_PASSWORD` are consulted; the credentials fall back to the
    /// bare `USER` and `PASSWORD` variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PQUERY_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                PqueryError::Configuration(format!("invalid PQUERY_PORT '{}': {}", raw, e))
            })?,
            None => 0,
        };

        Ok(Self {
            host: lookup("PQUERY_HOST").unwrap_or_else(|| "localhost".to_string()),
            port,
            database: lookup("PQUERY_DATABASE"),
            username: lookup("PQUERY_USER").or_else(|| lookup("USER")),
            password: lookup("PQUERY_PASSWORD").or_else(|| lookup("PASSWORD")),
            params: HashMap::new(),
        })
    }

    /// Set the database name
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the credentials
    pub fn with_credentials(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    /// Set a connection parameter
    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Get a string parameter
    pub fn get_string(&self, key: &str) -> Option<String> {
        if let Some(val) = self.params.get(key) {
            return Some(val.clone());
        }
        match key {
            "host" => Some(self.host.clone()).filter(|h| !h.is_empty()),
            "database" => self.database.clone(),
            "username" | "user" => self.username.clone(),
            "password" => self.password.clone(),
            _ => None,
        }
    }

    /// Resolve the port, falling back to `default` when unset
    pub fn port_or(&self, default: u16) -> u16 {
        if self.port > 0 { self.port } else { default }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_prefers_prefixed_credentials() {
        let config = ConnectionConfig::from_lookup(lookup_from(&[
            ("PQUERY_USER", "app"),
            ("USER", "shell-user"),
            ("PASSWORD", "secret"),
            ("PQUERY_PORT", "3307"),
        ]))
        .unwrap();

        assert_eq!(config.username.as_deref(), Some("app"));
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port_or(3306), 3307);
    }

    #[test]
    fn test_from_lookup_rejects_bad_port() {
        let err = ConnectionConfig::from_lookup(lookup_from(&[("PQUERY_PORT", "abc")])).unwrap_err();
        assert!(matches!(err, PqueryError::Configuration(_)));
    }

    #[test]
    fn test_get_string_checks_params_first() {
        let config = ConnectionConfig::new("db.internal", 0)
            .with_credentials("root", None)
            .with_param("host", "override");

        assert_eq!(config.get_string("host").as_deref(), Some("override"));
        assert_eq!(config.get_string("user").as_deref(), Some("root"));
        assert_eq!(config.get_string("password"), None);
        assert_eq!(config.port_or(3306), 3306);
    }

    mod test_connection_tests {
        use super::*;
        use pretty_assertions::assert_eq;
        use crate::{QueryResult, StatementResult};
        use std::sync::atomic::{AtomicBool, Ordering};

        struct StubConnection {
            reachable: bool,
            closed: Arc<AtomicBool>,
        }

        #[async_trait]
        impl Connection for StubConnection {
            fn driver_name(&self) -> &str {
                "stub"
            }

            async fn execute(&self, _sql: &str) -> Result<StatementResult> {
                Ok(StatementResult::default())
            }

            async fn query(&self, _sql: &str) -> Result<QueryResult> {
                if self.reachable {
                    Ok(QueryResult::empty())
                } else {
                    Err(PqueryError::Query("Access denied".into()))
                }
            }

            async fn close(&self) -> Result<()> {
                self.closed.store(true, Ordering::SeqCst);
                Ok(())
            }

            fn is_closed(&self) -> bool {
                self.closed.load(Ordering::SeqCst)
            }
        }

        struct StubDriver {
            reachable: bool,
            closed: Arc<AtomicBool>,
        }

        #[async_trait]
        impl DatabaseDriver for StubDriver {
            fn name(&self) -> &'static str {
                "stub"
            }

            async fn connect(&self, _config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
                Ok(Arc::new(StubConnection {
                    reachable: self.reachable,
                    closed: self.closed.clone(),
                }))
            }
        }

        #[tokio::test]
        async fn test_credential_check_closes_after_success() {
            let closed = Arc::new(AtomicBool::new(false));
            let driver = StubDriver { reachable: true, closed: closed.clone() };

            driver.test_connection(&ConnectionConfig::default()).await.unwrap();
            assert!(closed.load(Ordering::SeqCst));
            assert_eq!(driver.default_port(), None);
        }

        #[tokio::test]
        async fn test_credential_check_failure_is_a_connection_error() {
            let closed = Arc::new(AtomicBool::new(false));
            let driver = StubDriver { reachable: false, closed: closed.clone() };

            let err = driver.test_connection(&ConnectionConfig::default()).await.unwrap_err();
            assert!(matches!(err, PqueryError::Connection(msg) if msg.contains("Access denied")));
            assert!(closed.load(Ordering::SeqCst));
        }
    }
}
