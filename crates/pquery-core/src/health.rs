//! Connection health checks
//!
//! A ping runs a minimal query and times it; the latency is then classified
//! into a [`HealthStatus`].
//!
//! ```ignore
//! use pquery_core::health::{ping_database, HealthStatus};
//!
//! let latency = ping_database(conn.as_ref()).await?;
//! println!("{:?}", HealthStatus::from_latency(latency));
//! ```

use crate::Connection;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;


const PING_QUERY: &str = "SELECT 1";

/// Result of a ping operation
pub type PingResult = std::result::Result<Duration, PingError>;

/// Error that can occur during a ping operation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PingError {
    #[error("Connection is closed")]
    ConnectionClosed,
    #[error("Ping query failed: {0}")]
    QueryFailed(String),
}

/// Ping a database connection and return the round-trip time.
pub async fn ping_database(conn: &dyn Connection) -> PingResult {
    if conn.is_closed() {
        return Err(PingError::ConnectionClosed);
    }

    let start = Instant::now();
    match conn.query(PING_QUERY).await {
        Ok(_) => {
            let latency = start.elapsed();
            tracing::trace!(driver = conn.driver_name(), latency_ms = latency.as_millis() as u64, "ping ok");
            Ok(latency)
        }
        Err(e) => Err(PingError::QueryFailed(e.to_string())),
    }
}

/// Health status of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Connection is healthy with good latency
    #[default]
    Healthy,
    /// Connection is working but latency is elevated
    Degraded,
    /// Connection is unhealthy (very high latency or errors)
    Unhealthy,
}

impl HealthStatus {
    /// Classify health status from latency using default thresholds
    /// (healthy up to 100ms, degraded up to 500ms).
    pub fn from_latency(latency: Duration) -> Self {
        Self::from_latency_with_thresholds(latency, &HealthThresholds::default())
    }

    /// Classify health status from latency using custom thresholds.
    pub fn from_latency_with_thresholds(latency: Duration, thresholds: &HealthThresholds) -> Self {
        if latency <= thresholds.healthy_threshold {
            HealthStatus::Healthy
        } else if latency <= thresholds.degraded_threshold {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        }
    }

    /// Classify the outcome of a ping; any error is unhealthy.
    pub fn from_ping(result: &PingResult) -> Self {
        match result {
            Ok(latency) => Self::from_latency(*latency),
            Err(_) => HealthStatus::Unhealthy,
        }
    }

    /// Both `Healthy` and `Degraded` are usable.
    pub fn is_usable(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

/// Thresholds for health status classification
#[derive(Debug, Clone)]
pub struct HealthThresholds {
    /// Maximum latency considered healthy
    pub healthy_threshold: Duration,
    /// Maximum latency considered degraded (above this is unhealthy)
    pub degraded_threshold: Duration,
}

impl HealthThresholds {
    /// Create new thresholds from millisecond values. The degraded bound is
    /// never lower than the healthy bound.
    pub fn new(healthy_ms: u64, degraded_ms: u64) -> Self {
        Self {
            healthy_threshold: Duration::from_millis(healthy_ms),
            degraded_threshold: Duration::from_millis(degraded_ms.max(healthy_ms)),
        }
    }
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self::new(100, 500)
    }
}
