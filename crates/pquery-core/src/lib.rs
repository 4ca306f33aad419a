//! pquery core - shared abstractions for the insert builder and its drivers
//!
//! This crate defines the pieces every other pquery crate depends on:
//!
//! - `Connection` - the statement-execution collaborator
//! - `DatabaseDriver` - connection lifecycle (connect, test, disconnect)
//! - `ConnectionConfig` - connection settings, optionally read from the environment
//! - `ping_database` / `HealthStatus` - lightweight health checks
//! - Common types like `Value`, `Row`, `QueryResult` and `StatementResult`

mod connection;
mod driver;
mod error;
pub mod health;
mod types;

pub use connection::*;
pub use driver::*;
pub use error::*;
pub use health::{HealthStatus, HealthThresholds, PingError, PingResult, ping_database};
pub use types::*;
