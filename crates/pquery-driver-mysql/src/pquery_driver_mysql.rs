//! MySQL/MariaDB driver implementation

mod connection;
mod convert;
mod driver;

pub use connection::MySqlConnection;
pub use driver::MySqlDriver;
