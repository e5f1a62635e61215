//! PostgreSQL driver implementation

mod connection;
mod tls;

pub use connection::{PostgresConnection, describe_config};
pub use tls::{TlsError, TlsOptions, build_tls_connector, requires_tls};
