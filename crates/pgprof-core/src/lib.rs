//! pgprof core - shared abstractions for the query profiling harness
//!
//! This crate provides the pieces every other pgprof crate depends on:
//!
//! - `Connection` - Trait for a live database session
//! - `PgprofError` - The error taxonomy shared by the splitter, runner and drivers
//! - Result-set types (`Value`, `Row`, `ColumnMeta`, `ResultSet`)

mod connection;
mod error;
mod types;

pub use connection::*;
pub use error::*;
pub use types::*;
