//! EXPLAIN ANALYZE execution
//!
//! [`ExplainRunner`] drives a list of statements through a
//! [`pgprof_core::Connection`] and produces one [`QueryResult`] and one plan
//! artifact per statement.

mod executor;

pub use executor::{EXPLAIN_PREFIX, ExplainRunner, QueryResult, RunOptions, explain_sql};
