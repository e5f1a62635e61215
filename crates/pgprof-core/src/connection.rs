//! Connection trait

use crate::{Result, ResultSet, StatementResult};
use async_trait::async_trait;

/// A live database session.
///
/// The profiler drives a single connection sequentially; implementations do
/// not need to support concurrent callers, only `Send + Sync` so the session
/// can be shared behind a reference across await points.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute a statement that does not return rows (SET, DDL, DML)
    async fn execute(&self, sql: &str) -> Result<StatementResult>;

    /// Execute a statement that returns rows
    async fn query(&self, sql: &str) -> Result<ResultSet>;

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;

    /// Apply a session-wide statement timeout in milliseconds.
    ///
    /// The default issues PostgreSQL's `SET statement_timeout`.
    async fn set_statement_timeout(&self, timeout_ms: u64) -> Result<()> {
        tracing::debug!(timeout_ms, "applying session statement timeout");
        self.execute(&format!("SET statement_timeout TO {}", timeout_ms))
            .await?;
        Ok(())
    }
}
