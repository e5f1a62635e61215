//! Sequential EXPLAIN ANALYZE execution
//!
//! Profiles statements one at a time over a single connection. Each statement
//! is explained, timed, distilled and persisted before the next one starts.

use std::time::Instant;

use pgprof_analyzer::distill_json;
use pgprof_core::{Connection, PgprofError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use tracing::Instrument;

use crate::artifacts::ArtifactStore;
use crate::splitter::Statement;

/// Options prepended to every profiled statement
pub const EXPLAIN_PREFIX: &str = "EXPLAIN (ANALYZE, BUFFERS, VERBOSE, FORMAT JSON)";

/// Wraps a statement in the EXPLAIN form the runner submits
pub fn explain_sql(statement: &str) -> String {
    format!("{} {}", EXPLAIN_PREFIX, statement)
}

/// Configuration options for a profiling run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Session statement timeout in milliseconds, applied once before the first statement
    pub statement_timeout_ms: Option<u64>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set statement timeout in milliseconds
    pub fn with_statement_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.statement_timeout_ms = Some(timeout_ms);
        self
    }
}

/// Outcome of profiling one statement; also one line of the run summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// 1-based position of the statement in the script
    pub query_index: usize,
    /// Statement text as submitted (without the EXPLAIN prefix)
    pub query: String,
    /// File name of the plan artifact, relative to the run directory
    pub plan_file: String,
    pub planning_time_ms: Option<f64>,
    pub execution_time_ms: Option<f64>,
    /// Wall-clock round trip measured by the client
    pub client_time_ms: f64,
    pub top_actual_rows: Option<Number>,
}

/// Runs `EXPLAIN ANALYZE` for each statement and writes the plan artifacts
#[derive(Debug, Clone)]
pub struct ExplainRunner {
    artifacts: ArtifactStore,
    options: RunOptions,
}

impl ExplainRunner {
    pub fn new(artifacts: ArtifactStore, options: RunOptions) -> Self {
        Self { artifacts, options }
    }

    /// Profile statements in order.
    ///
    /// Stops at the first failure and returns it wrapped with the statement
    /// index. Plan artifacts written before the failure stay on disk.
    pub async fn run<I>(&self, conn: &dyn Connection, statements: I) -> Result<Vec<QueryResult>>
    where
        I: IntoIterator<Item = Statement>,
    {
        if let Some(timeout_ms) = self.options.statement_timeout_ms {
            conn.set_statement_timeout(timeout_ms).await?;
        }

        let run_start = Instant::now();
        let mut results = Vec::new();

        for statement in statements {
            let span = tracing::info_span!("statement", index = statement.index);
            let result = self
                .run_statement(conn, &statement)
                .instrument(span)
                .await
                .map_err(|e| e.at_statement(statement.index))?;
            results.push(result);
        }

        tracing::info!(
            statements = results.len(),
            elapsed_ms = run_start.elapsed().as_secs_f64() * 1000.0,
            "profiling run complete"
        );

        Ok(results)
    }

    async fn run_statement(
        &self,
        conn: &dyn Connection,
        statement: &Statement,
    ) -> Result<QueryResult> {
        tracing::debug!(sql = %preview(&statement.text), "explaining statement");

        let sql = explain_sql(&statement.text);
        let start = Instant::now();
        let rows = conn.query(&sql).await?;
        let client_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        let value = rows
            .first_value()
            .ok_or_else(|| PgprofError::Query("EXPLAIN returned no rows".into()))?;
        let document = value.to_json().ok_or_else(|| {
            PgprofError::Plan(format!(
                "EXPLAIN output is not a JSON document: {}",
                preview(&value.to_string())
            ))
        })?;

        let plan = distill_json(&document)?;
        let plan_file = self.artifacts.write_plan(statement.index, &plan)?;

        tracing::info!(
            plan_file = %plan_file,
            nodes = plan.node_count(),
            client_time_ms,
            execution_time_ms = ?plan.execution_time_ms,
            "statement profiled"
        );

        Ok(QueryResult {
            query_index: statement.index,
            query: statement.text.clone(),
            plan_file,
            planning_time_ms: plan.planning_time_ms,
            execution_time_ms: plan.execution_time_ms,
            client_time_ms,
            top_actual_rows: plan.top_actual_rows,
        })
    }
}

/// First line of a statement, shortened for log output
fn preview(sql: &str) -> String {
    const MAX_CHARS: usize = 80;

    let line = sql.lines().next().unwrap_or_default();
    if line.chars().count() > MAX_CHARS || sql.contains('\n') {
        let head: String = line.chars().take(MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        line.to_string()
    }
}
