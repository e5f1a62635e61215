//! One profiling run over an open connection
//!
//! Reads and splits the script, profiles every statement, then writes the
//! summary. A failed run leaves its plan files in place and writes no summary.

use std::path::PathBuf;

use anyhow::Context;
use pgprof_core::Connection;
use pgprof_query::{
    ArtifactStore, ExplainRunner, RunOptions, Statement, number_statements,
    split_statements_strict, statements, write_summary,
};

use crate::config::ProfileConfig;

/// What a successful run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub run_dir: PathBuf,
    pub plans: usize,
    pub summary_path: PathBuf,
}

/// Read the SQL file and split it, leniently unless `strict` is set
pub fn load_script(config: &ProfileConfig) -> anyhow::Result<Vec<Statement>> {
    let sql = std::fs::read_to_string(&config.sql_file)
        .with_context(|| format!("Failed to read SQL file {:?}", config.sql_file))?;
    let script = if config.strict {
        number_statements(split_statements_strict(&sql)?).collect()
    } else {
        statements(&sql).collect()
    };
    Ok(script)
}

/// Profile the configured script on `conn`.
///
/// The caller owns the connection and closes it whatever the outcome.
pub async fn run_profile(
    config: &ProfileConfig,
    conn: &dyn Connection,
) -> anyhow::Result<RunReport> {
    let script = load_script(config)?;
    let run_dir = config.run_dir();

    tracing::info!(
        run_id = %config.run_id,
        sql_file = %config.sql_file.display(),
        statements = script.len(),
        "starting profiling run"
    );

    let store = ArtifactStore::create(&run_dir)?;

    let mut options = RunOptions::new();
    if let Some(timeout_ms) = config.statement_timeout_ms {
        options = options.with_statement_timeout_ms(timeout_ms);
    }

    let results = ExplainRunner::new(store, options)
        .run(conn, script)
        .await
        .context("Profiling run aborted")?;

    let summary_path = write_summary(&run_dir, &config.run_id, &results)?;

    Ok(RunReport {
        run_dir,
        plans: results.len(),
        summary_path,
    })
}

#[cfg(test)]
mod tests;
