//! Run configuration
//!
//! Command-line flags (with `PGPROF_*` environment fallbacks) layered over an
//! optional TOML file. A flag that is given always wins over the file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::Parser;
use pgprof_core::{PgprofError, Result};
use serde::Deserialize;

pub const DEFAULT_OUT_DIR: &str = "monitoring/query_runs";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Run every statement of a SQL file through EXPLAIN ANALYZE and store the plans
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "pgprof", version, about)]
pub struct CliArgs {
    /// PostgreSQL DSN (`host=... user=...` or `postgresql://...`)
    #[arg(long, env = "PGPROF_DSN", hide_env_values = true)]
    pub dsn: Option<String>,

    /// SQL script to profile
    #[arg(long, env = "PGPROF_SQL_FILE")]
    pub sql_file: Option<PathBuf>,

    /// Root directory for run output [default: monitoring/query_runs]
    #[arg(long, env = "PGPROF_OUT_DIR")]
    pub out_dir: Option<PathBuf>,

    /// Session statement_timeout in milliseconds
    #[arg(long)]
    pub statement_timeout_ms: Option<u64>,

    /// Run identifier, also the name of the run directory [default: UTC timestamp]
    #[arg(long)]
    pub run_id: Option<String>,

    /// Fail on unterminated quotes, comments or dollar-quoted bodies
    #[arg(long)]
    pub strict: bool,

    /// Log filter used when RUST_LOG is unset [default: info]
    #[arg(long)]
    pub log_filter: Option<String>,

    /// Also write a JSON log of the run to `<run dir>/pgprof.log`
    #[arg(long)]
    pub json_log: bool,

    /// PEM root certificate used to verify the server
    #[arg(long, env = "PGPROF_SSL_ROOT_CERT")]
    pub ssl_root_cert: Option<PathBuf>,

    /// TOML file with defaults for any of the settings above
    #[arg(long, env = "PGPROF_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Settings read from a `--config` file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub dsn: Option<String>,
    pub sql_file: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub statement_timeout_ms: Option<u64>,
    pub run_id: Option<String>,
    pub strict: Option<bool>,
    pub log_filter: Option<String>,
    pub json_log: Option<bool>,
    pub ssl_root_cert: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PgprofError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| PgprofError::Configuration(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Fully resolved settings for one profiling run
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileConfig {
    pub dsn: String,
    pub sql_file: PathBuf,
    pub out_dir: PathBuf,
    pub statement_timeout_ms: Option<u64>,
    pub run_id: String,
    pub strict: bool,
    pub log_filter: String,
    pub json_log: bool,
    pub ssl_root_cert: Option<PathBuf>,
}

impl ProfileConfig {
    /// Resolve flags over the `--config` file (if any)
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file, Utc::now())
    }

    /// Layer flags over file values, fill defaults, then validate
    pub fn merge(args: CliArgs, file: FileConfig, now: DateTime<Utc>) -> Result<Self> {
        let config = Self {
            dsn: args
                .dsn
                .or(file.dsn)
                .ok_or_else(|| PgprofError::Configuration("a DSN is required (--dsn)".into()))?,
            sql_file: args.sql_file.or(file.sql_file).ok_or_else(|| {
                PgprofError::Configuration("a SQL file is required (--sql-file)".into())
            })?,
            out_dir: args
                .out_dir
                .or(file.out_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR)),
            statement_timeout_ms: args.statement_timeout_ms.or(file.statement_timeout_ms),
            run_id: args
                .run_id
                .or(file.run_id)
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| default_run_id(now)),
            strict: args.strict || file.strict.unwrap_or(false),
            log_filter: args
                .log_filter
                .or(file.log_filter)
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            json_log: args.json_log || file.json_log.unwrap_or(false),
            ssl_root_cert: args.ssl_root_cert.or(file.ssl_root_cert),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.dsn.trim().is_empty() {
            return Err(PgprofError::Configuration("DSN is empty".into()));
        }
        if self.run_id.contains(['/', '\\']) || self.run_id == "." || self.run_id == ".." {
            return Err(PgprofError::Configuration(format!(
                "run id {:?} must be a plain directory name",
                self.run_id
            )));
        }
        Ok(())
    }

    /// Directory receiving this run's plans, summary and log
    pub fn run_dir(&self) -> PathBuf {
        self.out_dir.join(&self.run_id)
    }
}

/// UTC timestamp run id, e.g. `20260314T091500Z`
pub fn default_run_id(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

#[cfg(test)]
mod tests;
