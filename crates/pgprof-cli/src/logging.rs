//! Logging setup for the profiler binary
//!
//! A human-readable stderr layer is always installed. With `--json-log` a
//! second layer writes JSON lines to `pgprof.log` inside the run directory.
//! `RUST_LOG` takes precedence over the configured filter.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE_NAME: &str = "pgprof.log";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub default_filter: String,
    /// Directory for the JSON log file; `None` disables it
    pub json_log_dir: Option<PathBuf>,
}

/// Keeps the non-blocking file writer alive; drop it to flush
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Initialize the global subscriber
pub fn init(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let mut layers = Vec::new();

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter(&config.default_filter))
        .boxed();
    layers.push(console_layer);

    let mut file_guard = None;
    if let Some(dir) = &config.json_log_dir {
        std::fs::create_dir_all(dir)?;
        let file_appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        file_guard = Some(guard);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking)
            .with_filter(env_filter(&config.default_filter))
            .boxed();
        layers.push(json_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::debug!(
        filter = %config.default_filter,
        json_log = config.json_log_dir.is_some(),
        "logging initialized"
    );

    Ok(LoggingGuard { _file: file_guard })
}
