//! pgprof: profile every statement of a SQL script with EXPLAIN ANALYZE
//!
//! ```text
//! pgprof --dsn "host=localhost user=app dbname=blog" --sql-file bench.sql \
//!        --statement-timeout-ms 30000
//! ```

mod config;
mod logging;
mod run;

use clap::Parser;
use pgprof_core::Connection;
use pgprof_driver_postgres::{PostgresConnection, TlsOptions};

use crate::config::{CliArgs, ProfileConfig};
use crate::logging::LoggingConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = ProfileConfig::from_args(CliArgs::parse())?;

    let _logging = logging::init(&LoggingConfig {
        default_filter: config.log_filter.clone(),
        json_log_dir: config.json_log.then(|| config.run_dir()),
    })?;

    let mut tls = TlsOptions::default();
    if let Some(ca_cert) = &config.ssl_root_cert {
        tls = tls.with_ca_cert(ca_cert);
    }
    let conn = PostgresConnection::connect_with_tls(&config.dsn, &tls).await?;

    let outcome = run::run_profile(&config, &conn).await;
    conn.close().await?;
    let report = outcome?;

    println!(
        "Wrote {} query plans to {}",
        report.plans,
        report.run_dir.display()
    );
    println!("Summary: {}", report.summary_path.display());
    Ok(())
}
