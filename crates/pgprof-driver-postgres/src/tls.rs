//! PostgreSQL TLS support
//!
//! Builds the `native-tls` connector used when the DSN's `sslmode` is anything
//! other than `disable`.

use native_tls::{Certificate, TlsConnector as NativeTlsConnector, TlsConnectorBuilder};
use pgprof_core::PgprofError;
use postgres_native_tls::MakeTlsConnector;
use std::fs;
use std::path::{Path, PathBuf};
use tokio_postgres::Config;
use tokio_postgres::config::SslMode;
use tracing::{debug, warn};

/// Error types for TLS setup
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    /// Failed to read CA certificate
    #[error("Failed to load CA certificate from {path}: {source}")]
    CaCertLoadFailed {
        path: String,
        source: std::io::Error,
    },

    /// Invalid CA certificate format
    #[error("Invalid CA certificate format: {0}")]
    InvalidCaCert(String),

    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    ConfigurationError(String),
}

impl From<TlsError> for PgprofError {
    fn from(err: TlsError) -> Self {
        PgprofError::Connection(err.to_string())
    }
}

/// TLS settings that cannot be expressed in a `tokio-postgres` DSN
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsOptions {
    /// PEM root certificate; when set the server certificate and host name are verified
    pub ca_cert: Option<PathBuf>,
}

impl TlsOptions {
    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }
}

/// Whether the connection config asks for an encrypted channel
pub fn requires_tls(config: &Config) -> bool {
    !matches!(config.get_ssl_mode(), SslMode::Disable)
}

/// Build a TLS connector for `tokio-postgres`.
///
/// Without a CA certificate the server certificate is not verified, which
/// matches libpq's `sslmode=require`.
pub fn build_tls_connector(options: &TlsOptions) -> Result<MakeTlsConnector, TlsError> {
    let mut builder = NativeTlsConnector::builder();

    match &options.ca_cert {
        Some(path) => apply_ca_cert(&mut builder, path)?,
        None => {
            warn!("no CA certificate configured, server certificate will not be verified");
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
    }

    let connector = builder
        .build()
        .map_err(|e| TlsError::ConfigurationError(e.to_string()))?;

    debug!("TLS connector built");
    Ok(MakeTlsConnector::new(connector))
}

fn apply_ca_cert(builder: &mut TlsConnectorBuilder, path: &Path) -> Result<(), TlsError> {
    debug!(path = %path.display(), "loading CA certificate");

    let pem_data = fs::read(path).map_err(|e| TlsError::CaCertLoadFailed {
        path: path.display().to_string(),
        source: e,
    })?;
    let cert =
        Certificate::from_pem(&pem_data).map_err(|e| TlsError::InvalidCaCert(e.to_string()))?;

    builder.add_root_certificate(cert);
    Ok(())
}
