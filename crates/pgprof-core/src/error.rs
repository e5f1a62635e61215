//! Error types for pgprof

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pgprof operations
#[derive(Error, Debug)]
pub enum PgprofError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Lexical error: {0}")]
    Lexical(String),

    #[error("Plan error: {0}")]
    Plan(String),

    #[error("Failed to write {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Statement {index} failed: {source}")]
    Statement {
        index: usize,
        #[source]
        source: Box<PgprofError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PgprofError {
    /// Wrap an error with the 1-based index of the statement that produced it
    pub fn at_statement(self, index: usize) -> Self {
        Self::Statement {
            index,
            source: Box::new(self),
        }
    }

    /// Wrap an IO error with the path that was being written
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// True for failures reported by the database while running a statement
    pub fn is_execution_error(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Query(_) | Self::Timeout(_) => true,
            Self::Statement { source, .. } => source.is_execution_error(),
            _ => false,
        }
    }
}

/// Result type alias for pgprof operations
pub type Result<T> = std::result::Result<T, PgprofError>;
