//! # Import Error Types Module
//!
//! This module defines the error types used throughout the import pipeline.
//! Per-cell and per-row problems never surface here: parsers fall back to
//! defaults and rows are skipped. Only pipeline-wide failures are errors.

use std::time::Duration;

/// Errors that abort an import or a configuration step
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    Config(String),
    /// Unit synonym table could not be loaded or failed validation
    #[error("Unit table error: {0}")]
    UnitTable(String),
    /// The grid source could not be read
    #[error("Grid error: {0}")]
    Grid(String),
    /// A row worker task failed to complete
    #[error("Worker error: {0}")]
    Worker(String),
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for fallible pipeline operations
pub type ImportResult<T> = Result<T, ImportError>;

/// Failures reported by (or around) the product categorizer
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CategorizerError {
    /// The categorizer backend could not answer
    #[error("Categorizer unavailable: {0}")]
    Unavailable(String),
    /// The call did not complete within the configured timeout
    #[error("Categorizer timed out after {0:?}")]
    Timeout(Duration),
    /// Calls are suspended after repeated failures
    #[error("Categorizer circuit is open")]
    CircuitOpen,
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Grid(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ImportError {
    fn from(err: tokio::task::JoinError) -> Self {
        ImportError::Worker(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ImportError::Config("concurrency must be greater than 0".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: concurrency must be greater than 0"
        );

        let err = CategorizerError::Timeout(Duration::from_millis(250));
        assert!(err.to_string().contains("timed out"));
        assert_eq!(
            CategorizerError::CircuitOpen.to_string(),
            "Categorizer circuit is open"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ImportError = io.into();
        assert!(matches!(err, ImportError::Io(_)));
    }
}
