//! # Import Configuration Module
//!
//! This module defines configuration structures for sheet import,
//! including column layout, row concurrency and categorizer recovery settings.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::errors::{ImportError, ImportResult};

// Constants for import configuration
pub const DEFAULT_SKIP_COLUMNS: usize = 1;
pub const DEFAULT_MAX_SKIP_COLUMNS: usize = 5;
pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_CATEGORIZER_TIMEOUT_MS: u64 = 2000;
/// Upper bound for row concurrency
pub const MAX_CONCURRENCY: usize = 1024;

/// Recovery configuration for categorizer calls
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryConfig {
    /// Timeout for a single categorizer call in milliseconds
    pub categorizer_timeout_ms: u64,
    /// Consecutive failures before the circuit opens
    pub circuit_breaker_threshold: u32,
    /// Time the circuit stays open in seconds
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            categorizer_timeout_ms: DEFAULT_CATEGORIZER_TIMEOUT_MS,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60, // 1 minute
        }
    }
}

impl RecoveryConfig {
    pub fn categorizer_timeout(&self) -> Duration {
        Duration::from_millis(self.categorizer_timeout_ms)
    }
}

/// Configuration structure for sheet import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    /// Leading columns before the meal name column
    pub skip_columns: usize,
    /// Largest accepted `skip_columns` value
    pub max_skip_columns: usize,
    /// Maximum number of rows processed at the same time
    pub concurrency: usize,
    /// Categorizer failure containment
    pub recovery: RecoveryConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            skip_columns: DEFAULT_SKIP_COLUMNS,
            max_skip_columns: DEFAULT_MAX_SKIP_COLUMNS,
            concurrency: DEFAULT_CONCURRENCY,
            recovery: RecoveryConfig::default(),
        }
    }
}

impl ImportConfig {
    /// Validate import configuration parameters
    pub fn validate(&self) -> ImportResult<()> {
        if self.concurrency == 0 {
            return Err(ImportError::Config(
                "concurrency must be greater than 0".to_string(),
            ));
        }
        if self.concurrency > MAX_CONCURRENCY {
            return Err(ImportError::Config(format!(
                "concurrency {} exceeds maximum {}",
                self.concurrency, MAX_CONCURRENCY
            )));
        }
        if self.recovery.categorizer_timeout_ms == 0 {
            return Err(ImportError::Config(
                "categorizer_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.recovery.circuit_breaker_threshold == 0 {
            return Err(ImportError::Config(
                "circuit_breaker_threshold must be greater than 0".to_string(),
            ));
        }
        if self.skip_columns > self.max_skip_columns {
            return Err(ImportError::Config(format!(
                "skip_columns {} exceeds max_skip_columns {}",
                self.skip_columns, self.max_skip_columns
            )));
        }
        Ok(())
    }

    /// Resolve a caller-supplied skip column count.
    ///
    /// Negative values and values above `max_skip_columns` fall back to the
    /// configured `skip_columns` rather than failing the import.
    pub fn resolve_skip_columns(&self, requested: i64) -> usize {
        match usize::try_from(requested) {
            Ok(value) if value <= self.max_skip_columns => value,
            _ => {
                warn!(
                    requested,
                    max = self.max_skip_columns,
                    fallback = self.skip_columns,
                    "skip_columns out of range, using configured default"
                );
                self.skip_columns
            }
        }
    }
}

/// Process-level configuration read from the environment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppConfig {
    pub import: ImportConfig,
    /// Optional JSON unit table replacing the built-in one
    pub unit_table_path: Option<PathBuf>,
}

impl AppConfig {
    /// Build configuration from environment variables.
    ///
    /// Unset variables keep their defaults; set but unparsable ones are errors.
    pub fn from_env() -> ImportResult<Self> {
        let defaults = ImportConfig::default();
        let import = ImportConfig {
            skip_columns: env_parse("IMPORT_SKIP_COLUMNS", defaults.skip_columns)?,
            max_skip_columns: env_parse("IMPORT_MAX_SKIP_COLUMNS", defaults.max_skip_columns)?,
            concurrency: env_parse("IMPORT_CONCURRENCY", defaults.concurrency)?,
            recovery: RecoveryConfig {
                categorizer_timeout_ms: env_parse(
                    "CATEGORIZER_TIMEOUT_MS",
                    defaults.recovery.categorizer_timeout_ms,
                )?,
                circuit_breaker_threshold: env_parse(
                    "CATEGORIZER_BREAKER_THRESHOLD",
                    defaults.recovery.circuit_breaker_threshold,
                )?,
                circuit_breaker_reset_secs: env_parse(
                    "CATEGORIZER_BREAKER_RESET_SECS",
                    defaults.recovery.circuit_breaker_reset_secs,
                )?,
            },
        };
        import.validate()?;

        let unit_table_path = env::var("UNIT_TABLE_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            import,
            unit_table_path,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> ImportResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ImportError::Config(format!("{key} has invalid value '{raw}'"))),
        Err(_) => Ok(default),
    }
}
