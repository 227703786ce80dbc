//! fanbench - fan-out/fan-in benchmark driver
//!
//! Launches a batch of concurrent synthetic work units (CPU-bound floating
//! point, light file I/O, or heavy file I/O with hashing and compression),
//! waits for all of them, and reports per-task and aggregate timing.

use std::fmt;

// Public re-exports
pub mod bench;
pub mod cli;
pub mod config;
pub mod io;
pub mod models;
pub mod report;
pub mod util;

// Common error types
#[derive(Debug)]
pub enum BenchError {
    /// I/O operation failed
    IoError(std::io::Error),
    /// Configuration validation or parsing error
    ConfigError(String),
    /// Benchmark execution error
    BenchmarkError(String),
    /// Stored file payload could not be encoded or decoded
    PayloadError(String),
    /// Decompressed content does not match the stored hash
    HashMismatch { expected: String, actual: String },
    /// Run history persistence error
    PersistenceError(String),
    /// Worker management error
    WorkerError(String),
    /// Cancellation error
    CancellationError(String),
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchError::IoError(err) => write!(f, "I/O error: {}", err),
            BenchError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            BenchError::BenchmarkError(msg) => write!(f, "Benchmark error: {}", msg),
            BenchError::PayloadError(msg) => write!(f, "Payload error: {}", msg),
            BenchError::HashMismatch { expected, actual } => {
                write!(f, "Hash mismatch: expected {}, got {}", expected, actual)
            }
            BenchError::PersistenceError(msg) => write!(f, "Results persistence error: {}", msg),
            BenchError::WorkerError(msg) => write!(f, "Worker error: {}", msg),
            BenchError::CancellationError(msg) => write!(f, "Cancellation error: {}", msg),
        }
    }
}

impl std::error::Error for BenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BenchError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BenchError {
    fn from(err: std::io::Error) -> Self {
        BenchError::IoError(err)
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::PayloadError(format!("JSON error: {}", err))
    }
}

impl From<hex::FromHexError> for BenchError {
    fn from(err: hex::FromHexError) -> Self {
        BenchError::PayloadError(format!("hex decoding error: {}", err))
    }
}

impl From<toml::de::Error> for BenchError {
    fn from(err: toml::de::Error) -> Self {
        BenchError::ConfigError(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for BenchError {
    fn from(err: toml::ser::Error) -> Self {
        BenchError::ConfigError(format!("TOML serialization error: {}", err))
    }
}

impl From<tokio::task::JoinError> for BenchError {
    fn from(err: tokio::task::JoinError) -> Self {
        BenchError::WorkerError(format!("task join failed: {}", err))
    }
}

/// Result type alias for fanbench operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Error handling utilities
pub mod error {
    use super::{BenchError, Result};
    use std::time::Duration;
    use tokio::time::sleep;

    /// Retry configuration for transient operations
    #[derive(Debug, Clone)]
    pub struct RetryConfig {
        /// Maximum number of attempts, including the first one
        pub max_attempts: usize,
        /// Initial delay between retries
        pub initial_delay: Duration,
        /// Multiplier applied to the delay after each failed attempt
        pub backoff_multiplier: f64,
        /// Maximum delay between retries
        pub max_delay: Duration,
    }

    impl Default for RetryConfig {
        fn default() -> Self {
            Self::fixed(10, Duration::from_millis(20))
        }
    }

    impl RetryConfig {
        /// Retry with a constant delay between attempts
        pub fn fixed(max_attempts: usize, delay: Duration) -> Self {
            Self {
                max_attempts,
                initial_delay: delay,
                backoff_multiplier: 1.0,
                max_delay: delay,
            }
        }
    }

    /// Retry a fallible async operation, sleeping between attempts
    pub async fn retry_async<F, Fut, T>(operation: F, config: RetryConfig) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut delay = config.initial_delay;
        let mut last_error = None;

        for attempt in 0..config.max_attempts {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    let retryable = is_retryable_error(&err);
                    log::debug!("attempt {} of {} failed: {}", attempt + 1, config.max_attempts, err);
                    last_error = Some(err);

                    if !retryable {
                        break;
                    }

                    // Don't sleep after the last attempt
                    if attempt + 1 < config.max_attempts {
                        sleep(delay).await;
                        delay = std::cmp::min(
                            Duration::from_millis(
                                (delay.as_millis() as f64 * config.backoff_multiplier) as u64,
                            ),
                            config.max_delay,
                        );
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BenchError::BenchmarkError("Retry failed with no error".to_string())
        }))
    }

    /// Check if an error is retryable
    pub fn is_retryable_error(error: &BenchError) -> bool {
        match error {
            BenchError::IoError(io_err) => !matches!(
                io_err.kind(),
                std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::InvalidInput
            ),
            BenchError::WorkerError(_) => true,

            BenchError::HashMismatch { .. } => false,
            BenchError::ConfigError(_) => false,
            BenchError::CancellationError(_) => false,

            // A half-written payload parses badly until the writer finishes
            BenchError::PayloadError(_) => true,
            _ => true,
        }
    }

    /// Convert error to user-friendly message with suggestions
    pub fn user_friendly_message(error: &BenchError) -> String {
        match error {
            BenchError::IoError(io_err)
                if io_err.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                "Permission denied. Choose a writable work directory with --work-dir.".to_string()
            }
            BenchError::ConfigError(msg) => {
                format!("Configuration error: {}. Check your settings.", msg)
            }
            BenchError::PersistenceError(_) => {
                "Failed to save run history. Check disk space and permissions.".to_string()
            }
            BenchError::CancellationError(_) => "Operation was cancelled by user.".to_string(),
            _ => error.to_string(),
        }
    }
}

// Common types and constants
pub const APP_NAME: &str = "fanbench";
pub const CONFIG_FILE: &str = "fanbench.toml";
pub const HISTORY_FILE: &str = "history.json";
pub const TEMP_FILE_PREFIX: &str = "FANBENCH_TMP_";
pub const MAX_HISTORY: usize = 100;
pub const DEFAULT_TASK_COUNT: usize = 10;
