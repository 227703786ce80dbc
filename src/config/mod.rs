//! Configuration management module
//!
//! Handles loading, saving, and validation of the workload parameters
//! used by each benchmark mode.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::error::RetryConfig;
use crate::{BenchError, Result, APP_NAME, CONFIG_FILE};

pub mod persistence;

use crate::models::RunReport;

/// Benchmark configuration structure containing all workload parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Directory where I/O units create their temporary files
    pub work_dir: PathBuf,
    /// CPU-bound workload parameters
    pub cpu: CpuWorkload,
    /// Light I/O workload parameters
    pub io: IoWorkload,
    /// Heavy I/O workload parameters
    pub heavy: HeavyWorkload,
    /// Simulated network call latency range
    pub network: NetworkDelay,
    /// Retry policy for reading files back
    pub retry: ReadRetry,
    /// Whether to keep temporary files after testing
    pub keep_temp_files: bool,
    /// Append every run report to the history file
    pub save_history: bool,
}

/// Parameters for the floating point work unit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuWorkload {
    /// Loop iterations per task
    pub iterations: usize,
}

/// Parameters for the light I/O work unit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IoWorkload {
    /// Files written and read back per task
    pub file_count: usize,
    /// Simulated network calls per task
    pub network_calls: usize,
}

/// Parameters for the heavy I/O work unit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeavyWorkload {
    /// Files generated per task
    pub file_count: usize,
    /// Size of each generated file before compression, in MiB
    pub file_size_mb: usize,
    /// Simulated network calls per task
    pub network_calls: usize,
    /// Pause between writing and reading files, in milliseconds
    pub settle_ms: u64,
}

/// Uniform latency range for simulated network calls (`min_ms..max_ms`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkDelay {
    pub min_ms: u64,
    pub max_ms: u64,
}

/// Fixed-backoff retry policy for file reads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadRetry {
    /// Total read attempts per file
    pub attempts: usize,
    /// Sleep between attempts, in milliseconds
    pub backoff_ms: u64,
}

/// Benchmark mode variants for the three work unit types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BenchmarkMode {
    /// Floating point work on the blocking pool
    Cpu,
    /// Small file writes/reads with simulated network delay
    Io,
    /// Large files with hashing, compression and verification
    IoHeavy,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir(),
            cpu: CpuWorkload::default(),
            io: IoWorkload::default(),
            heavy: HeavyWorkload::default(),
            network: NetworkDelay::default(),
            retry: ReadRetry::default(),
            keep_temp_files: false,
            save_history: false,
        }
    }
}

impl Default for CpuWorkload {
    fn default() -> Self {
        Self { iterations: 10_000_000 }
    }
}

impl Default for IoWorkload {
    fn default() -> Self {
        Self {
            file_count: 50,
            network_calls: 20,
        }
    }
}

impl Default for HeavyWorkload {
    fn default() -> Self {
        Self {
            file_count: 10,
            file_size_mb: 2,
            network_calls: 5,
            settle_ms: 5,
        }
    }
}

impl Default for NetworkDelay {
    fn default() -> Self {
        Self { min_ms: 10, max_ms: 30 }
    }
}

impl Default for ReadRetry {
    fn default() -> Self {
        Self {
            attempts: 10,
            backoff_ms: 20,
        }
    }
}

impl ReadRetry {
    /// Convert into the generic retry policy
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig::fixed(self.attempts, Duration::from_millis(self.backoff_ms))
    }
}

impl NetworkDelay {
    /// Draw one simulated call latency
    pub fn sample(&self) -> Duration {
        use rand::Rng;

        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..self.max_ms))
    }
}

impl BenchmarkConfig {
    /// Create a new benchmark configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.work_dir.exists() {
            return Err(BenchError::ConfigError(
                format!("Work directory does not exist: {}", self.work_dir.display())
            ));
        }

        if !self.work_dir.is_dir() {
            return Err(BenchError::ConfigError(
                format!("Work directory is not a directory: {}", self.work_dir.display())
            ));
        }

        if self.cpu.iterations == 0 {
            return Err(BenchError::ConfigError(
                "CPU iterations must be greater than 0".to_string()
            ));
        }

        if self.io.file_count == 0 || self.heavy.file_count == 0 {
            return Err(BenchError::ConfigError(
                "File count must be greater than 0".to_string()
            ));
        }

        const MAX_FILE_SIZE_MB: usize = 64;
        if self.heavy.file_size_mb == 0 || self.heavy.file_size_mb > MAX_FILE_SIZE_MB {
            return Err(BenchError::ConfigError(
                format!("Heavy file size must be between 1 and {} MiB", MAX_FILE_SIZE_MB)
            ));
        }

        if self.network.min_ms > self.network.max_ms {
            return Err(BenchError::ConfigError(
                format!("Network delay range is inverted: {}ms..{}ms",
                    self.network.min_ms, self.network.max_ms)
            ));
        }

        if self.retry.attempts == 0 {
            return Err(BenchError::ConfigError(
                "Read retry attempts must be greater than 0".to_string()
            ));
        }

        Ok(())
    }

    /// Set the directory for temporary files
    pub fn with_work_dir(mut self, path: PathBuf) -> Self {
        self.work_dir = path;
        self
    }

    /// Set CPU loop iterations per task
    pub fn with_cpu_iterations(mut self, iterations: usize) -> Self {
        self.cpu.iterations = iterations;
        self
    }

    /// Set the light I/O file and network call counts
    pub fn with_io_workload(mut self, file_count: usize, network_calls: usize) -> Self {
        self.io.file_count = file_count;
        self.io.network_calls = network_calls;
        self
    }

    /// Set the heavy I/O file count, size and network call count
    pub fn with_heavy_workload(mut self, file_count: usize, file_size_mb: usize, network_calls: usize) -> Self {
        self.heavy.file_count = file_count;
        self.heavy.file_size_mb = file_size_mb;
        self.heavy.network_calls = network_calls;
        self
    }

    /// Set the simulated network delay range
    pub fn with_network_delay(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.network = NetworkDelay { min_ms, max_ms };
        self
    }

    /// Set the read retry policy
    pub fn with_read_retry(mut self, attempts: usize, backoff_ms: u64) -> Self {
        self.retry = ReadRetry { attempts, backoff_ms };
        self
    }

    /// Set whether to keep temporary files
    pub fn with_keep_temp_files(mut self, keep: bool) -> Self {
        self.keep_temp_files = keep;
        self
    }

    /// Load configuration from an explicit path
    /// Returns default configuration if file doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            log::debug!("no config file at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)
            .map_err(|e| BenchError::ConfigError(
                format!("Failed to read config file {}: {}", config_path.display(), e)
            ))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| BenchError::ConfigError(
                format!("Failed to parse config file {}: {}", config_path.display(), e)
            ))?;

        log::info!("loaded configuration from {}", config_path.display());
        Ok(config)
    }

    /// Save configuration to the given path, creating parent directories
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| BenchError::ConfigError(
                    format!("Failed to create config directory {}: {}", parent.display(), e)
                ))?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content)
            .map_err(|e| BenchError::ConfigError(
                format!("Failed to write config file {}: {}", config_path.display(), e)
            ))?;

        Ok(())
    }

    /// Get the standard configuration file path
    /// Uses $CONFIG_HOME/fanbench/fanbench.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| BenchError::ConfigError(
                "Unable to determine config directory".to_string()
            ))?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

impl BenchmarkMode {
    /// Check if this mode touches the filesystem
    pub fn uses_files(&self) -> bool {
        matches!(self, BenchmarkMode::Io | BenchmarkMode::IoHeavy)
    }

    /// Keyword accepted on the command line and used in reports
    pub fn keyword(&self) -> &'static str {
        match self {
            BenchmarkMode::Cpu => "cpu",
            BenchmarkMode::Io => "io",
            BenchmarkMode::IoHeavy => "io-heavy",
        }
    }

    /// Get a human-readable description of the mode
    pub fn description(&self) -> &'static str {
        match self {
            BenchmarkMode::Cpu => "CPU-bound (floating point)",
            BenchmarkMode::Io => "I/O-bound (files + network simulation)",
            BenchmarkMode::IoHeavy => "Heavy I/O-bound (large files + compression + hashing)",
        }
    }
}

impl fmt::Display for BenchmarkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for BenchmarkMode {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cpu" => Ok(BenchmarkMode::Cpu),
            "io" => Ok(BenchmarkMode::Io),
            "heavy" | "io-heavy" => Ok(BenchmarkMode::IoHeavy),
            other => Err(BenchError::ConfigError(format!("Unknown benchmark mode: {}", other))),
        }
    }
}

/// Configuration manager for handling config and run history persistence
///
/// The history location is only resolved when history is actually used.
pub struct ConfigManager {
    config_path: PathBuf,
    /// An explicitly named config file must exist
    config_required: bool,
    history_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create a manager using the standard file locations
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_path: BenchmarkConfig::config_file_path()?,
            config_required: false,
            history_path: None,
        })
    }

    /// Create a manager with an explicit config path, which must exist when loading
    pub fn with_config_path(config_path: PathBuf) -> Self {
        Self {
            config_path,
            config_required: true,
            history_path: None,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from file or return default
    pub fn load_config(&self) -> Result<BenchmarkConfig> {
        if self.config_required && !self.config_path.exists() {
            return Err(BenchError::ConfigError(format!(
                "config file {} does not exist",
                self.config_path.display()
            )));
        }
        BenchmarkConfig::load_from(&self.config_path)
    }

    /// Save configuration to file
    pub fn save_config(&self, config: &BenchmarkConfig) -> Result<()> {
        config.save_to(&self.config_path)?;
        log::info!("wrote configuration to {}", self.config_path.display());
        Ok(())
    }

    fn history(&self) -> Result<persistence::HistoryStorage> {
        match &self.history_path {
            Some(path) => Ok(persistence::HistoryStorage::at(path.clone())),
            None => persistence::HistoryStorage::new(),
        }
    }

    /// Save a run report to history
    pub fn save_report(&self, report: RunReport) -> Result<()> {
        self.history()?.append_report(report)
    }

    /// Get the most recent reports (up to limit), newest first
    pub fn get_recent_reports(&self, limit: usize) -> Result<Vec<RunReport>> {
        let mut reports = self.history()?.load_reports()?;
        reports.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        reports.truncate(limit);
        Ok(reports)
    }

    /// Delete every saved report
    pub fn clear_history(&self) -> Result<()> {
        self.history()?.clear()
    }
}
