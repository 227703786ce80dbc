//! Benchmark request and result data models
//!
//! Contains the run request, per-task result slots, and the aggregate
//! report with task timing statistics.

use crate::config::BenchmarkMode;
use crate::{BenchError, Result, DEFAULT_TASK_COUNT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Upper bound on tasks in a single run
pub const MAX_TASK_COUNT: usize = 1000;

/// What to run: which work unit, and how many copies of it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkRequest {
    pub mode: BenchmarkMode,
    pub task_count: usize,
}

impl Default for BenchmarkRequest {
    fn default() -> Self {
        Self {
            mode: BenchmarkMode::Cpu,
            task_count: DEFAULT_TASK_COUNT,
        }
    }
}

impl BenchmarkRequest {
    pub fn new(mode: BenchmarkMode, task_count: usize) -> Self {
        Self { mode, task_count }
    }

    /// Check the task count is within bounds
    pub fn validate(&self) -> Result<()> {
        if self.task_count == 0 {
            return Err(BenchError::ConfigError(
                "Task count must be greater than 0".to_string(),
            ));
        }
        if self.task_count > MAX_TASK_COUNT {
            return Err(BenchError::ConfigError(format!(
                "Too many tasks: {} (max: {})",
                self.task_count, MAX_TASK_COUNT
            )));
        }
        Ok(())
    }
}

/// What a work unit produces on success
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskOutcome {
    /// Files written and read back (zero for CPU units)
    pub files_processed: usize,
    /// Bytes read back and verified (zero for CPU units)
    pub bytes_processed: u64,
    /// Result of the floating point loop (CPU units only)
    pub checksum: Option<f64>,
}

/// One result slot per task, indexed by task number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Zero-based task index
    pub index: usize,
    /// Wall-clock time from unit start to unit end
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
    /// Files processed, for I/O modes
    pub files_processed: Option<usize>,
    /// Bytes processed, for I/O modes
    pub bytes_processed: Option<u64>,
    /// Failure message, if the unit failed
    pub error: Option<String>,
}

impl TaskResult {
    /// Build a slot from a finished unit
    pub fn from_outcome(index: usize, mode: BenchmarkMode, elapsed: Duration, outcome: Result<TaskOutcome>) -> Self {
        match outcome {
            Ok(outcome) => Self {
                index,
                elapsed,
                files_processed: mode.uses_files().then_some(outcome.files_processed),
                bytes_processed: mode.uses_files().then_some(outcome.bytes_processed),
                error: None,
            },
            Err(err) => Self::failed(index, elapsed, err.to_string()),
        }
    }

    /// Build a failed slot
    pub fn failed(index: usize, elapsed: Duration, error: String) -> Self {
        Self {
            index,
            elapsed,
            files_processed: None,
            bytes_processed: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate statistics over the successful tasks of a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub succeeded: usize,
    pub failed: usize,
    #[serde(with = "duration_serde")]
    pub min: Duration,
    #[serde(with = "duration_serde")]
    pub avg: Duration,
    #[serde(with = "duration_serde")]
    pub max: Duration,
    /// Task time percentiles (50th, 95th, 99th)
    #[serde(with = "percentiles_serde")]
    pub percentiles: BTreeMap<u8, Duration>,
    pub total_files: usize,
    pub total_bytes: u64,
}

impl RunStats {
    /// Compute stats from result slots; failed slots only count as failures
    pub fn from_results(results: &[TaskResult]) -> Self {
        let successful: Vec<&TaskResult> = results.iter().filter(|r| r.is_success()).collect();
        let failed = results.len() - successful.len();

        if successful.is_empty() {
            return Self {
                failed,
                ..Self::default()
            };
        }

        let mut sorted: Vec<Duration> = successful.iter().map(|r| r.elapsed).collect();
        sorted.sort();
        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let avg_nanos: u128 =
            sorted.iter().map(|d| d.as_nanos()).sum::<u128>() / sorted.len() as u128;
        let avg = Duration::from_nanos(avg_nanos as u64);

        let mut percentiles = BTreeMap::new();
        percentiles.insert(50, sorted[sorted.len() * 50 / 100]);
        percentiles.insert(95, sorted[sorted.len() * 95 / 100]);
        percentiles.insert(99, sorted[sorted.len() * 99 / 100]);

        Self {
            succeeded: successful.len(),
            failed,
            min,
            avg,
            max,
            percentiles,
            total_files: successful.iter().filter_map(|r| r.files_processed).sum(),
            total_bytes: successful.iter().filter_map(|r| r.bytes_processed).sum(),
        }
    }

    pub fn p50(&self) -> Duration {
        self.percentiles.get(&50).copied().unwrap_or(self.avg)
    }

    pub fn p95(&self) -> Duration {
        self.percentiles.get(&95).copied().unwrap_or(self.max)
    }

    pub fn p99(&self) -> Duration {
        self.percentiles.get(&99).copied().unwrap_or(self.max)
    }
}

/// Complete run report: request, per-task slots, and aggregate timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// When the run finished
    pub timestamp: DateTime<Utc>,
    pub request: BenchmarkRequest,
    /// Wall-clock time of the whole batch, spawn to last join
    #[serde(with = "duration_serde")]
    pub total_elapsed: Duration,
    /// Exactly `request.task_count` slots, ordered by index
    pub results: Vec<TaskResult>,
    pub stats: RunStats,
}

impl RunReport {
    pub fn new(request: BenchmarkRequest, total_elapsed: Duration, results: Vec<TaskResult>) -> Self {
        let stats = RunStats::from_results(&results);
        Self {
            timestamp: Utc::now(),
            request,
            total_elapsed,
            results,
            stats,
        }
    }

    /// Longest individual task time, successful or not
    pub fn longest_task(&self) -> Duration {
        self.results
            .iter()
            .map(|r| r.elapsed)
            .max()
            .unwrap_or_default()
    }

    /// One-line summary for history listings
    pub fn summary(&self) -> String {
        format!(
            "{} - {} x{} - {} total - {} avg - {} failed",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.request.mode,
            self.request.task_count,
            crate::util::format_duration(self.total_elapsed),
            crate::util::format_duration(self.stats.avg),
            self.stats.failed,
        )
    }
}

// Durations are stored as nanoseconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_nanos() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = u64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos))
    }
}

mod percentiles_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;
    use std::time::Duration;

    pub fn serialize<S>(
        percentiles: &BTreeMap<u8, Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let nanos_map: BTreeMap<u8, u64> = percentiles
            .iter()
            .map(|(&k, &v)| (k, v.as_nanos() as u64))
            .collect();
        nanos_map.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<u8, Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos_map = BTreeMap::<u8, u64>::deserialize(deserializer)?;
        Ok(nanos_map
            .into_iter()
            .map(|(k, v)| (k, Duration::from_nanos(v)))
            .collect())
    }
}
