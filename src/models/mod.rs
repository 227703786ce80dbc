//! Data models module
//!
//! Contains the benchmark request, per-task result slots,
//! and aggregate run report definitions.

pub mod result;

// Re-export commonly used types
pub use result::{
    BenchmarkRequest,
    RunReport,
    RunStats,
    TaskOutcome,
    TaskResult,
    MAX_TASK_COUNT,
};
