//! Benchmark engine module
//!
//! Contains the three work unit types and the runner that fans them
//! out across concurrent tasks and collects their results.

pub mod cancel;
pub mod cpu;
pub mod heavy;
pub mod light;
pub mod runner;

use tokio::task::JoinSet;

use crate::Result;

// Re-export commonly used types
pub use cancel::{CancelSource, CancelToken};
pub use runner::{BenchmarkRunner, CancelHandle, WorkerInfo, WorkerStatus};

/// Await every task in the set, then report the first error if any
///
/// Nothing is aborted or detached: a unit only cleans up its files after
/// all of its writers have returned.
pub(crate) async fn join_all<T: 'static>(mut set: JoinSet<Result<T>>) -> Result<Vec<T>> {
    let mut results = Vec::with_capacity(set.len());
    let mut first_error = None;

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(value)) => results.push(value),
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(e) => {
                first_error.get_or_insert(e.into());
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(results),
    }
}
