//! Light I/O work unit
//!
//! Writes a batch of small text files concurrently, reads them back while
//! simulated network calls are in flight, then deletes them.

use tokio::task::JoinSet;

use crate::bench::{join_all, CancelToken};
use crate::config::BenchmarkConfig;
use crate::error::RetryConfig;
use crate::io::{join_network_calls, read_with_retry, spawn_network_calls, TaskFiles};
use crate::models::TaskOutcome;
use crate::{BenchError, Result};

/// Run one light I/O unit; files are removed whether it succeeds, fails or is cancelled
pub async fn run_unit(task_id: &str, config: &BenchmarkConfig, cancel: &CancelToken) -> Result<TaskOutcome> {
    let mut files = TaskFiles::new(&config.work_dir, task_id, "txt", config.io.file_count);
    if config.keep_temp_files {
        files.keep_on_drop();
    }

    let outcome = exercise(&files, config, cancel).await;
    files.cleanup().await;
    outcome
}

async fn exercise(files: &TaskFiles, config: &BenchmarkConfig, cancel: &CancelToken) -> Result<TaskOutcome> {
    create_files(files, cancel).await?;
    cancel.check()?;

    let network = spawn_network_calls(config.io.network_calls, &config.network);
    let (contents, network) = tokio::join!(
        read_files(files, config.retry.to_retry_config(), cancel),
        cancel.guard(join_network_calls(network))
    );
    let contents = contents?;
    let simulated = network?;
    log::trace!("{} simulated calls took {:?} in total", config.io.network_calls, simulated);

    Ok(TaskOutcome {
        files_processed: contents.len(),
        bytes_processed: contents.iter().map(|c| c.len() as u64).sum(),
        checksum: None,
    })
}

async fn create_files(files: &TaskFiles, cancel: &CancelToken) -> Result<()> {
    let mut writers = JoinSet::new();
    for i in 0..files.count() {
        let path = files.path(i);
        let cancel = cancel.clone();
        writers.spawn(async move {
            cancel.check()?;
            let content = format!(
                "Test file {} content with some data: {}",
                i,
                rand::random::<f64>()
            );
            tokio::fs::write(path, content).await?;
            Ok::<(), BenchError>(())
        });
    }

    join_all(writers).await?;
    Ok(())
}

async fn read_files(files: &TaskFiles, retry: RetryConfig, cancel: &CancelToken) -> Result<Vec<Vec<u8>>> {
    let mut readers = JoinSet::new();
    for i in 0..files.count() {
        let path = files.path(i);
        let retry = retry.clone();
        let cancel = cancel.clone();
        readers.spawn(async move { cancel.guard(read_with_retry(&path, retry)).await });
    }

    join_all(readers).await
}
