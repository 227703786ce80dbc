//! Heavy I/O work unit
//!
//! Each file is generated, hashed and gzip-compressed on the blocking pool,
//! stored as a JSON payload, then read back (with retry), decompressed and
//! checked against its stored hash. Simulated network calls overlap the
//! read phase.

use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::sleep;

use crate::bench::{join_all, CancelToken};
use crate::config::BenchmarkConfig;
use crate::error::RetryConfig;
use crate::io::{
    decode_payload, encode_payload, generate_content, join_network_calls, read_with_retry,
    spawn_network_calls, TaskFiles,
};
use crate::models::TaskOutcome;
use crate::{BenchError, Result};

/// Run one heavy I/O unit; files are removed whether it succeeds, fails or is cancelled
pub async fn run_unit(task_id: &str, config: &BenchmarkConfig, cancel: &CancelToken) -> Result<TaskOutcome> {
    let mut files = TaskFiles::new(&config.work_dir, task_id, "dat", config.heavy.file_count);
    if config.keep_temp_files {
        files.keep_on_drop();
    }

    let outcome = exercise(&files, task_id, config, cancel).await;
    files.cleanup().await;
    outcome
}

async fn exercise(
    files: &TaskFiles,
    task_id: &str,
    config: &BenchmarkConfig,
    cancel: &CancelToken,
) -> Result<TaskOutcome> {
    create_files(files, task_id, config.heavy.file_size_mb, cancel).await?;

    let settle = Duration::from_millis(config.heavy.settle_ms);
    cancel
        .guard(async {
            sleep(settle).await;
            Ok(())
        })
        .await?;

    let network = spawn_network_calls(config.heavy.network_calls, &config.network);
    let sizes = verify_files(files, config.retry.to_retry_config(), cancel).await?;
    cancel.guard(join_network_calls(network)).await?;

    Ok(TaskOutcome {
        files_processed: sizes.len(),
        bytes_processed: sizes.iter().sum(),
        checksum: None,
    })
}

async fn create_files(files: &TaskFiles, task_id: &str, size_mb: usize, cancel: &CancelToken) -> Result<()> {
    let mut writers = JoinSet::new();
    for i in 0..files.count() {
        let path = files.path(i);
        let seed = format!("{}_{}", task_id, i);
        let cancel = cancel.clone();
        writers.spawn_blocking(move || {
            cancel.check()?;
            let content = generate_content(size_mb, &seed);
            let raw = encode_payload(&content)?;
            // Last chance to skip the write once the payload is built
            cancel.check()?;
            std::fs::write(path, raw)?;
            Ok::<(), BenchError>(())
        });
    }

    join_all(writers).await?;
    Ok(())
}

/// Read every payload back and verify it; yields decompressed sizes
async fn verify_files(files: &TaskFiles, retry: RetryConfig, cancel: &CancelToken) -> Result<Vec<u64>> {
    let mut readers = JoinSet::new();
    for i in 0..files.count() {
        let path = files.path(i);
        let retry = retry.clone();
        let cancel = cancel.clone();
        readers.spawn(async move {
            let raw = cancel.guard(read_with_retry(&path, retry)).await?;
            let content = tokio::task::spawn_blocking(move || decode_payload(&raw)).await??;
            Ok::<u64, BenchError>(content.len() as u64)
        });
    }

    join_all(readers).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{compute_hash, FilePayload};
    use tempfile::tempdir;

    fn small_config(dir: &std::path::Path) -> BenchmarkConfig {
        BenchmarkConfig::default()
            .with_work_dir(dir.to_path_buf())
            .with_heavy_workload(2, 1, 2)
            .with_network_delay(1, 3)
    }

    #[tokio::test]
    async fn test_unit_verifies_every_file() {
        let dir = tempdir().unwrap();
        let config = small_config(dir.path());

        let outcome = run_unit("task0", &config, &CancelToken::never()).await.unwrap();
        assert_eq!(outcome.files_processed, 2);
        // Each file holds 1024 chunks of roughly 1 KiB
        assert!(outcome.bytes_processed > 2 * 900 * 1024);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_kept_payloads_match_their_hash() {
        let dir = tempdir().unwrap();
        let config = small_config(dir.path()).with_keep_temp_files(true);

        run_unit("task7", &config, &CancelToken::never()).await.unwrap();

        let files = TaskFiles::new(dir.path(), "task7", "dat", 2);
        for i in 0..2 {
            let raw = std::fs::read(files.path(i)).unwrap();
            let payload: FilePayload = serde_json::from_slice(&raw).unwrap();
            let content = decode_payload(&raw).unwrap();
            assert_eq!(compute_hash(content.as_bytes()), payload.hash);
            assert!(content.contains(&format!("seed task7_{}", i)));
        }
    }

    #[tokio::test]
    async fn test_cancel_during_writes_leaves_no_files() {
        let dir = tempdir().unwrap();
        let config = small_config(dir.path()).with_heavy_workload(4, 4, 1);
        let (source, cancel) = CancelToken::new();

        let unit = tokio::spawn(async move { run_unit("task0", &config, &cancel).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        source.cancel();

        let result = unit.await.unwrap();
        assert!(matches!(result, Err(BenchError::CancellationError(_))));

        // Writers are drained before cleanup, so nothing shows up later either
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        sleep(Duration::from_millis(300)).await;
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_writes_nothing() {
        let dir = tempdir().unwrap();
        let config = small_config(dir.path());
        let (source, cancel) = CancelToken::new();
        source.cancel();

        let result = run_unit("task0", &config, &cancel).await;
        assert!(matches!(result, Err(BenchError::CancellationError(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
