use std::path::{Path, PathBuf};

use crate::error::{retry_async, RetryConfig};
use crate::{BenchError, Result, TEMP_FILE_PREFIX};

/// The set of temporary files owned by one work unit
///
/// Names are `{prefix}{task_id}_{i}.{extension}` inside `dir`, so units
/// running in the same directory never touch each other's files. Anything
/// not removed by [`TaskFiles::cleanup`] is removed on drop.
pub struct TaskFiles {
    dir: PathBuf,
    task_id: String,
    extension: &'static str,
    count: usize,
    cleanup_on_drop: bool,
}

impl TaskFiles {
    pub fn new(dir: &Path, task_id: &str, extension: &'static str, count: usize) -> Self {
        Self {
            dir: dir.to_path_buf(),
            task_id: task_id.to_string(),
            extension,
            count,
            cleanup_on_drop: true,
        }
    }

    /// Disable automatic cleanup (for debugging)
    pub fn keep_on_drop(&mut self) {
        self.cleanup_on_drop = false;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Path of the `i`-th file
    pub fn path(&self, i: usize) -> PathBuf {
        self.dir.join(format!(
            "{}{}_{}.{}",
            TEMP_FILE_PREFIX, self.task_id, i, self.extension
        ))
    }

    /// Remove every file concurrently, ignoring individual failures
    pub async fn cleanup(&mut self) {
        if !self.cleanup_on_drop {
            return;
        }

        let handles: Vec<_> = (0..self.count)
            .map(|i| {
                let path = self.path(i);
                tokio::spawn(async move {
                    let _ = tokio::fs::remove_file(path).await;
                })
            })
            .collect();

        for handle in handles {
            let _ = handle.await;
        }

        self.cleanup_on_drop = false;
    }
}

impl Drop for TaskFiles {
    fn drop(&mut self) {
        if self.cleanup_on_drop {
            for i in 0..self.count {
                let _ = std::fs::remove_file(self.path(i));
            }
        }
    }
}

/// Read a whole file, retrying on failure with the given policy
pub async fn read_with_retry(path: &Path, retry: RetryConfig) -> Result<Vec<u8>> {
    retry_async(
        || {
            let path = path.to_path_buf();
            async move { Ok::<_, BenchError>(tokio::fs::read(path).await?) }
        },
        retry,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_file_names_are_task_scoped() {
        let dir = tempdir().unwrap();
        let a = TaskFiles::new(dir.path(), "task0", "txt", 2);
        let b = TaskFiles::new(dir.path(), "task1", "txt", 2);

        assert_ne!(a.path(0), b.path(0));
        let name = a.path(1).file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(name, format!("{}task0_1.txt", TEMP_FILE_PREFIX));
    }

    #[tokio::test]
    async fn test_cleanup_removes_files() {
        let dir = tempdir().unwrap();
        let mut files = TaskFiles::new(dir.path(), "t", "txt", 3);
        for i in 0..3 {
            tokio::fs::write(files.path(i), b"data").await.unwrap();
        }

        files.cleanup().await;
        for i in 0..3 {
            assert!(!files.path(i).exists());
        }
    }

    #[tokio::test]
    async fn test_drop_removes_files_unless_kept() {
        let dir = tempdir().unwrap();

        let files = TaskFiles::new(dir.path(), "dropped", "txt", 1);
        let dropped_path = files.path(0);
        std::fs::write(&dropped_path, b"x").unwrap();
        drop(files);
        assert!(!dropped_path.exists());

        let mut files = TaskFiles::new(dir.path(), "kept", "txt", 1);
        let kept_path = files.path(0);
        std::fs::write(&kept_path, b"x").unwrap();
        files.keep_on_drop();
        files.cleanup().await;
        drop(files);
        assert!(kept_path.exists());
    }

    #[tokio::test]
    async fn test_read_with_retry_waits_for_late_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("late.txt");

        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            // Rename so the reader never sees a half-written file
            let staging = writer_path.with_extension("partial");
            tokio::fs::write(&staging, b"arrived").await.unwrap();
            tokio::fs::rename(&staging, writer_path).await.unwrap();
        });

        let data = read_with_retry(&path, RetryConfig::fixed(20, Duration::from_millis(10)))
            .await
            .unwrap();
        assert_eq!(data, b"arrived");
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_read_with_retry_gives_up() {
        let dir = tempdir().unwrap();
        let result = read_with_retry(
            &dir.path().join("missing.txt"),
            RetryConfig::fixed(3, Duration::from_millis(1)),
        )
        .await;
        assert!(result.is_err());
    }
}
