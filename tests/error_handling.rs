use fanbench::error::{self, RetryConfig};
use fanbench::BenchError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test]
async fn test_retry_async_eventually_succeeds() {
    static ATTEMPTS: AtomicUsize = AtomicUsize::new(0);
    let result = error::retry_async(
        || async {
            let a = ATTEMPTS.fetch_add(1, Ordering::SeqCst);
            if a < 2 {
                Err(BenchError::IoError(std::io::Error::new(std::io::ErrorKind::NotFound, "not yet")))
            } else {
                Ok(42u32)
            }
        },
        RetryConfig::fixed(5, Duration::from_millis(1)),
    )
    .await
    .expect("retry should succeed");
    assert_eq!(result, 42);
    assert_eq!(ATTEMPTS.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_async_stops_after_max_attempts() {
    static ATTEMPTS: AtomicUsize = AtomicUsize::new(0);
    let result: fanbench::Result<()> = error::retry_async(
        || async {
            ATTEMPTS.fetch_add(1, Ordering::SeqCst);
            Err(BenchError::IoError(std::io::Error::new(std::io::ErrorKind::NotFound, "missing")))
        },
        RetryConfig::fixed(4, Duration::from_millis(1)),
    )
    .await;
    assert!(matches!(result, Err(BenchError::IoError(_))));
    assert_eq!(ATTEMPTS.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_hash_mismatch_is_not_retried() {
    static ATTEMPTS: AtomicUsize = AtomicUsize::new(0);
    let result: fanbench::Result<()> = error::retry_async(
        || async {
            ATTEMPTS.fetch_add(1, Ordering::SeqCst);
            Err(BenchError::HashMismatch {
                expected: "aa".into(),
                actual: "bb".into(),
            })
        },
        RetryConfig::fixed(10, Duration::from_millis(1)),
    )
    .await;
    assert!(matches!(result, Err(BenchError::HashMismatch { .. })));
    assert_eq!(ATTEMPTS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_user_friendly_messages() {
    let denied = BenchError::IoError(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "x"));
    assert!(error::user_friendly_message(&denied).contains("--work-dir"));

    let msg = error::user_friendly_message(&BenchError::ConfigError("task count must be > 0".into()));
    assert!(msg.starts_with("Configuration error"));

    let msg = error::user_friendly_message(&BenchError::CancellationError("x".into()));
    assert!(msg.contains("cancelled"));
}
