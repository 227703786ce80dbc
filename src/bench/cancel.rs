//! Cooperative cancellation for work units
//!
//! Units are never dropped mid-flight. They poll a [`CancelToken`] between
//! phases and race only side-effect-free waits (reads, sleeps, simulated
//! network calls) against it, so temp files are always cleaned up after
//! every writer has finished.

use std::future::Future;

use tokio::sync::watch;

use crate::{BenchError, Result};

/// Sending half, held by the runner
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl CancelSource {
    pub fn cancel(&self) {
        // No receivers left means the unit already finished
        let _ = self.tx.send(true);
    }
}

/// Receiving half, cloned into each unit and its subtasks
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> (CancelSource, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (CancelSource { tx }, CancelToken { rx })
    }

    /// A token that is never cancelled
    pub fn never() -> Self {
        Self::new().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Fail with a cancellation error if cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(BenchError::CancellationError("task cancelled".to_string()))
        } else {
            Ok(())
        }
    }

    /// Resolves once cancellation is requested; pends forever if the source is dropped
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let changed = rx.wait_for(|cancelled| *cancelled).await.map(|_| ());
        if changed.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Race `fut` against cancellation, dropping it if cancellation wins
    ///
    /// Only for futures that leave nothing behind on disk.
    pub async fn guard<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(BenchError::CancellationError("task cancelled".to_string())),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_waiters() {
        let (source, token) = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());

        let waiter = tokio::spawn({
            let token = token.clone();
            async move { token.cancelled().await }
        });
        source.cancel();
        waiter.await.unwrap();

        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(BenchError::CancellationError(_))));
    }

    #[tokio::test]
    async fn test_guard_drops_slow_future() {
        let (source, token) = CancelToken::new();
        source.cancel();

        let result: Result<()> = token
            .guard(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(BenchError::CancellationError(_))));
    }

    #[tokio::test]
    async fn test_never_token_lets_work_finish() {
        let token = CancelToken::never();
        let value = token.guard(async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);

        let pending = tokio::time::timeout(Duration::from_millis(20), token.cancelled()).await;
        assert!(pending.is_err());
    }
}
