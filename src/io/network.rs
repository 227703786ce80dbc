use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::sleep;

use crate::config::NetworkDelay;

/// Stand-in for a remote call: just waits
pub async fn simulate_network_delay(delay: Duration) {
    sleep(delay).await;
}

/// Start `count` simulated calls with latencies drawn from `range`
///
/// Dropping the returned set aborts any call still in flight.
pub fn spawn_network_calls(count: usize, range: &NetworkDelay) -> JoinSet<Duration> {
    let mut calls = JoinSet::new();
    for _ in 0..count {
        let delay = range.sample();
        calls.spawn(async move {
            simulate_network_delay(delay).await;
            delay
        });
    }
    calls
}

/// Wait for all calls; returns the total simulated latency
pub async fn join_network_calls(mut calls: JoinSet<Duration>) -> crate::Result<Duration> {
    let mut total = Duration::ZERO;
    while let Some(delay) = calls.join_next().await {
        total += delay?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_calls_run_concurrently() {
        let range = NetworkDelay { min_ms: 20, max_ms: 20 };
        let start = Instant::now();

        let calls = spawn_network_calls(10, &range);
        let total = join_network_calls(calls).await.unwrap();

        assert_eq!(total, Duration::from_millis(200));
        // Ten 20ms calls in parallel finish well before 200ms
        assert!(start.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_zero_calls() {
        let calls = spawn_network_calls(0, &NetworkDelay::default());
        assert_eq!(join_network_calls(calls).await.unwrap(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_dropping_set_aborts_calls() {
        let range = NetworkDelay { min_ms: 5_000, max_ms: 5_000 };
        let calls = spawn_network_calls(3, &range);
        assert_eq!(calls.len(), 3);
        drop(calls);
    }
}
