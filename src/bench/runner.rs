//! Benchmark runner
//!
//! Spawns one async task per work unit, tracks each unit's status, streams
//! finished results over a tokio channel, supports cooperative cancellation, and
//! collects exactly one result slot per task once every unit has finished.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::bench::{cpu, heavy, light, CancelSource, CancelToken};
use crate::config::{BenchmarkConfig, BenchmarkMode};
use crate::models::{BenchmarkRequest, RunReport, TaskOutcome, TaskResult};
use crate::{BenchError, Result};

/// Worker status for tracking individual unit states
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerStatus {
    /// Worker has not been started
    Idle,
    /// Worker is currently running its unit
    Running,
    /// Worker has completed successfully
    Completed,
    /// Worker failed with an error
    Failed(String),
    /// Worker was cancelled
    Cancelled,
}

/// Individual worker information
#[derive(Debug)]
pub struct WorkerInfo {
    /// Task index, also the result slot index
    pub id: usize,
    /// Current status of the worker
    pub status: WorkerStatus,
    /// Join handle for the worker task
    pub handle: Option<JoinHandle<TaskResult>>,
    /// Cancellation source for stopping the worker
    pub cancel: Option<CancelSource>,
}

impl WorkerInfo {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            status: WorkerStatus::Idle,
            handle: None,
            cancel: None,
        }
    }

    /// Check if the worker is active (running)
    pub fn is_active(&self) -> bool {
        matches!(self.status, WorkerStatus::Running)
    }

    /// Check if the worker is finished (success, failure or cancellation)
    pub fn is_completed(&self) -> bool {
        matches!(self.status, WorkerStatus::Completed | WorkerStatus::Failed(_) | WorkerStatus::Cancelled)
    }
}

/// Fans a request out over concurrent work units
pub struct BenchmarkRunner {
    config: Arc<BenchmarkConfig>,
    request: BenchmarkRequest,
    workers: Arc<Mutex<Vec<WorkerInfo>>>,
    start_time: Option<Instant>,
}

impl BenchmarkRunner {
    /// Create a runner after validating the config and the request
    pub fn new(config: BenchmarkConfig, request: BenchmarkRequest) -> Result<Self> {
        config.validate()?;
        request.validate()?;

        Ok(Self {
            config: Arc::new(config),
            request,
            workers: Arc::new(Mutex::new(Vec::new())),
            start_time: None,
        })
    }

    /// Run the whole batch and return the report
    pub async fn run(&mut self, events: Option<mpsc::Sender<TaskResult>>) -> Result<RunReport> {
        self.start(events).await?;
        self.wait_for_completion().await
    }

    /// Spawn `task_count` units; each finished result is also sent on `events`
    pub async fn start(&mut self, events: Option<mpsc::Sender<TaskResult>>) -> Result<()> {
        let mut workers = self.workers.lock().await;
        if workers.iter().any(|w| w.is_active()) {
            return Err(BenchError::WorkerError("Benchmark already running".to_string()));
        }
        workers.clear();

        log::info!(
            "starting {} benchmark with {} tasks",
            self.request.mode, self.request.task_count
        );
        self.start_time = Some(Instant::now());

        for index in 0..self.request.task_count {
            let (source, token) = CancelToken::new();
            let mut worker = WorkerInfo::new(index);
            worker.handle = Some(self.spawn_unit(index, events.clone(), token));
            worker.cancel = Some(source);
            worker.status = WorkerStatus::Running;
            workers.push(worker);
        }

        Ok(())
    }

    fn spawn_unit(
        &self,
        index: usize,
        events: Option<mpsc::Sender<TaskResult>>,
        cancel: CancelToken,
    ) -> JoinHandle<TaskResult> {
        let config = Arc::clone(&self.config);
        let mode = self.request.mode;

        tokio::spawn(async move {
            let task_id = format!("task{}", index);
            let started = Instant::now();

            // Units watch the token themselves and clean up before returning
            let outcome = match run_mode(mode, &task_id, &config, &cancel).await {
                Err(BenchError::CancellationError(_)) => {
                    Err(BenchError::CancellationError(format!("Task {} cancelled", index + 1)))
                }
                outcome => outcome,
            };

            if let Err(e) = &outcome {
                log::warn!("task {} failed: {}", index + 1, e);
            }

            let result = TaskResult::from_outcome(index, mode, started.elapsed(), outcome);
            if let Some(events) = events {
                let _ = events.send(result.clone()).await;
            }
            result
        })
    }

    /// Signal every running worker to stop
    pub async fn cancel_all(&self) {
        self.cancel_handle().cancel_all().await;
    }

    /// A cloneable handle that can cancel this run from another task
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            workers: Arc::clone(&self.workers),
        }
    }

    /// Wait for all workers and build the report
    ///
    /// Every task yields a slot, in index order; failed, cancelled and
    /// panicked units get a slot carrying their error.
    pub async fn wait_for_completion(&mut self) -> Result<RunReport> {
        let start_time = self.start_time.ok_or_else(|| {
            BenchError::WorkerError("Benchmark has not been started".to_string())
        })?;

        // Take the handles out so cancel_all can still lock while we wait
        let handles: Vec<(usize, Option<JoinHandle<TaskResult>>)> = {
            let mut workers = self.workers.lock().await;
            workers.iter_mut().map(|w| (w.id, w.handle.take())).collect()
        };

        let mut results = Vec::with_capacity(handles.len());
        for (index, handle) in handles {
            let result = match handle {
                Some(handle) => match handle.await {
                    Ok(result) => result,
                    Err(e) => TaskResult::failed(
                        index,
                        start_time.elapsed(),
                        format!("Task {} aborted: {}", index + 1, e),
                    ),
                },
                None => TaskResult::failed(
                    index,
                    start_time.elapsed(),
                    format!("Task {} was never started", index + 1),
                ),
            };
            results.push(result);
        }

        let total_elapsed = start_time.elapsed();

        let mut workers = self.workers.lock().await;
        for (worker, result) in workers.iter_mut().zip(&results) {
            if worker.status == WorkerStatus::Cancelled {
                continue;
            }
            worker.status = match &result.error {
                None => WorkerStatus::Completed,
                Some(e) => WorkerStatus::Failed(e.clone()),
            };
        }
        drop(workers);

        let report = RunReport::new(self.request, total_elapsed, results);
        log::info!(
            "{} benchmark finished: {} succeeded, {} failed in {:?}",
            self.request.mode, report.stats.succeeded, report.stats.failed, total_elapsed
        );
        Ok(report)
    }

    /// Get current worker statuses
    pub async fn get_worker_statuses(&self) -> Vec<(usize, WorkerStatus)> {
        let workers = self.workers.lock().await;
        workers.iter().map(|w| (w.id, w.status.clone())).collect()
    }

    /// Get the number of active workers
    pub async fn active_worker_count(&self) -> usize {
        let workers = self.workers.lock().await;
        workers.iter().filter(|w| w.is_active()).count()
    }

    /// Check if all workers are completed
    pub async fn all_workers_completed(&self) -> bool {
        let workers = self.workers.lock().await;
        workers.iter().all(|w| w.is_completed())
    }
}

/// Cancels the workers of a [`BenchmarkRunner`] without borrowing it
#[derive(Clone)]
pub struct CancelHandle {
    workers: Arc<Mutex<Vec<WorkerInfo>>>,
}

impl CancelHandle {
    pub async fn cancel_all(&self) {
        let mut workers = self.workers.lock().await;

        for worker in workers.iter_mut() {
            if worker.is_active() {
                if let Some(source) = worker.cancel.take() {
                    source.cancel();
                }
                worker.status = WorkerStatus::Cancelled;
            }
        }
    }
}

/// Dispatch one unit of the requested mode
async fn run_mode(
    mode: BenchmarkMode,
    task_id: &str,
    config: &BenchmarkConfig,
    cancel: &CancelToken,
) -> Result<TaskOutcome> {
    match mode {
        BenchmarkMode::Cpu => cpu::run_unit(config.cpu.clone(), cancel).await,
        BenchmarkMode::Io => light::run_unit(task_id, config, cancel).await,
        BenchmarkMode::IoHeavy => heavy::run_unit(task_id, config, cancel).await,
    }
}
