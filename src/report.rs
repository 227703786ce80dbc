//! Console reporting
//!
//! Streams per-task lines while a run is in progress and renders the
//! final report as text or JSON.

use std::fmt::Write as _;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::{BenchmarkRequest, RunReport, TaskResult};
use crate::util::{format_bytes, format_duration, format_rate};
use crate::Result;

/// How per-task completions are shown while the run is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressDisplay {
    /// Progress bar with task lines printed above it
    Bar,
    /// Plain task lines only
    Lines,
    /// Nothing
    Silent,
}

/// Line printed when a task finishes
pub fn task_line(result: &TaskResult) -> String {
    match &result.error {
        None => format!("Task {} done in {}", result.index + 1, format_duration(result.elapsed)),
        Some(e) => format!("Task {} failed: {}", result.index + 1, e),
    }
}

/// Consume finished results and display them until the sender side closes
pub fn spawn_progress(
    mut rx: mpsc::Receiver<TaskResult>,
    total: usize,
    display: ProgressDisplay,
) -> JoinHandle<()> {
    let pb = match display {
        ProgressDisplay::Bar => ProgressBar::new(total as u64),
        _ => ProgressBar::hidden(),
    };
    pb.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} tasks ({elapsed}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    tokio::spawn(async move {
        let mut failed = 0usize;
        while let Some(result) = rx.recv().await {
            if !result.is_success() {
                failed += 1;
                pb.set_message(format!("{} failed", failed));
            }
            match display {
                // println is a no-op on a hidden bar
                ProgressDisplay::Bar if !pb.is_hidden() => pb.println(task_line(&result)),
                ProgressDisplay::Bar | ProgressDisplay::Lines => println!("{}", task_line(&result)),
                ProgressDisplay::Silent => {}
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
    })
}

/// Header printed before a run starts
pub fn render_header(request: &BenchmarkRequest) -> String {
    format!(
        "fanbench {} benchmark start: {}, {} tasks\n---",
        request.mode,
        request.mode.description(),
        request.task_count
    )
}

/// Aggregate section of the text report
pub fn render_text(report: &RunReport) -> String {
    let stats = &report.stats;
    let mut out = String::new();

    let _ = writeln!(out, "---");
    let _ = writeln!(
        out,
        "All {} tasks done in {}",
        report.request.task_count,
        format_duration(report.total_elapsed)
    );

    if stats.succeeded > 0 {
        let _ = writeln!(out, "Average task time: {}", format_duration(stats.avg));
        let _ = writeln!(
            out,
            "Fastest / slowest task: {} / {}",
            format_duration(stats.min),
            format_duration(stats.max)
        );
        let _ = writeln!(
            out,
            "p50 / p95 / p99: {} / {} / {}",
            format_duration(stats.p50()),
            format_duration(stats.p95()),
            format_duration(stats.p99())
        );
    }

    if report.request.mode.uses_files() {
        let _ = writeln!(out, "Total files processed: {}", stats.total_files);
        let _ = writeln!(
            out,
            "Data read back: {} ({})",
            format_bytes(stats.total_bytes),
            format_rate(stats.total_bytes, report.total_elapsed)
        );
    }

    if stats.failed > 0 {
        let _ = writeln!(out, "Failed tasks: {} of {}", stats.failed, report.results.len());
        for result in report.results.iter().filter(|r| !r.is_success()) {
            let _ = writeln!(out, "  {}", task_line(result));
        }
    }

    out
}

/// Render the report as pretty JSON
pub fn render_json(report: &RunReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// One line per past run, newest first
pub fn render_history(reports: &[RunReport]) -> String {
    if reports.is_empty() {
        return "No saved runs.\n".to_string();
    }

    let mut out = String::new();
    for (i, report) in reports.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {}", i + 1, report.summary());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BenchmarkMode;
    use std::time::Duration;

    fn slot(index: usize, ms: u64, error: Option<&str>) -> TaskResult {
        TaskResult {
            index,
            elapsed: Duration::from_millis(ms),
            files_processed: error.is_none().then_some(10),
            bytes_processed: error.is_none().then_some(2 * 1048576),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_task_line() {
        assert_eq!(task_line(&slot(0, 250, None)), "Task 1 done in 250ms");
        assert_eq!(task_line(&slot(4, 250, Some("disk full"))), "Task 5 failed: disk full");
    }

    #[test]
    fn test_text_report_for_heavy_run() {
        let report = RunReport::new(
            BenchmarkRequest::new(BenchmarkMode::IoHeavy, 3),
            Duration::from_secs(2),
            vec![slot(0, 1000, None), slot(1, 1500, Some("Hash mismatch")), slot(2, 1200, None)],
        );

        let text = render_text(&report);
        assert!(text.contains("All 3 tasks done in 2s"));
        assert!(text.contains("Average task time: 1s 100ms"));
        assert!(text.contains("Total files processed: 20"));
        assert!(text.contains("Data read back: 4.0 MiB (2.0 MiB/s)"));
        assert!(text.contains("Failed tasks: 1 of 3"));
        assert!(text.contains("Task 2 failed: Hash mismatch"));
    }

    #[test]
    fn test_text_report_for_cpu_run_omits_files() {
        let report = RunReport::new(
            BenchmarkRequest::new(BenchmarkMode::Cpu, 1),
            Duration::from_millis(80),
            vec![TaskResult {
                index: 0,
                elapsed: Duration::from_millis(75),
                files_processed: None,
                bytes_processed: None,
                error: None,
            }],
        );

        let text = render_text(&report);
        assert!(text.contains("All 1 tasks done in 80ms"));
        assert!(!text.contains("files processed"));
        assert!(!text.contains("Failed"));
    }

    #[test]
    fn test_json_report_parses() {
        let report = RunReport::new(
            BenchmarkRequest::new(BenchmarkMode::Io, 1),
            Duration::from_millis(10),
            vec![slot(0, 9, None)],
        );
        let json = render_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["request"]["mode"], "io");
        assert_eq!(value["results"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_progress_drains_channel() {
        let (tx, rx) = mpsc::channel(4);
        let handle = spawn_progress(rx, 2, ProgressDisplay::Silent);
        tx.send(slot(0, 1, None)).await.unwrap();
        tx.send(slot(1, 1, Some("x"))).await.unwrap();
        drop(tx);
        handle.await.unwrap();
    }

    #[test]
    fn test_header_names_mode() {
        let header = render_header(&BenchmarkRequest::new(BenchmarkMode::Io, 5));
        assert!(header.starts_with("fanbench io benchmark start"));
        assert!(header.contains("5 tasks"));
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(render_history(&[]), "No saved runs.\n");
    }
}
