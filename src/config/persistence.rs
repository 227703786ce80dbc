//! Run history persistence module
//!
//! Handles saving, loading, and rotation of past run reports.

use std::fs;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use crate::{BenchError, Result, APP_NAME, HISTORY_FILE, MAX_HISTORY};
use crate::models::RunReport;

/// Run history storage manager
#[derive(Debug)]
pub struct HistoryStorage {
    history_path: PathBuf,
}

/// History file structure for JSON persistence
#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    reports: Vec<RunReport>,
}

impl HistoryStorage {
    /// Create a history storage at the standard location
    pub fn new() -> Result<Self> {
        Ok(Self { history_path: Self::history_file_path()? })
    }

    /// Create a history storage backed by an explicit file
    pub fn at(history_path: PathBuf) -> Self {
        Self { history_path }
    }

    /// Get the standard history file path
    /// Uses $DATA_HOME/fanbench/history.json
    pub fn history_file_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| BenchError::PersistenceError(
                "Unable to determine data directory".to_string()
            ))?;

        Ok(data_dir.join(APP_NAME).join(HISTORY_FILE))
    }

    /// Load all reports from the history file
    pub fn load_reports(&self) -> Result<Vec<RunReport>> {
        if !self.history_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.history_path)
            .map_err(|e| BenchError::PersistenceError(
                format!("Failed to read history file {}: {}", self.history_path.display(), e)
            ))?;

        let history: HistoryFile = serde_json::from_str(&content)
            .map_err(|e| BenchError::PersistenceError(
                format!("Failed to parse history file {}: {}", self.history_path.display(), e)
            ))?;

        Ok(history.reports)
    }

    /// Append a report, keeping only the most recent MAX_HISTORY entries
    pub fn append_report(&self, report: RunReport) -> Result<()> {
        let mut reports = self.load_reports()?;
        reports.push(report);

        if reports.len() > MAX_HISTORY {
            let skip_count = reports.len() - MAX_HISTORY;
            reports.drain(..skip_count);
        }

        self.save_reports(reports)
    }

    fn save_reports(&self, reports: Vec<RunReport>) -> Result<()> {
        if let Some(parent) = self.history_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| BenchError::PersistenceError(
                    format!("Failed to create history directory {}: {}", parent.display(), e)
                ))?;
        }

        let history = HistoryFile { version: 1, reports };

        let content = serde_json::to_string_pretty(&history)
            .map_err(|e| BenchError::PersistenceError(
                format!("Failed to serialize history: {}", e)
            ))?;

        fs::write(&self.history_path, content)
            .map_err(|e| BenchError::PersistenceError(
                format!("Failed to write history file {}: {}", self.history_path.display(), e)
            ))?;

        log::debug!("saved run history to {}", self.history_path.display());
        Ok(())
    }

    /// Clear all stored reports
    pub fn clear(&self) -> Result<()> {
        if self.history_path.exists() {
            fs::remove_file(&self.history_path)
                .map_err(|e| BenchError::PersistenceError(
                    format!("Failed to remove history file {}: {}", self.history_path.display(), e)
                ))?;
        }
        Ok(())
    }
}
