//! In-process ledger for tests and dry runs
//!
//! Clones share the same tables.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::DetailRow;

use super::LedgerBackend;

#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    rows: Arc<Mutex<Vec<Vec<String>>>>,
    summary: Arc<Mutex<Vec<Vec<String>>>>,
    append_error: Option<String>,
    summary_error: Option<String>,
    append_delay: Option<Duration>,
    summary_delay: Option<Duration>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger whose summary window holds these rows
    pub fn with_summary(rows: Vec<Vec<String>>) -> Self {
        let ledger = Self::default();
        ledger.set_summary(rows);
        ledger
    }

    /// Reject every append with a ledger error
    pub fn fail_appends(mut self, message: impl Into<String>) -> Self {
        self.append_error = Some(message.into());
        self
    }

    /// Fail every summary read with a ledger error
    pub fn fail_summary(mut self, message: impl Into<String>) -> Self {
        self.summary_error = Some(message.into());
        self
    }

    pub fn with_append_delay(mut self, delay: Duration) -> Self {
        self.append_delay = Some(delay);
        self
    }

    pub fn with_summary_delay(mut self, delay: Duration) -> Self {
        self.summary_delay = Some(delay);
        self
    }

    /// Replace the summary window
    pub fn set_summary(&self, rows: Vec<Vec<String>>) {
        if let Ok(mut summary) = self.summary.lock() {
            *summary = rows;
        }
    }

    /// Appended detail rows, oldest first
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.rows.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LedgerBackend for MemoryLedger {
    async fn append_row(&self, row: &DetailRow) -> Result<()> {
        if let Some(delay) = self.append_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.append_error {
            return Err(AppError::ledger(message.clone()));
        }
        self.rows
            .lock()
            .map_err(|_| AppError::ledger("memory ledger lock poisoned"))?
            .push(row.to_cells());
        Ok(())
    }

    async fn read_summary(&self) -> Result<Vec<Vec<String>>> {
        if let Some(delay) = self.summary_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.summary_error {
            return Err(AppError::ledger(message.clone()));
        }
        Ok(self.summary.lock().map(|s| s.clone()).unwrap_or_default())
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn link(&self) -> String {
        "memory://ledger".to_string()
    }
}
