//! Ledger persistence and budget reconciliation
//!
//! # Architecture
//!
//! - `LedgerBackend` trait: append one detail row, read the summary window
//! - `LedgerClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `SheetsLedger` (Google Sheets), `SqliteLedger`,
//!   `MemoryLedger`
//! - `LedgerStore`: the append-then-lookup flow with timeouts
//!
//! An append failure is always reported. A summary failure after a
//! successful append is logged and yields an empty summary.

mod memory;
mod sheets;
mod sqlite;

pub use memory::MemoryLedger;
pub use sheets::SheetsLedger;
pub use sqlite::SqliteLedger;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{info, warn};

use crate::config::{LedgerConfig, LedgerKind};
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{CategorySummary, DetailRow, Transaction};

/// Ledger timezone offset (UTC+7)
pub const LEDGER_UTC_OFFSET_HOURS: i64 = 7;

/// Format of the append timestamp column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Wall-clock time in the ledger timezone
pub fn ledger_time(now: DateTime<Utc>) -> NaiveDateTime {
    (now + chrono::Duration::hours(LEDGER_UTC_OFFSET_HOURS)).naive_utc()
}

/// Current append timestamp, `YYYY-MM-DD HH:MM:SS` in UTC+7
pub fn ledger_timestamp() -> String {
    ledger_time(Utc::now()).format(TIMESTAMP_FORMAT).to_string()
}

/// Today's date in the ledger timezone, `YYYY-MM-DD`
pub fn ledger_today() -> String {
    ledger_time(Utc::now()).format("%Y-%m-%d").to_string()
}

/// Find the summary of `category` in a summary window
///
/// The first row with at least 4 cells whose first cell equals `category`
/// wins. No match yields the zero value.
pub fn find_summary(rows: &[Vec<String>], category: &str) -> CategorySummary {
    rows.iter()
        .filter(|row| row.first().is_some_and(|c| c == category))
        .find_map(|row| CategorySummary::from_row(row))
        .unwrap_or_default()
}

/// Trait defining the interface for all ledger backends
#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// Append one row to the detail table
    async fn append_row(&self, row: &DetailRow) -> Result<()>;

    /// Read the fixed summary window
    async fn read_summary(&self) -> Result<Vec<Vec<String>>>;

    /// Backend name (for logging)
    fn name(&self) -> &str;

    /// Where a user can look at the ledger
    fn link(&self) -> String;
}

/// Concrete ledger client enum
#[derive(Debug, Clone)]
pub enum LedgerClient {
    /// Google Sheets REST
    Sheets(SheetsLedger),
    /// Local SQLite file
    Sqlite(SqliteLedger),
    /// In-process table for tests
    Memory(MemoryLedger),
}

impl LedgerClient {
    /// Build the configured backend
    ///
    /// Sheets credentials come from the environment
    /// (`GOOGLE_SPREADSHEET_ID`, `GOOGLE_SHEETS_TOKEN`).
    pub fn from_config(config: &LedgerConfig) -> Result<Self> {
        match config.backend {
            LedgerKind::Sheets => SheetsLedger::from_env(config).map(LedgerClient::Sheets),
            LedgerKind::Sqlite => {
                let db = Database::new(config.db_path())?;
                Ok(LedgerClient::Sqlite(SqliteLedger::new(
                    db,
                    config.summary_window,
                )))
            }
            LedgerKind::Memory => Ok(LedgerClient::Memory(MemoryLedger::new())),
        }
    }

    /// The underlying database, for the SQLite backend only
    pub fn database(&self) -> Option<&Database> {
        match self {
            LedgerClient::Sqlite(l) => Some(l.database()),
            _ => None,
        }
    }
}

#[async_trait]
impl LedgerBackend for LedgerClient {
    async fn append_row(&self, row: &DetailRow) -> Result<()> {
        match self {
            LedgerClient::Sheets(l) => l.append_row(row).await,
            LedgerClient::Sqlite(l) => l.append_row(row).await,
            LedgerClient::Memory(l) => l.append_row(row).await,
        }
    }

    async fn read_summary(&self) -> Result<Vec<Vec<String>>> {
        match self {
            LedgerClient::Sheets(l) => l.read_summary().await,
            LedgerClient::Sqlite(l) => l.read_summary().await,
            LedgerClient::Memory(l) => l.read_summary().await,
        }
    }

    fn name(&self) -> &str {
        match self {
            LedgerClient::Sheets(l) => l.name(),
            LedgerClient::Sqlite(l) => l.name(),
            LedgerClient::Memory(l) => l.name(),
        }
    }

    fn link(&self) -> String {
        match self {
            LedgerClient::Sheets(l) => l.link(),
            LedgerClient::Sqlite(l) => l.link(),
            LedgerClient::Memory(l) => l.link(),
        }
    }
}

/// Appends transactions and reads back the category standing
#[derive(Debug, Clone)]
pub struct LedgerStore {
    client: LedgerClient,
    timeout: Duration,
}

impl LedgerStore {
    pub fn new(client: LedgerClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn from_config(config: &LedgerConfig) -> Result<Self> {
        Ok(Self::new(LedgerClient::from_config(config)?, config.timeout))
    }

    pub fn client(&self) -> &LedgerClient {
        &self.client
    }

    pub fn link(&self) -> String {
        self.client.link()
    }

    /// Append one row, then look up the category in the summary window
    ///
    /// An append error (or timeout) means the row was not persisted. The
    /// summary lookup is best effort.
    ///
    /// SQLite appends are not bounded by the timeout: the insert runs on the
    /// blocking pool and cannot be cancelled, so it could commit after a
    /// timeout had already been reported.
    pub async fn append_row(
        &self,
        category: &str,
        date: &str,
        notes: &str,
        amount: &str,
        created_by: &str,
        file_id: &str,
    ) -> Result<CategorySummary> {
        let row = DetailRow {
            date: date.to_string(),
            category: category.to_string(),
            notes: notes.to_string(),
            amount: amount.to_string(),
            created_by: created_by.to_string(),
            file_id: file_id.to_string(),
            created_at: ledger_timestamp(),
        };

        let appended = match &self.client {
            LedgerClient::Sqlite(_) => Ok(self.client.append_row(&row).await),
            _ => tokio::time::timeout(self.timeout, self.client.append_row(&row)).await,
        };
        match appended {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(e
                    .with_context("category", category)
                    .with_context("ledger", self.client.name()))
            }
            Err(_) => {
                return Err(AppError::timeout("ledger append timed out")
                    .with_component("ledger")
                    .with_context("timeout_secs", self.timeout.as_secs())
                    .with_context("ledger", self.client.name()))
            }
        }
        info!(
            ledger = self.client.name(),
            category = %category,
            amount = %amount,
            created_at = %row.created_at,
            "Appended transaction row"
        );

        Ok(self.lookup_summary(category).await)
    }

    /// Append a transaction's fields
    pub async fn append_transaction(&self, trx: &Transaction) -> Result<CategorySummary> {
        self.append_row(
            &trx.category,
            &trx.transaction_date,
            &trx.notes,
            &trx.amount,
            &trx.created_by,
            &trx.file_id,
        )
        .await
    }

    async fn lookup_summary(&self, category: &str) -> CategorySummary {
        match tokio::time::timeout(self.timeout, self.client.read_summary()).await {
            Ok(Ok(rows)) => find_summary(&rows, category),
            Ok(Err(e)) => {
                warn!(
                    ledger = self.client.name(),
                    category = %category,
                    error = %e,
                    "Failed to read summary, returning empty summary"
                );
                CategorySummary::default()
            }
            Err(_) => {
                warn!(
                    ledger = self.client.name(),
                    category = %category,
                    timeout_secs = self.timeout.as_secs(),
                    "Summary read timed out, returning empty summary"
                );
                CategorySummary::default()
            }
        }
    }
}
