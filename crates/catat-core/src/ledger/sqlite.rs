//! SQLite-backed ledger
//!
//! Rusqlite calls block, so each one runs on the blocking thread pool with a
//! cloned handle to the connection pool. A call that has started runs to
//! completion even if the awaiting future is dropped.

use async_trait::async_trait;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::DetailRow;

use super::{ledger_time, LedgerBackend};

#[derive(Debug, Clone)]
pub struct SqliteLedger {
    db: Database,
    summary_window: usize,
}

impl SqliteLedger {
    pub fn new(db: Database, summary_window: usize) -> Self {
        Self { db, summary_window }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::ledger("ledger task failed").caused_by(e))?
}

#[async_trait]
impl LedgerBackend for SqliteLedger {
    async fn append_row(&self, row: &DetailRow) -> Result<()> {
        let db = self.db.clone();
        let row = row.clone();
        blocking(move || db.append_detail(&row).map(|_| ())).await
    }

    async fn read_summary(&self) -> Result<Vec<Vec<String>>> {
        let db = self.db.clone();
        let window = self.summary_window;
        let month = ledger_time(chrono::Utc::now()).format("%Y-%m").to_string();
        blocking(move || db.summary_rows(&month, window)).await
    }

    fn name(&self) -> &str {
        "sqlite"
    }

    fn link(&self) -> String {
        format!("sqlite://{}", self.db.path())
    }
}
