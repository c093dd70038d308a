//! Reconciliation engine: extract, stamp, persist, report
//!
//! Entry points that are triggered from outside (`process_image`,
//! `process_text`) run behind the panic guard.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::ai::AIClient;
use crate::amount::{format_rupiah, parse_balance};
use crate::config::AppConfig;
use crate::error::{guard, Result};
use crate::extract::ExtractionClient;
use crate::ledger::{ledger_today, LedgerStore};
use crate::models::{CategorySummary, InputKind, Transaction};

#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    extractor: ExtractionClient,
    ledger: LedgerStore,
}

impl ReconciliationEngine {
    pub fn new(extractor: ExtractionClient, ledger: LedgerStore) -> Self {
        Self { extractor, ledger }
    }

    /// Wire an engine from config, using `backend` for extraction
    pub fn from_config(backend: AIClient, config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            ExtractionClient::from_config(backend, config),
            LedgerStore::from_config(&config.ledger)?,
        ))
    }

    pub fn extractor(&self) -> &ExtractionClient {
        &self.extractor
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    /// Extract a transaction from an image and stamp the uploader
    pub async fn handle_image_input(&self, path: &Path, user: &str) -> Result<Transaction> {
        let mut trx = self
            .extractor
            .extract_image(path)
            .await
            .map_err(|e| e.with_context("user", user))?;
        trx.created_by = user.to_string();
        Ok(trx)
    }

    /// Extract a transaction from a message and stamp the uploader
    ///
    /// Today's date in the ledger timezone is offered as the default date.
    pub async fn handle_text_input(&self, message: &str, user: &str) -> Result<Transaction> {
        let mut trx = self
            .extractor
            .extract_text(message, &ledger_today())
            .await
            .map_err(|e| e.with_context("user", user))?;
        trx.created_by = user.to_string();
        Ok(trx)
    }

    /// Persist a transaction and return its category standing
    pub async fn save_transaction(&self, trx: &Transaction) -> Result<CategorySummary> {
        self.ledger.append_transaction(trx).await
    }

    /// Full flow for an image: extract, persist, compose the reply
    pub async fn process_image(&self, path: impl Into<PathBuf>, user: &str) -> Result<Reconciliation> {
        let engine = self.clone();
        let path = path.into();
        let user = user.to_string();
        guard("process image", async move {
            let trx = engine.handle_image_input(&path, &user).await?;
            engine.reconcile(InputKind::Image, trx).await
        })
        .await
    }

    /// Full flow for a message: extract, persist, compose the reply
    pub async fn process_text(&self, message: &str, user: &str) -> Result<Reconciliation> {
        let engine = self.clone();
        let message = message.to_string();
        let user = user.to_string();
        guard("process text", async move {
            let trx = engine.handle_text_input(&message, &user).await?;
            engine.reconcile(InputKind::Text, trx).await
        })
        .await
    }

    async fn reconcile(&self, kind: InputKind, transaction: Transaction) -> Result<Reconciliation> {
        let summary = self
            .save_transaction(&transaction)
            .await
            .map_err(|e| e.with_context("user", transaction.created_by.clone()))?;
        info!(
            kind = %kind,
            category = %transaction.category,
            user = %transaction.created_by,
            matched_summary = !summary.is_empty(),
            "Transaction reconciled"
        );
        Ok(Reconciliation::new(kind, transaction, summary, self.ledger.link()))
    }
}

/// A saved transaction together with its category standing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub kind: InputKind,
    pub transaction: Transaction,
    pub summary: CategorySummary,
    pub ledger_link: String,
    /// Advisory shown when the category is overspent
    pub warning: Option<String>,
}

impl Reconciliation {
    pub fn new(
        kind: InputKind,
        transaction: Transaction,
        summary: CategorySummary,
        ledger_link: String,
    ) -> Self {
        let warning = overspend_warning(&transaction, &summary);
        Self {
            kind,
            transaction,
            summary,
            ledger_link,
            warning,
        }
    }
}

/// The transaction's warning message, if budget or quota went negative
///
/// Never invents a message: an empty `warning_message` means no warning.
fn overspend_warning(trx: &Transaction, summary: &CategorySummary) -> Option<String> {
    let negative = |value: &str| parse_balance(value).is_some_and(|v| v < 0.0);
    let overspent = negative(&summary.budget_left) || negative(&summary.quota_left);
    (overspent && !trx.warning_message.is_empty()).then(|| trx.warning_message.clone())
}

impl fmt::Display for Reconciliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trx = &self.transaction;
        let summary = &self.summary;
        write!(
            f,
            "Saved {} ✅\nCategory: {}\nAmount: {}\nNotes: {}\nLink: {}\n\
             Monthly Expenses: {}\nMonthly Budget: {}\nBudget Left: {}\n\
             Monthly Quota: {}\nQuota Left: {}",
            self.kind.label(),
            trx.category,
            format_rupiah(&trx.amount),
            trx.notes,
            self.ledger_link,
            summary.monthly_expenses,
            summary.monthly_budget,
            summary.budget_left,
            summary.quota,
            summary.quota_left,
        )?;
        if let Some(warning) = &self.warning {
            write!(f, "\n\n⚠️ {}", warning)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ai::{AIClient, CandidatePolicy, MockBackend};
    use crate::config::Vocabulary;
    use crate::error::ErrorCode;
    use crate::ledger::{LedgerClient, MemoryLedger};

    fn engine(mock: MockBackend, ledger: MemoryLedger) -> ReconciliationEngine {
        ReconciliationEngine::new(
            ExtractionClient::new(
                AIClient::Mock(mock),
                Vocabulary::default(),
                CandidatePolicy::LastWins,
                Duration::from_secs(5),
            ),
            LedgerStore::new(LedgerClient::Memory(ledger), Duration::from_secs(5)),
        )
    }

    fn summary_row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn test_text_flow_end_to_end() {
        let mock = MockBackend::with_responses(&[
            r#"{"amount":"-100","category":"Groceries","notes":"groceries","transaction_date":"2025-07-10","created_by":"bot"}"#,
        ]);
        let ledger = MemoryLedger::with_summary(vec![summary_row(&[
            "Groceries", "100", "1000", "900",
        ])]);
        let result = engine(mock, ledger.clone())
            .process_text("spent -100 on groceries", "budi")
            .await
            .unwrap();

        assert_eq!(result.transaction.amount, "100");
        assert_eq!(result.transaction.created_by, "budi");
        assert_eq!(result.summary.budget_left, "900");
        assert_eq!(result.kind, InputKind::Text);
        assert!(result.warning.is_none());

        let rows = ledger.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][4], "100");
        assert_eq!(rows[0][5], "budi");
    }

    #[tokio::test]
    async fn test_handle_text_input_stamps_user() {
        let mock = MockBackend::with_responses(&[r#"{"amount":"5"}"#]);
        let trx = engine(mock, MemoryLedger::new())
            .handle_text_input("kopi 5", "sari")
            .await
            .unwrap();
        assert_eq!(trx.created_by, "sari");
    }

    #[tokio::test]
    async fn test_append_failure_propagates() {
        let result = engine(MockBackend::new(), MemoryLedger::new().fail_appends("no access"))
            .process_text("beli sayur 20k", "budi")
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.code, ErrorCode::Ledger);
        assert_eq!(err.context["user"], "budi");
    }

    #[tokio::test]
    async fn test_backend_failure_is_reported_with_user() {
        let err = engine(MockBackend::failing("down"), MemoryLedger::new())
            .process_text("beli sayur 20k", "budi")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Backend);
        assert_eq!(err.context["user"], "budi");
    }

    #[test]
    fn test_warning_requires_negative_balance_and_message() {
        let mut trx = Transaction {
            warning_message: "Over budget for Eating Out".to_string(),
            ..Default::default()
        };
        let mut summary = CategorySummary {
            budget_left: "-1,000".to_string(),
            ..Default::default()
        };
        assert_eq!(
            overspend_warning(&trx, &summary).as_deref(),
            Some("Over budget for Eating Out")
        );

        summary.budget_left = "500".to_string();
        summary.quota_left = "-5".to_string();
        assert!(overspend_warning(&trx, &summary).is_some());

        summary.quota_left = "".to_string();
        assert!(overspend_warning(&trx, &summary).is_none());

        summary.budget_left = "-1".to_string();
        trx.warning_message.clear();
        assert!(overspend_warning(&trx, &summary).is_none());
    }

    #[test]
    fn test_reply_text() {
        let trx = Transaction {
            category: "Eating Out".to_string(),
            amount: "150000".to_string(),
            notes: "Lunch".to_string(),
            warning_message: "Slow down on eating out".to_string(),
            ..Default::default()
        };
        let summary = CategorySummary {
            category: "Eating Out".to_string(),
            monthly_expenses: "650000".to_string(),
            monthly_budget: "500000".to_string(),
            budget_left: "-150000".to_string(),
            quota: String::new(),
            quota_left: String::new(),
        };
        let reply = Reconciliation::new(
            InputKind::Image,
            trx,
            summary,
            "https://docs.google.com/spreadsheets/d/abc".to_string(),
        );

        assert_eq!(
            reply.to_string(),
            "Saved photo ✅\nCategory: Eating Out\nAmount: Rp 150,000\nNotes: Lunch\n\
             Link: https://docs.google.com/spreadsheets/d/abc\n\
             Monthly Expenses: 650000\nMonthly Budget: 500000\nBudget Left: -150000\n\
             Monthly Quota: \nQuota Left: \n\n⚠️ Slow down on eating out"
        );
    }
}
