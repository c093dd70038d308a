//! Catat Core Library
//!
//! Turns receipt photos and free-text chat messages into ledger rows:
//! - Amount normalization and rupiah formatting
//! - Extraction prompts and candidate parsing
//! - Pluggable extraction backends (Gemini, Ollama, mock)
//! - Ledger backends (Google Sheets, SQLite, in-memory) with summary lookup
//! - Reconciliation of a transaction against its category budget
//! - Chat boundary: command routing and the received-file registry
//! - Error taxonomy with a logging handler and panic guard

pub mod ai;
pub mod amount;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod ledger;
pub mod models;
pub mod prompts;
pub mod reconcile;

pub use ai::{
    AIClient, CandidatePolicy, Completion, CompletionRequest, ExtractionBackend, GeminiBackend,
    MockBackend, OllamaBackend,
};
pub use amount::{format_rupiah, normalize_amount, parse_balance};
pub use chat::{ChatAdapter, ChatTransport, FileRegistry, InboundMessage, StoredFile};
pub use config::{AppConfig, LedgerConfig, LedgerKind, Vocabulary};
pub use db::Database;
pub use error::{AppError, Error, ErrorCode, Result, Severity};
pub use extract::ExtractionClient;
pub use ledger::{LedgerBackend, LedgerClient, LedgerStore};
pub use models::{Budget, CategorySummary, DetailRow, InputKind, Transaction};
pub use prompts::{build_prompt, PromptInput};
pub use reconcile::{Reconciliation, ReconciliationEngine};
