//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `load_config` - Resolve the application config
//! - `open_db` - Open the sqlite ledger database
//! - `build_engine` - Wire the reconciliation engine from config and env
//! - `cmd_init` - Write the default config and prepare the ledger

use std::path::Path;

use anyhow::{Context, Result};
use catat_core::ai::AIClient;
use catat_core::config::{default_config_path, AppConfig, LedgerKind, DEFAULT_CONFIG};
use catat_core::db::Database;
use catat_core::reconcile::ReconciliationEngine;

pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    AppConfig::load(path).context("Failed to load configuration")
}

/// Open the sqlite ledger database named by the config
pub fn open_db(config: &AppConfig) -> Result<Database> {
    if config.ledger.backend != LedgerKind::Sqlite {
        tracing::warn!(
            backend = config.ledger.backend.as_str(),
            "Ledger backend is not sqlite; budgets apply to the local database only"
        );
    }
    let path = config.ledger.db_path();
    Database::new(&path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Engine using the backend from `AI_BACKEND` and the configured ledger
pub fn build_engine(config: &AppConfig) -> Result<ReconciliationEngine> {
    let backend = AIClient::from_env().context("Failed to configure extraction backend")?;
    ReconciliationEngine::from_config(backend, config).context("Failed to open ledger")
}

pub fn cmd_init(config: &AppConfig) -> Result<()> {
    println!("🔧 Initializing catat...");

    match default_config_path() {
        Some(path) if path.exists() => {
            println!("   Config: {} (existing)", path.display());
        }
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("   Config: {} (written)", path.display());
        }
        None => println!("   Config: embedded defaults (no data directory)"),
    }

    match config.ledger.backend {
        LedgerKind::Sqlite => {
            let db = open_db(config)?;
            println!("   Ledger: sqlite at {}", db.path());
        }
        LedgerKind::Sheets => {
            println!(
                "   Ledger: Google Sheets ({})",
                config
                    .ledger
                    .spreadsheet_id
                    .as_deref()
                    .unwrap_or("set GOOGLE_SPREADSHEET_ID")
            );
        }
        LedgerKind::Memory => println!("   Ledger: in-memory (nothing is persisted)"),
    }
    println!(
        "   Vocabulary: {} categories, {} accounts",
        config.vocabulary.categories.len(),
        config.vocabulary.accounts.len()
    );

    println!("✅ catat initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Set GEMINI_API_KEY (or AI_BACKEND=ollama with OLLAMA_HOST)");
    println!("  2. Record a transaction: catat text \"kopi 25rb\" --user you");

    Ok(())
}
