//! Transaction recording commands

use std::path::Path;

use anyhow::Result;
use catat_core::config::AppConfig;
use catat_core::error::handle_error;
use catat_core::reconcile::Reconciliation;

use super::build_engine;

/// Record a transaction described in a text message
pub async fn cmd_text(config: &AppConfig, message: &str, user: &str, json: bool) -> Result<()> {
    let engine = build_engine(config)?;
    match engine.process_text(message, user).await {
        Ok(result) => print_result(&result, json),
        Err(e) => {
            handle_error(&e, "recording text transaction");
            Err(e.into())
        }
    }
}

/// Record a transaction from a receipt image
pub async fn cmd_image(config: &AppConfig, path: &Path, user: &str, json: bool) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Image not found: {}", path.display());
    }
    let engine = build_engine(config)?;
    match engine.process_image(path, user).await {
        Ok(result) => print_result(&result, json),
        Err(e) => {
            handle_error(&e, "recording image transaction");
            Err(e.into())
        }
    }
}

pub fn print_result(result: &Reconciliation, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!("{}", result);
    }
    Ok(())
}
