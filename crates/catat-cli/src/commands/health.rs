//! Health command implementation

use anyhow::Result;
use catat_core::ai::{AIClient, ExtractionBackend};
use catat_core::config::AppConfig;
use catat_core::ledger::{LedgerBackend, LedgerStore};

/// Check the extraction backend and the ledger
pub async fn cmd_health(config: &AppConfig) -> Result<()> {
    println!("🔍 Checking catat...\n");
    let mut healthy = true;

    match AIClient::from_env() {
        Ok(client) => {
            print!("  Backend {} at {}... ", client.model(), client.host());
            if client.health_check().await {
                println!("✅ Connected");
            } else {
                println!("❌ Unreachable");
                healthy = false;
            }
        }
        Err(e) => {
            println!("  Backend: ❌ {}", e);
            healthy = false;
        }
    }

    match LedgerStore::from_config(&config.ledger) {
        Ok(store) => {
            let client = store.client();
            print!("  Ledger {} ({})... ", client.name(), client.link());
            match client.read_summary().await {
                Ok(rows) => println!("✅ {} summary rows", rows.len()),
                Err(e) => {
                    println!("❌ {}", e);
                    healthy = false;
                }
            }
        }
        Err(e) => {
            println!("  Ledger: ❌ {}", e);
            healthy = false;
        }
    }

    println!();
    if healthy {
        println!("✅ All checks passed");
        Ok(())
    } else {
        anyhow::bail!("Some checks failed")
    }
}
