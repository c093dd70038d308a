//! Catat CLI - Receipt and message expense tracker
//!
//! Usage:
//!   catat init                           Write default config, prepare the ledger
//!   catat text "kopi 25rb" --user budi   Record a transaction from a message
//!   catat image receipt.jpg --user budi  Record a transaction from a receipt
//!   catat budget set Groceries 1500000   Set a monthly budget
//!   catat health                         Check backend and ledger

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => commands::cmd_init(&config),
        Commands::Text {
            message,
            user,
            json,
        } => commands::cmd_text(&config, &message, &user, json).await,
        Commands::Image { path, user, json } => {
            commands::cmd_image(&config, &path, &user, json).await
        }
        Commands::Prompt {
            image,
            message,
            date,
        } => commands::cmd_prompt(
            &config,
            image.as_deref(),
            message.as_deref(),
            date.as_deref(),
        ),
        Commands::Budget { action } => {
            let db = commands::open_db(&config)?;
            match action {
                BudgetAction::Set {
                    category,
                    amount,
                    quota,
                } => commands::cmd_budget_set(&db, &config, &category, amount, quota),
                BudgetAction::List { month } => commands::cmd_budget_list(&db, month.as_deref()),
            }
        }
        Commands::Chat { user, downloads } => {
            commands::cmd_chat(&config, &user, &downloads).await
        }
        Commands::Health => commands::cmd_health(&config).await,
    }
}
