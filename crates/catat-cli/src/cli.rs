//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Catat - Turn receipts and chat messages into ledger rows
#[derive(Parser)]
#[command(name = "catat")]
#[command(about = "Receipt and message expense tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to $CATAT_CONFIG, then the data directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the default config and prepare the ledger
    Init,

    /// Record a transaction from a text message
    Text {
        /// Message describing the transaction
        message: String,

        /// Who sent it
        #[arg(short, long)]
        user: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a transaction from a receipt image (the file is removed once read)
    Image {
        /// Receipt image
        path: PathBuf,

        /// Who sent it
        #[arg(short, long)]
        user: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the extraction prompt without calling a backend
    Prompt {
        /// Build the image prompt for this file id
        #[arg(long, conflicts_with = "message", required_unless_present = "message")]
        image: Option<String>,

        /// Build the text prompt for this message
        #[arg(long)]
        message: Option<String>,

        /// Current date for the text prompt (YYYY-MM-DD, defaults to today in UTC+7)
        #[arg(long, requires = "message")]
        date: Option<String>,
    },

    /// Manage monthly budgets (sqlite ledger)
    Budget {
        #[command(subcommand)]
        action: BudgetAction,
    },

    /// Interactive chat session on stdin
    ///
    /// Lines starting with `/` are commands; `photo <path>` and
    /// `document <name>` simulate uploads; anything else is a message.
    Chat {
        /// Who is chatting
        #[arg(short, long)]
        user: String,

        /// Directory holding received files
        #[arg(long, default_value = "downloads")]
        downloads: PathBuf,
    },

    /// Check the extraction backend and the ledger
    Health,
}

#[derive(Subcommand)]
pub enum BudgetAction {
    /// Set the monthly budget (and optional quota) of a category
    Set {
        /// Category name
        category: String,

        /// Monthly budget
        amount: f64,

        /// Monthly quota
        #[arg(short, long)]
        quota: Option<f64>,
    },

    /// Show budgets against this month's expenses
    List {
        /// Month to report (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },
}
