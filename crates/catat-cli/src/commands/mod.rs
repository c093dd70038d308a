//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init plus shared utilities (load_config, open_db, build_engine)
//! - `extract` - Record transactions from messages and images
//! - `budget` - Monthly budget management for the sqlite ledger
//! - `prompt` - Print extraction prompts
//! - `chat` - Interactive chat session over stdin/stdout
//! - `health` - Backend and ledger checks

pub mod budget;
pub mod chat;
pub mod core;
pub mod extract;
pub mod health;
pub mod prompt;

// Re-export command functions for main.rs
pub use budget::*;
pub use chat::*;
pub use core::*;
pub use extract::*;
pub use health::*;
pub use prompt::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
