//! Interactive chat session over stdin/stdout

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use catat_core::chat::{ChatAdapter, ChatTransport, FileRegistry, InboundMessage};
use catat_core::config::AppConfig;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::build_engine;

/// Chat id used for the console session
const CONSOLE_CHAT_ID: i64 = 1;

/// Prints replies to stdout
pub struct ConsoleTransport;

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send_message(&self, _chat_id: i64, text: &str) -> catat_core::Result<()> {
        println!("{}\n", text);
        Ok(())
    }

    async fn send_photo(&self, _chat_id: i64, path: &Path, caption: &str) -> catat_core::Result<()> {
        println!("[photo {}] {}\n", path.display(), caption);
        Ok(())
    }

    async fn send_document(
        &self,
        _chat_id: i64,
        path: &Path,
        caption: &str,
    ) -> catat_core::Result<()> {
        println!("[document {}] {}\n", path.display(), caption);
        Ok(())
    }
}

/// Turn one input line into a chat update
///
/// `photo <path>` and `document <name>` stand in for uploads.
pub fn parse_line(user: &str, line: &str) -> Option<InboundMessage> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(path) = line.strip_prefix("photo ") {
        let local_path = PathBuf::from(path.trim());
        let file_id = local_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Some(InboundMessage::Photo {
            chat_id: CONSOLE_CHAT_ID,
            user: user.to_string(),
            file_id,
            local_path,
        });
    }
    if let Some(name) = line.strip_prefix("document ") {
        let name = name.trim().to_string();
        return Some(InboundMessage::Document {
            chat_id: CONSOLE_CHAT_ID,
            user: user.to_string(),
            file_id: name.clone(),
            file_name: name,
        });
    }
    Some(InboundMessage::from_text(CONSOLE_CHAT_ID, user, line))
}

pub async fn cmd_chat(config: &AppConfig, user: &str, downloads: &Path) -> Result<()> {
    let engine = build_engine(config)?;
    let adapter = ChatAdapter::new(ConsoleTransport, FileRegistry::new(), engine, downloads);

    println!("💬 Chatting as @{} (Ctrl-D to quit)\n", user);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(message) = parse_line(user, &line) {
            adapter.handle(message).await?;
        }
    }
    Ok(())
}
