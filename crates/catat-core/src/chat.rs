//! Chat boundary
//!
//! The adapter routes inbound chat messages to the file registry or the
//! reconciliation engine and always answers. Platform clients plug in through
//! `ChatTransport`; the registry of received files is owned by the adapter
//! and shared through clones.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{handle_error, AppError, Result};
use crate::reconcile::ReconciliationEngine;

/// Reply sent when processing fails for any reason
pub const FAILURE_NOTICE: &str = "Sorry, that transaction could not be saved. Please try again.";

/// What the adapter needs from a chat platform
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;

    async fn send_photo(&self, chat_id: i64, path: &Path, caption: &str) -> Result<()>;

    async fn send_document(&self, chat_id: i64, path: &Path, caption: &str) -> Result<()>;
}

/// A file received from a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub file_id: String,
    pub file_name: String,
    pub user: String,
    pub received_at: DateTime<Utc>,
}

/// Indexed list of received files
///
/// Indexes shown to users are 1-based and stable: files are only appended.
#[derive(Debug, Clone, Default)]
pub struct FileRegistry {
    files: Arc<RwLock<Vec<StoredFile>>>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file and return its 1-based index
    pub fn register(&self, file: StoredFile) -> usize {
        match self.files.write() {
            Ok(mut files) => {
                files.push(file);
                files.len()
            }
            Err(_) => 0,
        }
    }

    pub fn list(&self) -> Vec<StoredFile> {
        self.files.read().map(|f| f.clone()).unwrap_or_default()
    }

    /// Look up a file by its 1-based index
    pub fn get(&self, index: usize) -> Option<StoredFile> {
        let files = self.files.read().ok()?;
        index.checked_sub(1).and_then(|i| files.get(i)).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.read().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One inbound chat update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Text starting with `/`
    Command {
        chat_id: i64,
        user: String,
        text: String,
    },
    /// A file sent as a document; kept in the registry only
    Document {
        chat_id: i64,
        user: String,
        file_id: String,
        file_name: String,
    },
    /// A photo already downloaded to `local_path`
    Photo {
        chat_id: i64,
        user: String,
        file_id: String,
        local_path: PathBuf,
    },
    Text {
        chat_id: i64,
        user: String,
        text: String,
    },
}

impl InboundMessage {
    /// Classify a plain text update as a command or a message
    pub fn from_text(chat_id: i64, user: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let user = user.into();
        if text.starts_with('/') {
            Self::Command {
                chat_id,
                user,
                text,
            }
        } else {
            Self::Text {
                chat_id,
                user,
                text,
            }
        }
    }
}

/// Bare file name that stays inside the download directory
///
/// Directory parts are dropped; `.`/`..` and names with a backslash are
/// refused.
fn stored_name(name: &str) -> Option<String> {
    let base = Path::new(name).file_name()?.to_str()?;
    if base.is_empty() || base == "." || base == ".." || base.contains('\\') {
        return None;
    }
    Some(base.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    List,
    View(Option<usize>),
    Download(Option<usize>),
    Unknown,
}

impl Command {
    fn parse(text: &str) -> Self {
        let mut words = text.split_whitespace();
        let name = words
            .next()
            .unwrap_or_default()
            .trim_start_matches('/')
            .split('@')
            .next()
            .unwrap_or_default();
        let index = words.next().and_then(|w| w.parse::<usize>().ok());
        match name {
            "list" => Self::List,
            "view" => Self::View(index),
            "download" => Self::Download(index),
            _ => Self::Unknown,
        }
    }
}

pub struct ChatAdapter<T: ChatTransport> {
    transport: T,
    registry: FileRegistry,
    engine: ReconciliationEngine,
    /// Where received files are kept
    download_dir: PathBuf,
}

impl<T: ChatTransport> ChatAdapter<T> {
    pub fn new(
        transport: T,
        registry: FileRegistry,
        engine: ReconciliationEngine,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            transport,
            registry,
            engine,
            download_dir: download_dir.into(),
        }
    }

    pub fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handle one update and reply
    ///
    /// Only a failure to send the reply is returned; processing failures
    /// are logged and answered with `FAILURE_NOTICE`.
    pub async fn handle(&self, message: InboundMessage) -> Result<()> {
        match message {
            InboundMessage::Command { chat_id, text, .. } => {
                self.handle_command(chat_id, &text).await
            }
            InboundMessage::Document {
                chat_id,
                user,
                file_id,
                file_name,
            } => {
                let Some(file_name) = stored_name(&file_name) else {
                    warn!(file_name = %file_name, "Rejected document name");
                    return self.reply(chat_id, "Unsupported file name.").await;
                };
                self.registry.register(StoredFile {
                    file_id,
                    file_name: file_name.clone(),
                    user,
                    received_at: Utc::now(),
                });
                self.reply(chat_id, &format!("Saved {} ✅", file_name)).await
            }
            InboundMessage::Photo {
                chat_id,
                user,
                file_id,
                local_path,
            } => {
                let file_name = crate::extract::file_id_for(&local_path);
                self.registry.register(StoredFile {
                    file_id,
                    file_name,
                    user: user.clone(),
                    received_at: Utc::now(),
                });
                let result = self.engine.process_image(local_path, &user).await;
                self.reply_with(chat_id, result, "processing photo").await
            }
            InboundMessage::Text {
                chat_id,
                user,
                text,
            } => {
                let result = self.engine.process_text(&text, &user).await;
                self.reply_with(chat_id, result, "processing text").await
            }
        }
    }

    async fn handle_command(&self, chat_id: i64, text: &str) -> Result<()> {
        debug!(command = %text, "Chat command");
        match Command::parse(text) {
            Command::List => {
                let files = self.registry.list();
                if files.is_empty() {
                    return self.reply(chat_id, "No files received yet.").await;
                }
                let listing: String = files
                    .iter()
                    .enumerate()
                    .map(|(i, f)| {
                        format!(
                            "{}. {} (from @{}, {})\n",
                            i + 1,
                            f.file_name,
                            f.user,
                            f.received_at.format("%b %-d %H:%M")
                        )
                    })
                    .collect();
                self.reply(chat_id, &listing).await
            }
            Command::View(index) => match self.stored_file(index) {
                Some((file, path)) => {
                    self.transport
                        .send_photo(chat_id, &path, &format!("Viewing: {}", file.file_name))
                        .await
                }
                None => self.reply(chat_id, "Usage: /view <number>").await,
            },
            Command::Download(index) => match self.stored_file(index) {
                Some((file, path)) => {
                    self.transport
                        .send_document(chat_id, &path, &format!("Download: {}", file.file_name))
                        .await
                }
                None => self.reply(chat_id, "Usage: /download <number>").await,
            },
            Command::Unknown => self.reply(chat_id, "Unknown command.").await,
        }
    }

    fn stored_file(&self, index: Option<usize>) -> Option<(StoredFile, PathBuf)> {
        let file = self.registry.get(index?)?;
        let path = self.download_dir.join(stored_name(&file.file_name)?);
        Some((file, path))
    }

    async fn reply_with(
        &self,
        chat_id: i64,
        result: Result<crate::reconcile::Reconciliation>,
        context: &str,
    ) -> Result<()> {
        match result {
            Ok(reconciliation) => self.reply(chat_id, &reconciliation.to_string()).await,
            Err(err) => {
                handle_error(&err, context);
                self.reply(chat_id, FAILURE_NOTICE).await
            }
        }
    }

    async fn reply(&self, chat_id: i64, text: &str) -> Result<()> {
        self.transport
            .send_message(chat_id, text)
            .await
            .map_err(|e| {
                warn!(chat_id, error = %e, "Failed to send chat reply");
                e.with_component("chat").with_context("chat_id", chat_id)
            })
    }
}

/// What a `RecordingTransport` was asked to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentItem {
    Message { chat_id: i64, text: String },
    Photo { chat_id: i64, path: PathBuf, caption: String },
    Document { chat_id: i64, path: PathBuf, caption: String },
}

/// Transport test double that records everything it sends
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<SentItem>>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every send fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentItem> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn record(&self, item: SentItem) -> Result<()> {
        if self.fail {
            return Err(AppError::chat("transport unavailable"));
        }
        self.sent
            .lock()
            .map_err(|_| AppError::chat("transport lock poisoned"))?
            .push(item);
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.record(SentItem::Message {
            chat_id,
            text: text.to_string(),
        })
    }

    async fn send_photo(&self, chat_id: i64, path: &Path, caption: &str) -> Result<()> {
        self.record(SentItem::Photo {
            chat_id,
            path: path.to_path_buf(),
            caption: caption.to_string(),
        })
    }

    async fn send_document(&self, chat_id: i64, path: &Path, caption: &str) -> Result<()> {
        self.record(SentItem::Document {
            chat_id,
            path: path.to_path_buf(),
            caption: caption.to_string(),
        })
    }
}
