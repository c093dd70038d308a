//! Error types for catat
//!
//! Two layers:
//! - `Error`: low-level failures from the libraries we call (SQLite, HTTP, JSON, ...)
//! - `AppError`: the envelope every public operation returns. It carries a
//!   taxonomy code, severity, component, free-form context and the wrapped cause.
//!
//! Low-level errors convert into `AppError` automatically, so `?` works across
//! the layers. Call sites that know better (e.g. a Sheets HTTP failure is a
//! ledger problem, not a backend one) build the envelope explicitly.

mod handling;

pub use handling::{
    format_context, guard, handle_critical_error, handle_error, is_critical_error,
    is_retryable_error, log_error, panic_to_error, safe_execute, stack_trace,
};

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL stripped on conversion; query strings may carry credentials
    #[error("HTTP request error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    /// Configuration and startup
    #[serde(rename = "CONFIG_ERROR")]
    Config,
    /// Chat platform communication
    #[serde(rename = "CHAT_ERROR")]
    Chat,
    /// Extraction backend communication
    #[serde(rename = "BACKEND_ERROR")]
    Backend,
    /// Ledger communication
    #[serde(rename = "LEDGER_ERROR")]
    Ledger,
    #[serde(rename = "FILE_ERROR")]
    FileOperation,
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    /// Business / transaction processing
    #[serde(rename = "TRANSACTION_ERROR")]
    Transaction,
    #[serde(rename = "NETWORK_ERROR")]
    Network,
    #[serde(rename = "TIMEOUT_ERROR")]
    Timeout,
    #[serde(rename = "DATA_ACCESS_ERROR")]
    DataAccess,
}

impl ErrorCode {
    /// Taxonomy key, as it appears in logs and serialized envelopes
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "CONFIG_ERROR",
            Self::Chat => "CHAT_ERROR",
            Self::Backend => "BACKEND_ERROR",
            Self::Ledger => "LEDGER_ERROR",
            Self::FileOperation => "FILE_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Transaction => "TRANSACTION_ERROR",
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT_ERROR",
            Self::DataAccess => "DATA_ACCESS_ERROR",
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            Self::Config => Severity::Critical,
            Self::Network | Self::Timeout => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn default_component(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Chat => "chat",
            Self::Backend => "backend",
            Self::Ledger => "ledger",
            Self::FileOperation => "file",
            Self::Validation => "validation",
            Self::Transaction => "transaction",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::DataAccess => "data",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Backend | Self::Ledger | Self::Network | Self::Timeout
        )
    }

    pub fn all() -> &'static [ErrorCode] {
        &[
            Self::Config,
            Self::Chat,
            Self::Backend,
            Self::Ledger,
            Self::FileOperation,
            Self::Validation,
            Self::Transaction,
            Self::Network,
            Self::Timeout,
            Self::DataAccess,
        ]
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application error envelope
///
/// Created where the failure happens, enriched by the immediate caller via
/// [`AppError::with_context`], and consumed by a handler at the boundary.
#[derive(Debug, Serialize)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip)]
    pub cause: Option<BoxError>,
    pub context: HashMap<String, serde_json::Value>,
    pub severity: Severity,
    pub component: String,
    pub timestamp: DateTime<Utc>,
}

impl AppError {
    /// Create an error with the code's default severity and component
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
            context: HashMap::new(),
            severity: code.default_severity(),
            component: code.default_component().to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_cause(code: ErrorCode, message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::new(code, message).caused_by(cause)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Config, message)
    }

    pub fn chat(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Chat, message)
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Backend, message)
    }

    pub fn ledger(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Ledger, message)
    }

    pub fn file(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FileOperation, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transaction, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    pub fn data_access(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DataAccess, message)
    }

    /// Attach the underlying error
    pub fn caused_by(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Add a context entry (overwrites an existing key)
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = component.into();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "[{}] {}: {}", self.code, self.message, cause),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.without_url())
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::Database(_) | Error::Pool(_) => (ErrorCode::Ledger, "ledger storage failure"),
            Error::Io(_) => (ErrorCode::FileOperation, "file operation failed"),
            Error::Http(e) if e.is_timeout() => (ErrorCode::Timeout, "request timed out"),
            Error::Http(e) if e.is_connect() => (ErrorCode::Network, "connection failed"),
            Error::Http(_) => (ErrorCode::Backend, "backend request failed"),
            Error::Json(_) => (ErrorCode::Validation, "malformed JSON"),
            Error::Toml(_) => (ErrorCode::Config, "invalid configuration"),
            Error::InvalidData(_) => (ErrorCode::Validation, "invalid data"),
            Error::NotFound(_) => (ErrorCode::DataAccess, "not found"),
        };
        AppError::with_cause(code, message, err)
    }
}

macro_rules! via_error {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for AppError {
                fn from(err: $t) -> Self {
                    Error::from(err).into()
                }
            }
        )*
    };
}

via_error!(
    rusqlite::Error,
    r2d2::Error,
    std::io::Error,
    reqwest::Error,
    serde_json::Error,
    toml::de::Error,
);

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_without_cause() {
        let err = AppError::validation("amount missing");
        assert_eq!(err.to_string(), "[VALIDATION_ERROR] amount missing");
    }

    #[test]
    fn test_display_with_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = AppError::file("failed to read image").caused_by(io);
        assert_eq!(
            err.to_string(),
            "[FILE_ERROR] failed to read image: no such file"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_taxonomy_defaults() {
        let expected = [
            (ErrorCode::Config, Severity::Critical, false),
            (ErrorCode::Chat, Severity::Error, false),
            (ErrorCode::Backend, Severity::Error, true),
            (ErrorCode::Ledger, Severity::Error, true),
            (ErrorCode::FileOperation, Severity::Error, false),
            (ErrorCode::Validation, Severity::Error, false),
            (ErrorCode::Transaction, Severity::Error, false),
            (ErrorCode::Network, Severity::Warning, true),
            (ErrorCode::Timeout, Severity::Warning, true),
            (ErrorCode::DataAccess, Severity::Error, false),
        ];
        assert_eq!(ErrorCode::all().len(), expected.len());
        for (code, severity, retryable) in expected {
            let err = AppError::new(code, "x");
            assert_eq!(err.severity, severity, "{code}");
            assert_eq!(err.is_retryable(), retryable, "{code}");
            assert_eq!(err.is_critical(), severity == Severity::Critical, "{code}");
        }
    }

    #[test]
    fn test_fluent_annotation() {
        let err = AppError::ledger("append failed")
            .with_context("category", "Groceries")
            .with_context("attempt", 2)
            .with_component("sheets")
            .with_severity(Severity::Critical);

        assert_eq!(err.component, "sheets");
        assert_eq!(err.context["category"], "Groceries");
        assert_eq!(err.context["attempt"], 2);
        assert!(err.is_critical());
        // Severity override does not change retryability
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_low_level_errors() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::Validation);

        let err: AppError = Error::NotFound("row".into()).into();
        assert_eq!(err.code, ErrorCode::DataAccess);

        let err: AppError = rusqlite::Error::InvalidQuery.into();
        assert_eq!(err.code, ErrorCode::Ledger);
        assert!(err.is_retryable());

        let err: AppError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert_eq!(err.code, ErrorCode::Config);
        assert!(err.is_critical());
    }

    #[test]
    fn test_serialized_envelope() {
        let err = AppError::timeout("gemini call exceeded deadline").with_context("secs", 30);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "TIMEOUT_ERROR");
        assert_eq!(json["severity"], "WARNING");
        assert_eq!(json["component"], "timeout");
        assert_eq!(json["context"]["secs"], 30);
        assert!(json.get("cause").is_none());
    }

    #[tokio::test]
    async fn test_http_error_drops_url() {
        let err: AppError = reqwest::Client::new()
            .get("http://127.0.0.1:1/values?token=hunter2")
            .send()
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::Network);
        assert!(!err.to_string().contains("hunter2"));
    }
}
