//! Application configuration
//!
//! Config is loaded with a layered resolution:
//! 1. Explicit path (`--config` or `CATAT_CONFIG`)
//! 2. Override in data dir (~/.local/share/catat/config.toml)
//! 3. Embedded defaults (compiled into binary)
//!
//! Keys missing from an override file keep their default values.
//! Secrets and endpoints are read from the environment by the backends.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::ai::CandidatePolicy;
use crate::error::{AppError, Result};

/// Embedded default config (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../../config/catat.toml");

/// Environment variable pointing at a config file
pub const CONFIG_ENV: &str = "CATAT_CONFIG";

/// Fixed vocabularies offered to the extraction backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pub categories: Vec<String>,
    pub accounts: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            categories: owned(&[
                "Groceries",
                "Utilities",
                "Entertainment",
                "Gifting",
                "Household",
                "Eating Out",
                "Health",
                "Transportation",
                "Savings",
                "Emergency",
                "Rent House",
            ]),
            accounts: owned(&[
                "GOPAY", "BCA", "OVO", "DANA", "ISAKU", "MANDIRI", "BNI", "BRI", "CASH",
            ]),
        }
    }
}

/// Which durable store backs the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
    Sqlite,
    Sheets,
    Memory,
}

impl LedgerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Sheets => "sheets",
            Self::Memory => "memory",
        }
    }
}

impl std::str::FromStr for LedgerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "sheets" | "google_sheets" => Ok(Self::Sheets),
            "memory" => Ok(Self::Memory),
            _ => Err(format!("Unknown ledger backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    pub backend: LedgerKind,
    /// SQLite file; defaults to the data dir
    pub db_path: Option<PathBuf>,
    /// Google spreadsheet id; `GOOGLE_SPREADSHEET_ID` takes precedence
    pub spreadsheet_id: Option<String>,
    /// A1 range rows are appended to
    pub detail_range: String,
    /// A1 range of the summary window
    pub summary_range: String,
    /// Number of summary rows scanned (SQLite backend)
    pub summary_window: usize,
    pub timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerKind::Sqlite,
            db_path: None,
            spreadsheet_id: None,
            detail_range: "detailed!A:H".to_string(),
            summary_range: "summary!A2:F12".to_string(),
            summary_window: 11,
            timeout: Duration::from_secs(20),
        }
    }
}

impl LedgerConfig {
    /// Resolved SQLite path
    pub fn db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .or_else(|| dirs::data_local_dir().map(|d| d.join("catat").join("catat.db")))
            .unwrap_or_else(|| PathBuf::from("catat.db"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    /// Upper bound on one backend call
    pub timeout: Duration,
    pub candidate_policy: CandidatePolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            candidate_policy: CandidatePolicy::LastWins,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub vocabulary: Vocabulary,
    pub ledger: LedgerConfig,
    pub extraction: ExtractionConfig,
}

impl AppConfig {
    /// Load configuration, preferring `path`, then `CATAT_CONFIG`, then the
    /// data-dir override, then the embedded defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        if let Some(path) = explicit {
            let content = fs::read_to_string(&path).map_err(|e| {
                AppError::config("failed to read config file")
                    .caused_by(e)
                    .with_context("path", path.display().to_string())
            })?;
            return Self::parse(&content);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(&path).map_err(|e| {
                    AppError::config("failed to read config file")
                        .caused_by(e)
                        .with_context("path", path.display().to_string())
                })?;
                Self::parse(&content)
            }
            _ => Self::parse(DEFAULT_CONFIG),
        }
    }

    /// Parse TOML, layering it over the defaults
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(vocabulary) = raw.vocabulary {
            if let Some(categories) = vocabulary.categories {
                config.vocabulary.categories = categories;
            }
            if let Some(accounts) = vocabulary.accounts {
                config.vocabulary.accounts = accounts;
            }
        }

        if let Some(ledger) = raw.ledger {
            if let Some(backend) = ledger.backend {
                config.ledger.backend = backend.parse().map_err(AppError::config)?;
            }
            if let Some(db_path) = ledger.db_path {
                config.ledger.db_path = Some(db_path);
            }
            if let Some(id) = ledger.spreadsheet_id {
                config.ledger.spreadsheet_id = Some(id);
            }
            if let Some(range) = ledger.detail_range {
                config.ledger.detail_range = range;
            }
            if let Some(range) = ledger.summary_range {
                config.ledger.summary_range = range;
            }
            if let Some(window) = ledger.summary_window {
                config.ledger.summary_window = window;
            }
            if let Some(secs) = ledger.timeout_secs {
                config.ledger.timeout = Duration::from_secs(secs);
            }
        }

        if let Some(extraction) = raw.extraction {
            if let Some(secs) = extraction.timeout_secs {
                config.extraction.timeout = Duration::from_secs(secs);
            }
            if let Some(policy) = extraction.candidate_policy {
                config.extraction.candidate_policy = policy;
            }
        }

        if config.vocabulary.categories.is_empty() {
            return Err(AppError::config("category vocabulary must not be empty"));
        }

        Ok(config)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("catat").join("config.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    vocabulary: Option<RawVocabulary>,
    ledger: Option<RawLedger>,
    extraction: Option<RawExtraction>,
}

#[derive(Debug, Deserialize)]
struct RawVocabulary {
    categories: Option<Vec<String>>,
    accounts: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawLedger {
    backend: Option<String>,
    db_path: Option<PathBuf>,
    spreadsheet_id: Option<String>,
    detail_range: Option<String>,
    summary_range: Option<String>,
    summary_window: Option<usize>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawExtraction {
    timeout_secs: Option<u64>,
    candidate_policy: Option<CandidatePolicy>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_embedded_config_matches_defaults() {
        let config = AppConfig::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.vocabulary.categories.len(), 11);
        assert_eq!(config.vocabulary.accounts[0], "GOPAY");
    }

    #[test]
    fn test_partial_override() {
        let config = AppConfig::parse(
            r#"
            [ledger]
            backend = "sheets"
            spreadsheet_id = "abc123"

            [extraction]
            candidate_policy = "first_wins"
            "#,
        )
        .unwrap();

        assert_eq!(config.ledger.backend, LedgerKind::Sheets);
        assert_eq!(config.ledger.spreadsheet_id.as_deref(), Some("abc123"));
        assert_eq!(config.ledger.summary_range, "summary!A2:F12");
        assert_eq!(config.extraction.candidate_policy, CandidatePolicy::FirstWins);
        assert_eq!(config.vocabulary, Vocabulary::default());
    }

    #[test]
    fn test_unknown_backend_is_config_error() {
        let err = AppConfig::parse("[ledger]\nbackend = \"excel\"").unwrap_err();
        assert_eq!(err.code, ErrorCode::Config);
        assert!(err.is_critical());
    }

    #[test]
    fn test_empty_categories_rejected() {
        let err = AppConfig::parse("[vocabulary]\ncategories = []").unwrap_err();
        assert_eq!(err.code, ErrorCode::Config);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catat.toml");
        fs::write(&path, "[vocabulary]\naccounts = [\"CASH\"]\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.vocabulary.accounts, vec!["CASH".to_string()]);

        let missing = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert_eq!(missing.code, ErrorCode::Config);
    }
}
