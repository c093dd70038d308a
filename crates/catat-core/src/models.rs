//! Data models for catat

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Where a transaction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Receipt or transfer screenshot
    Image,
    /// Free-text chat message
    Text,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Text => "text",
        }
    }

    /// Noun used in user-facing confirmations ("Saved photo ✅")
    pub fn label(&self) -> &'static str {
        match self {
            Self::Image => "photo",
            Self::Text => "text",
        }
    }
}

impl std::str::FromStr for InputKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" | "photo" => Ok(Self::Image),
            "text" | "message" => Ok(Self::Text),
            _ => Err(format!("Unknown input kind: {}", s)),
        }
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction extracted from a receipt image or a chat message
///
/// Field names on the wire are the snake_case names the extraction prompt asks
/// for. Every field tolerates `null` and scalar values, since completion
/// backends are not strict about JSON types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transaction {
    /// Calendar date, `YYYY-MM-DD`
    ///
    /// A direct decode of a payload carrying both this key and its alias
    /// fails as a duplicate field; `ai::parsing` folds the alias first.
    #[serde(alias = "transaction_datetime", deserialize_with = "lenient_string")]
    pub transaction_date: String,
    /// Decimal string; never signed once normalized
    #[serde(deserialize_with = "lenient_string")]
    pub amount: String,
    #[serde(deserialize_with = "lenient_string")]
    pub amount_currency: String,
    #[serde(deserialize_with = "lenient_string")]
    pub notes: String,
    /// Payee name (image mode only)
    #[serde(deserialize_with = "lenient_string")]
    pub destination_name: String,
    /// Payee account or phone number (image mode only)
    #[serde(deserialize_with = "lenient_string")]
    pub destination_number: String,
    /// One of the configured account names (image mode only)
    #[serde(deserialize_with = "lenient_string")]
    pub source_account: String,
    /// One of the configured category names
    #[serde(deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    /// Name of the originating image; empty for text input
    #[serde(deserialize_with = "lenient_string")]
    pub file_id: String,
    /// Uploader identity, always stamped after extraction
    #[serde(skip_deserializing)]
    pub created_by: String,
    /// Advisory shown when the category is over budget or quota
    #[serde(deserialize_with = "lenient_string")]
    pub warning_message: String,
}

/// Accept strings, numbers, booleans and null for a string field
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(String::new()),
        Some(serde_json::Value::String(s)) => Ok(s),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string, got {}",
            other
        ))),
    }
}

/// Budget standing of one category, read back after a transaction is saved
///
/// All values are passed through verbatim from the summary table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub monthly_expenses: String,
    pub monthly_budget: String,
    pub budget_left: String,
    /// Empty when the category has no quota
    pub quota: String,
    pub quota_left: String,
}

impl CategorySummary {
    /// Build a summary from a summary-table row
    ///
    /// Rows with fewer than 4 cells yield `None`; quota columns default to
    /// empty strings when the row stops after the budget columns.
    pub fn from_row(row: &[String]) -> Option<Self> {
        if row.len() < 4 {
            return None;
        }
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
        Some(Self {
            category: cell(0),
            monthly_expenses: cell(1),
            monthly_budget: cell(2),
            budget_left: cell(3),
            quota: cell(4),
            quota_left: cell(5),
        })
    }

    /// True for the zero value (no matching category or summary unavailable)
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One row of the append-only detail table, in column order
///
/// Column C is reserved and always written blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRow {
    pub date: String,
    pub category: String,
    pub notes: String,
    pub amount: String,
    pub created_by: String,
    pub file_id: String,
    /// Append time in UTC+7, `YYYY-MM-DD HH:MM:SS`
    pub created_at: String,
}

impl DetailRow {
    /// Number of cells written per row
    pub const WIDTH: usize = 8;

    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.category.clone(),
            String::new(),
            self.notes.clone(),
            self.amount.clone(),
            self.created_by.clone(),
            self.file_id.clone(),
            self.created_at.clone(),
        ]
    }
}

/// Monthly budget of one category (SQLite ledger)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub category: String,
    pub monthly_budget: f64,
    /// Secondary cap; `None` when the category has no quota
    pub quota: Option<f64>,
}
