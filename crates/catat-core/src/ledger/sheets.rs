//! Google Sheets ledger
//!
//! Uses the Sheets v4 `values` REST endpoints with a bearer token:
//! `values:append` (USER_ENTERED) for the detail table and `values.get` for
//! the summary window.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LedgerConfig;
use crate::error::{AppError, Result};
use crate::models::DetailRow;

use super::LedgerBackend;

/// Public Sheets API base URL
pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4";

#[derive(Clone)]
pub struct SheetsLedger {
    http_client: Client,
    base_url: String,
    token: String,
    spreadsheet_id: String,
    detail_range: String,
    summary_range: String,
}

impl std::fmt::Debug for SheetsLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsLedger")
            .field("base_url", &self.base_url)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("detail_range", &self.detail_range)
            .field("summary_range", &self.summary_range)
            .finish_non_exhaustive()
    }
}

impl SheetsLedger {
    pub fn new(base_url: &str, token: &str, spreadsheet_id: &str, config: &LedgerConfig) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            detail_range: config.detail_range.clone(),
            summary_range: config.summary_range.clone(),
        }
    }

    /// Create from environment variables and the ledger config
    ///
    /// `GOOGLE_SPREADSHEET_ID` overrides `spreadsheet_id` from the config;
    /// `GOOGLE_SHEETS_TOKEN` is required; `GOOGLE_SHEETS_API_BASE` is optional.
    pub fn from_env(config: &LedgerConfig) -> Result<Self> {
        let spreadsheet_id = std::env::var("GOOGLE_SPREADSHEET_ID")
            .ok()
            .filter(|id| !id.is_empty())
            .or_else(|| config.spreadsheet_id.clone())
            .ok_or_else(|| {
                AppError::config("spreadsheet id is not configured").with_component("ledger")
            })?;
        let token = std::env::var("GOOGLE_SHEETS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::config("GOOGLE_SHEETS_TOKEN is not set").with_component("ledger")
            })?;
        let base_url = std::env::var("GOOGLE_SHEETS_API_BASE")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Ok(Self::new(&base_url, &token, &spreadsheet_id, config))
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url, self.spreadsheet_id, range
        )
    }

    /// Classify a failed request as a ledger problem
    ///
    /// Timeouts and connection failures keep their own codes.
    fn transport_error(err: reqwest::Error, operation: &str) -> AppError {
        let err = err.without_url();
        let app = if err.is_timeout() {
            AppError::timeout(format!("Sheets {} timed out", operation))
        } else if err.is_connect() {
            AppError::network(format!("Sheets {} could not connect", operation))
        } else {
            AppError::ledger(format!("Sheets {} request failed", operation))
        };
        app.caused_by(err).with_component("ledger")
    }

    async fn check(response: reqwest::Response, operation: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::ledger(format!("Sheets {} failed with {}", operation, status))
            .with_context("status", status.as_u16())
            .with_context("body", body))
    }
}

#[derive(Debug, Serialize)]
struct ValueRange {
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ValueRangeResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Render a cell as the sheet shows it
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl LedgerBackend for SheetsLedger {
    async fn append_row(&self, row: &DetailRow) -> Result<()> {
        let body = ValueRange {
            values: vec![row.to_cells()],
        };
        let url = format!("{}:append", self.values_url(&self.detail_range));

        debug!(range = %self.detail_range, "Appending row to spreadsheet");
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::transport_error(e, "append"))?;
        Self::check(response, "append").await?;
        Ok(())
    }

    async fn read_summary(&self) -> Result<Vec<Vec<String>>> {
        let response = self
            .http_client
            .get(self.values_url(&self.summary_range))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Self::transport_error(e, "read"))?;
        let response = Self::check(response, "read").await?;
        let range: ValueRangeResponse = response
            .json()
            .await
            .map_err(|e| AppError::ledger("failed to decode summary range").caused_by(e))?;

        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    fn name(&self) -> &str {
        "sheets"
    }

    fn link(&self) -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}",
            self.spreadsheet_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_values_url_and_link() {
        let ledger = SheetsLedger::new(
            "http://localhost:1234/v4/",
            "token",
            "sheet-1",
            &LedgerConfig::default(),
        );
        assert_eq!(
            ledger.values_url("summary!A2:F12"),
            "http://localhost:1234/v4/spreadsheets/sheet-1/values/summary!A2:F12"
        );
        assert_eq!(ledger.link(), "https://docs.google.com/spreadsheets/d/sheet-1");
    }

    #[tokio::test]
    async fn test_request_failures_are_ledger_errors() {
        let ledger = SheetsLedger::new("notaurl", "token", "sheet-1", &LedgerConfig::default());
        let err = ledger.append_row(&DetailRow::default()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Ledger);
        assert_eq!(err.component, "ledger");

        let ledger = SheetsLedger::new(
            "http://127.0.0.1:1/v4",
            "token",
            "sheet-1",
            &LedgerConfig::default(),
        );
        let err = ledger.read_summary().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Network);
        assert_eq!(err.component, "ledger");
    }

    #[test]
    fn test_summary_cells_render_as_text() {
        let raw = r#"{"range": "summary!A2:F12", "values": [["Food", 1000, "5,000"], ["Empty", null]]}"#;
        let range: ValueRangeResponse = serde_json::from_str(raw).unwrap();
        let rows: Vec<Vec<String>> = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        assert_eq!(rows[0], vec!["Food", "1000", "5,000"]);
        assert_eq!(rows[1], vec!["Empty", ""]);
    }

    #[test]
    fn test_missing_values_key_is_empty_window() {
        let range: ValueRangeResponse = serde_json::from_str(r#"{"range": "x"}"#).unwrap();
        assert!(range.values.is_empty());
    }
}
