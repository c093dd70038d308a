//! Parsing of extraction backend output
//!
//! Backends are asked for raw JSON but often wrap it in a fenced code block.
//! Each candidate is sanitized and checked on its own; a candidate that does
//! not decode is skipped, never fatal. Accepted candidates are merged into one
//! record, later ones overwriting only the fields they carry.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::amount::normalize_amount;
use crate::models::Transaction;

use super::types::{CandidatePolicy, Completion};

const FENCE_OPEN_JSON: &str = "```json";
const FENCE: &str = "```";

/// Older prompts name the date field this way
const DATE_ALIAS: &str = "transaction_datetime";
const DATE_FIELD: &str = "transaction_date";

/// Strip surrounding whitespace and a Markdown code fence
pub fn sanitize_candidate(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix(FENCE_OPEN_JSON)
        .or_else(|| trimmed.strip_prefix(FENCE))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(FENCE).unwrap_or(trimmed);
    trimmed.trim()
}

/// Decode one sanitized payload into the fields it sets
///
/// The date alias is folded into `transaction_date` (the canonical key wins
/// when both are present) and `null` values are dropped so they never
/// overwrite an earlier candidate.
pub fn candidate_fields(payload: &str) -> serde_json::Result<Map<String, Value>> {
    let mut fields = match serde_json::from_str::<Value>(payload)? {
        Value::Object(fields) => fields,
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected a JSON object, found {}",
                other
            )))
        }
    };

    if let Some(date) = fields.remove(DATE_ALIAS) {
        fields.entry(DATE_FIELD).or_insert(date);
    }
    serde_json::from_value::<Transaction>(Value::Object(fields.clone()))?;

    fields.retain(|_, value| !value.is_null());
    Ok(fields)
}

/// Decode one sanitized payload on its own, normalizing the amount
pub fn parse_transaction(payload: &str) -> serde_json::Result<Transaction> {
    let fields = candidate_fields(payload)?;
    let mut trx: Transaction = serde_json::from_value(Value::Object(fields))?;
    trx.amount = normalize_amount(&trx.amount);
    Ok(trx)
}

/// Merge every decodable candidate according to `policy`
///
/// Returns the zero-value `Transaction` when no candidate decodes.
pub fn parse_candidates(completion: &Completion, policy: CandidatePolicy) -> Transaction {
    let mut merged: Option<Map<String, Value>> = None;

    for (index, candidate) in completion.candidates.iter().enumerate() {
        let text = candidate.text();
        let payload = sanitize_candidate(&text);
        debug!(candidate = index, payload = %payload, "Decoding completion candidate");

        match candidate_fields(payload) {
            Ok(fields) => {
                if keep_candidate(policy, merged.is_some()) {
                    merged.get_or_insert_with(Map::new).extend(fields);
                }
            }
            Err(e) => {
                warn!(candidate = index, error = %e, "Skipping undecodable candidate");
            }
        }
    }

    let Some(fields) = merged else {
        if !completion.candidates.is_empty() {
            warn!(
                candidates = completion.candidates.len(),
                "No completion candidate decoded, returning empty transaction"
            );
        }
        return Transaction::default();
    };

    match serde_json::from_value::<Transaction>(Value::Object(fields)) {
        Ok(mut trx) => {
            trx.amount = normalize_amount(&trx.amount);
            trx
        }
        Err(e) => {
            warn!(error = %e, "Merged candidates did not decode, returning empty transaction");
            Transaction::default()
        }
    }
}

/// Whether a freshly decoded candidate is merged into the result
fn keep_candidate(policy: CandidatePolicy, have_selection: bool) -> bool {
    match policy {
        CandidatePolicy::LastWins => true,
        CandidatePolicy::FirstWins => !have_selection,
    }
}
