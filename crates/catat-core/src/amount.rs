//! Amount normalization and display
//!
//! Amounts stay strings end to end: the ledger stores whatever the backend
//! produced (e.g. `150,000`), minus a leading sign.

/// Strip a single leading minus sign
///
/// Total over all inputs: no numeric validation, currency symbols are kept,
/// and `"0"` / `""` pass through unchanged.
pub fn normalize_amount(amount: &str) -> String {
    amount.strip_prefix('-').unwrap_or(amount).to_string()
}

/// Parse a balance cell such as `-1,250,000` or `4000.5`
///
/// Thousands separators are removed before parsing.
pub fn parse_balance(value: &str) -> Option<f64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Format an amount as Indonesian rupiah, e.g. `Rp 1,500,000`
///
/// Amounts that do not parse as plain numbers are shown as-is.
pub fn format_rupiah(amount: &str) -> String {
    match amount.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => format!("Rp {}", format_thousands(value.trunc() as i64)),
        _ => format!("Rp {}", amount),
    }
}

fn format_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
