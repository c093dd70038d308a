//! Budget command implementations

use anyhow::{Context, Result};
use catat_core::config::AppConfig;
use catat_core::db::Database;
use catat_core::ledger::ledger_time;

/// Set the monthly budget of a category
pub fn cmd_budget_set(
    db: &Database,
    config: &AppConfig,
    category: &str,
    amount: f64,
    quota: Option<f64>,
) -> Result<()> {
    if amount < 0.0 || quota.is_some_and(|q| q < 0.0) {
        anyhow::bail!("Budget and quota must not be negative");
    }
    if !config.vocabulary.categories.iter().any(|c| c == category) {
        println!(
            "⚠️  '{}' is not in the category vocabulary; extracted transactions will not match it",
            category
        );
    }

    db.set_budget(category, amount, quota)
        .context("Failed to save budget")?;

    match quota {
        Some(q) => println!("✅ {}: budget {} / quota {}", category, amount, q),
        None => println!("✅ {}: budget {}", category, amount),
    }
    Ok(())
}

/// Show every budget with the month's expenses
pub fn cmd_budget_list(db: &Database, month: Option<&str>) -> Result<()> {
    let month = match month {
        Some(m) => {
            chrono::NaiveDate::parse_from_str(&format!("{}-01", m), "%Y-%m-%d")
                .with_context(|| format!("Invalid month '{}', expected YYYY-MM", m))?;
            m.to_string()
        }
        None => ledger_time(chrono::Utc::now()).format("%Y-%m").to_string(),
    };

    let rows = db
        .summary_rows(&month, usize::MAX)
        .context("Failed to compute summary")?;

    if rows.is_empty() {
        println!("No budgets set. Add one with: catat budget set <CATEGORY> <AMOUNT>");
        return Ok(());
    }

    println!("Budgets for {}:\n", month);
    println!(
        "{:<20} {:>12} {:>12} {:>12} {:>8} {:>8}",
        "CATEGORY", "EXPENSES", "BUDGET", "LEFT", "QUOTA", "Q.LEFT"
    );
    println!("{}", "-".repeat(77));

    for row in &rows {
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("-");
        println!(
            "{:<20} {:>12} {:>12} {:>12} {:>8} {:>8}",
            super::truncate(cell(0), 20),
            cell(1),
            cell(2),
            cell(3),
            cell(4),
            cell(5)
        );
    }

    Ok(())
}
