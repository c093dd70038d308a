//! Budget operations and the computed summary window

use rusqlite::params;

use super::Database;
use crate::amount::parse_balance;
use crate::error::Result;
use crate::models::Budget;

impl Database {
    /// Create or replace the budget of a category
    pub fn set_budget(&self, category: &str, monthly_budget: f64, quota: Option<f64>) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO budgets (category, monthly_budget, quota)
            VALUES (?, ?, ?)
            ON CONFLICT(category) DO UPDATE SET
                monthly_budget = excluded.monthly_budget,
                quota = excluded.quota,
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![category, monthly_budget, quota],
        )?;
        Ok(())
    }

    /// Budgets in the order they were first created
    pub fn list_budgets(&self) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT category, monthly_budget, quota FROM budgets ORDER BY id")?;
        let budgets = stmt
            .query_map([], |row| {
                Ok(Budget {
                    category: row.get(0)?,
                    monthly_budget: row.get(1)?,
                    quota: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(budgets)
    }

    /// Build the summary window for `month` (`YYYY-MM`)
    ///
    /// One row per budget, at most `window` rows: category, expenses,
    /// budget, budget left, and quota / quota left when a quota is set.
    /// Amounts that do not parse count as zero.
    pub fn summary_rows(&self, month: &str, window: usize) -> Result<Vec<Vec<String>>> {
        let mut rows = Vec::new();

        for budget in self.list_budgets()?.into_iter().take(window) {
            let expenses: f64 = self
                .month_amounts(&budget.category, month)?
                .iter()
                .filter_map(|a| parse_balance(a))
                .sum();

            let mut row = vec![
                budget.category.clone(),
                format_number(expenses),
                format_number(budget.monthly_budget),
                format_number(budget.monthly_budget - expenses),
            ];
            if let Some(quota) = budget.quota {
                row.push(format_number(quota));
                row.push(format_number(quota - expenses));
            }
            rows.push(row);
        }

        Ok(rows)
    }
}

/// Whole numbers without a fraction, others with two decimals
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}
