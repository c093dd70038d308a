//! Detail table operations

use rusqlite::params;

use super::Database;
use crate::error::Result;
use crate::models::DetailRow;

impl Database {
    /// Append one row to the detail table
    pub fn append_detail(&self, row: &DetailRow) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO detailed (date, category, notes, amount, created_by, file_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                row.date,
                row.category,
                row.notes,
                row.amount,
                row.created_by,
                row.file_id,
                row.created_at
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent detail rows, newest first
    pub fn list_details(&self, limit: i64) -> Result<Vec<DetailRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT date, category, notes, amount, created_by, file_id, created_at
            FROM detailed
            ORDER BY id DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(DetailRow {
                    date: row.get(0)?,
                    category: row.get(1)?,
                    notes: row.get(2)?,
                    amount: row.get(3)?,
                    created_by: row.get(4)?,
                    file_id: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Raw amounts of one category for dates starting with `month` (`YYYY-MM`)
    pub fn month_amounts(&self, category: &str, month: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT amount FROM detailed WHERE category = ? AND substr(date, 1, 7) = ?",
        )?;
        let amounts = stmt
            .query_map(params![category, month], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(amounts)
    }
}
