//! Database tests

use super::*;
use crate::models::DetailRow;

fn row(date: &str, category: &str, amount: &str) -> DetailRow {
    DetailRow {
        date: date.to_string(),
        category: category.to_string(),
        notes: "note".to_string(),
        amount: amount.to_string(),
        created_by: "budi".to_string(),
        file_id: String::new(),
        created_at: format!("{} 09:00:00", date),
    }
}

#[test]
fn test_in_memory_db() {
    let db = Database::in_memory().unwrap();
    assert!(db.list_details(10).unwrap().is_empty());
    assert!(db.list_budgets().unwrap().is_empty());
    assert_eq!(db.path(), ":memory:");
}

#[test]
fn test_append_and_list_details() {
    let db = Database::in_memory().unwrap();
    let first = db.append_detail(&row("2025-07-01", "Groceries", "100")).unwrap();
    let second = db.append_detail(&row("2025-07-02", "Health", "250")).unwrap();
    assert!(second > first);

    let rows = db.list_details(10).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].category, "Health");
    assert_eq!(rows[1], row("2025-07-01", "Groceries", "100"));
}

#[test]
fn test_set_budget_upserts() {
    let db = Database::in_memory().unwrap();
    db.set_budget("Groceries", 1_000_000.0, None).unwrap();
    db.set_budget("Eating Out", 500_000.0, Some(200_000.0)).unwrap();
    db.set_budget("Groceries", 1_500_000.0, Some(300_000.0)).unwrap();

    let budgets = db.list_budgets().unwrap();
    assert_eq!(budgets.len(), 2);
    assert_eq!(budgets[0].category, "Groceries");
    assert_eq!(budgets[0].monthly_budget, 1_500_000.0);
    assert_eq!(budgets[0].quota, Some(300_000.0));
    assert_eq!(budgets[1].quota, Some(200_000.0));
}

#[test]
fn test_summary_rows_for_month() {
    let db = Database::in_memory().unwrap();
    db.set_budget("Groceries", 1000.0, None).unwrap();
    db.set_budget("Eating Out", 500.0, Some(200.0)).unwrap();

    db.append_detail(&row("2025-07-01", "Groceries", "300")).unwrap();
    db.append_detail(&row("2025-07-15", "Groceries", "1,200")).unwrap();
    db.append_detail(&row("2025-06-30", "Groceries", "999")).unwrap();
    db.append_detail(&row("2025-07-03", "Eating Out", "150")).unwrap();

    let rows = db.summary_rows("2025-07", 11).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], vec!["Groceries", "1500", "1000", "-500"]);
    assert_eq!(rows[1], vec!["Eating Out", "150", "500", "350", "200", "50"]);
}

#[test]
fn test_summary_window_limits_rows() {
    let db = Database::in_memory().unwrap();
    for category in ["A", "B", "C"] {
        db.set_budget(category, 10.0, None).unwrap();
    }
    assert_eq!(db.summary_rows("2025-07", 2).unwrap().len(), 2);
}

#[test]
fn test_file_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("catat.db");
    {
        let db = Database::new(&path).unwrap();
        db.append_detail(&row("2025-07-01", "Groceries", "100")).unwrap();
    }
    let db = Database::new(&path).unwrap();
    assert_eq!(db.list_details(5).unwrap().len(), 1);
}
