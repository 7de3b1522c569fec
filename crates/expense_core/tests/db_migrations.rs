use expense_core::db::migrations::{has_column, latest_version};
use expense_core::db::{open_db, open_db_in_memory, DbError};
use expense_core::{ExpenseDate, ExpenseStore, SqliteExpenseStore};
use chrono::NaiveDate;
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "expenses");
    assert!(has_column(&conn, "expenses", "date").unwrap());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("expenses.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "expenses");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn minimal_schema_without_date_gains_the_column_and_reads_undated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("minimal.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            amount REAL NOT NULL,
            category TEXT NOT NULL
        );
        INSERT INTO expenses (name, amount, category) VALUES ('Bus', 2.75, 'Transport');",
    )
    .unwrap();
    drop(conn);

    let store = SqliteExpenseStore::open(&path).unwrap();
    let all = store.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Bus");
    assert_eq!(all[0].date, ExpenseDate::Undated);

    let conn = Connection::open(&path).unwrap();
    assert!(has_column(&conn, "expenses", "date").unwrap());
}

#[test]
fn dated_schema_from_older_builds_is_adopted_without_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dated.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            amount REAL NOT NULL,
            category TEXT NOT NULL,
            date TEXT NOT NULL
        );
        INSERT INTO expenses (name, amount, category, date)
        VALUES ('Market', 40.0, 'Groceries', '2024-03-09');",
    )
    .unwrap();
    drop(conn);

    let store = SqliteExpenseStore::open(&path).unwrap();
    let all = store.get_all().unwrap();
    assert_eq!(
        all[0].date,
        ExpenseDate::Dated(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
    );
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
