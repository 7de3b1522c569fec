use chrono::{Local, NaiveDate};
use expense_core::db::open_db_in_memory;
use expense_core::{
    Expense, ExpenseStore, ExpenseValidationError, SqliteExpenseStore, StoreError,
};
use rusqlite::Connection;
use std::sync::Arc;
use std::thread;

#[test]
fn scenario_add_list_delete() {
    let store = SqliteExpenseStore::open_in_memory().unwrap();
    store.initialize().unwrap();

    let id = store.add(&Expense::new("Coffee", 3.5, "Food")).unwrap();
    assert_eq!(id, 1);

    let all = store.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, Some(1));

    store.delete(1).unwrap();
    assert!(store.get_all().unwrap().is_empty());
}

#[test]
fn add_and_get_all_roundtrip_keeps_dated_fields() {
    let store = SqliteExpenseStore::open_in_memory().unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 11, 2).unwrap();
    let expense = Expense::new("Hardware store", 18.99, "Home").with_date(date);

    let id = store.add(&expense).unwrap();
    let loaded = store.get(id).unwrap().unwrap();

    assert_eq!(
        loaded,
        Expense {
            id: Some(id),
            ..expense
        }
    );
}

#[test]
fn undated_expense_is_stored_with_todays_date() {
    let store = SqliteExpenseStore::open_in_memory().unwrap();
    let before = Local::now().date_naive();
    let id = store.add(&Expense::new("Lunch", 11.0, "Dining")).unwrap();
    let after = Local::now().date_naive();

    let stored = store.get(id).unwrap().unwrap();
    let date = stored.date.as_date().unwrap();
    assert!(date == before || date == after);
}

#[test]
fn add_ignores_input_id() {
    let store = SqliteExpenseStore::open_in_memory().unwrap();
    let mut expense = Expense::new("Taxi", 23.0, "Transport");
    expense.id = Some(42);

    let id = store.add(&expense).unwrap();
    assert_eq!(id, 1);
    assert!(store.get(42).unwrap().is_none());
}

#[test]
fn add_rejects_invalid_records_before_writing() {
    let store = SqliteExpenseStore::open_in_memory().unwrap();

    let cases = [
        (Expense::new("", 1.0, "Food"), ExpenseValidationError::EmptyName),
        (Expense::new("Cafe", 1.0, "  "), ExpenseValidationError::EmptyCategory),
        (
            Expense::new("Cafe", -2.0, "Food"),
            ExpenseValidationError::NonPositiveAmount(-2.0),
        ),
    ];
    for (expense, expected) in cases {
        let err = store.add(&expense).unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref actual) if *actual == expected));
    }

    assert!(store.get_all().unwrap().is_empty());
}

#[test]
fn delete_is_idempotent_and_ignores_unknown_ids() {
    let store = SqliteExpenseStore::open_in_memory().unwrap();
    let keep = store.add(&Expense::new("Keep", 1.0, "Misc")).unwrap();
    let drop_id = store.add(&Expense::new("Drop", 2.0, "Misc")).unwrap();

    store.delete(drop_id).unwrap();
    store.delete(drop_id).unwrap();
    store.delete(9_999).unwrap();

    let ids: Vec<_> = store.get_all().unwrap().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![Some(keep)]);
}

#[test]
fn ids_increase_and_are_not_reused_after_delete() {
    let store = SqliteExpenseStore::open_in_memory().unwrap();
    let first = store.add(&Expense::new("A", 1.0, "Misc")).unwrap();
    let second = store.add(&Expense::new("B", 1.0, "Misc")).unwrap();
    store.delete(second).unwrap();
    let third = store.add(&Expense::new("C", 1.0, "Misc")).unwrap();

    assert!(first < second);
    assert!(second < third);
}

#[test]
fn get_all_returns_insertion_order() {
    let store = SqliteExpenseStore::open_in_memory().unwrap();
    for name in ["first", "second", "third"] {
        store.add(&Expense::new(name, 1.0, "Misc")).unwrap();
    }

    let names: Vec<_> = store
        .get_all()
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, ["first", "second", "third"]);
}

#[test]
fn total_amount_sums_all_rows() {
    let store = SqliteExpenseStore::open_in_memory().unwrap();
    assert_eq!(store.total_amount().unwrap(), 0.0);

    store.add(&Expense::new("A", 1.25, "Misc")).unwrap();
    store.add(&Expense::new("B", 2.5, "Misc")).unwrap();
    assert!((store.total_amount().unwrap() - 3.75).abs() < 1e-9);
}

#[test]
fn initialize_is_idempotent_on_existing_table() {
    let store = SqliteExpenseStore::open_in_memory().unwrap();
    store.add(&Expense::new("A", 1.0, "Misc")).unwrap();

    store.initialize().unwrap();
    store.initialize().unwrap();
    assert_eq!(store.get_all().unwrap().len(), 1);
}

#[test]
fn from_connection_initialize_creates_schema() {
    let store = SqliteExpenseStore::from_connection(Connection::open_in_memory().unwrap());
    store.initialize().unwrap();
    assert_eq!(store.add(&Expense::new("A", 1.0, "Misc")).unwrap(), 1);
}

#[test]
fn malformed_persisted_date_is_reported() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO expenses (name, amount, category, date) VALUES ('Bad', 1.0, 'Misc', '03/09/2024');",
        [],
    )
    .unwrap();
    let store = SqliteExpenseStore::from_connection(conn);

    let err = store.get_all().unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(ref message) if message.contains("03/09/2024")));
}

#[test]
fn invalid_persisted_amount_is_reported() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO expenses (name, amount, category) VALUES ('Refund', -4.0, 'Misc');",
        [],
    )
    .unwrap();
    let store = SqliteExpenseStore::from_connection(conn);

    assert!(matches!(
        store.get_all().unwrap_err(),
        StoreError::InvalidData(_)
    ));
}

#[test]
fn concurrent_adds_assign_distinct_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteExpenseStore::open(dir.path().join("shared.db")).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                (0..10)
                    .map(|n| {
                        store
                            .add(&Expense::new(format!("w{worker}-{n}"), 1.0, "Misc"))
                            .unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<_> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 40);
    assert_eq!(store.get_all().unwrap().len(), 40);
}

