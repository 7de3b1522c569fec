//! Expense store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide durable CRUD over the single `expenses` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `add` validates before any SQL mutation and ignores the input `id`.
//! - Insert and id read-back run under one lock, so ids are assigned
//!   atomically and strictly increase (`AUTOINCREMENT` never reuses them).
//! - Read paths reject invalid persisted rows instead of masking them.
//! - `delete` is idempotent.

use crate::db::{migrations::apply_migrations, open_db, open_db_in_memory, DbError};
use crate::model::expense::{Expense, ExpenseDate, ExpenseId, ExpenseValidationError};
use log::{error, info};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const EXPENSE_SELECT_SQL: &str = "SELECT
    id,
    name,
    amount,
    category,
    date
FROM expenses";

pub type StoreResult<T> = Result<T, StoreError>;

/// Error for expense persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    Validation(ExpenseValidationError),
    Db(DbError),
    InvalidData(String),
    /// A writer panicked while holding the connection.
    LockPoisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted expense data: {message}"),
            Self::LockPoisoned => write!(f, "expense store connection lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<ExpenseValidationError> for StoreError {
    fn from(value: ExpenseValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Store interface for expense CRUD operations.
pub trait ExpenseStore {
    /// Ensures the schema exists. Safe to call on every start.
    fn initialize(&self) -> StoreResult<()>;
    /// Persists a new row and returns its assigned id.
    fn add(&self, expense: &Expense) -> StoreResult<ExpenseId>;
    /// Returns every row in insertion order.
    fn get_all(&self) -> StoreResult<Vec<Expense>>;
    /// Removes the row if present; missing ids are not an error.
    fn delete(&self, id: ExpenseId) -> StoreResult<()>;
    fn get(&self, id: ExpenseId) -> StoreResult<Option<Expense>>;
    /// Sum of all stored amounts.
    fn total_amount(&self) -> StoreResult<f64>;
}

impl<S: ExpenseStore + ?Sized> ExpenseStore for &S {
    fn initialize(&self) -> StoreResult<()> {
        (**self).initialize()
    }

    fn add(&self, expense: &Expense) -> StoreResult<ExpenseId> {
        (**self).add(expense)
    }

    fn get_all(&self) -> StoreResult<Vec<Expense>> {
        (**self).get_all()
    }

    fn delete(&self, id: ExpenseId) -> StoreResult<()> {
        (**self).delete(id)
    }

    fn get(&self, id: ExpenseId) -> StoreResult<Option<Expense>> {
        (**self).get(id)
    }

    fn total_amount(&self) -> StoreResult<f64> {
        (**self).total_amount()
    }
}

/// SQLite-backed expense store.
///
/// Owns its connection behind a mutex so one store can be shared between
/// threads (for example behind an `Arc`).
pub struct SqliteExpenseStore {
    conn: Mutex<Connection>,
}

impl SqliteExpenseStore {
    /// Opens (or creates) a database file with the schema applied.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a private in-memory database with the schema applied.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an existing connection as-is.
    ///
    /// Callers must run [`ExpenseStore::initialize`] before other operations
    /// when the connection was not produced by [`open_db`].
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::LockPoisoned)
    }
}

impl ExpenseStore for SqliteExpenseStore {
    fn initialize(&self) -> StoreResult<()> {
        let mut conn = self.lock()?;
        match apply_migrations(&mut conn) {
            Ok(()) => {
                info!("event=store_init module=repo status=ok");
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_init module=repo status=error error_code=schema_init_failed error={}",
                    err
                );
                Err(err.into())
            }
        }
    }

    fn add(&self, expense: &Expense) -> StoreResult<ExpenseId> {
        expense.validate()?;

        let date_text = ExpenseDate::Dated(expense.date.or_today()).to_db_text();
        let conn = self.lock()?;
        let result = conn
            .execute(
                "INSERT INTO expenses (
                    name,
                    amount,
                    category,
                    date
                ) VALUES (?1, ?2, ?3, ?4);",
                params![
                    expense.name.as_str(),
                    expense.amount,
                    expense.category.as_str(),
                    date_text,
                ],
            )
            .map(|_| conn.last_insert_rowid());

        match result {
            Ok(id) => {
                info!("event=expense_add module=repo status=ok id={id}");
                Ok(id)
            }
            Err(err) => {
                error!(
                    "event=expense_add module=repo status=error error_code=insert_failed error={}",
                    err
                );
                Err(err.into())
            }
        }
    }

    fn get_all(&self) -> StoreResult<Vec<Expense>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{EXPENSE_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut expenses = Vec::new();

        while let Some(row) = rows.next()? {
            expenses.push(parse_expense_row(row)?);
        }

        Ok(expenses)
    }

    fn delete(&self, id: ExpenseId) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM expenses WHERE id = ?1;", [id])?;
        info!("event=expense_delete module=repo status=ok id={id} changed={changed}");
        Ok(())
    }

    fn get(&self, id: ExpenseId) -> StoreResult<Option<Expense>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{EXPENSE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_expense_row(row)?));
        }

        Ok(None)
    }

    fn total_amount(&self) -> StoreResult<f64> {
        let conn = self.lock()?;
        let total = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM expenses;",
            [],
            |row| row.get::<_, f64>(0),
        )?;
        Ok(total)
    }
}

fn parse_expense_row(row: &Row<'_>) -> StoreResult<Expense> {
    let id: ExpenseId = row.get("id")?;

    let date_text: Option<String> = row.get("date")?;
    let date = ExpenseDate::parse_db_text(date_text.as_deref()).map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid date `{}` in expenses.date for id {id}",
            date_text.as_deref().unwrap_or_default()
        ))
    })?;

    let expense = Expense {
        id: Some(id),
        name: row.get("name")?,
        amount: row.get("amount")?,
        category: row.get("category")?,
        date,
    };
    expense
        .validate()
        .map_err(|err| StoreError::InvalidData(format!("row {id}: {err}")))?;
    Ok(expense)
}

#[cfg(test)]
mod tests {
    use super::{SqliteExpenseStore, StoreError};
    use crate::model::expense::Expense;
    use crate::repo::expense_store::ExpenseStore;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn poisoned_connection_lock_is_reported_distinctly() {
        let store = Arc::new(SqliteExpenseStore::open_in_memory().unwrap());
        store.add(&Expense::new("Cafe", 4.5, "Dining")).unwrap();

        let holder = Arc::clone(&store);
        let outcome = thread::spawn(move || {
            let _guard = holder.conn.lock().unwrap();
            panic!("writer died while holding the connection");
        })
        .join();
        assert!(outcome.is_err());

        let err = store.get_all().unwrap_err();
        assert!(matches!(err, StoreError::LockPoisoned));
        assert_eq!(err.to_string(), "expense store connection lock poisoned");
        assert!(matches!(
            store.add(&Expense::new("Cafe", 1.0, "Dining")),
            Err(StoreError::LockPoisoned)
        ));
    }
}
