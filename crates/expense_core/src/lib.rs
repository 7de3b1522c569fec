//! Core of the receipt-aware expense ledger.
//! Owns expense invariants, SQLite persistence and receipt extraction.

pub mod db;
pub mod logging;
pub mod model;
pub mod receipt;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::expense::{Expense, ExpenseDate, ExpenseId, ExpenseValidationError};
pub use receipt::{AnalysisError, AnalyzerConfig, ReceiptAnalyzer};
pub use repo::expense_store::{ExpenseStore, SqliteExpenseStore, StoreError, StoreResult};
pub use service::expense_service::{ExpenseService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
