//! Store layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the expense CRUD contract used by services and shells.
//! - Isolate SQLite query details from use-case orchestration.
//!
//! # Invariants
//! - Store writes must enforce `Expense::validate()` before persistence.
//! - Store errors are propagated to callers, never logged-and-swallowed.

pub mod expense_store;
