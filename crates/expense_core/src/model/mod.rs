//! Expense domain model.
//!
//! # Responsibility
//! - Define the record shape that flows between analyzer, store and shell.
//!
//! # Invariants
//! - A record is either unsaved (`id == None`) or persisted (`id == Some`).
//! - Deletion is a hard delete; there are no tombstones.

pub mod expense;
