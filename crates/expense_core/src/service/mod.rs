//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate analyzer and store calls into use-case level APIs.
//! - Keep shells decoupled from storage details.

pub mod expense_service;
