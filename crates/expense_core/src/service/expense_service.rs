//! Expense use-case service.
//!
//! # Responsibility
//! - Provide the entry points a shell needs: manual add, receipt import,
//!   listing and removal.
//! - Delegate persistence to an [`ExpenseStore`] implementation.
//!
//! # Invariants
//! - Service APIs never bypass store validation.
//! - Receipt import persists only a fully validated candidate.

use crate::model::expense::{Expense, ExpenseId, ExpenseValidationError};
use crate::receipt::{AnalysisError, InferenceTransport, ReceiptAnalyzer};
use crate::repo::expense_store::{ExpenseStore, StoreError};
use chrono::{Local, NaiveDate};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for expense use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before any I/O.
    Validation(ExpenseValidationError),
    Store(StoreError),
    Analysis(AnalysisError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Analysis(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Analysis(err) => Some(err),
        }
    }
}

impl From<ExpenseValidationError> for ServiceError {
    fn from(value: ExpenseValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

impl From<AnalysisError> for ServiceError {
    fn from(value: AnalysisError) -> Self {
        Self::Analysis(value)
    }
}

/// Use-case wrapper around an expense store.
pub struct ExpenseService<S: ExpenseStore> {
    store: S,
}

impl<S: ExpenseStore> ExpenseService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Adds an expense from raw form fields.
    ///
    /// # Contract
    /// - `amount_text` must be a plain decimal; no currency scrubbing here.
    /// - The record is dated today by the store.
    pub fn add_manual(
        &self,
        name: &str,
        amount_text: &str,
        category: &str,
    ) -> ServiceResult<ExpenseId> {
        let expense = Expense::from_manual_input(name, amount_text, category)?;
        Ok(self.store.add(&expense)?)
    }

    /// Analyzes a receipt, stamps its date and persists it.
    ///
    /// `date` defaults to today's local date. Returns the stored record with
    /// its assigned id.
    pub fn import_receipt<T: InferenceTransport>(
        &self,
        analyzer: &ReceiptAnalyzer<T>,
        image: &[u8],
        mime_type: &str,
        date: Option<NaiveDate>,
    ) -> ServiceResult<Expense> {
        let candidate = analyzer.analyze(image, mime_type)?;
        self.persist_candidate(candidate, date)
    }

    /// Same as [`ExpenseService::import_receipt`], reading the image from
    /// `path` and inferring its MIME type from the extension.
    pub fn import_receipt_file<T: InferenceTransport>(
        &self,
        analyzer: &ReceiptAnalyzer<T>,
        path: impl AsRef<Path>,
        date: Option<NaiveDate>,
    ) -> ServiceResult<Expense> {
        let candidate = analyzer.analyze_file(path)?;
        self.persist_candidate(candidate, date)
    }

    pub fn list(&self) -> ServiceResult<Vec<Expense>> {
        Ok(self.store.get_all()?)
    }

    /// Removes an expense; unknown ids are ignored.
    pub fn remove(&self, id: ExpenseId) -> ServiceResult<()> {
        Ok(self.store.delete(id)?)
    }

    fn persist_candidate(
        &self,
        candidate: Expense,
        date: Option<NaiveDate>,
    ) -> ServiceResult<Expense> {
        let mut expense = candidate.with_date(date.unwrap_or_else(|| Local::now().date_naive()));
        let id = self.store.add(&expense)?;
        expense.id = Some(id);

        info!("event=receipt_import module=service status=ok id={id}");
        Ok(expense)
    }
}
