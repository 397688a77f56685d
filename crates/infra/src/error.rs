//! Engine boundary errors.
//!
//! Every storage and domain failure is translated into [`EngineError`] before
//! it leaves the search or reservation engine.

use thiserror::Error;

use medfind_core::DomainError;
use medfind_inventory::DecrementRejected;

use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Malformed reservation input (non-positive quantity, blank user, bad id).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Search bounds rejected before storage was touched.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    /// Lost every compare-and-swap attempt within the retry bound.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl EngineError {
    /// Whether the caller may repeat the same call and expect a different outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Conflict(_) | EngineError::StoreUnavailable(_))
    }
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => EngineError::InvalidRequest(msg),
            DomainError::InvalidId(msg) => EngineError::InvalidRequest(msg),
            DomainError::InvariantViolation(msg) => EngineError::InvalidRequest(msg),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(msg) => EngineError::NotFound(msg),
            StoreError::Conflict(msg) => EngineError::Conflict(msg),
            StoreError::Duplicate(msg) => EngineError::InvalidRequest(format!("duplicate: {msg}")),
            StoreError::Unavailable(msg) => EngineError::StoreUnavailable(msg),
            StoreError::Corrupt(msg) => EngineError::StoreUnavailable(format!("corrupt row: {msg}")),
        }
    }
}

impl From<DecrementRejected> for EngineError {
    fn from(value: DecrementRejected) -> Self {
        match value {
            DecrementRejected::InvalidAmount(amount) => {
                EngineError::InvalidRequest(format!("quantity must be positive (got {amount})"))
            }
            DecrementRejected::InsufficientStock { requested, available } => {
                EngineError::InsufficientStock { requested, available }
            }
        }
    }
}
