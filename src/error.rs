//! Error type for the zone store.
//!
//! Only contract violations surface here. Stale zone or card ids are not
//! errors (the store treats them as no-ops) and malformed numeric input is
//! normalized to 0 before it reaches the store.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Input field name outside `conversion`, `removal`, `removal_base`, `duplication`.
    #[error("Unknown input field: {0}")]
    UnknownField(String),
    #[error("Unknown card category: {0}")]
    UnknownCategory(String),
    #[error("Unknown card kind: {0}")]
    UnknownKind(String),
    /// Persisted state could not be parsed (strict import only).
    #[error("Invalid calculator state JSON: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}
