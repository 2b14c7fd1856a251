//! Error taxonomy of the stock entry workflow.
//!
//! - [`ParseError`] aborts an import; nothing is loaded.
//! - [`MappingLookupError`] is recovered locally: items default to unmapped.
//! - [`ValidationError`] blocks only the submit action.
//! - [`SubmissionError`] is surfaced without touching the working set.
//! - [`ReconciliationError`] is a rejected state transition.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed XML: {0}")]
    Malformed(String),

    #[error("identification block <infNFe> not found")]
    MissingIdentification,

    #[error("invalid number {value:?} in <{tag}>")]
    InvalidNumber { tag: String, value: String },

    #[error("line item number {0} appears more than once")]
    DuplicateItem(u32),
}

#[derive(Debug, Error)]
pub enum MappingLookupError {
    #[error("mapping lookup failed: {0}")]
    Store(#[from] StoreError),

    #[error("mapping lookup timed out after {0}s")]
    Timeout(u64),
}

/// Submission preconditions, in the order they are checked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("entry has no items")]
    EmptyEntry,

    #[error("{} item(s) without product mapping: {}", .items.len(), join(.items))]
    UnmappedItems { items: Vec<u32> },

    #[error("{} item(s) still pending confirmation: {}", .items.len(), join(.items))]
    PendingItems { items: Vec<u32> },

    #[error("{} item(s) with unacknowledged quantity divergence: {}", .items.len(), join(.items))]
    UnacknowledgedDivergence { items: Vec<u32> },
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("stock entry rejected: {0}")]
    Rejected(String),

    #[error("stock entry could not be delivered: {0}")]
    Unavailable(#[source] StoreError),
}

impl From<StoreError> for SubmissionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(reason) => SubmissionError::Rejected(reason),
            other => SubmissionError::Unavailable(other),
        }
    }
}

/// Transition refused by the reconciliation state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconciliationError {
    #[error("item {0} not found")]
    ItemNotFound(u32),

    #[error("item {0} has no product mapping and cannot be confirmed")]
    NotMapped(u32),

    #[error("item {0} is confirmed; unconfirm it before editing")]
    Confirmed(u32),

    #[error("received quantity for item {0} cannot be negative")]
    NegativeQuantity(u32),

    #[error("received quantity for item {0} has too many decimal places")]
    QuantityOutOfRange(u32),
}

/// Failure reported by an external collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("operation timed out")]
    Timeout,
}

/// Service-level error returned by the workflow and the HTTP layer.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),

    #[error("collaborator failure: {0}")]
    Store(#[from] StoreError),

    #[error("workspace {0} has no document loaded")]
    WorkspaceNotFound(Uuid),

    #[error("workspace {0} was reloaded while the request was in flight")]
    StaleGeneration(Uuid),
}

fn join(items: &[u32]) -> String {
    items
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_the_condition() {
        let err = ValidationError::UnmappedItems { items: vec![1, 3] };
        assert_eq!(err.to_string(), "2 item(s) without product mapping: 1, 3");

        let err = ValidationError::PendingItems { items: vec![2] };
        assert_eq!(err.to_string(), "1 item(s) still pending confirmation: 2");
    }

    #[test]
    fn store_rejection_becomes_submission_rejection() {
        let err: SubmissionError = StoreError::Rejected("duplicate entry".into()).into();
        assert!(matches!(err, SubmissionError::Rejected(ref r) if r == "duplicate entry"));

        let err: SubmissionError = StoreError::Timeout.into();
        assert!(matches!(err, SubmissionError::Unavailable(StoreError::Timeout)));
    }
}
