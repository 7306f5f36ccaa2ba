// Audit trail checks
//
// The history is append-only. A consistent document has its status equal to
// the last entry's status, non-decreasing timestamps, and only statuses its
// type supports.

use thiserror::Error;

use super::types::{RevisionEntry, Status, WorkflowDocument};

#[derive(Debug, Error, PartialEq)]
pub enum HistoryError {
    #[error("Document status {status:?} does not match last history entry {last}")]
    StatusMismatch { status: Option<Status>, last: Status },

    #[error("History entry {index} is older than the entry before it")]
    OutOfOrder { index: usize },

    #[error("History entry {index} has status {status}, which {document_type} does not support")]
    UnsupportedStatus {
        index: usize,
        status: Status,
        document_type: String,
    },
}

/// Check a document's audit trail invariants
pub fn verify_history(document: &WorkflowDocument) -> Result<(), HistoryError> {
    if let Some(document_type) = document.workflow_type() {
        for (index, entry) in document.revision_history.iter().enumerate() {
            if !document_type.supports(entry.status) {
                return Err(HistoryError::UnsupportedStatus {
                    index,
                    status: entry.status,
                    document_type: document.document_type.clone(),
                });
            }
        }
    }

    for (index, pair) in document.revision_history.windows(2).enumerate() {
        if pair[1].changed_at < pair[0].changed_at {
            return Err(HistoryError::OutOfOrder { index: index + 1 });
        }
    }

    if let Some(last) = document.last_entry() {
        if document.status != Some(last.status) {
            return Err(HistoryError::StatusMismatch {
                status: document.status,
                last: last.status,
            });
        }
    }

    Ok(())
}

/// True when `after` extends `before` by exactly `appended`, leaving every
/// earlier entry untouched.
pub fn is_append_of(before: &[RevisionEntry], after: &[RevisionEntry], appended: usize) -> bool {
    after.len() == before.len() + appended && after[..before.len()] == *before
}
