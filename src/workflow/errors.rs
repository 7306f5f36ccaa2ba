use thiserror::Error;

use super::state_machine::Operation;
use super::types::Status;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The operation is not offered for this document type and status.
    /// Nothing was sent to the content store.
    #[error("{operation} is not available for {document_type} document {document_id} in status {}", status_name(.status))]
    OperationUnavailable {
        operation: Operation,
        document_id: String,
        document_type: String,
        status: Option<Status>,
    },

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Content store error: {0}")]
    Store(#[from] StoreError),
}

fn status_name(status: &Option<Status>) -> &'static str {
    status.map(|s| s.as_str()).unwrap_or("<none>")
}

impl WorkflowError {
    /// Whether the user can retry the same action unchanged
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkflowError::Store(err) => err.is_transient(),
            _ => false,
        }
    }
}
