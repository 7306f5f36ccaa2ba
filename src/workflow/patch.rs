// Store patches produced by workflow transitions
//
// A transition always ships as one patch: set the status, make sure the history
// array exists, append one entry after the current last one. The store applies
// the whole patch or nothing. A patch planned from a snapshot also carries the
// status it was planned against, so a store can refuse it once the document
// has moved on.

use serde_json::{json, Value};
use thiserror::Error;

use super::types::{RevisionEntry, Status, WorkflowDocument};

/// Path the new history entry is inserted after
pub const HISTORY_TAIL: &str = "revisionHistory[-1]";

#[derive(Debug, Clone, PartialEq)]
pub enum PatchOperation {
    SetStatus(Status),
    /// Create an empty history array when the document has none yet
    SetHistoryIfMissing,
    /// Insert after the current last history entry
    AppendHistory(RevisionEntry),
}

#[derive(Debug, Error, PartialEq)]
pub enum PatchError {
    #[error("Patch targets {expected} but was applied to {actual}")]
    DocumentMismatch { expected: String, actual: String },
    #[error("Patch must set exactly one status and append exactly one history entry")]
    Malformed,
    #[error("Appended entry status {entry} does not match new status {status}")]
    StatusMismatch { status: Status, entry: Status },
    #[error("Document {document_id} is no longer in status {expected}")]
    StaleSnapshot {
        document_id: String,
        expected: Status,
        actual: Option<Status>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowPatch {
    pub document_id: String,
    pub operations: Vec<PatchOperation>,
    /// Status the document must still hold when the patch is applied
    pub expected_status: Option<Status>,
    /// Store revision of the snapshot, sent as `ifRevisionID`
    pub if_revision: Option<String>,
}

impl WorkflowPatch {
    /// Patch recording a move to `entry.status`
    pub fn transition(document_id: impl Into<String>, entry: RevisionEntry) -> Self {
        Self {
            document_id: document_id.into(),
            operations: vec![
                PatchOperation::SetStatus(entry.status),
                PatchOperation::SetHistoryIfMissing,
                PatchOperation::AppendHistory(entry),
            ],
            expected_status: None,
            if_revision: None,
        }
    }

    /// Require the target to be unchanged since `snapshot` was read
    pub fn guarded_by(mut self, snapshot: &WorkflowDocument) -> Self {
        self.expected_status = snapshot.status;
        self.if_revision = snapshot.revision.clone();
        self
    }

    /// Fail when the document no longer holds the status the patch was planned from
    pub fn check_precondition(&self, document: &WorkflowDocument) -> Result<(), PatchError> {
        match self.expected_status {
            Some(expected) if document.status != Some(expected) => Err(PatchError::StaleSnapshot {
                document_id: document.id.clone(),
                expected,
                actual: document.status,
            }),
            _ => Ok(()),
        }
    }

    pub fn new_status(&self) -> Option<Status> {
        self.operations.iter().find_map(|op| match op {
            PatchOperation::SetStatus(status) => Some(*status),
            _ => None,
        })
    }

    pub fn appended_entry(&self) -> Option<&RevisionEntry> {
        self.operations.iter().find_map(|op| match op {
            PatchOperation::AppendHistory(entry) => Some(entry),
            _ => None,
        })
    }

    /// Check the two-mutation shape of a transition patch
    pub fn validate(&self) -> Result<(), PatchError> {
        let sets = self
            .operations
            .iter()
            .filter(|op| matches!(op, PatchOperation::SetStatus(_)))
            .count();
        let appends = self
            .operations
            .iter()
            .filter(|op| matches!(op, PatchOperation::AppendHistory(_)))
            .count();
        if sets != 1 || appends != 1 {
            return Err(PatchError::Malformed);
        }

        match (self.new_status(), self.appended_entry()) {
            (Some(status), Some(entry)) if status != entry.status => Err(PatchError::StatusMismatch {
                status,
                entry: entry.status,
            }),
            _ => Ok(()),
        }
    }

    /// Apply to a snapshot, returning the patched copy. The input is never
    /// modified, so a failed patch leaves no partial state behind.
    pub fn apply_to(&self, document: &WorkflowDocument) -> Result<WorkflowDocument, PatchError> {
        if document.id != self.document_id {
            return Err(PatchError::DocumentMismatch {
                expected: self.document_id.clone(),
                actual: document.id.clone(),
            });
        }
        self.validate()?;
        self.check_precondition(document)?;

        let mut next = document.clone();
        for op in &self.operations {
            match op {
                PatchOperation::SetStatus(status) => next.status = Some(*status),
                // An empty Vec is how a missing array deserializes
                PatchOperation::SetHistoryIfMissing => {}
                PatchOperation::AppendHistory(entry) => next.revision_history.push(entry.clone()),
            }
        }
        Ok(next)
    }

    /// Mutation body in the store's wire format. All operations share one
    /// `patch` object so the store commits them in a single transaction.
    pub fn to_mutation(&self) -> Value {
        let mut patch = serde_json::Map::new();
        patch.insert("id".to_string(), Value::String(self.document_id.clone()));
        if let Some(revision) = &self.if_revision {
            patch.insert("ifRevisionID".to_string(), Value::String(revision.clone()));
        }

        for op in &self.operations {
            match op {
                PatchOperation::SetStatus(status) => {
                    patch.insert("set".to_string(), json!({ "status": status }));
                }
                PatchOperation::SetHistoryIfMissing => {
                    patch.insert("setIfMissing".to_string(), json!({ "revisionHistory": [] }));
                }
                PatchOperation::AppendHistory(entry) => {
                    patch.insert(
                        "insert".to_string(),
                        json!({ "after": HISTORY_TAIL, "items": [entry] }),
                    );
                }
            }
        }

        json!({ "mutations": [{ "patch": Value::Object(patch) }] })
    }
}
