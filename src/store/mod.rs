// Content store seam
//
// The workflow never talks to a backend directly; it reads snapshots and
// commits patches through `ContentStore`. A patch names the status (and, when
// known, the revision) it was planned against; a store refuses it with a 409
// rejection once the document has moved on.

pub mod memory;
pub mod sanity;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::dashboard::StatusFilter;
use crate::workflow::patch::{PatchError, WorkflowPatch};
use crate::workflow::types::{published_id, WorkflowDocument};

pub use memory::InMemoryContentStore;
pub use sanity::SanityContentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Content store unreachable: {0}")]
    Transport(String),

    #[error("Content store rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed content store payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid patch: {0}")]
    Patch(#[from] PatchError),

    #[error("Content store misconfigured: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Rejection of a patch planned against a status the document has left
    pub fn stale(err: &PatchError) -> Self {
        StoreError::Rejected {
            status: 409,
            message: err.to_string(),
        }
    }

    /// Whether the caller may simply retry the same action
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Transport(_) => true,
            StoreError::Rejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Content store interface consumed by the workflow engine
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read a document snapshot by id. Implementations holding draft copies
    /// return the draft when one exists.
    async fn fetch_document(&self, id: &str) -> Result<Option<WorkflowDocument>, StoreError>;

    /// Apply a patch atomically and return the updated document
    async fn commit_patch(&self, patch: &WorkflowPatch) -> Result<WorkflowDocument, StoreError>;

    /// List documents matching a type/status filter. A document with a
    /// pending draft is listed once, as its draft copy.
    async fn list_documents(&self, filter: &StatusFilter)
        -> Result<Vec<WorkflowDocument>, StoreError>;
}

/// Prefer the pending draft copy over the published one
pub fn pick_draft_first(documents: Vec<WorkflowDocument>) -> Option<WorkflowDocument> {
    let (drafts, published): (Vec<_>, Vec<_>) =
        documents.into_iter().partition(|doc| doc.is_draft_copy());
    drafts.into_iter().next().or_else(|| published.into_iter().next())
}

/// One entry per logical document, draft copy first, ordered by published id
pub fn collapse_draft_pairs(
    documents: impl IntoIterator<Item = WorkflowDocument>,
) -> Vec<WorkflowDocument> {
    let mut groups: BTreeMap<String, Vec<WorkflowDocument>> = BTreeMap::new();
    for document in documents {
        groups
            .entry(published_id(&document.id).to_string())
            .or_default()
            .push(document);
    }
    groups.into_values().filter_map(pick_draft_first).collect()
}
