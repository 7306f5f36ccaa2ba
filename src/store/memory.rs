// In-memory content store
//
// Patches are applied to a copy under the write lock and swapped in only on
// success, so a rejected patch never leaves a half-updated document. The
// status a patch was planned against is rechecked under the same lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{collapse_draft_pairs, ContentStore, StoreError};
use crate::dashboard::StatusFilter;
use crate::workflow::patch::{PatchError, WorkflowPatch};
use crate::workflow::types::{draft_id, WorkflowDocument};

#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    documents: RwLock<HashMap<String, WorkflowDocument>>,
    fail_commits: AtomicBool,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_documents(documents: impl IntoIterator<Item = WorkflowDocument>) -> Self {
        let store = Self::new();
        for document in documents {
            store.insert(document).await;
        }
        store
    }

    /// Insert or replace a document directly, bypassing the workflow
    pub async fn insert(&self, document: WorkflowDocument) {
        self.documents
            .write()
            .await
            .insert(document.id.clone(), document);
    }

    /// Raw lookup by exact id, without draft resolution
    pub async fn get(&self, id: &str) -> Option<WorkflowDocument> {
        self.documents.read().await.get(id).cloned()
    }

    /// Make subsequent commits fail as if the network dropped
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn fetch_document(&self, id: &str) -> Result<Option<WorkflowDocument>, StoreError> {
        let documents = self.documents.read().await;
        let found = documents
            .get(&draft_id(id))
            .or_else(|| documents.get(id))
            .cloned();
        Ok(found)
    }

    async fn commit_patch(&self, patch: &WorkflowPatch) -> Result<WorkflowDocument, StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            warn!(document_id = %patch.document_id, "Simulated transport failure");
            return Err(StoreError::Transport(
                "simulated network failure".to_string(),
            ));
        }

        let mut documents = self.documents.write().await;
        let current = documents
            .get(&patch.document_id)
            .ok_or_else(|| StoreError::NotFound(patch.document_id.clone()))?;

        let updated = patch.apply_to(current).map_err(|err| match err {
            PatchError::StaleSnapshot { .. } => {
                warn!(document_id = %patch.document_id, error = %err, "Rejected stale patch");
                StoreError::stale(&err)
            }
            other => other.into(),
        })?;
        documents.insert(updated.id.clone(), updated.clone());
        debug!(
            document_id = %updated.id,
            history_len = updated.revision_history.len(),
            "Patch committed"
        );
        Ok(updated)
    }

    async fn list_documents(
        &self,
        filter: &StatusFilter,
    ) -> Result<Vec<WorkflowDocument>, StoreError> {
        let documents = self.documents.read().await;
        let matched = collapse_draft_pairs(documents.values().cloned())
            .into_iter()
            .filter(|doc| filter.matches(doc))
            .collect();
        Ok(matched)
    }
}
