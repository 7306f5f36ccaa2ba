// Workflow engine - gates and records editorial transitions
//
// One user action is one call: read the snapshot, check the operation is
// offered, commit a single patch, announce completion. Nothing is retried.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{info, warn, Instrument};

use super::actions::{document_actions_for, DocumentAction};
use super::errors::WorkflowError;
use super::history::is_append_of;
use super::patch::WorkflowPatch;
use super::state_machine::{available_operations_for, next_status, Operation};
use super::types::{Actor, DocumentType, RevisionEntry, Status, WorkflowDocument};
use crate::config::WorkflowConfig;
use crate::store::ContentStore;
use crate::telemetry::{create_transition_span, generate_correlation_id};

/// Result handed back to the caller after a committed transition
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub operation: Operation,
    pub previous_status: Status,
    pub entry: RevisionEntry,
    /// Document as returned by the store after the patch
    pub document: WorkflowDocument,
}

/// Completion signal broadcast to the host UI
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionCompleted {
    pub document_id: String,
    pub document_type: DocumentType,
    pub operation: Operation,
    pub from: Status,
    pub to: Status,
    pub entry: RevisionEntry,
}

/// A checked transition, ready to be committed
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTransition {
    pub document_type: DocumentType,
    pub from: Status,
    pub entry: RevisionEntry,
    pub patch: WorkflowPatch,
}

/// Build the patch for `operation` against a snapshot without touching any
/// store. Fails with `OperationUnavailable` when the operation is not offered.
/// The patch only applies while the document still holds the snapshot's status.
pub fn plan_transition(
    document: &WorkflowDocument,
    operation: Operation,
    actor: &Actor,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> Result<PlannedTransition, WorkflowError> {
    let unavailable = || WorkflowError::OperationUnavailable {
        operation,
        document_id: document.id.clone(),
        document_type: document.document_type.clone(),
        status: document.status,
    };

    let document_type = document.workflow_type().ok_or_else(unavailable)?;
    let current = document.status.ok_or_else(unavailable)?;
    let target = next_status(document_type, current, operation).ok_or_else(unavailable)?;

    let note = note
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(operation.default_note());
    let entry = RevisionEntry::new(target, actor.as_str(), now, note);

    Ok(PlannedTransition {
        document_type,
        from: current,
        patch: WorkflowPatch::transition(document.id.clone(), entry.clone()).guarded_by(document),
        entry,
    })
}

pub struct WorkflowEngine<S: ContentStore> {
    store: S,
    placeholder_actor: String,
    completions: broadcast::Sender<TransitionCompleted>,
}

impl<S: ContentStore> WorkflowEngine<S> {
    pub fn new(store: S, config: &WorkflowConfig) -> Self {
        let (completions, _) = broadcast::channel(config.completion_channel_capacity.max(1));
        Self {
            store,
            placeholder_actor: config.placeholder_actor.clone(),
            completions,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Receive a `TransitionCompleted` for every committed transition
    pub fn subscribe(&self) -> broadcast::Receiver<TransitionCompleted> {
        self.completions.subscribe()
    }

    async fn load(&self, id: &str) -> Result<WorkflowDocument, WorkflowError> {
        self.store
            .fetch_document(id)
            .await?
            .ok_or_else(|| WorkflowError::DocumentNotFound(id.to_string()))
    }

    /// Operations currently offered for a stored document
    pub async fn available_operations(&self, id: &str) -> Result<Vec<Operation>, WorkflowError> {
        Ok(available_operations_for(&self.load(id).await?))
    }

    /// Visible UI actions for a stored document
    pub async fn document_actions(&self, id: &str) -> Result<Vec<DocumentAction>, WorkflowError> {
        Ok(document_actions_for(&self.load(id).await?))
    }

    /// Run one editorial operation against a stored document.
    ///
    /// A missing or blank `actor` is recorded as the configured placeholder.
    /// On a store failure nothing is applied and the error is returned for the
    /// caller to surface; the caller decides whether to retry.
    pub async fn execute(
        &self,
        id: &str,
        operation: Operation,
        actor: Option<&str>,
        note: Option<&str>,
    ) -> Result<TransitionOutcome, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let span = create_transition_span(operation, id, None, &correlation_id);

        async move {
            let document = self.load(id).await?;
            let actor = Actor::resolve(actor, &self.placeholder_actor);
            let PlannedTransition {
                document_type,
                from: previous_status,
                entry,
                patch,
            } = plan_transition(&document, operation, &actor, note, Utc::now())?;

            let updated = match self.store.commit_patch(&patch).await {
                Ok(updated) => updated,
                Err(err) => {
                    warn!(
                        document_id = %document.id,
                        operation = %operation,
                        error = %err,
                        "Transition not applied"
                    );
                    return Err(err.into());
                }
            };

            if !is_append_of(&document.revision_history, &updated.revision_history, 1)
                || updated.status != Some(entry.status)
            {
                warn!(
                    document_id = %updated.id,
                    "Store returned a document that does not reflect exactly one appended entry"
                );
            }

            info!(
                document_id = %updated.id,
                document_type = %document_type,
                from = %previous_status,
                to = %entry.status,
                changed_by = %entry.changed_by,
                "Editorial transition committed"
            );

            // No subscribers is fine
            let _ = self.completions.send(TransitionCompleted {
                document_id: updated.id.clone(),
                document_type,
                operation,
                from: previous_status,
                to: entry.status,
                entry: entry.clone(),
            });

            Ok(TransitionOutcome {
                operation,
                previous_status,
                entry,
                document: updated,
            })
        }
        .instrument(span)
        .await
    }

    pub async fn submit_for_review(
        &self,
        id: &str,
        actor: Option<&str>,
        note: Option<&str>,
    ) -> Result<TransitionOutcome, WorkflowError> {
        self.execute(id, Operation::SubmitForReview, actor, note).await
    }

    pub async fn approve(
        &self,
        id: &str,
        actor: Option<&str>,
        note: Option<&str>,
    ) -> Result<TransitionOutcome, WorkflowError> {
        self.execute(id, Operation::Approve, actor, note).await
    }

    pub async fn request_changes(
        &self,
        id: &str,
        actor: Option<&str>,
        note: Option<&str>,
    ) -> Result<TransitionOutcome, WorkflowError> {
        self.execute(id, Operation::RequestChanges, actor, note).await
    }

    pub async fn publish(
        &self,
        id: &str,
        actor: Option<&str>,
        note: Option<&str>,
    ) -> Result<TransitionOutcome, WorkflowError> {
        self.execute(id, Operation::Publish, actor, note).await
    }
}
