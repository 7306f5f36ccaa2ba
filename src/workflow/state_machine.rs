use serde::{Deserialize, Serialize};
use statig::prelude::*;

use super::types::{DocumentType, Status, WorkflowDocument};

/// Editorial operations a reviewer or author can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    SubmitForReview,
    Approve,
    RequestChanges,
    Publish,
}

impl Operation {
    /// All operations in the order actions are presented
    pub const ALL: [Operation; 4] = [
        Operation::SubmitForReview,
        Operation::Approve,
        Operation::RequestChanges,
        Operation::Publish,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::SubmitForReview => "submitForReview",
            Operation::Approve => "approve",
            Operation::RequestChanges => "requestChanges",
            Operation::Publish => "publish",
        }
    }

    /// Status a document lands in after this operation
    pub fn target_status(&self) -> Status {
        match self {
            Operation::SubmitForReview => Status::InReview,
            Operation::Approve => Status::Approved,
            Operation::RequestChanges => Status::ChangesRequested,
            Operation::Publish => Status::Published,
        }
    }

    /// Note recorded when the caller does not supply one
    pub fn default_note(&self) -> &'static str {
        match self {
            Operation::SubmitForReview => "Submitted for review to the chief editor",
            Operation::Approve => "Approved by the chief editor",
            Operation::RequestChanges => "Returned for revision. See the comments",
            Operation::Publish => "Published",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorialEvent {
    /// Seed the machine with the status read from the content store
    Load(Status),
    Apply(Operation),
}

/// Per-document editorial state machine.
///
/// Starts `unloaded`; a `Load` event moves it to the stored status, after which
/// only the four editorial operations can move it. `in_progress` accepts no
/// operation, and nothing leaves `published`.
#[derive(Debug)]
pub struct EditorialStateMachine {
    pub document_type: DocumentType,
}

impl EditorialStateMachine {
    pub fn new(document_type: DocumentType) -> Self {
        Self { document_type }
    }
}

#[state_machine(
    initial = "State::unloaded()",
    state(derive(Debug, Clone, PartialEq, Eq))
)]
impl EditorialStateMachine {
    #[state]
    fn unloaded(&mut self, event: &EditorialEvent) -> Outcome<State> {
        match event {
            EditorialEvent::Load(status) if self.document_type.supports(*status) => {
                Transition(State::for_status(*status))
            }
            EditorialEvent::Load(status) => {
                tracing::trace!(
                    document_type = %self.document_type,
                    status = %status,
                    "Status not supported by document type"
                );
                Handled
            }
            _ => Handled,
        }
    }

    #[state]
    fn draft(event: &EditorialEvent) -> Outcome<State> {
        match event {
            EditorialEvent::Apply(Operation::SubmitForReview) => Transition(State::in_review()),
            _ => Handled,
        }
    }

    #[state]
    fn in_progress(event: &EditorialEvent) -> Outcome<State> {
        // Entered and left only by direct edits in the store
        tracing::trace!(?event, "No editorial operation from in_progress");
        Handled
    }

    #[state]
    fn in_review(event: &EditorialEvent) -> Outcome<State> {
        match event {
            EditorialEvent::Apply(Operation::Approve) => Transition(State::approved()),
            EditorialEvent::Apply(Operation::RequestChanges) => {
                Transition(State::changes_requested())
            }
            _ => Handled,
        }
    }

    #[state]
    fn changes_requested(event: &EditorialEvent) -> Outcome<State> {
        match event {
            EditorialEvent::Apply(Operation::SubmitForReview) => Transition(State::in_review()),
            _ => Handled,
        }
    }

    #[state]
    fn approved(event: &EditorialEvent) -> Outcome<State> {
        match event {
            EditorialEvent::Apply(Operation::Publish) => Transition(State::published()),
            _ => Handled,
        }
    }

    #[state]
    fn published(event: &EditorialEvent) -> Outcome<State> {
        tracing::trace!(?event, "No editorial operation from published");
        Handled
    }
}

impl State {
    fn for_status(status: Status) -> Self {
        match status {
            Status::Draft => State::draft(),
            Status::InProgress => State::in_progress(),
            Status::InReview => State::in_review(),
            Status::ChangesRequested => State::changes_requested(),
            Status::Approved => State::approved(),
            Status::Published => State::published(),
        }
    }

    /// Status held in this state; None before the machine is loaded
    pub fn status(&self) -> Option<Status> {
        match self {
            State::Unloaded { .. } => None,
            State::Draft { .. } => Some(Status::Draft),
            State::InProgress { .. } => Some(Status::InProgress),
            State::InReview { .. } => Some(Status::InReview),
            State::ChangesRequested { .. } => Some(Status::ChangesRequested),
            State::Approved { .. } => Some(Status::Approved),
            State::Published { .. } => Some(Status::Published),
        }
    }
}

/// Status reached by applying `operation`, or None when the operation is not
/// available for this document type and current status.
pub fn next_status(
    document_type: DocumentType,
    current: Status,
    operation: Operation,
) -> Option<Status> {
    let mut machine = EditorialStateMachine::new(document_type).state_machine();
    machine.handle(&EditorialEvent::Load(current));
    if machine.state().status() != Some(current) {
        return None;
    }

    machine.handle(&EditorialEvent::Apply(operation));
    match machine.state().status() {
        Some(next) if next != current => Some(next),
        _ => None,
    }
}

/// Capability query: operations offered for a (type, status) pair, in
/// presentation order.
pub fn available_operations(document_type: DocumentType, status: Status) -> Vec<Operation> {
    Operation::ALL
        .into_iter()
        .filter(|op| next_status(document_type, status, *op).is_some())
        .collect()
}

/// Capability query over a raw store snapshot. Documents of a type without a
/// workflow, or without a status, are offered nothing.
pub fn available_operations_for(document: &WorkflowDocument) -> Vec<Operation> {
    match (document.workflow_type(), document.status) {
        (Some(document_type), Some(status)) => available_operations(document_type, status),
        _ => Vec::new(),
    }
}
