// Presentation-layer actions
//
// The host UI asks which actions to show for a document; an action that is
// not legal for the current (type, status) pair is simply absent.

use serde::Serialize;

use super::state_machine::{available_operations, available_operations_for, Operation};
use super::types::{DocumentType, Status, WorkflowDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Default,
    Positive,
    Caution,
}

/// A labelled, visible action bound to one workflow operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentAction {
    pub operation: Operation,
    pub label: &'static str,
    pub icon: &'static str,
    pub tone: Tone,
}

impl DocumentAction {
    pub fn for_operation(operation: Operation) -> Self {
        let (label, icon, tone) = match operation {
            Operation::SubmitForReview => ("Submit for Review", "👀", Tone::Default),
            Operation::Approve => ("Approve", "✅", Tone::Positive),
            Operation::RequestChanges => ("Request Changes", "🔄", Tone::Caution),
            Operation::Publish => ("Publish", "🌟", Tone::Positive),
        };
        Self {
            operation,
            label,
            icon,
            tone,
        }
    }
}

/// Visible actions for a (type, status) pair
pub fn document_actions(document_type: DocumentType, status: Status) -> Vec<DocumentAction> {
    available_operations(document_type, status)
        .into_iter()
        .map(DocumentAction::for_operation)
        .collect()
}

/// Visible actions for a raw store snapshot
pub fn document_actions_for(document: &WorkflowDocument) -> Vec<DocumentAction> {
    available_operations_for(document)
        .into_iter()
        .map(DocumentAction::for_operation)
        .collect()
}
