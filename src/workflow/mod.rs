// Editorial Workflow Module - Capability-Gated Document Lifecycle
//
// Documents move through draft, review and publication. Which operations are
// offered is a pure function of (type, status); every committed operation
// sets the status and appends one audit entry in a single patch.

pub mod types;
pub mod state_machine;
pub mod patch;
pub mod errors;
pub mod actions;
pub mod history;
pub mod engine;

pub use types::{draft_id, published_id, Actor, DocumentType, RevisionEntry, Status, WorkflowDocument};
pub use state_machine::{available_operations, available_operations_for, next_status, EditorialEvent, EditorialStateMachine, Operation};
pub use patch::{PatchError, PatchOperation, WorkflowPatch};
pub use errors::WorkflowError;
pub use actions::{document_actions, document_actions_for, DocumentAction, Tone};
pub use history::{is_append_of, verify_history, HistoryError};
pub use engine::{plan_transition, PlannedTransition, TransitionCompleted, TransitionOutcome, WorkflowEngine};
