// Editorial Workflow Library - Review and Publication Pipeline for Media Blog Content
// This exposes the workflow engine, content store adapters and supporting services

pub mod config;
pub mod dashboard;
pub mod revalidation;
pub mod store;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use crate::config::{config, init_config, EditorialConfig};
pub use dashboard::{load_review_queue, status_sections, DashboardSection, StatusFilter};
pub use revalidation::{handle_webhook, verify_secret, RevalidationError, RevalidationPlan, WebhookPayload};
pub use store::{ContentStore, InMemoryContentStore, SanityContentStore, StoreError};
pub use telemetry::{create_transition_span, generate_correlation_id, init_telemetry};
pub use workflow::{
    available_operations,
    document_actions,
    DocumentAction,
    DocumentType,
    Operation,
    RevisionEntry,
    Status,
    TransitionCompleted,
    TransitionOutcome,
    WorkflowDocument,
    WorkflowEngine,
    WorkflowError,
};
