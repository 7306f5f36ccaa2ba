use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;
use crate::workflow::{DocumentType, Operation};

/// Initialize structured logging.
/// RUST_LOG wins over the configured level when it is set.
pub fn init_telemetry(observability: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&observability.log_level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if observability.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }

    tracing::info!("Editorial workflow telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking the log lines of one action
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping one editorial operation from snapshot read to commit
pub fn create_transition_span(
    operation: Operation,
    document_id: &str,
    document_type: Option<DocumentType>,
    correlation_id: &str,
) -> tracing::Span {
    tracing::info_span!(
        "editorial_transition",
        operation = %operation,
        document.id = document_id,
        document_type = document_type.map(|t| t.type_name()),
        correlation.id = correlation_id,
    )
}
