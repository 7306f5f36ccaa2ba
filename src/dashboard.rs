// Review dashboard - status-grouped document listings
//
// Each workflow type gets one section per status it supports, followed by an
// unfiltered "all" section. The review queue collects `in_review` documents
// across every workflow type.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{ContentStore, StoreError};
use crate::workflow::types::{DocumentType, Status, WorkflowDocument};

/// Store filter on document type and, optionally, status equality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusFilter {
    pub document_type: DocumentType,
    pub status: Option<Status>,
}

impl StatusFilter {
    pub fn new(document_type: DocumentType, status: Status) -> Self {
        Self {
            document_type,
            status: Some(status),
        }
    }

    pub fn all(document_type: DocumentType) -> Self {
        Self {
            document_type,
            status: None,
        }
    }

    /// GROQ filter expression for this filter
    pub fn to_groq(&self) -> String {
        match self.status {
            Some(status) => format!(
                "_type == \"{}\" && status == \"{}\"",
                self.document_type.type_name(),
                status.as_str()
            ),
            None => format!("_type == \"{}\"", self.document_type.type_name()),
        }
    }

    pub fn matches(&self, document: &WorkflowDocument) -> bool {
        if document.document_type != self.document_type.type_name() {
            return false;
        }
        match self.status {
            Some(status) => document.status == Some(status),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSection {
    pub title: String,
    pub filter: StatusFilter,
}

/// Sections shown for one document type, in pipeline order
pub fn status_sections(document_type: DocumentType) -> Vec<DashboardSection> {
    let mut sections: Vec<DashboardSection> = document_type
        .statuses()
        .iter()
        .map(|status| DashboardSection {
            title: format!("{} {}", status.emoji(), status.title()),
            filter: StatusFilter::new(document_type, *status),
        })
        .collect();

    sections.push(DashboardSection {
        title: format!("All {}", document_type.title()),
        filter: StatusFilter::all(document_type),
    });
    sections
}

/// "In review" sections, one per workflow type
pub fn review_queue_sections() -> Vec<DashboardSection> {
    DocumentType::ALL
        .iter()
        .map(|document_type| DashboardSection {
            title: format!("{} in review", document_type.title()),
            filter: StatusFilter::new(*document_type, Status::InReview),
        })
        .collect()
}

/// Load the review queue from a store
pub async fn load_review_queue<S: ContentStore + ?Sized>(
    store: &S,
) -> Result<Vec<(DashboardSection, Vec<WorkflowDocument>)>, StoreError> {
    let mut queue = Vec::new();
    for section in review_queue_sections() {
        let documents = store.list_documents(&section.filter).await?;
        debug!(
            section = %section.title,
            count = documents.len(),
            "Loaded review queue section"
        );
        queue.push((section, documents));
    }
    Ok(queue)
}

/// Filter already-loaded documents without a store round trip
pub fn filter_documents<'a>(
    documents: &'a [WorkflowDocument],
    filter: &StatusFilter,
) -> Vec<&'a WorkflowDocument> {
    documents.iter().filter(|doc| filter.matches(doc)).collect()
}
