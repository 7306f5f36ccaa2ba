// Core types for the editorial workflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Document types that go through editorial review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentType {
    /// Journalist biography
    Biography,
    /// Student reflection essay
    Reflection,
    /// Multi-author multimedia project
    LargeProject,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [
        DocumentType::Biography,
        DocumentType::Reflection,
        DocumentType::LargeProject,
    ];

    /// Resolve a raw `_type` name. Returns None for types without a workflow
    /// (team members, plain posts, ...).
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "biography" => Some(DocumentType::Biography),
            "reflection" => Some(DocumentType::Reflection),
            "largeProject" => Some(DocumentType::LargeProject),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            DocumentType::Biography => "biography",
            DocumentType::Reflection => "reflection",
            DocumentType::LargeProject => "largeProject",
        }
    }

    /// Plural title used for dashboard sections
    pub fn title(&self) -> &'static str {
        match self {
            DocumentType::Biography => "Biographies",
            DocumentType::Reflection => "Reflections",
            DocumentType::LargeProject => "Large Projects",
        }
    }

    /// Statuses this type may hold, in pipeline order
    pub fn statuses(&self) -> &'static [Status] {
        match self {
            DocumentType::LargeProject => &[
                Status::Draft,
                Status::InProgress,
                Status::InReview,
                Status::ChangesRequested,
                Status::Approved,
                Status::Published,
            ],
            _ => &[
                Status::Draft,
                Status::InReview,
                Status::ChangesRequested,
                Status::Approved,
                Status::Published,
            ],
        }
    }

    pub fn supports(&self, status: Status) -> bool {
        self.statuses().contains(&status)
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Stage of a document in the editorial pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Draft,
    /// Only used by large projects
    InProgress,
    InReview,
    ChangesRequested,
    Approved,
    Published,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Draft,
        Status::InProgress,
        Status::InReview,
        Status::ChangesRequested,
        Status::Approved,
        Status::Published,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::InProgress => "in_progress",
            Status::InReview => "in_review",
            Status::ChangesRequested => "changes_requested",
            Status::Approved => "approved",
            Status::Published => "published",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Status::Draft => "Draft",
            Status::InProgress => "In Progress",
            Status::InReview => "In Review",
            Status::ChangesRequested => "Changes Requested",
            Status::Approved => "Approved",
            Status::Published => "Published",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Status::Draft => "📝",
            Status::InProgress => "⚙️",
            Status::InReview => "👀",
            Status::ChangesRequested => "🔄",
            Status::Approved => "✅",
            Status::Published => "🌟",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Status::Draft),
            "in_progress" => Ok(Status::InProgress),
            "in_review" => Ok(Status::InReview),
            "changes_requested" => Ok(Status::ChangesRequested),
            "approved" => Ok(Status::Approved),
            "published" => Ok(Status::Published),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// One immutable audit record of a status change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionEntry {
    /// Array item key required by the content store
    #[serde(rename = "_key")]
    pub key: String,
    pub status: Status,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    #[serde(default)]
    pub note: String,
}

impl RevisionEntry {
    pub fn new(
        status: Status,
        changed_by: impl Into<String>,
        changed_at: DateTime<Utc>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            key: uuid::Uuid::new_v4().simple().to_string(),
            status,
            changed_by: changed_by.into(),
            changed_at,
            note: note.into(),
        }
    }
}

/// Snapshot of a document as held by the content store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    #[serde(rename = "_id")]
    pub id: String,
    /// Store revision, changed by every write
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Raw type name; may name a type without a workflow
    #[serde(rename = "_type")]
    pub document_type: String,
    #[serde(default)]
    pub status: Option<Status>,
    /// Absent or null until the first transition creates it
    #[serde(rename = "revisionHistory", default, deserialize_with = "null_as_empty")]
    pub revision_history: Vec<RevisionEntry>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<RevisionEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<RevisionEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

impl WorkflowDocument {
    /// New workflow document in its initial `draft` status with empty history
    pub fn new(id: impl Into<String>, document_type: DocumentType) -> Self {
        Self {
            id: id.into(),
            revision: None,
            document_type: document_type.type_name().to_string(),
            status: Some(Status::Draft),
            revision_history: Vec::new(),
        }
    }

    pub fn workflow_type(&self) -> Option<DocumentType> {
        DocumentType::from_type_name(&self.document_type)
    }

    pub fn last_entry(&self) -> Option<&RevisionEntry> {
        self.revision_history.last()
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_draft_copy(&self) -> bool {
        self.id.starts_with(DRAFTS_PREFIX)
    }
}

pub const DRAFTS_PREFIX: &str = "drafts.";

/// Id of the pending draft copy of a document
pub fn draft_id(id: &str) -> String {
    if id.starts_with(DRAFTS_PREFIX) {
        id.to_string()
    } else {
        format!("{DRAFTS_PREFIX}{id}")
    }
}

/// Id of the published copy of a document
pub fn published_id(id: &str) -> &str {
    id.strip_prefix(DRAFTS_PREFIX).unwrap_or(id)
}

/// Identity recorded as `changedBy` on revision entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(String);

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Use the supplied identity, or the placeholder when it is missing or blank
    pub fn resolve(identity: Option<&str>, placeholder: &str) -> Self {
        match identity.map(str::trim) {
            Some(name) if !name.is_empty() => Self(name.to_string()),
            _ => Self(placeholder.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
