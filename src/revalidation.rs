// Front-end revalidation planning for content-change webhooks
//
// The site caches rendered pages; when the store reports a change we work out
// which paths must be rebuilt. The caller performs the actual refresh.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::RevalidationConfig;
use crate::workflow::DocumentType;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RevalidationError {
    #[error("Webhook secret is not configured")]
    Misconfigured,

    #[error("Invalid webhook secret")]
    Unauthorized,

    #[error("Malformed webhook payload: {0}")]
    InvalidPayload(String),
}

impl RevalidationError {
    /// HTTP status the webhook endpoint should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            RevalidationError::Misconfigured => 500,
            RevalidationError::Unauthorized => 401,
            // Same answer as any other failure while revalidating
            RevalidationError::InvalidPayload(_) => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slug {
    pub current: String,
}

/// Body the content store posts on document change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub document_type: String,
    #[serde(default)]
    pub slug: Option<Slug>,
}

impl WebhookPayload {
    pub fn from_json(body: &str) -> Result<Self, RevalidationError> {
        serde_json::from_str(body).map_err(|e| RevalidationError::InvalidPayload(e.to_string()))
    }

    fn slug(&self) -> Option<&str> {
        self.slug
            .as_ref()
            .map(|s| s.current.as_str())
            .filter(|s| !s.is_empty())
    }
}

/// Paths to refresh for one webhook, plus the response body sent back
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevalidationPlan {
    pub revalidated: bool,
    pub paths: Vec<String>,
    pub message: String,
}

impl RevalidationPlan {
    pub fn for_payload(payload: &WebhookPayload) -> Self {
        let mut paths = Vec::new();

        match DocumentType::from_type_name(&payload.document_type) {
            Some(document_type) => {
                let section = match document_type {
                    DocumentType::Biography => "/biographies",
                    DocumentType::Reflection => "/reflections",
                    DocumentType::LargeProject => "/projects",
                };
                paths.push("/".to_string());
                paths.push(section.to_string());
                if let Some(slug) = payload.slug() {
                    paths.push(format!("{section}/{slug}"));
                }
            }
            None if payload.document_type == "teamMember" => {
                paths.push("/about".to_string());
            }
            None => {
                warn!(
                    document_id = %payload.id,
                    document_type = %payload.document_type,
                    "Unknown document type in webhook, refreshing home page only"
                );
                paths.push("/".to_string());
            }
        }

        for path in &paths {
            info!(document_id = %payload.id, path = %path, "Path scheduled for revalidation");
        }

        Self {
            revalidated: true,
            message: format!("Revalidated {} paths", paths.len()),
            paths,
        }
    }
}

/// Compare the secret sent with the webhook against the configured one
pub fn verify_secret(configured: Option<&str>, provided: Option<&str>) -> Result<(), RevalidationError> {
    let expected = match configured {
        Some(secret) if !secret.is_empty() => secret,
        _ => return Err(RevalidationError::Misconfigured),
    };

    if provided != Some(expected) {
        warn!("Rejected webhook with invalid secret");
        return Err(RevalidationError::Unauthorized);
    }

    Ok(())
}

/// Verify the secret, then plan the paths for a raw webhook body
pub fn handle_webhook(
    config: &RevalidationConfig,
    provided_secret: Option<&str>,
    body: &str,
) -> Result<RevalidationPlan, RevalidationError> {
    verify_secret(config.secret.as_deref(), provided_secret)?;
    let payload = WebhookPayload::from_json(body)?;
    Ok(RevalidationPlan::for_payload(&payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(document_type: &str, slug: Option<&str>) -> WebhookPayload {
        WebhookPayload {
            id: "doc-1".to_string(),
            document_type: document_type.to_string(),
            slug: slug.map(|s| Slug {
                current: s.to_string(),
            }),
        }
    }

    #[test]
    fn test_biography_paths() {
        let plan = RevalidationPlan::for_payload(&payload("biography", Some("ivan-franko")));
        assert_eq!(plan.paths, vec!["/", "/biographies", "/biographies/ivan-franko"]);
        assert!(plan.revalidated);
        assert_eq!(plan.message, "Revalidated 3 paths");
    }

    #[test]
    fn test_project_without_slug() {
        let plan = RevalidationPlan::for_payload(&payload("largeProject", None));
        assert_eq!(plan.paths, vec!["/", "/projects"]);
    }

    #[test]
    fn test_reflection_paths() {
        let plan = RevalidationPlan::for_payload(&payload("reflection", Some("winter")));
        assert_eq!(plan.paths, vec!["/", "/reflections", "/reflections/winter"]);
    }

    #[test]
    fn test_team_member_refreshes_about() {
        let plan = RevalidationPlan::for_payload(&payload("teamMember", Some("anna")));
        assert_eq!(plan.paths, vec!["/about"]);
    }

    #[test]
    fn test_unknown_type_refreshes_home() {
        let plan = RevalidationPlan::for_payload(&payload("post", None));
        assert_eq!(plan.paths, vec!["/"]);
    }

    #[test]
    fn test_secret_checks() {
        assert_eq!(verify_secret(None, Some("x")), Err(RevalidationError::Misconfigured));
        assert_eq!(verify_secret(Some(""), Some("")), Err(RevalidationError::Misconfigured));
        assert_eq!(verify_secret(Some("s3cret"), None), Err(RevalidationError::Unauthorized));
        assert_eq!(verify_secret(Some("s3cret"), Some("nope")), Err(RevalidationError::Unauthorized));
        assert_eq!(verify_secret(Some("s3cret"), Some("s3cret")), Ok(()));

        assert_eq!(RevalidationError::Misconfigured.status_code(), 500);
        assert_eq!(RevalidationError::Unauthorized.status_code(), 401);
    }

    #[test]
    fn test_handle_webhook() {
        let config = RevalidationConfig {
            secret: Some("s3cret".to_string()),
        };
        let body = r#"{"_id":"bio-1","_type":"biography","slug":{"current":"lesya"}}"#;

        let plan = handle_webhook(&config, Some("s3cret"), body).unwrap();
        assert_eq!(plan.paths.last().map(String::as_str), Some("/biographies/lesya"));

        let err = handle_webhook(&config, Some("s3cret"), "not json").unwrap_err();
        assert_eq!(err.status_code(), 500);

        let err = handle_webhook(&config, Some("s3cret"), r#"{"_type":"biography"}"#).unwrap_err();
        assert!(matches!(err, RevalidationError::InvalidPayload(_)));
        assert_eq!(err.status_code(), 500);
    }
}
