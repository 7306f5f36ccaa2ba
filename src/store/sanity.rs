// HTTP content store for a Sanity-style headless backend
//
// Reads go through the GROQ query endpoint, writes through the mutate
// endpoint. The snapshot a transition is gated on always comes from the live
// API; only dashboard listings may be served from the CDN. Listings are cached
// briefly and dropped after every successful patch. Patches carry the
// snapshot's `_rev`, so a write racing another editor is refused with 409.
// There is no automatic retry: a failed write surfaces to the caller with
// nothing applied.

use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use async_trait::async_trait;

use super::{collapse_draft_pairs, pick_draft_first, ContentStore, StoreError};
use crate::config::ContentStoreConfig;
use crate::dashboard::StatusFilter;
use crate::workflow::patch::WorkflowPatch;
use crate::workflow::types::{draft_id, published_id, WorkflowDocument};

const DOCUMENT_PROJECTION: &str = "{_id, _rev, _type, status, revisionHistory}";

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct MutateResponse {
    #[serde(default)]
    results: Vec<MutateResult>,
}

#[derive(Debug, Deserialize)]
struct MutateResult {
    id: String,
    #[serde(default)]
    document: Option<WorkflowDocument>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Rate-limited client for the content store HTTP API
#[derive(Debug)]
pub struct SanityContentStore {
    http: reqwest::Client,
    config: ContentStoreConfig,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    list_cache: Cache<StatusFilter, Vec<WorkflowDocument>>,
}

impl SanityContentStore {
    pub fn new(config: ContentStoreConfig) -> Result<Self, StoreError> {
        if config.project_id.trim().is_empty() || config.dataset.trim().is_empty() {
            return Err(StoreError::Configuration(
                "project_id and dataset must be set".to_string(),
            ));
        }

        let per_second = NonZeroU32::new(config.rate_limit.requests_per_second).ok_or_else(|| {
            StoreError::Configuration("rate_limit.requests_per_second must be positive".to_string())
        })?;
        let burst = NonZeroU32::new(config.rate_limit.burst_capacity).ok_or_else(|| {
            StoreError::Configuration("rate_limit.burst_capacity must be positive".to_string())
        })?;
        let rate_limiter = Arc::new(RateLimiter::direct(
            Quota::per_second(per_second).allow_burst(burst),
        ));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| StoreError::Configuration(e.to_string()))?;

        let list_cache = Cache::builder()
            .max_capacity(64)
            .time_to_live(Duration::from_secs(config.list_cache_ttl_seconds))
            .build();

        Ok(Self {
            http,
            config,
            rate_limiter,
            list_cache,
        })
    }

    fn host(&self, use_cdn: bool) -> String {
        if let Some(host) = &self.config.api_host {
            return host.trim_end_matches('/').to_string();
        }
        let api = if use_cdn { "apicdn" } else { "api" };
        format!("https://{}.{}.sanity.io", self.config.project_id, api)
    }

    fn query_endpoint(&self, use_cdn: bool) -> String {
        format!(
            "{}/v{}/data/query/{}",
            self.host(use_cdn),
            self.config.api_version,
            self.config.dataset
        )
    }

    /// Query endpoint for snapshots; never the CDN
    pub fn query_url(&self) -> String {
        self.query_endpoint(false)
    }

    /// Query endpoint for dashboard listings; served from the CDN when configured
    pub fn listing_url(&self) -> String {
        self.query_endpoint(self.config.use_cdn)
    }

    /// Mutate endpoint; never the CDN
    pub fn mutate_url(&self) -> String {
        format!(
            "{}/v{}/data/mutate/{}",
            self.host(false),
            self.config.api_version,
            self.config.dataset
        )
    }

    /// Query and parameters fetching both copies of a document
    pub fn document_query(id: &str) -> (String, Vec<(String, String)>) {
        let published = published_id(id);
        let query = format!("*[_id in [$id, $draftId]]{}", DOCUMENT_PROJECTION);
        let params = vec![
            ("$id".to_string(), json_param(published)),
            ("$draftId".to_string(), json_param(&draft_id(published))),
        ];
        (query, params)
    }

    pub fn list_query(filter: &StatusFilter) -> String {
        format!(
            "*[{}] | order(_id asc){}",
            filter.to_groq(),
            DOCUMENT_PROJECTION
        )
    }

    async fn wait_for_slot(&self) {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn run_query<T: DeserializeOwned>(
        &self,
        url: String,
        query: &str,
        params: &[(String, String)],
    ) -> Result<T, StoreError> {
        self.wait_for_slot().await;

        let mut pairs: Vec<(&str, &str)> = vec![("query", query)];
        pairs.extend(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let request = self.authorize(self.http.get(url).query(&pairs));
        let response = request.send().await.map_err(transport_error)?;
        let body = read_body(response).await?;

        let parsed: QueryResponse<T> = serde_json::from_str(&body)?;
        Ok(parsed.result)
    }
}

#[async_trait]
impl ContentStore for SanityContentStore {
    async fn fetch_document(&self, id: &str) -> Result<Option<WorkflowDocument>, StoreError> {
        let (query, params) = Self::document_query(id);
        let documents: Vec<WorkflowDocument> =
            self.run_query(self.query_url(), &query, &params).await?;
        debug!(document_id = %id, copies = documents.len(), "Fetched document snapshot");
        Ok(pick_draft_first(documents))
    }

    async fn commit_patch(&self, patch: &WorkflowPatch) -> Result<WorkflowDocument, StoreError> {
        patch.validate()?;
        let token = self.config.token.as_deref().ok_or_else(|| {
            StoreError::Configuration("a write token is required to commit patches".to_string())
        })?;

        self.wait_for_slot().await;
        let response = self
            .http
            .post(self.mutate_url())
            .query(&[("returnDocuments", "true")])
            .bearer_auth(token)
            .json(&patch.to_mutation())
            .send()
            .await
            .map_err(transport_error)?;
        let body = read_body(response).await?;

        let parsed: MutateResponse = serde_json::from_str(&body)?;
        let updated = parsed
            .results
            .into_iter()
            .find(|r| r.id == patch.document_id)
            .and_then(|r| r.document)
            .ok_or_else(|| StoreError::NotFound(patch.document_id.clone()))?;

        // Any cached listing may now hold the old status
        self.list_cache.invalidate_all();
        info!(
            document_id = %updated.id,
            status = ?updated.status,
            "Patch committed to content store"
        );
        Ok(updated)
    }

    async fn list_documents(
        &self,
        filter: &StatusFilter,
    ) -> Result<Vec<WorkflowDocument>, StoreError> {
        // Status is filtered after collapsing draft pairs, so a published copy
        // whose draft has moved on is not listed under its stale status
        let by_type = StatusFilter::all(filter.document_type);
        let documents = match self.list_cache.get(&by_type).await {
            Some(cached) => {
                debug!(filter = %by_type.to_groq(), "List cache hit");
                cached
            }
            None => {
                let fetched: Vec<WorkflowDocument> = self
                    .run_query(self.listing_url(), &Self::list_query(&by_type), &[])
                    .await?;
                let collapsed = collapse_draft_pairs(fetched);
                self.list_cache.insert(by_type, collapsed.clone()).await;
                collapsed
            }
        };

        Ok(documents
            .into_iter()
            .filter(|doc| filter.matches(doc))
            .collect())
    }
}

/// Query parameters are passed as JSON literals
fn json_param(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn transport_error(err: reqwest::Error) -> StoreError {
    warn!(error = %err, "Content store request failed");
    StoreError::Transport(err.to_string())
}

async fn read_body(response: reqwest::Response) -> Result<String, StoreError> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;
    if status.is_success() {
        return Ok(body);
    }

    let message = error_message(&body);
    warn!(status = status.as_u16(), message = %message, "Content store rejected request");
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Human-readable message from an error payload, falling back to the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error.description.or(e.error.message))
        .unwrap_or_else(|| body.trim().to_string())
}
