//! HTTP content store tests against a mocked backend
//!
//! Verifies request shapes (GROQ query parameters, mutation body, auth) and
//! how backend failures surface, without touching a real project.

use editorial_workflow::config::{ContentStoreConfig, WorkflowConfig};
use editorial_workflow::dashboard::StatusFilter;
use editorial_workflow::store::{ContentStore, SanityContentStore, StoreError};
use editorial_workflow::workflow::{DocumentType, Status, WorkflowEngine, WorkflowError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUERY_PATH: &str = "/v2024-01-01/data/query/production";
const MUTATE_PATH: &str = "/v2024-01-01/data/mutate/production";

fn store_for(server: &MockServer, token: Option<&str>) -> SanityContentStore {
    let config = ContentStoreConfig {
        api_host: Some(server.uri()),
        token: token.map(str::to_string),
        ..ContentStoreConfig::default()
    };
    SanityContentStore::new(config).unwrap()
}

fn reflection_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "_type": "reflection",
        "status": status,
        "revisionHistory": []
    })
}

#[tokio::test]
async fn test_fetch_prefers_draft_copy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param("$id", "\"ref-1\""))
        .and(query_param("$draftId", "\"drafts.ref-1\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                reflection_json("ref-1", "published"),
                reflection_json("drafts.ref-1", "draft")
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server, None);
    let doc = store.fetch_document("ref-1").await.unwrap().unwrap();

    assert_eq!(doc.id, "drafts.ref-1");
    assert_eq!(doc.status, Some(Status::Draft));
}

#[tokio::test]
async fn test_missing_document_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": [] })))
        .mount(&server)
        .await;

    let store = store_for(&server, None);
    assert!(store.fetch_document("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_engine_commits_single_mutation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [reflection_json("ref-2", "in_review")]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(MUTATE_PATH))
        .and(query_param("returnDocuments", "true"))
        .and(header("authorization", "Bearer editor-token"))
        .and(body_partial_json(json!({
            "mutations": [{
                "patch": {
                    "id": "ref-2",
                    "set": { "status": "approved" },
                    "setIfMissing": { "revisionHistory": [] },
                    "insert": { "after": "revisionHistory[-1]" }
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactionId": "tx-1",
            "results": [{
                "id": "ref-2",
                "operation": "update",
                "document": {
                    "_id": "ref-2",
                    "_type": "reflection",
                    "status": "approved",
                    "revisionHistory": [{
                        "_key": "a1b2c3",
                        "status": "approved",
                        "changedBy": "Chief Editor",
                        "changedAt": "2024-05-06T14:30:00Z",
                        "note": "Approved by the chief editor"
                    }]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = WorkflowEngine::new(
        store_for(&server, Some("editor-token")),
        &WorkflowConfig::default(),
    );
    let outcome = engine
        .approve("ref-2", Some("Chief Editor"), None)
        .await
        .unwrap();

    assert_eq!(outcome.previous_status, Status::InReview);
    assert_eq!(outcome.document.status, Some(Status::Approved));
    assert_eq!(outcome.document.revision_history.len(), 1);
}

#[tokio::test]
async fn test_rejected_mutation_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [reflection_json("ref-3", "approved")]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(MUTATE_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "description": "Insufficient permissions",
                "type": "mutationError"
            }
        })))
        .mount(&server)
        .await;

    let engine = WorkflowEngine::new(
        store_for(&server, Some("read-only-token")),
        &WorkflowConfig::default(),
    );
    let err = engine
        .publish("ref-3", Some("Chief Editor"), None)
        .await
        .unwrap_err();

    match &err {
        WorkflowError::Store(StoreError::Rejected { status, message }) => {
            assert_eq!(*status, 403);
            assert_eq!(message, "Insufficient permissions");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_rate_limited_backend_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
        .mount(&server)
        .await;

    let store = store_for(&server, None);
    let err = store.fetch_document("ref-4").await.unwrap_err();

    assert!(matches!(err, StoreError::Rejected { status: 429, .. }));
    assert!(err.is_transient());
}

const REFLECTION_LISTING: &str =
    "*[_type == \"reflection\"] | order(_id asc){_id, _rev, _type, status, revisionHistory}";

#[tokio::test]
async fn test_listings_are_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param("query", REFLECTION_LISTING))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                reflection_json("ref-5", "in_review"),
                reflection_json("ref-6", "draft")
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server, None);
    let filter = StatusFilter::new(DocumentType::Reflection, Status::InReview);

    let first = store.list_documents(&filter).await.unwrap();
    let second = store.list_documents(&filter).await.unwrap();
    let drafts = store
        .list_documents(&StatusFilter::new(DocumentType::Reflection, Status::Draft))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id, "ref-5");
    assert_eq!(drafts[0].id, "ref-6");
}

#[tokio::test]
async fn test_listing_shows_draft_pair_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param("query", REFLECTION_LISTING))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                reflection_json("drafts.ref-7", "in_review"),
                reflection_json("drafts.ref-8", "in_review"),
                reflection_json("ref-7", "in_review"),
                reflection_json("ref-8", "published")
            ]
        })))
        .mount(&server)
        .await;

    let store = store_for(&server, None);
    let in_review = store
        .list_documents(&StatusFilter::new(DocumentType::Reflection, Status::InReview))
        .await
        .unwrap();
    let published = store
        .list_documents(&StatusFilter::new(DocumentType::Reflection, Status::Published))
        .await
        .unwrap();

    let ids: Vec<&str> = in_review.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["drafts.ref-7", "drafts.ref-8"]);
    assert!(published.is_empty());
}

#[tokio::test]
async fn test_snapshot_never_read_from_cdn() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [reflection_json("ref-9", "in_review")]
        })))
        .mount(&server)
        .await;

    let config = ContentStoreConfig {
        project_id: "campus".to_string(),
        use_cdn: true,
        ..ContentStoreConfig::default()
    };
    let cdn_store = SanityContentStore::new(config).unwrap();
    assert!(cdn_store.query_url().starts_with("https://campus.api.sanity.io/"));
    assert!(cdn_store.listing_url().starts_with("https://campus.apicdn.sanity.io/"));

    let store = store_for(&server, None);
    let doc = store.fetch_document("ref-9").await.unwrap().unwrap();
    assert_eq!(doc.status, Some(Status::InReview));
}

#[tokio::test]
async fn test_first_submission_with_null_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{
                "_id": "bio-new",
                "_rev": "r1",
                "_type": "biography",
                "status": "draft",
                "revisionHistory": null
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(MUTATE_PATH))
        .and(body_partial_json(json!({
            "mutations": [{
                "patch": {
                    "id": "bio-new",
                    "ifRevisionID": "r1",
                    "set": { "status": "in_review" },
                    "setIfMissing": { "revisionHistory": [] }
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactionId": "tx-2",
            "results": [{
                "id": "bio-new",
                "operation": "update",
                "document": {
                    "_id": "bio-new",
                    "_rev": "r2",
                    "_type": "biography",
                    "status": "in_review",
                    "revisionHistory": [{
                        "_key": "d4e5f6",
                        "status": "in_review",
                        "changedBy": "Student A",
                        "changedAt": "2024-05-06T14:30:00Z",
                        "note": "Submitted for review to the chief editor"
                    }]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server, Some("editor-token"));
    let snapshot = store.fetch_document("bio-new").await.unwrap().unwrap();
    assert!(snapshot.revision_history.is_empty());

    let engine = WorkflowEngine::new(store, &WorkflowConfig::default());
    let outcome = engine
        .submit_for_review("bio-new", Some("Student A"), None)
        .await
        .unwrap();

    assert_eq!(outcome.previous_status, Status::Draft);
    assert_eq!(outcome.document.revision_history.len(), 1);
}

#[tokio::test]
async fn test_null_history_in_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{
                "_id": "ref-10",
                "_type": "reflection",
                "status": "draft",
                "revisionHistory": null
            }]
        })))
        .mount(&server)
        .await;

    let store = store_for(&server, None);
    let drafts = store
        .list_documents(&StatusFilter::new(DocumentType::Reflection, Status::Draft))
        .await
        .unwrap();
    assert_eq!(drafts.len(), 1);
    assert!(drafts[0].revision_history.is_empty());
}

#[tokio::test]
async fn test_revision_conflict_is_not_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{
                "_id": "ref-11",
                "_rev": "r5",
                "_type": "reflection",
                "status": "in_review",
                "revisionHistory": []
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(MUTATE_PATH))
        .and(body_partial_json(json!({
            "mutations": [{ "patch": { "id": "ref-11", "ifRevisionID": "r5" } }]
        })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {
                "description": "Document \"ref-11\" has unexpected revision ID (\"r6\"), expected \"r5\"",
                "type": "mutationError"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = WorkflowEngine::new(
        store_for(&server, Some("editor-token")),
        &WorkflowConfig::default(),
    );
    let err = engine
        .approve("ref-11", Some("Chief Editor"), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Store(StoreError::Rejected { status: 409, .. })
    ));
    assert!(!err.is_retryable());
}
