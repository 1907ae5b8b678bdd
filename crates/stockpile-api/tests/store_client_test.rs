#![allow(clippy::unwrap_used)]
// Integration tests for `StoreClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stockpile_api::{Error, StoreClient, Write};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, StoreClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = StoreClient::with_client(reqwest::Client::new(), base_url);
    client.set_bearer(Some(SecretString::from("tok-test".to_string())));
    (server, client)
}

fn collection_path(name: &str) -> String {
    format!("/v1/collections/{name}/documents")
}

// ── Listing tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_list_documents() {
    let (server, client) = setup().await;

    let envelope = json!({
        "data": [
            { "id": "p1", "fields": { "name": "Beans", "stock": 12 } },
            { "id": "p2", "fields": { "name": "Rice", "stock": 40 } }
        ],
        "error": null
    });

    Mock::given(method("GET"))
        .and(path(collection_path("products")))
        .and(header("Authorization", "Bearer tok-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&envelope))
        .mount(&server)
        .await;

    let docs = client.list_documents("products").await.unwrap();

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, "p1");
    assert_eq!(docs[0].fields["name"], "Beans");
    assert_eq!(docs[1].fields["stock"], 40);
}

// ── Single-document tests ───────────────────────────────────────────

#[tokio::test]
async fn test_get_document_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/collections/users/documents/acct-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "acct-1", "fields": { "name": "Alice", "role": "Manager" } },
            "error": null
        })))
        .mount(&server)
        .await;

    let doc = client.get_document("users", "acct-1").await.unwrap();

    let doc = doc.expect("document should be present");
    assert_eq!(doc.id, "acct-1");
    assert_eq!(doc.fields["role"], "Manager");
}

#[tokio::test]
async fn test_get_document_missing_maps_to_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/collections/users/documents/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "data": null,
            "error": { "code": "not-found", "message": "no such document" }
        })))
        .mount(&server)
        .await;

    let doc = client.get_document("users", "ghost").await.unwrap();
    assert!(doc.is_none());
}

// ── Mutation tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_create_document_returns_assigned_id() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(collection_path("products")))
        .and(body_partial_json(json!({"fields": {"name": "Beans"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "p-new", "fields": { "name": "Beans" } },
            "error": null
        })))
        .mount(&server)
        .await;

    let doc = client
        .create_document("products", &json!({"name": "Beans"}))
        .await
        .unwrap();

    assert_eq!(doc.id, "p-new");
}

#[tokio::test]
async fn test_update_document_patches_fields() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/v1/collections/products/documents/p1"))
        .and(body_partial_json(json!({"fields": {"price": 9.5}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "p1", "fields": { "price": 9.5 } },
            "error": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let doc = client
        .update_document("products", "p1", &json!({"price": 9.5}))
        .await
        .unwrap();

    assert_eq!(doc.id, "p1");
}

// ── Batch tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_commit_batch_sends_all_writes() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/batch"))
        .and(body_partial_json(json!({
            "writes": [
                { "op": "create", "collection": "sales" },
                { "op": "increment", "collection": "products", "id": "p1",
                  "field": "stock", "by": -3, "floor": 0 }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {},
            "error": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let writes = vec![
        Write::Create {
            collection: "sales".into(),
            fields: json!({"productId": "p1", "quantity": 3}),
        },
        Write::Increment {
            collection: "products".into(),
            id: "p1".into(),
            field: "stock".into(),
            by: -3,
            floor: Some(0),
        },
    ];

    client.commit_batch(&writes).await.unwrap();
}

#[tokio::test]
async fn test_commit_batch_guard_rejection_is_conflict() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/batch"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "data": null,
            "error": { "code": "conflict", "message": "stock would drop below floor" }
        })))
        .mount(&server)
        .await;

    let writes = vec![Write::Increment {
        collection: "products".into(),
        id: "p1".into(),
        field: "stock".into(),
        by: -99,
        floor: Some(0),
    }];

    let err = client.commit_batch(&writes).await.unwrap_err();
    assert!(err.is_conflict(), "expected conflict, got: {err:?}");
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_expired_session() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_documents("products").await;

    assert!(
        matches!(result, Err(Error::SessionExpired)),
        "expected SessionExpired, got: {result:?}"
    );
}

#[tokio::test]
async fn test_envelope_error_surfaces_code_and_message() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(collection_path("products")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "error": { "code": "permission-denied", "message": "read not allowed" }
        })))
        .mount(&server)
        .await;

    let result = client.list_documents("products").await;

    match result {
        Err(Error::Backend { ref code, ref message, .. }) => {
            assert_eq!(code.as_deref(), Some("permission-denied"));
            assert!(message.contains("read not allowed"));
        }
        other => panic!("expected Backend error, got: {other:?}"),
    }
}
