#![allow(clippy::unwrap_used)]
// Integration tests for `DirectoryClient` using wiremock.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stockpile_api::{DirectoryClient, Error};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DirectoryClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = DirectoryClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

// ── Sign-in tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_sign_in_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/sessions"))
        .and(body_partial_json(json!({"email": "alice@co"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accountId": "acct-alice",
            "token": "tok-alice"
        })))
        .mount(&server)
        .await;

    let session = client.sign_in("alice@co", &secret("hunter2")).await.unwrap();

    assert_eq!(session.account_id, "acct-alice");
    assert_eq!(session.token.expose_secret(), "tok-alice");
}

#[tokio::test]
async fn test_sign_in_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/sessions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .mount(&server)
        .await;

    let result = client.sign_in("alice@co", &secret("wrong")).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

// ── Sign-out tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_sign_out_revokes_session() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/auth/sessions/current"))
        .and(header("Authorization", "Bearer tok-alice"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.sign_out(&secret("tok-alice")).await.unwrap();
}

// ── Account creation tests ──────────────────────────────────────────

#[tokio::test]
async fn test_create_account_returns_new_identity_session() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/accounts"))
        .and(header("Authorization", "Bearer tok-alice"))
        .and(body_partial_json(json!({"email": "bob@co"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accountId": "acct-bob",
            "token": "tok-bob"
        })))
        .mount(&server)
        .await;

    let session = client
        .create_account("bob@co", &secret("changeme"), &secret("tok-alice"))
        .await
        .unwrap();

    // The provider hands back a session for the NEW identity.
    assert_eq!(session.account_id, "acct-bob");
    assert_eq!(session.token.expose_secret(), "tok-bob");
}

#[tokio::test]
async fn test_create_account_requires_auth() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/accounts"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let result = client
        .create_account("bob@co", &secret("changeme"), &secret("stale"))
        .await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}
