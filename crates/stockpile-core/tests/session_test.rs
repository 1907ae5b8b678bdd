#![allow(clippy::unwrap_used)]
// End-to-end tests for the `Session` facade against a wiremock backend.
//
// The change feed is disabled throughout: convergence here relies on the
// post-mutation refresh path, which re-fetches the collections a
// mutation touched. List mocks are mounted in pairs -- a one-shot mock
// for the pre-mutation state, then a fallback for the post-mutation
// state (wiremock matches in mount order, expired mocks drop out).

use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stockpile_core::{
    NewEmployee, NewProduct, SaleDraft, Session, SessionConfig, SessionError, SessionState,
    UserRole,
};

// ── Fixtures ────────────────────────────────────────────────────────

fn test_config(server: &MockServer) -> SessionConfig {
    SessionConfig {
        backend_url: Url::parse(&server.uri()).unwrap(),
        timeout: std::time::Duration::from_secs(5),
        watch_enabled: false,
        refresh_interval_secs: 0,
        ..SessionConfig::default()
    }
}

fn password() -> SecretString {
    SecretString::from("hunter2".to_string())
}

fn envelope(data: Value) -> Value {
    json!({ "data": data, "error": null })
}

fn beans_fields(stock: u32) -> Value {
    json!({
        "name": "Beans",
        "description": "Dark roast",
        "category": "Coffee",
        "supplierId": "sup-1",
        "stock": stock,
        "price": 9.5,
        "cost": 4.0
    })
}

fn alice_profile() -> Value {
    json!({ "name": "Alice", "email": "alice@co", "role": "Manager" })
}

fn sale_fields(id_suffix: &str, date: &str) -> Value {
    json!({
        "productId": "p1",
        "productName": "Beans",
        "quantity": 2,
        "totalPrice": 19.0,
        "date": date,
        "employeeId": format!("acct-{id_suffix}")
    })
}

/// Mount the endpoints every signed-in test needs: auth, alice's profile
/// document, and empty collection listings for anything not overridden
/// by an earlier-mounted mock.
async fn mount_baseline(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/auth/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accountId": "acct-alice",
            "token": "tok-alice"
        })))
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1/auth/sessions/current"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/collections/users/documents/acct-alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "id": "acct-alice",
            "fields": alice_profile()
        }))))
        .mount(server)
        .await;

    for collection in ["products", "suppliers", "sales", "users"] {
        Mock::given(method("GET"))
            .and(path(format!("/v1/collections/{collection}/documents")))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
            .mount(server)
            .await;
    }
}

/// Mount a listing for `collection`. With `once`, the mock expires after
/// a single match so a later-mounted fallback takes over.
async fn mount_listing(server: &MockServer, collection: &str, docs: Value, once: bool) {
    let mock = Mock::given(method("GET"))
        .and(path(format!("/v1/collections/{collection}/documents")))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(docs)));
    let mock = if once { mock.up_to_n_times(1) } else { mock };
    mock.mount(server).await;
}

async fn signed_in_session(server: &MockServer) -> Session {
    let session = Session::new(test_config(server)).unwrap();
    session.sign_in("alice@co", &password()).await.unwrap();
    session
}

// ── Sign-in ─────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_in_loads_profile_and_replicas() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "products",
        json!([{ "id": "p1", "fields": beans_fields(12) }]),
        false,
    )
    .await;
    mount_listing(
        &server,
        "sales",
        json!([
            { "id": "s1", "fields": sale_fields("alice", "2026-08-01T09:00:00Z") },
            { "id": "s2", "fields": sale_fields("alice", "2026-08-03T09:00:00Z") }
        ]),
        false,
    )
    .await;
    mount_baseline(&server).await;

    let session = signed_in_session(&server).await;

    assert_eq!(*session.state().borrow(), SessionState::Ready);
    assert!(!*session.loading().borrow());
    assert_eq!(
        session.profile().borrow().as_ref().unwrap().name,
        "Alice"
    );

    let products = session.products_snapshot();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].stock, 12);

    // Sales arrive unsorted; the replica must hold them date-descending.
    let sales = session.sales_snapshot();
    let ids: Vec<&str> = sales.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["s2", "s1"]);
}

#[tokio::test]
async fn sign_in_without_profile_stays_awaiting_profile() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/collections/users/documents/acct-alice"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "data": null,
            "error": { "code": "not-found", "message": "no such document" }
        })))
        .mount(&server)
        .await;
    mount_baseline(&server).await;

    let session = signed_in_session(&server).await;

    assert_eq!(*session.state().borrow(), SessionState::AwaitingProfile);
    assert!(session.profile().borrow().is_none());
    assert!(!*session.loading().borrow());
}

#[tokio::test]
async fn sign_in_rejection_surfaces_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/sessions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .mount(&server)
        .await;

    let session = Session::new(test_config(&server)).unwrap();
    let result = session.sign_in("alice@co", &password()).await;

    assert!(matches!(
        result,
        Err(SessionError::AuthenticationFailed { .. })
    ));
    assert_eq!(*session.state().borrow(), SessionState::SignedOut);
    assert!(!*session.loading().borrow());
}

// ── Product mutations ───────────────────────────────────────────────

#[tokio::test]
async fn add_product_appears_in_replica_with_assigned_id() {
    let server = MockServer::start().await;
    // Pre-mutation listing: empty. Post-mutation: the created product.
    mount_listing(&server, "products", json!([]), true).await;
    mount_listing(
        &server,
        "products",
        json!([{ "id": "p-new", "fields": beans_fields(12) }]),
        false,
    )
    .await;
    mount_baseline(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/collections/products/documents"))
        .and(body_partial_json(json!({"fields": {"name": "Beans"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "id": "p-new",
            "fields": beans_fields(12)
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let session = signed_in_session(&server).await;
    assert!(session.products_snapshot().is_empty());

    let created = session
        .add_product(NewProduct {
            name: "Beans".into(),
            description: "Dark roast".into(),
            category: "Coffee".into(),
            supplier_id: "sup-1".into(),
            stock: 12,
            price: 9.5,
            cost: 4.0,
        })
        .await
        .unwrap();
    assert_eq!(created.id, "p-new");

    // Exactly one document whose fields equal the submitted product.
    let products = session.products_snapshot();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, "p-new");
    assert_eq!(products[0].name, "Beans");
    assert_eq!(products[0].supplier_id, "sup-1");
    assert_eq!(products[0].stock, 12);
}

#[tokio::test]
async fn update_product_replaces_fields_and_keeps_id() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "products",
        json!([{ "id": "p1", "fields": beans_fields(12) }]),
        true,
    )
    .await;
    let updated_fields = json!({
        "name": "Beans (Decaf)",
        "description": "Smooth decaf",
        "category": "Coffee",
        "supplierId": "sup-1",
        "stock": 12,
        "price": 10.5,
        "cost": 4.5
    });
    mount_listing(
        &server,
        "products",
        json!([{ "id": "p1", "fields": updated_fields }]),
        false,
    )
    .await;
    mount_baseline(&server).await;

    // The PATCH body must carry the fields but never the id.
    Mock::given(method("PATCH"))
        .and(path("/v1/collections/products/documents/p1"))
        .and(body_partial_json(json!({"fields": {"name": "Beans (Decaf)"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "id": "p1",
            "fields": updated_fields
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let session = signed_in_session(&server).await;

    let mut product = (*session.products_snapshot()[0]).clone();
    product.name = "Beans (Decaf)".into();
    product.description = "Smooth decaf".into();
    product.price = 10.5;
    product.cost = 4.5;
    session.update_product(product).await.unwrap();

    let products = session.products_snapshot();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, "p1");
    assert_eq!(products[0].name, "Beans (Decaf)");
    assert_eq!(products[0].price, 10.5);

    // The update body must not smuggle the id into the field map.
    let patch_bodies: Vec<Value> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "PATCH")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(patch_bodies.len(), 1);
    assert!(patch_bodies[0]["fields"].get("id").is_none());
}

// ── Sale recording ──────────────────────────────────────────────────

#[tokio::test]
async fn record_sale_with_insufficient_stock_issues_no_writes() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "products",
        json!([{ "id": "p1", "fields": beans_fields(5) }]),
        false,
    )
    .await;
    mount_baseline(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({}))))
        .expect(0)
        .mount(&server)
        .await;

    let session = signed_in_session(&server).await;

    let result = session
        .record_sale(SaleDraft {
            product_id: "p1".into(),
            quantity: 9,
        })
        .await;

    assert!(matches!(
        result,
        Err(SessionError::InsufficientStock {
            requested: 9,
            available: 5
        })
    ));

    // Both collections unchanged.
    assert_eq!(session.products_snapshot()[0].stock, 5);
    assert!(session.sales_snapshot().is_empty());
}

#[tokio::test]
async fn record_sale_for_unknown_product_issues_no_writes() {
    let server = MockServer::start().await;
    mount_baseline(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({}))))
        .expect(0)
        .mount(&server)
        .await;

    let session = signed_in_session(&server).await;

    let result = session
        .record_sale(SaleDraft {
            product_id: "ghost".into(),
            quantity: 1,
        })
        .await;

    assert!(matches!(result, Err(SessionError::ProductNotFound { .. })));
}

#[tokio::test]
async fn record_sale_commits_one_atomic_batch_and_converges() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "products",
        json!([{ "id": "p1", "fields": beans_fields(10) }]),
        true,
    )
    .await;
    mount_listing(
        &server,
        "products",
        json!([{ "id": "p1", "fields": beans_fields(8) }]),
        false,
    )
    .await;
    mount_listing(&server, "sales", json!([]), true).await;
    mount_listing(
        &server,
        "sales",
        json!([{ "id": "s-new", "fields": sale_fields("alice", "2026-08-06T10:00:00Z") }]),
        false,
    )
    .await;
    mount_baseline(&server).await;

    // One batch: sale insert + server-side conditional decrement.
    // No absolute stock value anywhere in the payload.
    Mock::given(method("POST"))
        .and(path("/v1/batch"))
        .and(body_partial_json(json!({
            "writes": [
                { "op": "create", "collection": "sales",
                  "fields": { "productId": "p1", "productName": "Beans",
                              "quantity": 2, "totalPrice": 19.0,
                              "employeeId": "acct-alice" } },
                { "op": "increment", "collection": "products", "id": "p1",
                  "field": "stock", "by": -2, "floor": 0 }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({}))))
        .expect(1)
        .mount(&server)
        .await;

    let session = signed_in_session(&server).await;

    let sale = session
        .record_sale(SaleDraft {
            product_id: "p1".into(),
            quantity: 2,
        })
        .await
        .unwrap();
    assert_eq!(sale.total_price, 19.0);
    assert_eq!(sale.product_name, "Beans");

    // Single atomic outcome: exactly one new sale, stock down by
    // exactly the quantity.
    let sales = session.sales_snapshot();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].id, "s-new");
    assert_eq!(session.products_snapshot()[0].stock, 8);
}

#[tokio::test]
async fn record_sale_surfaces_guard_conflict() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "products",
        json!([{ "id": "p1", "fields": beans_fields(10) }]),
        false,
    )
    .await;
    mount_baseline(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/batch"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "data": null,
            "error": { "code": "conflict", "message": "stock would drop below floor" }
        })))
        .mount(&server)
        .await;

    let session = signed_in_session(&server).await;

    let result = session
        .record_sale(SaleDraft {
            product_id: "p1".into(),
            quantity: 4,
        })
        .await;

    assert!(matches!(result, Err(SessionError::Conflict { .. })));
}

#[tokio::test]
async fn concurrent_sales_each_commit_conditional_decrements() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "products",
        json!([{ "id": "p1", "fields": beans_fields(10) }]),
        false,
    )
    .await;
    mount_baseline(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({}))))
        .expect(2)
        .mount(&server)
        .await;

    let session = signed_in_session(&server).await;

    let (a, b) = tokio::join!(
        session.record_sale(SaleDraft {
            product_id: "p1".into(),
            quantity: 3,
        }),
        session.record_sale(SaleDraft {
            product_id: "p1".into(),
            quantity: 4,
        }),
    );
    a.unwrap();
    b.unwrap();

    // Both commits must decrement relative to the persisted value:
    // every stock write on the wire is an `increment` op, never an
    // absolute value, so neither sale can overwrite the other's
    // decrement.
    let batch_bodies: Vec<Value> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/v1/batch")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(batch_bodies.len(), 2);

    let mut increments = Vec::new();
    for body in &batch_bodies {
        for write in body["writes"].as_array().unwrap() {
            if write["collection"] == "products" {
                assert_eq!(write["op"], "increment");
                assert_eq!(write["field"], "stock");
                assert_eq!(write["floor"], 0);
                increments.push(write["by"].as_i64().unwrap());
            }
        }
    }
    increments.sort_unstable();
    assert_eq!(increments, vec![-4, -3]);
}

// ── Sign-out ────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_out_clears_replicas_and_profile() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "products",
        json!([{ "id": "p1", "fields": beans_fields(12) }]),
        false,
    )
    .await;
    mount_listing(
        &server,
        "suppliers",
        json!([{ "id": "sup-1", "fields": {
            "name": "Acme Roasters", "contactPerson": "Ann",
            "email": "ann@acme", "phone": "555-0101"
        } }]),
        false,
    )
    .await;
    mount_listing(
        &server,
        "sales",
        json!([{ "id": "s1", "fields": sale_fields("alice", "2026-08-01T09:00:00Z") }]),
        false,
    )
    .await;
    mount_listing(
        &server,
        "users",
        json!([{ "id": "acct-alice", "fields": alice_profile() }]),
        false,
    )
    .await;
    mount_baseline(&server).await;

    let session = signed_in_session(&server).await;
    assert!(!session.products_snapshot().is_empty());
    assert!(!session.users_snapshot().is_empty());

    session.sign_out().await;

    assert!(session.products_snapshot().is_empty());
    assert!(session.suppliers_snapshot().is_empty());
    assert!(session.sales_snapshot().is_empty());
    assert!(session.users_snapshot().is_empty());
    assert!(session.profile().borrow().is_none());
    assert_eq!(*session.state().borrow(), SessionState::SignedOut);
}

#[tokio::test]
async fn mutations_require_a_session() {
    let server = MockServer::start().await;
    let session = Session::new(test_config(&server)).unwrap();

    let result = session
        .record_sale(SaleDraft {
            product_id: "p1".into(),
            quantity: 1,
        })
        .await;

    assert!(matches!(result, Err(SessionError::NotSignedIn)));
}

// ── Employee registration ───────────────────────────────────────────

#[tokio::test]
async fn register_employee_creates_profile_and_switches_session() {
    let server = MockServer::start().await;
    mount_listing(&server, "users", json!([]), true).await;
    mount_listing(
        &server,
        "users",
        json!([
            { "id": "acct-alice", "fields": alice_profile() },
            { "id": "acct-bob", "fields": {
                "name": "Bob", "email": "bob@co", "role": "Employee",
                "limits": { "maxSaleValue": 500.0 }
            } }
        ]),
        false,
    )
    .await;
    mount_baseline(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/accounts"))
        .and(header("Authorization", "Bearer tok-alice"))
        .and(body_partial_json(json!({"email": "bob@co"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accountId": "acct-bob",
            "token": "tok-bob"
        })))
        .expect(1)
        .mount(&server)
        .await;

    // The profile write and everything after it must ride the NEW
    // identity's token -- the provider already rotated the session.
    Mock::given(method("PUT"))
        .and(path("/v1/collections/users/documents/acct-bob"))
        .and(header("Authorization", "Bearer tok-bob"))
        .and(body_partial_json(json!({
            "fields": { "name": "Bob", "role": "Employee",
                        "limits": { "maxSaleValue": 500.0 } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "id": "acct-bob",
            "fields": { "name": "Bob", "email": "bob@co", "role": "Employee",
                        "limits": { "maxSaleValue": 500.0 } }
        }))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/collections/users/documents/acct-bob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "id": "acct-bob",
            "fields": { "name": "Bob", "email": "bob@co", "role": "Employee" }
        }))))
        .mount(&server)
        .await;

    let session = signed_in_session(&server).await;
    assert_eq!(session.account_id().await.as_deref(), Some("acct-alice"));

    let account_id = session
        .register_employee(NewEmployee {
            name: "Bob".into(),
            email: "bob@co".into(),
            password: SecretString::from("changeme".to_string()),
            role: UserRole::Employee,
            limits: Some(stockpile_core::SaleLimits {
                max_sale_value: 500.0,
            }),
        })
        .await
        .unwrap();
    assert_eq!(account_id, "acct-bob");

    // Bob's identity and profile both exist...
    let users = session.users_snapshot();
    assert!(users.iter().any(|u| u.id == "acct-bob" && u.role == UserRole::Employee));

    // ...and (documented defect) the active session now belongs to Bob,
    // not Alice. The manager has to sign in again.
    assert_eq!(session.account_id().await.as_deref(), Some("acct-bob"));
    let profile = session.profile().borrow().clone().unwrap();
    assert_eq!(profile.name, "Bob");
    assert_eq!(profile.role, UserRole::Employee);
}

// ── One-shot mode ───────────────────────────────────────────────────

#[tokio::test]
async fn oneshot_signs_in_runs_and_signs_out() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "products",
        json!([{ "id": "p1", "fields": beans_fields(12) }]),
        false,
    )
    .await;
    mount_baseline(&server).await;

    let count = Session::oneshot(test_config(&server), "alice@co", &password(), |session| async move {
        Ok::<_, SessionError>(session.products_snapshot().len())
    })
    .await
    .unwrap();
    assert_eq!(count, 1);

    // The session must have been revoked on the way out.
    let sign_outs = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "DELETE")
        .count();
    assert_eq!(sign_outs, 1);
}
