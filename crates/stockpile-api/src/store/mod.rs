// Document store HTTP client
//
// Wraps `reqwest::Client` with envelope unwrapping and collection-scoped
// URL construction. Every response uses the `{ "data": ..., "error": ... }`
// envelope; this module strips it before the caller sees the payload.

mod write;

use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

pub use write::Write;

/// A document as the backend returns it: opaque id plus a JSON field map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub fields: Value,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    error: Option<EnvelopeError>,
}

#[derive(Deserialize)]
struct EnvelopeError {
    code: String,
    message: Option<String>,
}

/// HTTP client for the backend's document surface.
///
/// Carries the bearer token of the active session; the session facade
/// rotates it on sign-in, sign-out, and account creation.
pub struct StoreClient {
    http: reqwest::Client,
    base_url: Url,
    /// Bearer token for the active session. Rotated by the session
    /// facade; applied to every request.
    bearer: RwLock<Option<SecretString>>,
}

impl StoreClient {
    /// Create a new store client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            bearer: RwLock::new(None),
        })
    }

    /// Create a store client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            bearer: RwLock::new(None),
        }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Install or clear the bearer token used for subsequent requests.
    pub fn set_bearer(&self, token: Option<SecretString>) {
        *self.bearer.write().expect("bearer lock poisoned") = token;
    }

    /// The current bearer token, exposed for the change-feed handshake.
    pub fn bearer_header(&self) -> Option<String> {
        self.bearer
            .read()
            .expect("bearer lock poisoned")
            .as_ref()
            .map(|t| format!("Bearer {}", t.expose_secret()))
    }

    fn apply_bearer(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self.bearer.read().expect("bearer lock poisoned");
        match guard.as_ref() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/v1/collections/{name}/documents`
    fn collection_url(&self, collection: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/v1/collections/{collection}/documents"))
            .map_err(Error::InvalidUrl)
    }

    /// `{base}/v1/collections/{name}/documents/{id}`
    fn document_url(&self, collection: &str, id: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!(
            "{base}/v1/collections/{collection}/documents/{id}"
        ))
        .map_err(Error::InvalidUrl)
    }

    /// The change-feed WebSocket URL (`ws`/`wss` scheme).
    pub fn watch_url(&self) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| Error::WatchConnect(format!("cannot derive ws scheme from {url}")))?;
        let base = url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/v1/watch")).map_err(Error::InvalidUrl)
    }

    // ── Document operations ──────────────────────────────────────────

    /// Fetch the full contents of a collection.
    pub async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, Error> {
        let url = self.collection_url(collection)?;
        debug!("GET {url}");

        let resp = self
            .apply_bearer(self.http.get(url))
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_envelope(resp).await
    }

    /// Fetch a single document, or `None` if it does not exist.
    pub async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, Error> {
        let url = self.document_url(collection, id)?;
        debug!("GET {url}");

        let resp = self
            .apply_bearer(self.http.get(url))
            .send()
            .await
            .map_err(Error::Transport)?;

        match parse_envelope::<Document>(resp).await {
            Ok(doc) => Ok(Some(doc)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Insert a new document; the backend assigns and returns the id.
    pub async fn create_document(
        &self,
        collection: &str,
        fields: &(impl Serialize + Sync),
    ) -> Result<Document, Error> {
        let url = self.collection_url(collection)?;
        debug!("POST {url}");

        let resp = self
            .apply_bearer(self.http.post(url).json(&serde_json::json!({ "fields": fields })))
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_envelope(resp).await
    }

    /// Upsert a document at a caller-chosen id.
    pub async fn set_document(
        &self,
        collection: &str,
        id: &str,
        fields: &(impl Serialize + Sync),
    ) -> Result<Document, Error> {
        let url = self.document_url(collection, id)?;
        debug!("PUT {url}");

        let resp = self
            .apply_bearer(self.http.put(url).json(&serde_json::json!({ "fields": fields })))
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_envelope(resp).await
    }

    /// Overwrite the listed fields of an existing document. The id is
    /// immutable; fields not listed are left untouched.
    pub async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: &(impl Serialize + Sync),
    ) -> Result<Document, Error> {
        let url = self.document_url(collection, id)?;
        debug!("PATCH {url}");

        let resp = self
            .apply_bearer(self.http.patch(url).json(&serde_json::json!({ "fields": fields })))
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_envelope(resp).await
    }

    /// Commit a multi-write batch as a single all-or-nothing unit.
    pub async fn commit_batch(&self, writes: &[Write]) -> Result<(), Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let url = Url::parse(&format!("{base}/v1/batch")).map_err(Error::InvalidUrl)?;
        debug!(writes = writes.len(), "POST {url}");

        let resp = self
            .apply_bearer(self.http.post(url).json(&serde_json::json!({ "writes": writes })))
            .send()
            .await
            .map_err(Error::Transport)?;

        // The commit response carries no payload of interest.
        let _: Value = parse_envelope(resp).await?;
        Ok(())
    }
}

/// Parse the `{ data, error }` envelope, returning `data` on success.
///
/// HTTP 401 maps to `SessionExpired`; a populated `error` object maps to
/// `Backend` with the server's code; any other non-2xx to `Backend` with
/// a body preview.
async fn parse_envelope<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::SessionExpired);
    }

    let body = resp.text().await.map_err(Error::Transport)?;

    if let Ok(envelope) = serde_json::from_str::<Envelope<T>>(&body) {
        if let Some(err) = envelope.error {
            return Err(Error::Backend {
                message: err.message.unwrap_or_else(|| err.code.clone()),
                code: Some(err.code),
                status: Some(status.as_u16()),
            });
        }
        if let Some(data) = envelope.data {
            return Ok(data);
        }
    }

    if !status.is_success() {
        let preview = &body[..body.len().min(200)];
        return Err(Error::Backend {
            message: format!("HTTP {status}: {preview}"),
            code: None,
            status: Some(status.as_u16()),
        });
    }

    Err(Error::Deserialization {
        message: "envelope missing both data and error".into(),
        body,
    })
}
