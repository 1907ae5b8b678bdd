// Identity provider HTTP client
//
// Bearer-token session management against the backend's auth surface.
// Sign-in and account creation both mint a token; the backend rotates
// the active session to whichever identity minted the token last, so
// `create_account` hands the caller a session for the NEW identity.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// An authenticated identity: the account id plus its bearer token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub account_id: String,
    pub token: SecretString,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    account_id: String,
    token: String,
}

impl From<SessionResponse> for AuthSession {
    fn from(resp: SessionResponse) -> Self {
        Self {
            account_id: resp.account_id,
            token: SecretString::from(resp.token),
        }
    }
}

/// HTTP client for the backend's identity surface.
///
/// Stateless: credentials go in, an [`AuthSession`] comes out. Token
/// storage and rotation are the caller's concern (the session facade
/// in `stockpile-core` owns the active token).
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DirectoryClient {
    /// Create a new directory client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
        })
    }

    /// Create a directory client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn auth_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/v1/auth/{path}")).map_err(Error::InvalidUrl)
    }

    /// Sign in with email and password, minting a new session.
    ///
    /// No local validation is performed -- the provider's verdict is final.
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<AuthSession, Error> {
        let url = self.auth_url("sessions")?;
        debug!(%email, "signing in");

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let session = parse_session(resp).await?;
        debug!(account_id = %session.account_id, "sign-in successful");
        Ok(session)
    }

    /// Revoke the current session.
    pub async fn sign_out(&self, token: &SecretString) -> Result<(), Error> {
        let url = self.auth_url("sessions/current")?;
        debug!("signing out");

        let resp = self
            .http
            .delete(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Backend {
                message: format!("sign-out failed (HTTP {status}): {body}"),
                code: None,
                status: Some(status.as_u16()),
            });
        }

        debug!("sign-out complete");
        Ok(())
    }

    /// Create a new identity.
    ///
    /// Provider contract: the returned token replaces the caller's active
    /// session -- after this call the caller is signed in as the NEW
    /// identity, not the one whose `token` authorized the request.
    pub async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
        token: &SecretString,
    ) -> Result<AuthSession, Error> {
        let url = self.auth_url("accounts")?;
        debug!(%email, "creating account");

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let resp = self
            .http
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let session = parse_session(resp).await?;
        debug!(account_id = %session.account_id, "account created");
        Ok(session)
    }
}

/// Parse an auth endpoint response into an [`AuthSession`].
///
/// 401/403 map to `Authentication`; other non-2xx to `Backend`.
async fn parse_session(resp: reqwest::Response) -> Result<AuthSession, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Authentication {
            message: if body.is_empty() {
                "invalid credentials".into()
            } else {
                body
            },
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Backend {
            message: format!("HTTP {status}: {}", &body[..body.len().min(200)]),
            code: None,
            status: Some(status.as_u16()),
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;
    let session: SessionResponse =
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.clone(),
        })?;

    Ok(session.into())
}
