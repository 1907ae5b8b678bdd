use thiserror::Error;

/// Top-level error type for the `stockpile-api` crate.
///
/// Covers every failure mode across the backend surfaces: identity,
/// document store, change feed, and the assist provider.
/// `stockpile-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Sign-in failed (wrong credentials, account disabled, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Bearer token has expired or been revoked.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    /// Assist provider calls need an API key and none was configured.
    #[error("Assist API key not configured")]
    MissingApiKey,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Backend ─────────────────────────────────────────────────────
    /// Structured error from the backend's `{data, error}` envelope
    /// or a bare non-2xx status.
    #[error("Backend error: {message}")]
    Backend {
        message: String,
        code: Option<String>,
        status: Option<u16>,
    },

    // ── Change feed ─────────────────────────────────────────────────
    /// Change-feed WebSocket connection failed.
    #[error("Change feed connection failed: {0}")]
    WatchConnect(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates auth has expired
    /// and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::SessionExpired)
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Backend { status, code, .. } => {
                *status == Some(404) || code.as_deref() == Some("not-found")
            }
            _ => false,
        }
    }

    /// Returns `true` if the backend rejected a batch because a
    /// conditional write guard failed.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Backend { code: Some(code), .. } if code == "conflict"
        )
    }
}
