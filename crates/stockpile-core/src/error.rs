// ── Core error types ──
//
// User-facing errors from stockpile-core. These are NOT transport-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<stockpile_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum SessionError {
    // ── Session errors ───────────────────────────────────────────────
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Local precondition failures ──────────────────────────────────
    //
    // Rejected before any remote write is issued.
    #[error("Product not found: {id}")]
    ProductNotFound { id: String },

    #[error("Not enough stock: requested {requested}, only {available} available")]
    InsufficientStock { requested: u32, available: u32 },

    // ── Remote rejections ────────────────────────────────────────────
    #[error("Write rejected by the backend: {message}")]
    Conflict { message: String },

    #[error("Backend error: {message}")]
    Backend {
        message: String,
        code: Option<String>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<stockpile_api::Error> for SessionError {
    fn from(err: stockpile_api::Error) -> Self {
        if err.is_conflict() {
            return SessionError::Conflict {
                message: err.to_string(),
            };
        }
        match err {
            stockpile_api::Error::Authentication { message } => {
                SessionError::AuthenticationFailed { message }
            }
            stockpile_api::Error::SessionExpired => SessionError::AuthenticationFailed {
                message: "session expired -- sign in again".into(),
            },
            stockpile_api::Error::MissingApiKey => SessionError::Config {
                message: "assist API key not configured".into(),
            },
            stockpile_api::Error::Transport(e) => SessionError::Backend {
                message: e.to_string(),
                code: None,
            },
            stockpile_api::Error::InvalidUrl(e) => SessionError::Config {
                message: format!("invalid URL: {e}"),
            },
            stockpile_api::Error::Backend { message, code, .. } => {
                SessionError::Backend { message, code }
            }
            stockpile_api::Error::WatchConnect(reason) => SessionError::Backend {
                message: format!("change feed connection failed: {reason}"),
                code: None,
            },
            stockpile_api::Error::Deserialization { message, .. } => {
                SessionError::Internal(format!("deserialization error: {message}"))
            }
        }
    }
}
