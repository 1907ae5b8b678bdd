//! CLI error types with miette diagnostics.
//!
//! Maps `SessionError` variants into user-facing errors with actionable
//! help text.

use miette::Diagnostic;
use thiserror::Error;

use stockpile_core::SessionError;

/// Exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(stockpile::auth_failed),
        help(
            "Verify your email and password.\n\
             Set STOCKPILE_EMAIL / STOCKPILE_PASSWORD or pass --email."
        )
    )]
    AuthFailed { message: String },

    #[error("No sign-in email configured")]
    #[diagnostic(
        code(stockpile::no_email),
        help(
            "Pass --email, set STOCKPILE_EMAIL, or put it under\n\
             [defaults] email = \"you@example.com\" in the config file."
        )
    )]
    NoEmail,

    // ── Authorization ────────────────────────────────────────────────

    #[error("'{command}' requires the Manager role")]
    #[diagnostic(
        code(stockpile::access_denied),
        help("Your profile's role is {role}. Ask a manager to run this.")
    )]
    AccessDenied { command: String, role: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(stockpile::not_found),
        help("Run: stockpile {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Not enough stock: requested {requested}, only {available} available")]
    #[diagnostic(code(stockpile::insufficient_stock))]
    InsufficientStock { requested: u32, available: u32 },

    #[error("Write rejected by the backend: {message}")]
    #[diagnostic(
        code(stockpile::conflict),
        help("Someone else may have changed the data first. Re-check and retry.")
    )]
    Conflict { message: String },

    // ── Backend ──────────────────────────────────────────────────────

    #[error("Backend error ({code}): {message}")]
    #[diagnostic(code(stockpile::backend_error))]
    BackendError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(stockpile::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(stockpile::config),
        help("Config file location: {path}")
    )]
    Config { message: String, path: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } | Self::NoEmail => exit_code::AUTH,
            Self::AccessDenied { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::InsufficientStock { .. } | Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::BackendError { .. } => exit_code::CONNECTION,
            _ => exit_code::GENERAL,
        }
    }
}

// ── SessionError → CliError mapping ──────────────────────────────────

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotSignedIn => CliError::AuthFailed {
                message: "not signed in".into(),
            },

            SessionError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            SessionError::ProductNotFound { id } => CliError::NotFound {
                resource_type: "product".into(),
                identifier: id,
                list_command: "products list".into(),
            },

            SessionError::InsufficientStock {
                requested,
                available,
            } => CliError::InsufficientStock {
                requested,
                available,
            },

            SessionError::Conflict { message } => CliError::Conflict { message },

            SessionError::Backend { message, code } => CliError::BackendError {
                code: code.unwrap_or_default(),
                message,
            },

            SessionError::Config { message } => CliError::Config {
                message,
                path: stockpile_config::config_path().display().to_string(),
            },

            SessionError::Internal(message) => CliError::BackendError {
                code: "internal".into(),
                message,
            },
        }
    }
}

impl From<stockpile_config::ConfigError> for CliError {
    fn from(err: stockpile_config::ConfigError) -> Self {
        CliError::Config {
            message: err.to_string(),
            path: stockpile_config::config_path().display().to_string(),
        }
    }
}
