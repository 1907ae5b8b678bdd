//! CLI configuration — thin wrapper around `stockpile_config` shared types.
//!
//! Re-exports the shared loaders and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--backend, --email, --timeout).

use std::io::IsTerminal;
use std::time::Duration;

use secrecy::SecretString;

use stockpile_core::SessionConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use stockpile_config::{Config, config_path, load_config_or_default};

// ── CLI-specific resolution ─────────────────────────────────────────

/// Translate the loaded config + global flags into a `SessionConfig`.
///
/// CLI flag overrides take priority over config file values.
pub fn resolve_session_config(
    config: &Config,
    global: &GlobalOpts,
) -> Result<SessionConfig, CliError> {
    let mut session = stockpile_config::to_session_config(config)?;

    if let Some(ref backend) = global.backend {
        session.backend_url = backend.parse().map_err(|_| CliError::Validation {
            field: "backend".into(),
            reason: format!("invalid URL: {backend}"),
        })?;
    }

    session.timeout = Duration::from_secs(global.timeout);

    Ok(session)
}

/// Resolve the sign-in credentials: email from flag/env/config, password
/// from `STOCKPILE_PASSWORD` or an interactive prompt.
pub fn resolve_credentials(
    config: &Config,
    global: &GlobalOpts,
) -> Result<(String, SecretString), CliError> {
    let email = global
        .email
        .clone()
        .or_else(|| config.defaults.email.clone())
        .ok_or(CliError::NoEmail)?;

    if let Some(password) = stockpile_config::password_from_env() {
        return Ok((email, password));
    }

    if !std::io::stdin().is_terminal() {
        return Err(CliError::AuthFailed {
            message: format!(
                "no password available: set {} or run interactively",
                stockpile_config::PASSWORD_ENV
            ),
        });
    }

    let prompt = format!("Password for {email}: ");
    let password = rpassword::prompt_password(prompt)?;
    Ok((email, SecretString::from(password)))
}
