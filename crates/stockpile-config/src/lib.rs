//! Shared configuration for the stockpile CLI.
//!
//! TOML config file + `STOCKPILE_*` environment overlay, credential
//! resolution (env + plaintext), and translation to
//! `stockpile_core::SessionConfig`. The CLI adds flag-aware wrappers
//! on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockpile_core::{AssistSettings, SessionConfig};

/// Default environment variable holding the assist API key.
pub const ASSIST_API_KEY_ENV: &str = "STOCKPILE_ASSIST_API_KEY";

/// Environment variable holding the sign-in password.
pub const PASSWORD_ENV: &str = "STOCKPILE_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Backend connection settings.
    #[serde(default)]
    pub backend: BackendSettings,

    /// Assist provider settings.
    #[serde(default)]
    pub assist: AssistFileSettings,

    /// CLI defaults.
    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BackendSettings {
    /// Backend base URL (identity, document store, change feed).
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Subscribe to the realtime change feed after sign-in.
    #[serde(default = "default_watch")]
    pub watch: bool,

    /// Periodic full-refresh interval in seconds (polling fallback).
    /// 0 = never.
    #[serde(default)]
    pub refresh_interval: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout: default_timeout(),
            watch: default_watch(),
            refresh_interval: 0,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AssistFileSettings {
    /// API key in plaintext (prefer the env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    /// Defaults to `STOCKPILE_ASSIST_API_KEY`.
    pub api_key_env: Option<String>,

    /// Override the provider base URL.
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Defaults {
    /// Default sign-in email.
    pub email: Option<String>,
}

fn default_backend_url() -> String {
    "https://api.stockpile.example".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_watch() -> bool {
    true
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "stockpile", "stockpile").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("stockpile");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_at(&config_path())
}

/// Load from an explicit path (also the seam the tests use).
pub fn load_config_at(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("STOCKPILE_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning defaults if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the assist API key: named env var first, then plaintext.
/// Returns `None` when nothing is configured -- assist features then
/// answer with their "not configured" fallback instead of failing.
pub fn resolve_assist_api_key(assist: &AssistFileSettings) -> Option<SecretString> {
    let env_name = assist.api_key_env.as_deref().unwrap_or(ASSIST_API_KEY_ENV);
    if let Ok(val) = std::env::var(env_name) {
        if !val.is_empty() {
            return Some(SecretString::from(val));
        }
    }

    assist
        .api_key
        .as_ref()
        .map(|key| SecretString::from(key.clone()))
}

/// Resolve the sign-in password from `STOCKPILE_PASSWORD`, if set.
pub fn password_from_env() -> Option<SecretString> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(SecretString::from)
}

// ── Translation to runtime config ───────────────────────────────────

/// Build a `SessionConfig` from the loaded file config.
pub fn to_session_config(config: &Config) -> Result<SessionConfig, ConfigError> {
    let backend_url: url::Url =
        config
            .backend
            .url
            .parse()
            .map_err(|_| ConfigError::Validation {
                field: "backend.url".into(),
                reason: format!("invalid URL: {}", config.backend.url),
            })?;

    let mut assist = AssistSettings {
        api_key: resolve_assist_api_key(&config.assist),
        ..AssistSettings::default()
    };
    if let Some(ref base) = config.assist.base_url {
        assist.base_url = base.parse().map_err(|_| ConfigError::Validation {
            field: "assist.base_url".into(),
            reason: format!("invalid URL: {base}"),
        })?;
    }

    Ok(SessionConfig {
        backend_url,
        timeout: Duration::from_secs(config.backend.timeout),
        watch_enabled: config.backend.watch,
        refresh_interval_secs: config.backend.refresh_interval,
        assist,
    })
}

// ── Tests ───────────────────────────────────────────────────────────
