// ── Runtime session configuration ──
//
// These types describe *how* to reach the backend and the assist
// provider. They carry credential data and connection tuning, but never
// touch disk. The CLI constructs a `SessionConfig` (usually via
// `stockpile-config`) and hands it in.

use secrecy::SecretString;
use url::Url;

/// Assist provider settings.
///
/// `api_key: None` leaves assist features in their "not configured"
/// state -- calls return the fixed fallback string instead of failing.
#[derive(Debug, Clone)]
pub struct AssistSettings {
    pub base_url: Url,
    pub api_key: Option<SecretString>,
}

impl Default for AssistSettings {
    fn default() -> Self {
        Self {
            base_url: stockpile_api::assist::DEFAULT_ASSIST_BASE_URL
                .parse()
                .expect("default assist URL is valid"),
            api_key: None,
        }
    }
}

/// Configuration for a single session against one backend.
///
/// Built by the CLI, passed to `Session` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend base URL (identity + document store + change feed).
    pub backend_url: Url,
    /// Request timeout for all HTTP calls.
    pub timeout: std::time::Duration,
    /// Subscribe to the realtime change feed after sign-in.
    pub watch_enabled: bool,
    /// Periodic full-refresh interval in seconds, the polling fallback
    /// when the change feed is off or unavailable. 0 = never.
    pub refresh_interval_secs: u64,
    /// Assist provider settings.
    pub assist: AssistSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend_url: "https://api.stockpile.example"
                .parse()
                .expect("default backend URL is valid"),
            timeout: std::time::Duration::from_secs(30),
            watch_enabled: true,
            refresh_interval_secs: 0,
            assist: AssistSettings::default(),
        }
    }
}
