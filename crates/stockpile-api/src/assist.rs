// Assist provider HTTP client
//
// Thin wrapper over the hosted model's `generateContent` endpoint.
// Prompt construction and fallback handling live in `stockpile-core`;
// this client only moves bytes.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Default base URL for the hosted model provider.
pub const DEFAULT_ASSIST_BASE_URL: &str = "https://generativelanguage.googleapis.com";

// ── Request / response types ─────────────────────────────────────────

/// Optional generation tuning for a request.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

impl GenerationConfig {
    /// Config with a reasoning-depth budget (provider-specific token count
    /// the model may spend on internal computation before responding).
    pub fn with_thinking_budget(budget: u32) -> Self {
        Self {
            thinking_config: Some(ThinkingConfig {
                thinking_budget: budget,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<&'a GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ProviderError {
    error: Option<ProviderErrorInner>,
}

#[derive(Deserialize)]
struct ProviderErrorInner {
    code: Option<u16>,
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// HTTP client for the hosted model provider.
///
/// Construct with `api_key: None` to get a client that fails every call
/// with [`Error::MissingApiKey`] without touching the network -- callers
/// in core map that to a fixed "not configured" string.
pub struct AssistClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<SecretString>,
}

impl AssistClient {
    /// Create a new assist client from a `TransportConfig`.
    pub fn new(
        base_url: Url,
        api_key: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            api_key,
        })
    }

    /// Create an assist client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate text from a single prompt.
    ///
    /// Returns the concatenated text of the first candidate.
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        config: Option<&GenerationConfig>,
    ) -> Result<String, Error> {
        let Some(ref api_key) = self.api_key else {
            return Err(Error::MissingApiKey);
        };

        let base = self.base_url.as_str().trim_end_matches('/');
        let url = Url::parse(&format!("{base}/v1beta/models/{model}:generateContent"))
            .map_err(Error::InvalidUrl)?;

        debug!(%model, prompt_len = prompt.len(), "generate request");

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: config,
        };

        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let text = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            // Provider errors come wrapped as `{"error": {code, message, status}}`.
            if let Ok(wrapper) = serde_json::from_str::<ProviderError>(&text) {
                if let Some(err) = wrapper.error {
                    return Err(Error::Backend {
                        message: err.message.unwrap_or_default(),
                        code: err.code.map(|c| c.to_string()),
                        status: Some(status.as_u16()),
                    });
                }
            }
            let preview = &text[..text.len().min(200)];
            return Err(Error::Backend {
                message: format!("HTTP {status}: {preview}"),
                code: None,
                status: Some(status.as_u16()),
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: text.clone(),
            })?;

        let out: String = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if out.is_empty() {
            return Err(Error::Deserialization {
                message: "response contained no candidate text".into(),
                body: text,
            });
        }

        Ok(out)
    }
}
