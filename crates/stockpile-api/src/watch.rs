//! Change-feed WebSocket stream with auto-reconnect.
//!
//! Connects to the backend's `/v1/watch` endpoint and streams parsed
//! [`ChangeNotice`]s through a [`tokio::sync::broadcast`] channel. Handles
//! reconnection with exponential backoff + jitter automatically.
//!
//! # Example
//!
//! ```rust,ignore
//! use stockpile_api::watch::{ReconnectConfig, WatchHandle};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let url = Url::parse("wss://backend.example.com/v1/watch")?;
//!
//! let handle = WatchHandle::connect(url, ReconnectConfig::default(), cancel.clone(), None)?;
//! let mut rx = handle.subscribe();
//!
//! while let Ok(notice) = rx.recv().await {
//!     println!("{} changed", notice.collection);
//! }
//!
//! handle.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

const NOTICE_CHANNEL_CAPACITY: usize = 256;

// ── ChangeNotice ─────────────────────────────────────────────────────

/// A change notification pushed by the backend.
///
/// One frame per changed collection (coalesced server-side). Carries no
/// document data -- the consumer re-fetches the collection snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeNotice {
    /// The collection that changed, e.g. `"products"`.
    pub collection: String,

    /// Monotonic revision counter, if the backend provides one.
    #[serde(default)]
    pub revision: Option<u64>,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for change-feed reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── WatchHandle ──────────────────────────────────────────────────────

/// Handle to a running change-feed stream.
///
/// Subscribe for notices; call [`shutdown`](Self::shutdown) to tear down
/// the background task.
pub struct WatchHandle {
    notice_rx: broadcast::Receiver<Arc<ChangeNotice>>,
    cancel: CancellationToken,
}

impl WatchHandle {
    /// Connect to the change feed and spawn the reconnection loop.
    ///
    /// Returns immediately once the background task is spawned. The first
    /// connection attempt happens asynchronously -- subscribe to the
    /// notice receiver to start consuming.
    pub fn connect(
        watch_url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
        bearer: Option<String>,
    ) -> Result<Self, Error> {
        let (notice_tx, notice_rx) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            watch_loop(watch_url, notice_tx, reconnect, task_cancel, bearer).await;
        });

        Ok(Self { notice_rx, cancel })
    }

    /// Get a new broadcast receiver for the notice stream.
    ///
    /// Multiple consumers can subscribe concurrently. If a consumer falls
    /// behind, it receives [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ChangeNotice>> {
        self.notice_rx.resubscribe()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
async fn watch_loop(
    watch_url: Url,
    notice_tx: broadcast::Sender<Arc<ChangeNotice>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
    bearer: Option<String>,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = connect_and_read(&watch_url, &notice_tx, &cancel, bearer.as_deref()) => {
                match result {
                    // Clean disconnect (server close frame or stream ended).
                    // Reset attempt counter and reconnect immediately.
                    Ok(()) => {
                        tracing::info!("change feed disconnected cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "change feed error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "change feed reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = delay.as_millis() as u64,
                            attempt,
                            "waiting before reconnect"
                        );

                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }

                        attempt += 1;
                    }
                }
            }
        }
    }

    tracing::debug!("change feed loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish a single WebSocket connection, read frames until it drops.
///
/// If `bearer` is provided, it's injected as an `Authorization` header on
/// the upgrade request.
async fn connect_and_read(
    url: &Url,
    notice_tx: &broadcast::Sender<Arc<ChangeNotice>>,
    cancel: &CancellationToken,
    bearer: Option<&str>,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting to change feed");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WatchConnect(e.to_string()))?;

    let mut request = ClientRequestBuilder::new(uri);
    if let Some(auth) = bearer {
        request = request.with_header("Authorization", auth);
    }

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::WatchConnect(e.to_string()))?;

    tracing::info!("change feed connected");

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        if let Some(notice) = parse_notice(&text) {
                            // Ignore send errors -- just means no active subscribers.
                            let _ = notice_tx.send(Arc::new(notice));
                        }
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite handles pong replies automatically
                        tracing::trace!("change feed ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "change feed close frame received"
                            );
                        } else {
                            tracing::info!("change feed close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::WatchConnect(e.to_string()));
                    }
                    None => {
                        // Stream ended without a close frame
                        tracing::info!("change feed stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

// ── Frame parsing ────────────────────────────────────────────────────

/// Parse a text frame into a [`ChangeNotice`], or `None` if malformed.
fn parse_notice(text: &str) -> Option<ChangeNotice> {
    match serde_json::from_str::<ChangeNotice>(text) {
        Ok(notice) => Some(notice),
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse change notice");
            None
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from multiple clients.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(attempt as i32);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    // Not cryptographically random, but good enough for backoff spread.
    let jitter_factor = 1.0 + 0.25 * ((attempt as f64 * 7.3).sin());
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
