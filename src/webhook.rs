use crate::card::CardPayload;
use crate::sink::CardSink;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::error::Error;

/// Default number of delivery attempts per card.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Error type returned when validating webhook configuration.
///
/// Surfaced at construction time so a misconfigured notifier fails on
/// startup instead of on the first log call.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("webhook URL is required")]
    MissingWebhookUrl,

    #[error("webhook URL must be an http(s) URL: {0}")]
    InvalidWebhookUrl(String),
}

/// Error type returned when delivering a card.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    /// Every attempt hit a transport failure; carries the last one.
    #[error("webhook delivery failed after {attempts} attempts: {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    #[error("failed to serialize card payload")]
    Serialize(#[from] serde_json::Error),
}

/// Run `request` up to `max_attempts` times, returning the first success.
///
/// Intermediate failures are retried silently with no backoff; only the last
/// attempt's failure surfaces, aggregated into a [`DeliveryError`]. A
/// transport-level response of any kind counts as success. `max_attempts` is
/// clamped to at least one attempt.
pub fn execute_with_retry<F>(mut request: F, max_attempts: u32) -> Result<String, DeliveryError>
where
    F: FnMut() -> Result<String, Box<dyn Error + Send + Sync>>,
{
    let max_attempts = max_attempts.max(1);
    let mut remaining = max_attempts;

    loop {
        remaining -= 1;
        match request() {
            Ok(body) => return Ok(body),
            Err(_) if remaining > 0 => continue,
            Err(source) => {
                return Err(DeliveryError::Transport {
                    attempts: max_attempts,
                    source,
                })
            }
        }
    }
}

/// [`CardSink`] implementation that POSTs cards to a Teams incoming webhook.
///
/// The HTTP client is reused across calls; each call is otherwise
/// independent and blocks the calling thread for the duration of the retry
/// sequence.
#[derive(Clone)]
pub struct WebhookSink {
    client: Client,
    url: String,
    max_attempts: u32,
}

impl WebhookSink {
    /// Create a sink for the given webhook URL.
    ///
    /// **Returns**
    /// - `Err(ConfigError)` if the URL is empty or not http(s).
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();

        if url.trim().is_empty() {
            return Err(ConfigError::MissingWebhookUrl);
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::InvalidWebhookUrl(url));
        }

        Ok(WebhookSink {
            client: Client::new(),
            url,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Override the per-card attempt budget.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CardSink for WebhookSink {
    fn send(&self, payload: &CardPayload) -> Result<String, DeliveryError> {
        let body = serde_json::to_string(payload)?;

        execute_with_retry(
            || {
                let response = self
                    .client
                    .post(&self.url)
                    .header(CONTENT_TYPE, "application/json")
                    .body(body.clone())
                    .send()?;
                Ok(response.text()?)
            },
            self.max_attempts,
        )
    }
}
