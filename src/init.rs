use crate::card::CardBuilder;
use crate::env;
use crate::layer::TeamsLayer;
use crate::record::Severity;
use crate::webhook::{ConfigError, WebhookSink, DEFAULT_MAX_ATTEMPTS};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration surface exposed to the embedding application.
///
/// **Fields**
/// - `webhook_url`: Teams incoming webhook URL. Required; validated when the
///   layer is built.
/// - `min_severity`: minimum severity to forward to the webhook.
/// - `title`: card title, shown next to the severity emoji.
/// - `subject`: subject line, used as each section's activity title.
/// - `emoji` / `color`: optional overrides replacing the severity-derived
///   emoji and theme color.
/// - `format`: template for the card text; `%message%` is replaced by the
///   event message.
/// - `source_location`: record target/module/file/line as an extra section.
/// - `max_attempts`: delivery attempts per card before giving up.
/// - `enable_stdout`: additionally install a `fmt` layer so events also
///   reach the console.
#[derive(Clone, Debug)]
pub struct NotifierConfig {
    pub webhook_url: String,
    pub min_severity: Severity,
    pub title: String,
    pub subject: String,
    pub emoji: Option<String>,
    pub color: Option<String>,
    pub format: String,
    pub source_location: bool,
    pub max_attempts: u32,
    pub enable_stdout: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            min_severity: Severity::Debug,
            title: "Message".to_string(),
            subject: "Date".to_string(),
            emoji: None,
            color: None,
            format: "%message%".to_string(),
            source_location: false,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            enable_stdout: true,
        }
    }
}

impl NotifierConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            ..Self::default()
        }
    }

    /// Build a config from the `TEAMS_*` environment variables, falling back
    /// to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            webhook_url: env::env_or(env::TEAMS_WEBHOOK_URL_ENV, &defaults.webhook_url),
            title: env::env_or(env::TEAMS_CARD_TITLE_ENV, &defaults.title),
            subject: env::env_or(env::TEAMS_CARD_SUBJECT_ENV, &defaults.subject),
            min_severity: env::env_or(env::TEAMS_MIN_SEVERITY_ENV, "")
                .parse()
                .unwrap_or(defaults.min_severity),
            ..defaults
        }
    }
}

/// Build a [`TeamsLayer`] from a [`NotifierConfig`] for composing with an
/// existing subscriber stack.
///
/// **Returns**
/// - `Err(ConfigError)` if the webhook URL is missing or malformed.
pub fn teams_layer(config: &NotifierConfig) -> Result<TeamsLayer, ConfigError> {
    let sink =
        WebhookSink::new(config.webhook_url.clone())?.with_max_attempts(config.max_attempts);

    let mut builder = CardBuilder::new(&config.title, &config.subject);
    if let Some(emoji) = &config.emoji {
        builder = builder.with_emoji(emoji);
    }
    if let Some(color) = &config.color {
        builder = builder.with_color(color);
    }

    Ok(TeamsLayer::new(builder, Arc::new(sink))
        .with_min_severity(config.min_severity)
        .with_format(&config.format)
        .with_source_location(config.source_location))
}

/// Install the notifier as the global default subscriber.
///
/// Combines a [`Registry`] with the [`TeamsLayer`] and, when
/// `enable_stdout` is set, a `fmt` layer so events stay visible on the
/// console. This is the recommended entrypoint for typical services; use
/// [`teams_layer`] directly to compose with other layers.
pub fn init_teams_notifier(config: NotifierConfig) -> Result<(), ConfigError> {
    let layer = teams_layer(&config)?;

    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    }

    Ok(())
}
