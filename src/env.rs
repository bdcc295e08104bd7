/// Environment variable names used by this crate for convenient
/// configuration of the notifier from services.
///
/// These are purely helpers; the core card and sink types remain decoupled
/// from environment access.

/// Teams incoming webhook URL (required).
pub const TEAMS_WEBHOOK_URL_ENV: &str = "TEAMS_WEBHOOK_URL";

/// Card title shown next to the severity emoji.
pub const TEAMS_CARD_TITLE_ENV: &str = "TEAMS_CARD_TITLE";

/// Subject line used as each section's activity title.
pub const TEAMS_CARD_SUBJECT_ENV: &str = "TEAMS_CARD_SUBJECT";

/// Minimum severity to forward, by name (e.g. `warning`).
pub const TEAMS_MIN_SEVERITY_ENV: &str = "TEAMS_MIN_SEVERITY";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
