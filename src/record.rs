use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Ordered severity scale used to pick the card tier.
///
/// The numeric values follow the classic syslog-style logging scale so that
/// tier thresholds (`>= Error`, `>= Warning`, `>= Info`) stay meaningful even
/// for severities above `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Severity {
    /// Numeric rank used for threshold comparisons.
    pub fn value(self) -> u16 {
        match self {
            Severity::Debug => 100,
            Severity::Info => 200,
            Severity::Notice => 250,
            Severity::Warning => 300,
            Severity::Error => 400,
            Severity::Critical => 500,
            Severity::Alert => 550,
            Severity::Emergency => 600,
        }
    }

    /// Display name used for the leading `Level:` fact.
    pub fn name(self) -> &'static str {
        match self {
            Severity::Debug => "Debug",
            Severity::Info => "Info",
            Severity::Notice => "Notice",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Critical => "Critical",
            Severity::Alert => "Alert",
            Severity::Emergency => "Emergency",
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "notice" => Ok(Severity::Notice),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            "alert" => Ok(Severity::Alert),
            "emergency" => Ok(Severity::Emergency),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

/// Error type returned when parsing a severity name.
#[derive(thiserror::Error, Debug)]
#[error("unknown severity name: {0}")]
pub struct UnknownSeverity(pub String);

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Severity::Error,
            tracing::Level::WARN => Severity::Warning,
            tracing::Level::INFO => Severity::Info,
            _ => Severity::Debug,
        }
    }
}

/// The five facets an error value expands into on the card.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDetails {
    pub message: String,
    pub code: i64,
    pub file: String,
    pub line: u32,
    pub trace: String,
}

/// A structured field value attached to a record.
///
/// The card builder renders `Plain` values as a single fact and expands
/// `Error` values into five facts (message, code, file, line, trace). The
/// producer decides which variant applies; the builder never inspects types
/// at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Plain(serde_json::Value),
    Error(ErrorDetails),
}

impl FieldValue {
    pub fn plain(value: impl Into<serde_json::Value>) -> Self {
        FieldValue::Plain(value.into())
    }
}

/// Normalized log record handed from the layer to the card builder.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    /// Host-rendered message text, already formatted.
    pub text: String,
    pub context: BTreeMap<String, FieldValue>,
    pub extra: BTreeMap<String, FieldValue>,
}

impl LogRecord {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        LogRecord {
            timestamp: Utc::now(),
            severity,
            text: text.into(),
            context: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_scale_is_ordered() {
        assert!(Severity::Emergency.value() > Severity::Error.value());
        assert!(Severity::Error.value() > Severity::Warning.value());
        assert!(Severity::Warning.value() > Severity::Info.value());
        assert!(Severity::Info.value() > Severity::Debug.value());
    }

    #[test]
    fn tracing_levels_map_onto_scale() {
        assert_eq!(Severity::from(tracing::Level::ERROR), Severity::Error);
        assert_eq!(Severity::from(tracing::Level::WARN), Severity::Warning);
        assert_eq!(Severity::from(tracing::Level::INFO), Severity::Info);
        assert_eq!(Severity::from(tracing::Level::DEBUG), Severity::Debug);
        assert_eq!(Severity::from(tracing::Level::TRACE), Severity::Debug);
    }
}
