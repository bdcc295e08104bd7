use crate::record::{FieldValue, LogRecord, Severity};
use serde::Serialize;
use serde_json::Value;

/// Card tier colors.
pub const COLOR_DANGER: &str = "#A93226";
pub const COLOR_WARNING: &str = "#D68910";
pub const COLOR_INFO: &str = "#2471A3";
pub const COLOR_DEFAULT: &str = "#A6ACAF";

/// Card tier emojis (HTML entities, rendered by Teams).
pub const EMOJI_DANGER: &str = "&#x1F6A8";
pub const EMOJI_WARNING: &str = "&#x1F4E2";
pub const EMOJI_INFO: &str = "&#x1F3C1";
pub const EMOJI_DEFAULT: &str = "&#x1F3C1";

pub const CARD_TYPE: &str = "MessageCard";
pub const CARD_CONTEXT: &str = "https://schema.org/extensions";

/// Displayed fact values are capped at this many characters.
const VALUE_LIMIT: usize = 1000;

/// Fully constructed MessageCard payload, ready for JSON serialization.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CardPayload {
    #[serde(rename = "type")]
    pub card_type: String,
    pub context: String,
    #[serde(rename = "themeColor")]
    pub theme_color: String,
    pub title: String,
    pub text: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub activity_title: String,
    pub activity_subtitle: String,
    pub facts: Vec<Fact>,
}

/// Single name/value pair displayed within a card section.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Fact {
    pub name: String,
    pub value: Value,
}

/// Renders [`LogRecord`]s into Teams MessageCard payloads.
///
/// Configuration is fixed at construction; [`CardBuilder::build`] is a pure
/// function producing a fresh payload per record, so a single builder can be
/// shared across calls without coordination.
#[derive(Debug, Clone)]
pub struct CardBuilder {
    title: String,
    subject: String,
    emoji: Option<String>,
    color: Option<String>,
}

impl CardBuilder {
    pub fn new(title: impl Into<String>, subject: impl Into<String>) -> Self {
        CardBuilder {
            title: title.into(),
            subject: subject.into(),
            emoji: None,
            color: None,
        }
    }

    /// Use a fixed emoji instead of the severity-derived one.
    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    /// Use a fixed theme color instead of the severity-derived one.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Build the card payload for a single record.
    ///
    /// This step never fails: oversized values are truncated and unexpected
    /// shapes coerced, not rejected.
    pub fn build(&self, record: &LogRecord) -> CardPayload {
        let color = self
            .color
            .clone()
            .unwrap_or_else(|| theme_color(record.severity).to_string());
        let emoji = self
            .emoji
            .as_deref()
            .unwrap_or_else(|| emoji(record.severity));

        CardPayload {
            card_type: CARD_TYPE.to_string(),
            context: CARD_CONTEXT.to_string(),
            theme_color: color,
            title: format!("{} {}", emoji, self.title),
            text: record.text.clone(),
            sections: self.sections(record),
        }
    }

    /// One section per non-empty source map, `extra` before `context`.
    fn sections(&self, record: &LogRecord) -> Vec<Section> {
        let mut sections = Vec::new();

        for map in [&record.extra, &record.context] {
            if map.is_empty() {
                continue;
            }

            let mut facts = vec![fact("Level", record.severity.name().into())];

            for (key, value) in map {
                match value {
                    FieldValue::Error(err) => {
                        facts.push(fact("message", err.message.clone().into()));
                        facts.push(fact("Code", err.code.into()));
                        facts.push(fact("File", err.file.clone().into()));
                        facts.push(fact("Line", err.line.into()));
                        facts.push(quoted_fact("Trace", err.trace.clone().into()));
                    }
                    FieldValue::Plain(value) => facts.push(fact(key, value.clone())),
                }
            }

            sections.push(Section {
                activity_title: self.subject.clone(),
                activity_subtitle: record.timestamp.format("%Y/%m/%d %-I:%M %p").to_string(),
                facts,
            });
        }

        sections
    }
}

/// Build a display fact from a raw key and value.
pub fn fact(name: &str, value: Value) -> Fact {
    make_fact(name, value, false)
}

/// Same as [`fact`] but wraps scalar values in a `<pre>` marker. Used for
/// stack traces so Teams keeps their line structure.
pub fn quoted_fact(name: &str, value: Value) -> Fact {
    make_fact(name, value, true)
}

fn make_fact(name: &str, value: Value, quoted: bool) -> Fact {
    let name = name.replace('_', " ");
    let value = transform_value(value);
    let value = if quoted { quote(value) } else { value };

    Fact {
        name: format!("{}:", ucfirst(name.trim())),
        value,
    }
}

/// Coerce a raw value into something a fact can display: nested structures
/// are pretty-printed as JSON and truncated, strings truncated, scalars kept.
fn transform_value(value: Value) -> Value {
    match value {
        Value::Object(_) | Value::Array(_) => {
            let rendered = serde_json::to_string_pretty(&value).unwrap_or_default();
            Value::String(truncate(&rendered))
        }
        Value::String(s) => Value::String(truncate(&s)),
        other => other,
    }
}

fn quote(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(format!("<pre> {} </pre>", s)),
        Value::Bool(b) => Value::String(format!("<pre> {} </pre>", b)),
        Value::Number(n) => Value::String(format!("<pre> {} </pre>", n)),
        Value::Null => Value::String("<pre>  </pre>".to_string()),
        other => other,
    }
}

fn truncate(s: &str) -> String {
    s.chars().take(VALUE_LIMIT).collect()
}

fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Theme color for a severity, by inclusive tier threshold.
pub fn theme_color(severity: Severity) -> &'static str {
    let level = severity.value();
    if level >= Severity::Error.value() {
        COLOR_DANGER
    } else if level >= Severity::Warning.value() {
        COLOR_WARNING
    } else if level >= Severity::Info.value() {
        COLOR_INFO
    } else {
        COLOR_DEFAULT
    }
}

/// Emoji for a severity, same tiers as [`theme_color`].
pub fn emoji(severity: Severity) -> &'static str {
    let level = severity.value();
    if level >= Severity::Error.value() {
        EMOJI_DANGER
    } else if level >= Severity::Warning.value() {
        EMOJI_WARNING
    } else if level >= Severity::Info.value() {
        EMOJI_INFO
    } else {
        EMOJI_DEFAULT
    }
}
