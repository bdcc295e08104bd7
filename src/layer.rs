use crate::card::CardBuilder;
use crate::record::{ErrorDetails, FieldValue, LogRecord, Severity};
use crate::sink::CardSink;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that renders events as Teams cards and hands
/// them to a [`CardSink`] on the calling thread.
///
/// Delivery is synchronous: the thread that emitted the event blocks until
/// the sink returns. There is no buffering, batching or shared mutable state
/// between calls; each event is rendered and delivered independently.
pub struct TeamsLayer {
    builder: CardBuilder,
    sink: Arc<dyn CardSink>,
    min_severity: Severity,
    format: String,
    source_location: bool,
}

impl TeamsLayer {
    pub fn new(builder: CardBuilder, sink: Arc<dyn CardSink>) -> Self {
        TeamsLayer {
            builder,
            sink,
            min_severity: Severity::Debug,
            format: "%message%".to_string(),
            source_location: false,
        }
    }

    /// Only forward events at or above this severity.
    pub fn with_min_severity(mut self, min_severity: Severity) -> Self {
        self.min_severity = min_severity;
        self
    }

    /// Template applied to the captured message; `%message%` is replaced by
    /// the event's message text.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Record the event's target, module path, file and line as an `extra`
    /// section on every card.
    pub fn with_source_location(mut self, enabled: bool) -> Self {
        self.source_location = enabled;
        self
    }
}

impl<S> Layer<S> for TeamsLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        let severity = Severity::from(*event.metadata().level());
        if severity.value() < self.min_severity.value() {
            return;
        }

        let meta = event.metadata();
        let mut context = BTreeMap::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor {
            fields: &mut context,
            message: &mut message,
            file: meta.file(),
            line: meta.line(),
        };
        event.record(&mut visitor);

        let message = message.unwrap_or_default();
        let mut record = LogRecord::new(severity, self.format.replace("%message%", &message));
        record.context = context;

        if self.source_location {
            record
                .extra
                .insert("target".to_string(), FieldValue::plain(meta.target()));
            if let Some(module_path) = meta.module_path() {
                record
                    .extra
                    .insert("module_path".to_string(), FieldValue::plain(module_path));
            }
            if let Some(file) = meta.file() {
                record
                    .extra
                    .insert("file".to_string(), FieldValue::plain(file));
            }
            if let Some(line) = meta.line() {
                record
                    .extra
                    .insert("line".to_string(), FieldValue::plain(line));
            }
        }

        // Never log delivery failures back into the framework we serve.
        if let Err(e) = self.sink.send(&self.builder.build(&record)) {
            eprintln!("error sending teams card: {}", e);
        }
    }
}

use tracing::field::{Field, Visit};

struct FieldVisitor<'a> {
    fields: &'a mut BTreeMap<String, FieldValue>,
    message: &'a mut Option<String>,
    file: Option<&'a str>,
    line: Option<u32>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields
                .insert(field.name().to_string(), FieldValue::plain(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), FieldValue::plain(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), FieldValue::plain(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields
            .insert(field.name().to_string(), FieldValue::plain(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), FieldValue::plain(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        let mut trace = String::new();
        let mut source = value.source();
        while let Some(err) = source {
            if !trace.is_empty() {
                trace.push('\n');
            }
            trace.push_str("caused by: ");
            trace.push_str(&err.to_string());
            source = err.source();
        }

        self.fields.insert(
            field.name().to_string(),
            FieldValue::Error(ErrorDetails {
                message: value.to_string(),
                code: 0,
                file: self.file.unwrap_or_default().to_string(),
                line: self.line.unwrap_or_default(),
                trace,
            }),
        );
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(
                field.name().to_string(),
                FieldValue::plain(format!("{:?}", value)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardPayload;
    use crate::webhook::DeliveryError;
    use std::sync::Mutex;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Default)]
    struct RecordingSink {
        cards: Mutex<Vec<CardPayload>>,
    }

    impl CardSink for RecordingSink {
        fn send(&self, payload: &CardPayload) -> Result<String, DeliveryError> {
            self.cards.lock().unwrap().push(payload.clone());
            Ok("1".to_string())
        }
    }

    fn capture(layer: TeamsLayer, emit: impl FnOnce()) -> Vec<CardPayload> {
        let sink = Arc::new(RecordingSink::default());
        let layer = TeamsLayer {
            sink: Arc::clone(&sink) as Arc<dyn CardSink>,
            ..layer
        };
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, emit);
        let cards = sink.cards.lock().unwrap();
        cards.clone()
    }

    fn layer() -> TeamsLayer {
        TeamsLayer::new(
            CardBuilder::new("Message", "Date"),
            Arc::new(NoopSinkForTests),
        )
    }

    struct NoopSinkForTests;

    impl CardSink for NoopSinkForTests {
        fn send(&self, _payload: &CardPayload) -> Result<String, DeliveryError> {
            Ok(String::new())
        }
    }

    #[test]
    fn events_below_min_severity_are_dropped() {
        let cards = capture(layer().with_min_severity(Severity::Warning), || {
            tracing::info!("too quiet");
            tracing::warn!("loud enough");
        });

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].text, "loud enough");
        assert_eq!(cards[0].theme_color, crate::card::COLOR_WARNING);
    }

    #[test]
    fn event_fields_land_in_context_section() {
        let cards = capture(layer(), || {
            tracing::error!(user_id = 42, reason = "invalid password", "auth failed");
        });

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].text, "auth failed");
        assert_eq!(cards[0].sections.len(), 1);

        let facts = &cards[0].sections[0].facts;
        assert_eq!(facts[0].name, "Level:");
        assert_eq!(facts[0].value, serde_json::json!("Error"));
        assert_eq!(facts[1].name, "Reason:");
        assert_eq!(facts[1].value, serde_json::json!("invalid password"));
        assert_eq!(facts[2].name, "User id:");
        assert_eq!(facts[2].value, serde_json::json!(42));
    }

    #[test]
    fn fieldless_event_yields_card_with_no_sections() {
        let cards = capture(layer(), || {
            tracing::debug!("just text");
        });

        assert_eq!(cards.len(), 1);
        assert!(cards[0].sections.is_empty());
    }

    #[test]
    fn source_location_populates_extra_section() {
        let cards = capture(layer().with_source_location(true), || {
            tracing::error!(code = 7, "broken");
        });

        assert_eq!(cards[0].sections.len(), 2);
        let extra = &cards[0].sections[0].facts;
        assert!(extra.iter().any(|f| f.name == "Target:"));
        assert!(extra.iter().any(|f| f.name == "File:"));
        assert!(extra.iter().any(|f| f.name == "Line:"));
    }

    #[test]
    fn format_template_wraps_message() {
        let cards = capture(layer().with_format("[app] %message%"), || {
            tracing::error!("exploded");
        });

        assert_eq!(cards[0].text, "[app] exploded");
    }

    #[test]
    fn error_fields_expand_into_error_facts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let cards = capture(layer(), || {
            tracing::error!(error = &io_err as &(dyn std::error::Error + 'static), "request failed");
        });

        let facts = &cards[0].sections[0].facts;
        assert_eq!(facts.len(), 6);
        assert_eq!(facts[1].name, "Message:");
        assert_eq!(facts[1].value, serde_json::json!("boom"));
        assert_eq!(facts[5].name, "Trace:");
    }
}
