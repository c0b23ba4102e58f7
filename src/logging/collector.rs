//! This module provides a `tracing` layer that feeds warnings and errors into
//! a shared `LogRecorder`.
use super::{lock, Severity, SharedRecorder};
use std::fmt::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

/// A `tracing` layer that records events into a `LogRecorder`.
pub struct RecorderLayer {
    recorder: SharedRecorder,
}

impl RecorderLayer {
    /// Creates a new `RecorderLayer`.
    ///
    /// # Arguments
    ///
    /// * `recorder` - The recorder that receives the captured events.
    pub fn new(recorder: SharedRecorder) -> Self {
        Self { recorder }
    }
}

impl<S> Layer<S> for RecorderLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    /// Handles a `tracing` event.
    ///
    /// The level decides the severity unless the event carries a `severity`
    /// field naming `exception` or `assert`.
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut fields = EventFields::default();
        event.record(&mut fields);

        let severity = fields
            .severity
            .as_deref()
            .and_then(Severity::from_keyword)
            .filter(|severity| matches!(severity, Severity::Exception | Severity::Assert))
            .unwrap_or_else(|| Severity::from(*metadata.level()));

        if !severity.is_tracked() {
            return;
        }

        let message = if fields.extra.is_empty() {
            fields.message
        } else if fields.message.is_empty() {
            fields.extra
        } else {
            format!("{} {}", fields.message, fields.extra)
        };

        lock(&self.recorder).record(severity, &message, &fields.stack_trace);
    }
}

/// A `tracing::field::Visit` implementation splitting out the fields the
/// recorder cares about.
#[derive(Default)]
struct EventFields {
    message: String,
    stack_trace: String,
    severity: Option<String>,
    extra: String,
}

impl EventFields {
    fn push_extra(&mut self, name: &str, value: impl std::fmt::Display) {
        if !self.extra.is_empty() {
            self.extra.push(' ');
        }
        let _ = write!(self.extra, "{}={}", name, value);
    }
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "stack_trace" => self.stack_trace = value.to_string(),
            "severity" => self.severity = Some(value.to_string()),
            name => self.push_extra(name, value),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{:?}", value),
            "stack_trace" => self.stack_trace = format!("{:?}", value),
            "severity" => self.severity = Some(format!("{:?}", value)),
            name => self.push_extra(name, format_args!("{:?}", value)),
        }
    }
}
