//! tracing Layer feeding the sinks

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::Sinks;

/// Formats each event as one line and appends it to the shared sinks
#[derive(Clone)]
pub struct RollingLayer {
    sinks: Arc<Sinks>,
}

impl RollingLayer {
    pub fn new(sinks: Arc<Sinks>) -> Self {
        Self { sinks }
    }

    pub fn sinks(&self) -> &Arc<Sinks> {
        &self.sinks
    }
}

pub(crate) fn format_line(level: &str, target: &str, message: &str) -> String {
    format!(
        "[{}] {:<5} {}: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        level,
        target,
        message
    )
}

/// Collects `message` plus any other fields as `key=value`
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

impl<S: Subscriber> Layer<S> for RollingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        let metadata = event.metadata();
        let line = format_line(
            metadata.level().as_str(),
            metadata.target(),
            &format!("{}{}", visitor.message, visitor.fields),
        );
        // Logging must never fail the caller
        let _ = self.sinks.write_line(&line);
    }
}
