//! Logging Setup
//!
//! Native builds log to a rotated file under the given directory. In the
//! browser, events go to the devtools console and the in-memory buffer.

#[cfg(not(target_arch = "wasm32"))]
pub fn init(log_dir: std::path::PathBuf) -> Result<(), rolling_logger::LoggerError> {
    rolling_logger::init_logger(log_dir, "tareas-ui")?;
    let _ = rolling_logger::info("Logger initialized");
    Ok(())
}

#[cfg(target_arch = "wasm32")]
pub fn init() -> Result<(), rolling_logger::LoggerError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    console_error_panic_hook::set_once();
    let memory = rolling_logger::memory_layer(rolling_logger::DEFAULT_CAPACITY)?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with(memory)
        .with(console::ConsoleLayer)
        .try_init()
        .map_err(|e| rolling_logger::LoggerError::Install(e.to_string()))
}

#[cfg(target_arch = "wasm32")]
mod console {
    use std::fmt::Write as _;

    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::Context;
    use tracing_subscriber::Layer;

    /// Forwards events to `console.*` by level
    pub struct ConsoleLayer;

    #[derive(Default)]
    struct Message(String);

    impl Visit for Message {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                let _ = write!(self.0, "{:?}", value);
            } else {
                let _ = write!(self.0, " {}={:?}", field.name(), value);
            }
        }
    }

    impl<S: Subscriber> Layer<S> for ConsoleLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut message = Message::default();
            event.record(&mut message);
            let line = wasm_bindgen::JsValue::from(format!("[{}] {}", event.metadata().target(), message.0));
            match *event.metadata().level() {
                Level::ERROR => web_sys::console::error_1(&line),
                Level::WARN => web_sys::console::warn_1(&line),
                _ => web_sys::console::log_1(&line),
            }
        }
    }
}
