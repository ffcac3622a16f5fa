//! Rolling Logger
//!
//! `tracing` backend used by the Tareas clients:
//! - a size-rotated log file (native builds)
//! - a circular buffer holding the most recent lines (all targets)
//!
//! Both sinks sit behind one [`RollingLayer`]. The process-wide sinks are
//! registered once so [`info`], [`error`] and [`recent`] work from anywhere.

mod buffer;
mod file;
mod layer;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub use buffer::RingBuffer;
pub use file::RollingFile;
pub use layer::RollingLayer;

/// Default number of lines kept in memory
pub const DEFAULT_CAPACITY: usize = 500;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Log file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logger already initialized")]
    AlreadyInitialized,

    #[error("Logger not initialized")]
    NotInitialized,

    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

/// Shared output targets of a [`RollingLayer`]
pub struct Sinks {
    buffer: Mutex<RingBuffer>,
    file: Option<Mutex<RollingFile>>,
}

impl Sinks {
    pub fn new(capacity: usize, file: Option<RollingFile>) -> Self {
        Self {
            buffer: Mutex::new(RingBuffer::new(capacity)),
            file: file.map(Mutex::new),
        }
    }

    /// Append a formatted line to every sink
    pub fn write_line(&self, line: &str) -> Result<(), LoggerError> {
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.push(line.to_string());
        }
        if let Some(file) = &self.file {
            // A poisoned file lock only loses file output, the buffer still has the line
            if let Ok(mut file) = file.lock() {
                file.write_line(line)?;
            }
        }
        Ok(())
    }

    pub fn recent(&self) -> Vec<String> {
        self.buffer
            .lock()
            .map(|buffer| buffer.lines())
            .unwrap_or_default()
    }
}

static GLOBAL: OnceLock<Arc<Sinks>> = OnceLock::new();

fn register(sinks: Arc<Sinks>) -> Result<(), LoggerError> {
    GLOBAL.set(sinks).map_err(|_| LoggerError::AlreadyInitialized)
}

/// Create the in-memory layer and register its sinks globally.
///
/// Callers compose the returned layer with their own (e.g. a browser console
/// layer) before installing the subscriber.
pub fn memory_layer(capacity: usize) -> Result<RollingLayer, LoggerError> {
    let sinks = Arc::new(Sinks::new(capacity, None));
    register(sinks.clone())?;
    Ok(RollingLayer::new(sinks))
}

/// Install the file + buffer subscriber writing to `<log_dir>/<app_name>.log`.
///
/// Level filtering follows `RUST_LOG`, defaulting to `info`.
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), LoggerError> {
    std::fs::create_dir_all(&log_dir)?;
    let file = RollingFile::open(&log_dir, app_name)?;
    let sinks = Arc::new(Sinks::new(DEFAULT_CAPACITY, Some(file)));
    register(sinks.clone())?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(RollingLayer::new(sinks))
        .try_init()
        .map_err(|e| LoggerError::Install(e.to_string()))
}

fn write_direct(level: &str, msg: &str) -> Result<(), LoggerError> {
    let sinks = GLOBAL.get().ok_or(LoggerError::NotInitialized)?;
    sinks.write_line(&layer::format_line(level, "app", msg))
}

/// Write an INFO line straight to the sinks, bypassing level filters
pub fn info(msg: &str) -> Result<(), LoggerError> {
    write_direct("INFO", msg)
}

/// Write an ERROR line straight to the sinks
pub fn error(msg: &str) -> Result<(), LoggerError> {
    write_direct("ERROR", msg)
}

/// Most recent lines, oldest first. Empty before initialization.
pub fn recent() -> Vec<String> {
    GLOBAL.get().map(|sinks| sinks.recent()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sinks_write_to_buffer_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = RollingFile::open(dir.path(), "test").unwrap();
        let sinks = Sinks::new(2, Some(file));

        sinks.write_line("one").unwrap();
        sinks.write_line("two").unwrap();
        sinks.write_line("three").unwrap();

        assert_eq!(sinks.recent(), vec!["two".to_string(), "three".to_string()]);
        let content = std::fs::read_to_string(dir.path().join("test.log")).unwrap();
        assert_eq!(content, "one\ntwo\nthree\n");
    }

    #[test]
    fn test_direct_write_requires_init() {
        // The global is never set in this test binary
        assert!(matches!(info("hello"), Err(LoggerError::NotInitialized)));
        assert!(recent().is_empty());
    }
}
