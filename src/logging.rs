//! Structured JSONL logging plus human-readable stderr output.
//!
//! This module provides dual-output logging:
//! - **JSONL to file** (~/.mactools/logs/mactools.jsonl) - structured, one event per line
//! - **Compact to stderr** - for whoever launched the binary from a terminal
//!
//! # Usage
//!
//! ```rust,ignore
//! use mactools::logging;
//!
//! // Initialize logging - MUST keep guard alive for duration of program
//! let _guard = logging::init();
//!
//! // Use tracing macros directly
//! tracing::info!(feature = "dock_minimizer", "Feature started");
//! ```
//!
//! # JSONL Output Format
//!
//! ```json
//! {"timestamp":"2026-10-19T10:30:45.123Z","level":"INFO","target":"mactools::features","fields":{"message":"Feature started","feature":"pin_toggle"}}
//! ```

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

static LOG_BUFFER: Mutex<VecDeque<String>> = Mutex::new(VecDeque::new());
const MAX_LOG_LINES: usize = 50;

const LOG_FILE_NAME: &str = "mactools.jsonl";

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the dual-output logging system.
///
/// Returns a guard that MUST be kept alive for the duration of the program.
/// If the log file can't be opened, logging continues on stderr only.
pub fn init() -> LoggingGuard {
    let log_dir = get_log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }

    let log_path = log_dir.join(LOG_FILE_NAME);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (json_layer, file_guard) = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => {
            // Non-blocking so a slow disk never stalls an event tap callback
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file);

            let layer = fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .with_span_events(FmtSpan::NONE);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            (None, None)
        }
    };

    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .with(BufferLayer)
        .init();

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %log_path.display(),
        "Logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Get the log directory path (~/.mactools/logs/)
fn get_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".mactools").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("mactools-logs"))
}

/// Get the path to the JSONL log file
pub fn log_path() -> PathBuf {
    get_log_dir().join(LOG_FILE_NAME)
}

/// Keeps the last [`MAX_LOG_LINES`] info-or-louder events as
/// `LEVEL target: message key=value` lines.
struct BufferLayer;

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

impl<S: Subscriber> Layer<S> for BufferLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() > Level::INFO {
            return;
        }
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        push_line(format!(
            "{} {}: {}{}",
            meta.level(),
            meta.target(),
            visitor.message,
            visitor.fields
        ));
    }
}

fn push_line(line: String) {
    let mut buf = LOG_BUFFER.lock();
    while buf.len() >= MAX_LOG_LINES {
        buf.pop_front();
    }
    buf.push_back(line);
}

/// Get recent log lines for UI display
pub fn get_recent_logs() -> Vec<String> {
    LOG_BUFFER.lock().iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_ends_with_file_name() {
        assert!(log_path().ends_with(LOG_FILE_NAME));
    }

    #[test]
    fn test_buffer_collects_events_and_is_bounded() {
        let subscriber = tracing_subscriber::registry().with(BufferLayer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("too quiet to keep");
            tracing::warn!(pid = 42, "Focus restore failed");
            for i in 0..(MAX_LOG_LINES + 10) {
                tracing::info!(line = i, "filler");
            }
            tracing::info!(feature = "pin_toggle", "Feature started");
        });

        let lines = get_recent_logs();
        assert_eq!(lines.len(), MAX_LOG_LINES);
        assert!(!lines.iter().any(|l| l.contains("too quiet")));
        assert!(!lines.iter().any(|l| l.contains("Focus restore failed")));
        let last = lines.last().unwrap();
        assert!(last.starts_with("INFO "));
        assert!(last.ends_with("Feature started feature=pin_toggle"));
    }
}
