//! Observability side-channel for silent failures.
//!
//! Resolution misses and permission denials never interrupt the user. They
//! land here instead: a bounded ring of recent events plus per-kind counters
//! that `mactools status` and a settings screen can show.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ErrorKind, MacToolsError};

const MAX_EVENTS: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEvent {
    #[serde(with = "kind_name")]
    pub kind: ErrorKind,
    /// Feature or service that recorded the event
    pub source: &'static str,
    pub message: String,
    pub at: SystemTime,
}

mod kind_name {
    use crate::error::ErrorKind;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(kind: &ErrorKind, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(super::kind_label(*kind))
    }
}

pub fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::PermissionDenied => "permission_denied",
        ErrorKind::ResolutionMiss => "resolution_miss",
        ErrorKind::ResourceExhaustion => "resource_exhaustion",
        ErrorKind::Configuration => "configuration",
    }
}

#[derive(Default)]
struct Inner {
    events: VecDeque<DiagnosticEvent>,
    counts: HashMap<ErrorKind, u64>,
}

#[derive(Clone, Default)]
pub struct Diagnostics {
    inner: Arc<Mutex<Inner>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: ErrorKind, source: &'static str, message: impl Into<String>) {
        let message = message.into();
        match kind {
            ErrorKind::ResolutionMiss => {
                debug!(kind = kind_label(kind), source, %message, "Resolution miss")
            }
            _ => warn!(kind = kind_label(kind), source, %message, "Feature degraded"),
        }

        let mut inner = self.inner.lock();
        *inner.counts.entry(kind).or_insert(0) += 1;
        if inner.events.len() >= MAX_EVENTS {
            inner.events.pop_front();
        }
        inner.events.push_back(DiagnosticEvent {
            kind,
            source,
            message,
            at: SystemTime::now(),
        });
    }

    pub fn record_error(&self, source: &'static str, error: &MacToolsError) {
        self.record(error.kind(), source, error.to_string());
    }

    pub fn miss(&self, source: &'static str, what: impl Into<String>) {
        self.record(ErrorKind::ResolutionMiss, source, what);
    }

    pub fn count(&self, kind: ErrorKind) -> u64 {
        self.inner.lock().counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn recent(&self) -> Vec<DiagnosticEvent> {
        self.inner.lock().events.iter().cloned().collect()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.events.clear();
        inner.counts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_kind() {
        let diag = Diagnostics::new();
        diag.miss("dock_minimizer", "no tile under cursor");
        diag.miss("pin_toggle", "no focused window");
        diag.record_error(
            "resize_trigger",
            &MacToolsError::EventTap {
                feature: "resize_trigger",
            },
        );
        assert_eq!(diag.count(ErrorKind::ResolutionMiss), 2);
        assert_eq!(diag.count(ErrorKind::ResourceExhaustion), 1);
        assert_eq!(diag.count(ErrorKind::PermissionDenied), 0);
    }

    #[test]
    fn test_ring_is_bounded() {
        let diag = Diagnostics::new();
        for i in 0..(MAX_EVENTS + 5) {
            diag.miss("test", format!("miss {}", i));
        }
        let recent = diag.recent();
        assert_eq!(recent.len(), MAX_EVENTS);
        assert_eq!(recent[0].message, "miss 5");
        assert_eq!(diag.count(ErrorKind::ResolutionMiss), (MAX_EVENTS + 5) as u64);
    }

    #[test]
    fn test_event_serializes_kind_label() {
        let diag = Diagnostics::new();
        diag.miss("dock_minimizer", "trash");
        let json = serde_json::to_value(&diag.recent()[0]).unwrap();
        assert_eq!(json["kind"], "resolution_miss");
        assert_eq!(json["source"], "dock_minimizer");
    }
}
