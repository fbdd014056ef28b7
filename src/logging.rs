//! logging
//!
//! The failure-reporting capability for swallowed mirroring errors.
//!
//! # Design
//!
//! Mirroring failures are never surfaced to the saving caller; they are
//! routed here instead. The sink is injected at construction time so
//! tests can observe exactly what was swallowed, and so embedders can
//! wire failures into whatever alerting they run. [`TracingSink`] is the
//! default and emits through `tracing`.

use std::sync::{Arc, Mutex};

use crate::mirror::MirrorError;

/// Receives mirroring failures the façade swallows.
///
/// Fire-and-forget: implementations return nothing and must not panic.
pub trait ErrorSink: Send + Sync {
    /// Record one failed mirroring attempt.
    fn record(&self, error: &MirrorError);
}

/// Default sink: emits an error event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn record(&self, error: &MirrorError) {
        tracing::error!(error = %error, "failed to push save to the remote repository");
    }
}

/// Test sink that keeps every reported failure.
///
/// # Example
///
/// ```
/// use gitmirror::logging::RecordingSink;
///
/// let sink = RecordingSink::new();
/// assert!(sink.errors().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    errors: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages of every recorded failure, in order.
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    /// Number of recorded failures.
    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }
}

impl ErrorSink for RecordingSink {
    fn record(&self, error: &MirrorError) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}
