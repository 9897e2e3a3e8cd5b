//! Host application error interface.
//!
//! Every failure inside a load session (bad configuration, duplicate folder
//! titles, malformed descriptors, failed source requests) is funneled through
//! [`Host::error`] instead of unwinding the caller. The host decides how to
//! surface it: a dialog, a log line, a collected report.

use parking_lot::Mutex;

/// Receiver for errors reported during a load session.
///
/// Calls are fire-and-forget; nothing the host returns is consumed.
pub trait Host: Send + Sync {
    /// Reports an error with an optional title and a descriptive message.
    fn error(&self, title: &str, message: &str);
}

/// Host that writes every reported error to the `tracing` error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHost;

impl Host for TracingHost {
    fn error(&self, title: &str, message: &str) {
        if title.is_empty() {
            tracing::error!("{}", message);
        } else {
            tracing::error!(title = %title, "{}", message);
        }
    }
}

/// A single error captured by [`CollectingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    pub title: String,
    pub message: String,
}

/// Host that records every error in memory.
///
/// Used by tests and by the CLI to print a summary after a session.
#[derive(Debug, Default)]
pub struct CollectingHost {
    errors: Mutex<Vec<HostError>>,
}

impl CollectingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every error reported so far, in report order.
    pub fn errors(&self) -> Vec<HostError> {
        self.errors.lock().clone()
    }

    /// Returns only the messages, in report order.
    pub fn messages(&self) -> Vec<String> {
        self.errors.lock().iter().map(|e| e.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }
}

impl Host for CollectingHost {
    fn error(&self, title: &str, message: &str) {
        tracing::debug!(title = %title, message = %message, "Host error recorded");
        self.errors.lock().push(HostError {
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}
