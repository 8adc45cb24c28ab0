//! Non-fatal diagnostics.
//!
//! Data-shape problems met while transforming or rendering (an unknown type,
//! an unresolved handler name, a redirection target that cannot be found) are
//! recovered locally and reported through an injectable [`DiagnosticSink`].
//! Nothing in the engine logs these conditions on its own.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;

/// The condition a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A structured node type did not resolve to anything renderable.
    UnknownType,
    /// A string event-handler name had no matching handler.
    UnresolvedHandler,
    /// A redirection target selector matched no known target.
    UnresolvedTarget,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::UnknownType => "unknown_type",
            DiagnosticKind::UnresolvedHandler => "unresolved_handler",
            DiagnosticKind::UnresolvedTarget => "unresolved_target",
        };
        f.write_str(name)
    }
}

/// A reported, recovered condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// The offending name: a type, handler name, or selector.
    pub subject: String,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        let subject = type_name.into();
        Diagnostic {
            kind: DiagnosticKind::UnknownType,
            message: format!("Unknown component type: {}", subject),
            subject,
        }
    }

    pub fn unresolved_handler(name: impl Into<String>) -> Self {
        let subject = name.into();
        Diagnostic {
            kind: DiagnosticKind::UnresolvedHandler,
            message: format!("Event handler not found: {}", subject),
            subject,
        }
    }

    pub fn unresolved_target(selector: impl Into<String>) -> Self {
        let subject = selector.into();
        Diagnostic {
            kind: DiagnosticKind::UnresolvedTarget,
            message: format!("Portal container not found: {}", subject),
            subject,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Receiver for diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Shared handle to a sink.
pub type SharedSink = Arc<dyn DiagnosticSink>;

/// Sink that logs every diagnostic as a `tracing` warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        tracing::warn!(
            kind = %diagnostic.kind,
            subject = %diagnostic.subject,
            "{}",
            diagnostic.message
        );
    }
}

/// Sink that records diagnostics in emission order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    seen: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of everything emitted so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Remove and return everything emitted so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(
            &mut *self
                .seen
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }

    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(diagnostic);
    }
}

/// The default sink used when a caller supplies none.
pub fn default_sink() -> SharedSink {
    Arc::new(TracingSink)
}
