//! Per-build logging context.
//!
//! Every component of a build (graph, resolver, walker, story reader) holds a
//! [`BuildContext`] scoped to its own name. Non-fatal findings are logged via
//! `tracing` and also kept as [`Diagnostic`]s so callers can inspect them once
//! the build finishes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

/// Category of a non-fatal finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// A specifier could not be resolved; the node was skipped.
    Resolution,
    /// A recognized pattern had an unexpected shape.
    StructuralMismatch,
    /// Syntax with no extraction rule. Only recorded in debug builds.
    UnhandledSyntax,
    /// Identifier or node path collision, first occurrence kept.
    DuplicateKey,
    /// Anything else worth surfacing.
    Other,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiagnosticKind::Resolution => "resolution",
            DiagnosticKind::StructuralMismatch => "structural-mismatch",
            DiagnosticKind::UnhandledSyntax => "unhandled-syntax",
            DiagnosticKind::DuplicateKey => "duplicate-key",
            DiagnosticKind::Other => "other",
        };
        f.write_str(label)
    }
}

/// A recorded non-fatal finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub scope: &'static str,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.scope, self.kind, self.message)
    }
}

/// Shared build context: debug flag, logging scope and diagnostic sink.
///
/// Cloning is cheap; all clones (and all scopes derived with
/// [`BuildContext::scoped`]) write into the same diagnostic list.
#[derive(Debug, Clone)]
pub struct BuildContext {
    debug: bool,
    scope: &'static str,
    diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
}

impl BuildContext {
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            scope: "storymap",
            diagnostics: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Same sink and debug flag, different scope name.
    pub fn scoped(&self, scope: &'static str) -> Self {
        Self {
            debug: self.debug,
            scope,
            diagnostics: Arc::clone(&self.diagnostics),
        }
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn scope(&self) -> &'static str {
        self.scope
    }

    /// Debug-only message, never recorded.
    pub fn verbose(&self, message: impl fmt::Display) {
        if self.debug {
            tracing::debug!(scope = self.scope, "{}", message);
        }
    }

    pub fn info(&self, message: impl fmt::Display) {
        tracing::info!(scope = self.scope, "{}", message);
    }

    /// Log a warning and record it.
    pub fn warn(&self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(scope = self.scope, kind = %kind, "{}", message);
        self.record(kind, message);
    }

    /// Log an error that does not abort the build and record it.
    pub fn error(&self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(scope = self.scope, kind = %kind, "{}", message);
        self.record(kind, message);
    }

    /// Syntax without an extraction rule. Logged and recorded only in debug mode.
    pub fn unhandled(&self, location: &str, node_kind: &str) {
        if self.debug {
            let message = format!("{location}: no rule for {node_kind}");
            tracing::debug!(scope = self.scope, "{}", message);
            self.record(DiagnosticKind::UnhandledSyntax, message);
        }
    }

    fn record(&self, kind: DiagnosticKind, message: String) {
        self.diagnostics.lock().push(Diagnostic {
            kind,
            scope: self.scope,
            message,
        });
    }

    /// Snapshot of everything recorded so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .iter()
            .filter(|d| d.kind == kind)
            .cloned()
            .collect()
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Format a duration as seconds with four decimals, e.g. `0.0123s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.4}s", elapsed.as_secs_f64())
}
