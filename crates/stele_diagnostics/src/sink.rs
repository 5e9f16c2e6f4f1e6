//! Thread-safe diagnostic accumulator.

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Collects diagnostics from any number of threads.
///
/// The error count is kept in an atomic so [`has_errors`](Self::has_errors)
/// never takes the lock.
#[derive(Default)]
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    error_count: AtomicUsize,
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity == Severity::Error {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        self.diagnostics.lock().push(diag);
    }

    /// Returns `true` if any error has been recorded.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Returns the number of errors recorded so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Returns the number of recorded diagnostics with the given code.
    pub fn count_code(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.lock().iter().filter(|d| d.code == code).count()
    }

    /// Drains all diagnostics. The error count is not reset.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock())
    }

    /// Returns a snapshot of all diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }
}
