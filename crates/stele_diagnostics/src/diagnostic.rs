//! The diagnostic value type.

use crate::code::DiagnosticCode;
use crate::label::Label;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use stele_source::Span;

/// A structured message with a code, a location, and optional context.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// How serious the problem is.
    pub severity: Severity,
    /// Stable code identifying the kind of problem.
    pub code: DiagnosticCode,
    /// The main message.
    pub message: String,
    /// Where the problem was detected, or [`Span::DUMMY`].
    pub primary_span: Span,
    /// Additional annotated spans.
    pub labels: Vec<Label>,
    /// `note: ...` footers.
    pub notes: Vec<String>,
    /// `help: ...` footers.
    pub help: Vec<String>,
}

impl Diagnostic {
    fn with_severity(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            primary_span: span,
            labels: Vec::new(),
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates an error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Error, code, message, span)
    }

    /// Creates a warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Warning, code, message, span)
    }

    /// Creates a note diagnostic.
    pub fn note(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Note, code, message, span)
    }

    /// Adds a label.
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Adds a note footer.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help footer.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::codes;

    #[test]
    fn warning_builder() {
        let diag = Diagnostic::warning(
            codes::MALFORMED_MODULE_FLAGS,
            "malformed module-flags line",
            Span::DUMMY,
        )
        .with_note("default flags will be used")
        .with_help("write `// swift-module-flags: <flags>`");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.code.to_string(), "W102");
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(diag.help.len(), 1);
    }

    #[test]
    fn note_has_note_severity() {
        let diag = Diagnostic::note(codes::CACHE_EVENT, "cache hit", Span::DUMMY);
        assert_eq!(diag.severity, Severity::Note);
    }

    #[test]
    fn json_roundtrip_keeps_labels() {
        let diag = Diagnostic::error(codes::SYNTAX_ERROR, "expected '{'", Span::DUMMY)
            .with_label(Label::primary(Span::DUMMY, "here"));
        let json = serde_json::to_string(&diag).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back.labels.len(), 1);
        assert_eq!(back.message, "expected '{'");
    }
}
