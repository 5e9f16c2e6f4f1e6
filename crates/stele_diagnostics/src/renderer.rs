//! Terminal and JSON rendering of diagnostics.

use crate::diagnostic::Diagnostic;
use crate::label::LabelStyle;
use stele_source::SourceDb;

/// Formats a diagnostic for output.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic.
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String;
}

/// Renders diagnostics in a rustc-like layout:
///
/// ```text
/// warning[W102]: malformed module-flags line
///   --> Geometry.swiftinterface:2:1
///   |
/// 2 | // swift-module-flags -O
///   | ^^^^^^^^^^^^^^^^^^^^^^^^ expected `swift-module-flags: <flags>`
///   = note: default flags will be used
/// ```
pub struct TerminalRenderer {
    /// Whether to wrap the severity in ANSI colors.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, diag: &Diagnostic) -> String {
        let plain = format!("{}[{}]", diag.severity, diag.code);
        if !self.color {
            return plain;
        }
        let ansi = match diag.severity {
            crate::Severity::Error => "31",
            crate::Severity::Warning => "33",
            crate::Severity::Note => "36",
        };
        format!("\x1b[1;{ansi}m{plain}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let mut out = format!("{}: {}\n", self.paint(diag), diag.message);

        let located = source_db
            .resolve_span(diag.primary_span)
            .zip(source_db.try_get_file(diag.primary_span.file));
        if let Some((resolved, file)) = located {
            out.push_str(&format!("  --> {resolved}\n"));

            let line_num = resolved.start_line.to_string();
            let gutter = " ".repeat(line_num.len());
            let line_text = file.line_text_at(diag.primary_span.start);
            let width = (diag.primary_span.len() as usize)
                .clamp(1, line_text.len().saturating_sub(resolved.start_col as usize - 1).max(1));
            let indent = " ".repeat(resolved.start_col as usize - 1);
            let message = diag
                .labels
                .iter()
                .find(|l| l.style == LabelStyle::Primary)
                .map(|l| format!(" {}", l.message))
                .unwrap_or_default();

            out.push_str(&format!("{gutter} |\n"));
            out.push_str(&format!("{line_num} | {line_text}\n"));
            out.push_str(&format!("{gutter} | {indent}{}{message}\n", "^".repeat(width)));
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }
        out
    }
}

/// Renders each diagnostic as one line of JSON.
pub struct JsonRenderer;

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let mut value = serde_json::to_value(diag).unwrap_or(serde_json::Value::Null);
        if let (Some(obj), Some(resolved)) =
            (value.as_object_mut(), source_db.resolve_span(diag.primary_span))
        {
            obj.insert(
                "location".to_string(),
                serde_json::json!({
                    "file": resolved.file_path.display().to_string(),
                    "line": resolved.start_line,
                    "column": resolved.start_col,
                }),
            );
        }
        value.to_string()
    }
}
