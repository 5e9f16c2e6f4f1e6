//! Header marker recognition.
//!
//! The two marker lines are matched by two independent patterns. Each is
//! anchored at the start of the line and tolerates leading whitespace and a
//! comment leader (`//`, `#`, `--` or `;`). Only the leading header region is
//! scanned: blank lines and comment lines up to the first line of anything
//! else. Scanning never fails; problems become [`HeaderAnomaly`] values that
//! [`report_header`] turns into warnings.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;
use stele_common::ToolVersion;
use stele_diagnostics::{codes, Diagnostic, DiagnosticCode, DiagnosticSink, Label};
use stele_source::{FileId, Span};

/// Key of the tool-version marker line.
pub const TOOLS_VERSION_KEY: &str = "swift-tools-version";

/// Key of the module-flags marker line.
pub const MODULE_FLAGS_KEY: &str = "swift-module-flags";

static TOOLS_VERSION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(?://+|#+|-{2,}|;+)\s*)?swift-tools-version:\s*([0-9]+(?:\.[0-9]+)*)\s*$")
        .expect("tools-version pattern is valid")
});

static MODULE_FLAGS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(?://+|#+|-{2,}|;+)\s*)?swift-module-flags:(.*)$")
        .expect("module-flags pattern is valid")
});

static MARKER_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(?://+|#+|-{2,}|;+)\s*)?(swift-tools-version|swift-module-flags)")
        .expect("marker key pattern is valid")
});

/// Returns the version token if `line` is a well-formed tool-version marker.
pub fn match_tools_version(line: &str) -> Option<&str> {
    TOOLS_VERSION_LINE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Returns the trimmed flags string if `line` is a well-formed module-flags marker.
pub fn match_module_flags(line: &str) -> Option<&str> {
    MODULE_FLAGS_LINE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Returns the marker whose key opens `line`, well-formed or not.
///
/// A key mentioned later in the line, such as inside a flags payload, does
/// not count.
fn leading_marker(line: &str) -> Option<Marker> {
    let key = MARKER_KEY.captures(line)?.get(1)?.as_str();
    if key == TOOLS_VERSION_KEY {
        Some(Marker::ToolsVersion)
    } else {
        Some(Marker::ModuleFlags)
    }
}

/// One of the two header markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Marker {
    /// `swift-tools-version:`
    ToolsVersion,
    /// `swift-module-flags:`
    ModuleFlags,
}

impl Marker {
    /// The marker key as written in the file, without the colon.
    pub fn key(self) -> &'static str {
        match self {
            Marker::ToolsVersion => TOOLS_VERSION_KEY,
            Marker::ModuleFlags => MODULE_FLAGS_KEY,
        }
    }

    fn malformed_code(self) -> DiagnosticCode {
        match self {
            Marker::ToolsVersion => codes::MALFORMED_TOOLS_VERSION,
            Marker::ModuleFlags => codes::MALFORMED_MODULE_FLAGS,
        }
    }
}

/// What went wrong with a header line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnomalyKind {
    /// The line mentions the marker key but does not match its pattern.
    Malformed(Marker),
    /// A second well-formed line for a marker that was already seen.
    Duplicate(Marker),
}

/// A recoverable problem found while scanning the header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderAnomaly {
    /// The kind of problem.
    pub kind: AnomalyKind,
    /// Zero-based line index.
    pub line: usize,
    /// Byte range of the line, without its terminator.
    pub range: Range<usize>,
}

/// The metadata carried by the header markers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterfaceHeader {
    /// Version of the tool that produced the file; `None` means unknown producer.
    pub tools_version: Option<ToolVersion>,
    /// Verbatim flags string; `None` means default flags apply.
    pub module_flags: Option<String>,
}

impl InterfaceHeader {
    /// The flags to compile with: the recorded flags, or `default` if absent.
    pub fn flags_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.module_flags.as_deref().unwrap_or(default)
    }
}

/// The result of scanning a file's header region.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderScan {
    /// Extracted metadata.
    pub header: InterfaceHeader,
    /// Problems found, in line order.
    pub anomalies: Vec<HeaderAnomaly>,
    /// Byte offset of the first line after the header region.
    pub body_offset: usize,
}

impl HeaderScan {
    /// Returns `true` if there were no anomalies.
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}

fn is_header_line(line: &str) -> bool {
    let t = line.trim_start();
    t.is_empty() || t.starts_with("//") || t.starts_with('#') || t.starts_with("--") || t.starts_with(';')
}

/// Scans the header region of an interface file.
pub fn scan_header(text: &str) -> HeaderScan {
    let mut scan = HeaderScan::default();
    let mut seen_version = false;
    let mut seen_flags = false;
    let mut offset = 0;

    for (index, raw) in text.split_inclusive('\n').enumerate() {
        let line = raw.trim_end_matches(['\n', '\r']);
        if !is_header_line(line) {
            break;
        }
        let range = offset..offset + line.len();
        offset += raw.len();

        let anomaly = |kind| HeaderAnomaly {
            kind,
            line: index,
            range: range.clone(),
        };

        if let Some(token) = match_tools_version(line) {
            if seen_version {
                scan.anomalies.push(anomaly(AnomalyKind::Duplicate(Marker::ToolsVersion)));
            } else {
                match token.parse::<ToolVersion>() {
                    Ok(version) => {
                        scan.header.tools_version = Some(version);
                        seen_version = true;
                    }
                    Err(_) => scan
                        .anomalies
                        .push(anomaly(AnomalyKind::Malformed(Marker::ToolsVersion))),
                }
            }
        } else if let Some(flags) = match_module_flags(line) {
            if seen_flags {
                scan.anomalies.push(anomaly(AnomalyKind::Duplicate(Marker::ModuleFlags)));
            } else {
                scan.header.module_flags = Some(flags.to_string());
                seen_flags = true;
            }
        } else if let Some(marker) = leading_marker(line) {
            scan.anomalies.push(anomaly(AnomalyKind::Malformed(marker)));
        }
    }

    scan.body_offset = offset;
    scan
}

/// Reports header anomalies to `sink` as warnings.
///
/// With `report_missing_flags`, an absent module-flags line is reported too.
pub fn report_header(
    scan: &HeaderScan,
    file: FileId,
    sink: &DiagnosticSink,
    report_missing_flags: bool,
) {
    for anomaly in &scan.anomalies {
        let span = Span::new(file, anomaly.range.start as u32, anomaly.range.end as u32);
        let diag = match anomaly.kind {
            AnomalyKind::Malformed(Marker::ToolsVersion) => Diagnostic::warning(
                Marker::ToolsVersion.malformed_code(),
                format!("malformed `{TOOLS_VERSION_KEY}` line; producer version is unknown"),
                span,
            )
            .with_label(Label::primary(span, "expected a dotted version number"))
            .with_help(format!("expected `// {TOOLS_VERSION_KEY}: <major>.<minor>`")),
            AnomalyKind::Malformed(Marker::ModuleFlags) => Diagnostic::warning(
                Marker::ModuleFlags.malformed_code(),
                format!("malformed `{MODULE_FLAGS_KEY}` line; default flags will be used"),
                span,
            )
            .with_label(Label::primary(span, "missing ':' after the key"))
            .with_help(format!("expected `// {MODULE_FLAGS_KEY}: <flags>`")),
            AnomalyKind::Duplicate(marker) => Diagnostic::warning(
                codes::DUPLICATE_MARKER,
                format!("duplicate `{}` line; the first one is used", marker.key()),
                span,
            )
            .with_label(Label::primary(span, "ignored")),
        };
        sink.emit(diag);
    }

    if report_missing_flags
        && scan.header.module_flags.is_none()
        && !scan
            .anomalies
            .iter()
            .any(|a| a.kind == AnomalyKind::Malformed(Marker::ModuleFlags))
    {
        sink.emit(Diagnostic::warning(
            codes::MISSING_MODULE_FLAGS,
            format!("interface has no `{MODULE_FLAGS_KEY}` line; default flags will be used"),
            Span::new(file, 0, 0),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tools_version_pattern() {
        assert_eq!(match_tools_version("// swift-tools-version: 5.0"), Some("5.0"));
        assert_eq!(match_tools_version("swift-tools-version:5.9.1  "), Some("5.9.1"));
        assert_eq!(match_tools_version("  # swift-tools-version: 6"), Some("6"));
        assert_eq!(match_tools_version("-- swift-tools-version: 5.0"), Some("5.0"));
        assert_eq!(match_tools_version("// swift-tools-version: five"), None);
        assert_eq!(match_tools_version("// swift-tools-version: 5.0 beta"), None);
        assert_eq!(match_tools_version("// note swift-tools-version: 5.0"), None);
    }

    #[test]
    fn module_flags_pattern() {
        assert_eq!(match_module_flags("// swift-module-flags: -foo -bar"), Some("-foo -bar"));
        assert_eq!(match_module_flags("// swift-module-flags:"), Some(""));
        assert_eq!(match_module_flags(";; swift-module-flags:   -O  "), Some("-O"));
        assert_eq!(match_module_flags("// swift-module-flags -O"), None);
    }

    #[test]
    fn clean_header() {
        let text = "// swift-tools-version: 5.0\n// swift-module-flags: -foo -bar\n\npublic func f()\n";
        let scan = scan_header(text);
        assert!(scan.is_clean());
        assert_eq!(scan.header.tools_version, Some("5.0".parse().unwrap()));
        assert_eq!(scan.header.module_flags.as_deref(), Some("-foo -bar"));
        assert_eq!(&text[scan.body_offset..], "public func f()\n");
    }

    #[test]
    fn malformed_flags_keeps_version() {
        let text = "// swift-tools-version: 5.0\n// swift-module-flags -foo\npublic func f()\n";
        let scan = scan_header(text);
        assert_eq!(scan.header.tools_version, Some("5.0".parse().unwrap()));
        assert_eq!(scan.header.module_flags, None);
        assert_eq!(scan.anomalies.len(), 1);
        assert_eq!(scan.anomalies[0].kind, AnomalyKind::Malformed(Marker::ModuleFlags));
        assert_eq!(scan.anomalies[0].line, 1);
        assert_eq!(scan.header.flags_or("-default"), "-default");
    }

    #[test]
    fn duplicate_first_wins() {
        let text = "// swift-module-flags: -a\n// swift-module-flags: -b\n";
        let scan = scan_header(text);
        assert_eq!(scan.header.module_flags.as_deref(), Some("-a"));
        assert_eq!(scan.anomalies[0].kind, AnomalyKind::Duplicate(Marker::ModuleFlags));
        assert_eq!(scan.body_offset, text.len());
    }

    #[test]
    fn markers_after_body_are_ignored() {
        let text = "import Foundation\n// swift-tools-version: 5.0\n";
        let scan = scan_header(text);
        assert_eq!(scan.header, InterfaceHeader::default());
        assert_eq!(scan.body_offset, 0);
    }

    #[test]
    fn flags_payload_may_mention_the_version_key() {
        let text = "// swift-tools-version: 5.0\n// swift-module-flags: -D swift-tools-version:x\n";
        let scan = scan_header(text);
        assert!(scan.is_clean());
        assert_eq!(scan.header.tools_version, Some("5.0".parse().unwrap()));
        assert_eq!(
            scan.header.module_flags.as_deref(),
            Some("-D swift-tools-version:x")
        );
    }

    #[test]
    fn key_mentioned_mid_line_is_not_a_marker() {
        let scan = scan_header("// see swift-tools-version: five\n// swift-module-flags: -O\n");
        assert!(scan.is_clean());
        assert_eq!(scan.header.tools_version, None);
        assert_eq!(scan.header.module_flags.as_deref(), Some("-O"));
    }

    #[test]
    fn overflowing_version_is_malformed() {
        let scan = scan_header("// swift-tools-version: 99999999999\n");
        assert!(scan.header.tools_version.is_none());
        assert_eq!(scan.anomalies[0].kind, AnomalyKind::Malformed(Marker::ToolsVersion));
    }

    #[test]
    fn crlf_lines() {
        let scan = scan_header("// swift-tools-version: 5.0\r\n// swift-module-flags: -x\r\nfunc");
        assert!(scan.is_clean());
        assert_eq!(scan.header.module_flags.as_deref(), Some("-x"));
    }

    #[test]
    fn report_emits_warnings() {
        let text = "// swift-tools-version: x\n// swift-tools-version: 5.0\n// swift-tools-version: 5.1\n";
        let scan = scan_header(text);
        let sink = DiagnosticSink::new();
        report_header(&scan, FileId::from_raw(0), &sink, true);
        assert_eq!(sink.count_code(codes::MALFORMED_TOOLS_VERSION), 1);
        assert_eq!(sink.count_code(codes::DUPLICATE_MARKER), 1);
        assert_eq!(sink.count_code(codes::MISSING_MODULE_FLAGS), 1);
        assert!(!sink.has_errors());
    }

    #[test]
    fn anomalies_are_labelled_in_rendered_output() {
        use stele_diagnostics::{DiagnosticRenderer, LabelStyle, TerminalRenderer};
        use stele_source::SourceDb;

        let text = "// swift-tools-version: 5.0\n// swift-module-flags -O\n";
        let mut db = SourceDb::new();
        let file = db.add_source("M.swiftinterface", text.to_string());
        let sink = DiagnosticSink::new();
        report_header(&scan_header(text), file, &sink, true);

        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].labels[0].style, LabelStyle::Primary);
        assert_eq!(diags[0].labels[0].span, diags[0].primary_span);
        let rendered = TerminalRenderer::new(false).render(&diags[0], &db);
        assert!(rendered.contains("--> M.swiftinterface:2:1"), "{rendered}");
        assert!(rendered.contains("^ missing ':' after the key"), "{rendered}");
    }

    #[test]
    fn missing_flags_not_reported_twice() {
        let scan = scan_header("// swift-module-flags -O\n");
        let sink = DiagnosticSink::new();
        report_header(&scan, FileId::from_raw(0), &sink, true);
        assert_eq!(sink.count_code(codes::MALFORMED_MODULE_FLAGS), 1);
        assert_eq!(sink.count_code(codes::MISSING_MODULE_FLAGS), 0);
    }
}
