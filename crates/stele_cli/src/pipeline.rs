//! Shared helpers for CLI commands: session setup, status lines and
//! diagnostic rendering.

use std::path::{Path, PathBuf};

use stele_diagnostics::{
    Diagnostic, DiagnosticRenderer, JsonRenderer, Severity, TerminalRenderer,
};
use stele_driver::{open_config, Session};
use stele_source::SourceDb;

use crate::{GlobalArgs, ReportFormat};

/// Opens a session for the project containing the current directory.
///
/// `extra_search_paths` are resolved against the current directory and
/// searched after the configured paths.
pub fn open_session(
    global: &GlobalArgs,
    extra_search_paths: &[PathBuf],
) -> Result<Session, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let mut config = open_config(&cwd, global.config.as_deref())?;
    config
        .search_paths
        .extend(extra_search_paths.iter().map(|p| absolute(&cwd, p)));
    Ok(Session::new(config, global.verbose))
}

fn absolute(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Prints a cargo-style status line to stderr unless `--quiet`.
pub fn status(global: &GlobalArgs, verb: &str, message: impl std::fmt::Display) {
    if !global.quiet && global.format == ReportFormat::Text {
        eprintln!("{verb:>12} {message}");
    }
}

/// Renders diagnostics; `--quiet` keeps only errors.
///
/// Text goes to stderr, JSON (one object per line) to stdout.
pub fn report(diagnostics: &[Diagnostic], db: &SourceDb, global: &GlobalArgs) {
    let shown = diagnostics
        .iter()
        .filter(|d| !global.quiet || d.severity == Severity::Error);
    match global.format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in shown {
                eprintln!("{}", renderer.render(diag, db));
            }
        }
        ReportFormat::Json => {
            for diag in shown {
                println!("{}", JsonRenderer.render(diag, db));
            }
        }
    }
}

/// Exit code for a finished command: 1 if any diagnostic is an error.
pub fn exit_code(diagnostics: &[Diagnostic]) -> i32 {
    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stele_diagnostics::codes;
    use stele_source::Span;

    #[test]
    fn absolute_joins_relative_paths() {
        assert_eq!(
            absolute(Path::new("/work"), Path::new("sdk")),
            PathBuf::from("/work/sdk")
        );
        assert_eq!(
            absolute(Path::new("/work"), Path::new("/opt/sdk")),
            PathBuf::from("/opt/sdk")
        );
    }

    #[test]
    fn exit_code_ignores_warnings() {
        let warning = Diagnostic::warning(codes::MISSING_MODULE_FLAGS, "w", Span::DUMMY);
        assert_eq!(exit_code(std::slice::from_ref(&warning)), 0);
        let error = Diagnostic::error(codes::LOAD_FAILED, "e", Span::DUMMY);
        assert_eq!(exit_code(&[warning, error]), 1);
    }
}
