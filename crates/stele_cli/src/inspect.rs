//! `stele header` and `stele key`: inspect a textual interface.

use std::path::Path;

use stele_diagnostics::DiagnosticSink;
use stele_source::SourceDb;

use crate::pipeline::{exit_code, open_session, report};
use crate::{GlobalArgs, ReportFormat};

/// Runs `stele header`: prints the recorded tool version and flags.
pub fn header(file: &Path, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let session = open_session(global, &[])?;
    let mut db = SourceDb::new();
    let sink = DiagnosticSink::new();
    let input = session.read_interface(file, &mut db, &sink)?;
    let recorded = &input.header.header;

    match global.format {
        ReportFormat::Text => {
            match &recorded.tools_version {
                Some(version) => println!("tools-version: {version}"),
                None => println!("tools-version: (none)"),
            }
            match &recorded.module_flags {
                Some(flags) => println!("module-flags:  {flags}"),
                None => println!("module-flags:  (none, defaults: {})", input.flags),
            }
        }
        ReportFormat::Json => {
            let value = serde_json::json!({
                "module": input.module,
                "tools_version": recorded.tools_version.as_ref().map(ToString::to_string),
                "module_flags": recorded.module_flags,
                "effective_flags": input.flags,
                "anomalies": input.header.anomalies.len(),
            });
            println!("{value}");
        }
    }

    let diagnostics = sink.take_all();
    report(&diagnostics, &db, global);
    Ok(exit_code(&diagnostics))
}

/// Runs `stele key`: prints the cache key and the artifact it names.
pub fn key(file: &Path, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let session = open_session(global, &[])?;
    let mut db = SourceDb::new();
    let sink = DiagnosticSink::new();
    let input = session.read_interface(file, &mut db, &sink)?;
    let key = session.key_for(&input);
    let artifact = session.loader().store().artifact_path(&input.module, &key);

    match global.format {
        ReportFormat::Text => {
            println!("{key}");
            if !global.quiet {
                eprintln!("   flags: {}", input.flags);
                eprintln!("artifact: {}", artifact.display());
            }
        }
        ReportFormat::Json => {
            let value = serde_json::json!({
                "module": input.module,
                "key": key.to_hex(),
                "flags": input.flags,
                "tool_version": session.config().tool_version.to_string(),
                "artifact": artifact.display().to_string(),
            });
            println!("{value}");
        }
    }

    let diagnostics = sink.take_all();
    report(&diagnostics, &db, global);
    Ok(exit_code(&diagnostics))
}
