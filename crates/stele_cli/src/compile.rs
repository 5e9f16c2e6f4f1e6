//! `stele compile` and `stele emit`: convert between textual interfaces and
//! binary modules without going through the cache.

use std::path::PathBuf;

use stele_diagnostics::DiagnosticSink;
use stele_driver::emit_interface_from_binary;
use stele_source::SourceDb;

use crate::pipeline::{exit_code, open_session, report, status};
use crate::{CompileArgs, EmitArgs, GlobalArgs};

/// Runs `stele compile`.
pub fn compile(args: &CompileArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let session = open_session(global, &[])?;
    let mut db = SourceDb::new();
    let sink = DiagnosticSink::new();

    status(global, "Compiling", args.file.display());
    let result = session.compile_file(&args.file, &mut db, &sink);
    let (module, bytes) = match result {
        Ok(compiled) => compiled,
        Err(err) => {
            sink.emit(err.to_diagnostic());
            let diagnostics = sink.take_all();
            report(&diagnostics, &db, global);
            return Ok(1);
        }
    };

    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}.{}",
            module.name,
            session.config().extensions.module
        ))
    });
    std::fs::write(&output, &bytes)
        .map_err(|e| format!("failed to write {}: {e}", output.display()))?;
    status(
        global,
        "Finished",
        format!("{} ({} bytes)", output.display(), bytes.len()),
    );

    let diagnostics = sink.take_all();
    report(&diagnostics, &db, global);
    Ok(exit_code(&diagnostics))
}

/// Runs `stele emit`.
pub fn emit(args: &EmitArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let text = match emit_interface_from_binary(&args.file) {
        Ok(text) => text,
        Err(err) => {
            report(&[err.to_diagnostic()], &SourceDb::new(), global);
            return Ok(1);
        }
    };
    match &args.output {
        Some(path) => {
            std::fs::write(path, &text)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            status(global, "Emitted", path.display());
        }
        None => print!("{text}"),
    }
    Ok(0)
}
