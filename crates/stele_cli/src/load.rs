//! `stele load`: resolve modules through the interface cache.
//!
//! Modules are loaded in parallel. Loads of distinct modules proceed
//! independently; loads that share a cache key compile it once.

use rayon::prelude::*;

use stele_cache::{ArtifactSource, FileListTracker};
use stele_diagnostics::DiagnosticSink;

use crate::pipeline::{exit_code, open_session, report, status};
use crate::{GlobalArgs, LoadArgs, ReportFormat};

fn describe(source: ArtifactSource) -> &'static str {
    match source {
        ArtifactSource::Prebuilt => "prebuilt",
        ArtifactSource::CacheHit => "cached",
        ArtifactSource::Compiled => "compiled",
        ArtifactSource::CompiledByPeer => "compiled by peer",
    }
}

/// Runs `stele load`.
pub fn run(args: &LoadArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let session = open_session(global, &args.search_paths)?;
    let sink = DiagnosticSink::new();
    let tracker = FileListTracker::new();

    let results: Vec<_> = args
        .modules
        .par_iter()
        .map(|name| (name, session.load(name, &sink, Some(&tracker))))
        .collect();

    for (name, result) in results {
        match result {
            Ok(outcome) => match global.format {
                ReportFormat::Text => status(
                    global,
                    "Loaded",
                    format!(
                        "{name} ({}) {}",
                        describe(outcome.source),
                        outcome.artifact.display()
                    ),
                ),
                ReportFormat::Json => {
                    let value = serde_json::json!({
                        "module": name,
                        "source": describe(outcome.source),
                        "artifact": outcome.artifact.display().to_string(),
                        "key": outcome.key.map(|k| k.to_hex()),
                        "declarations": outcome.module.module.decls.len(),
                    });
                    println!("{value}");
                }
            },
            Err(err) => sink.emit(err.to_diagnostic()),
        }
    }

    if let Some(depfile) = &args.depfile {
        let target = args
            .dep_target
            .clone()
            .unwrap_or_else(|| depfile.with_extension(""));
        std::fs::write(depfile, tracker.render_make_deps(&target))
            .map_err(|e| format!("failed to write {}: {e}", depfile.display()))?;
    }

    let diagnostics = sink.take_all();
    session
        .loader()
        .with_sources(|db| report(&diagnostics, db, global));
    Ok(exit_code(&diagnostics))
}
