//! The reference compilation pipeline for textual interfaces.

use stele_binary::SerializedModule;
use stele_cache::{CompileJob, CompilePipeline, PipelineError};
use stele_common::InternalError;
use stele_diagnostics::{DiagnosticSink, Severity};
use stele_interface::parse_interface;
use stele_source::{SourceDb, Span};

/// Compiles an interface body into an encoded binary module.
///
/// Each job runs with its own source database and diagnostic sink, so no
/// state is shared with the caller or with concurrent jobs.
#[derive(Debug, Default, Clone, Copy)]
pub struct InterfacePipeline;

impl InterfacePipeline {
    /// Creates the pipeline.
    pub fn new() -> Self {
        Self
    }

    /// Compiles `job` to a decoded module without encoding it.
    pub fn compile_module(&self, job: &CompileJob) -> Result<SerializedModule, PipelineError> {
        if job.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        if let Some(name) = job.flag_value("-module-name") {
            if name != job.module_name {
                return Err(PipelineError::FlagMismatch {
                    reason: format!(
                        "flags name module '{name}' but '{}' was requested",
                        job.module_name
                    ),
                });
            }
        }

        let mut db = SourceDb::new();
        let file = db.add_source(job.interface_path.clone(), job.source.clone());
        let sink = DiagnosticSink::new();
        let parsed = parse_interface(&job.module_name, &job.source, file, &sink);

        if sink.has_errors() {
            // Spans only resolve against this job's database, so bake the
            // location into the message before handing diagnostics out.
            let diagnostics: Vec<_> = sink
                .take_all()
                .into_iter()
                .map(|mut diag| {
                    if let Some(at) = db.resolve_span(diag.primary_span) {
                        diag.message = format!("{at}: {}", diag.message);
                    }
                    diag.primary_span = Span::DUMMY;
                    diag
                })
                .collect();
            let count = diagnostics
                .iter()
                .filter(|d| d.severity == Severity::Error)
                .count();
            return Err(PipelineError::Rejected { count, diagnostics });
        }
        if job.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        Ok(SerializedModule {
            name: job.module_name.clone(),
            flags: job.flags.clone(),
            tool_version: job.tool_version.clone(),
            module: parsed.module,
        })
    }
}

impl CompilePipeline for InterfacePipeline {
    fn compile(&self, job: CompileJob) -> Result<Vec<u8>, PipelineError> {
        let module = self.compile_module(&job)?;
        stele_binary::encode(&module)
            .map_err(|e| PipelineError::Internal(InternalError::new(e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stele_cache::{split_flags, CancellationToken};
    use std::path::PathBuf;

    fn job(name: &str, source: &str, flags: &str) -> CompileJob {
        CompileJob {
            module_name: name.to_string(),
            interface_path: PathBuf::from(format!("{name}.swiftinterface")),
            source: source.to_string(),
            flags: flags.to_string(),
            args: split_flags(flags).unwrap(),
            tool_version: "5.0".parse().unwrap(),
            output_path: PathBuf::from("out.swiftmodule"),
            cancel: CancellationToken::new(),
        }
    }

    const SOURCE: &str = "// swift-tools-version: 5.0\n// swift-module-flags: -foo -bar\n\nimport Swift\n\npublic func area(_ r: Double) -> Double\n";

    #[test]
    fn compiles_and_keeps_flags_verbatim() {
        let bytes = InterfacePipeline
            .compile(job("Geometry", SOURCE, "-foo  -bar"))
            .unwrap();
        let module = stele_binary::decode(&bytes).unwrap();
        assert_eq!(module.name, "Geometry");
        assert_eq!(module.flags, "-foo  -bar");
        assert_eq!(module.module.imports, vec!["Swift".to_string()]);
        assert!(module.module.find("area").is_some());
    }

    #[test]
    fn syntax_errors_reject_with_locations() {
        let err = InterfacePipeline
            .compile(job("Broken", "public func (\n", ""))
            .unwrap_err();
        match err {
            PipelineError::Rejected { count, diagnostics } => {
                assert!(count >= 1);
                assert!(diagnostics[0].message.starts_with("Broken.swiftinterface:1:"));
                assert!(diagnostics[0].primary_span.is_dummy());
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn module_name_flag_must_match() {
        let err = InterfacePipeline
            .compile(job("Geometry", SOURCE, "-module-name Shapes"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::FlagMismatch { .. }));
        assert!(InterfacePipeline
            .compile(job("Geometry", SOURCE, "-module-name Geometry"))
            .is_ok());
    }

    #[test]
    fn cancelled_job_does_nothing() {
        let j = job("Geometry", SOURCE, "");
        j.cancel.cancel();
        assert!(matches!(
            InterfacePipeline.compile(j),
            Err(PipelineError::Cancelled)
        ));
    }
}
