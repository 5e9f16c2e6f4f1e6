//! Subordinate compilation.
//!
//! A cache miss is resolved by running the full compilation pipeline over the
//! interface as its only source. The configuration is rebuilt from the flags
//! recorded in the interface and passed by value as a [`CompileJob`]; the
//! output location is the only thing the cache overrides. The produced bytes
//! are verified, written to a temporary file, and published atomically.

use std::path::PathBuf;

use stele_common::{InternalError, ToolVersion};
use stele_diagnostics::Diagnostic;

use crate::cancel::CancellationToken;
use crate::error::LoadError;
use crate::key::CacheKey;
use crate::store::{ArtifactStore, PublishOutcome};

/// A fully described compilation of one interface.
#[derive(Debug, Clone)]
pub struct CompileJob {
    /// The module being built.
    pub module_name: String,
    /// Path of the interface file, for diagnostics.
    pub interface_path: PathBuf,
    /// The interface text, the job's only source.
    pub source: String,
    /// The flags string, verbatim as recorded.
    pub flags: String,
    /// `flags` split into arguments.
    pub args: Vec<String>,
    /// Version of the tool running the job.
    pub tool_version: ToolVersion,
    /// Where the artifact will end up once published.
    pub output_path: PathBuf,
    /// Set when the caller abandons the load.
    pub cancel: CancellationToken,
}

impl CompileJob {
    /// Returns the value following `flag` in the arguments, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

/// Why a pipeline did not produce an artifact.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The interface did not compile.
    #[error("interface rejected with {count} error(s)")]
    Rejected {
        /// Number of error diagnostics.
        count: usize,
        /// All diagnostics the pipeline produced.
        diagnostics: Vec<Diagnostic>,
    },

    /// The recorded flags cannot reproduce the requested module.
    #[error("flag reconstruction mismatch: {reason}")]
    FlagMismatch {
        /// What did not match.
        reason: String,
    },

    /// The job's cancellation token was set.
    #[error("compilation cancelled")]
    Cancelled,

    /// The pipeline failed for a reason unrelated to its input.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// The full compilation pipeline, invoked as a subordinate job.
pub trait CompilePipeline: Send + Sync {
    /// Compiles `job` and returns the encoded binary module.
    fn compile(&self, job: CompileJob) -> Result<Vec<u8>, PipelineError>;
}

impl<P: CompilePipeline + ?Sized> CompilePipeline for &P {
    fn compile(&self, job: CompileJob) -> Result<Vec<u8>, PipelineError> {
        (**self).compile(job)
    }
}

/// Splits a flags string into arguments with shell-style quoting.
///
/// Whitespace separates arguments; single quotes preserve text literally;
/// double quotes allow `\"` and `\\` escapes; a backslash outside quotes
/// escapes the next character.
pub fn split_flags(flags: &str) -> Result<Vec<String>, PipelineError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut chars = flags.chars();

    let unterminated = |what: &str| PipelineError::FlagMismatch {
        reason: format!("unterminated {what} in flags `{flags}`"),
    };

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            '\'' => {
                in_arg = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(unterminated("single quote")),
                    }
                }
            }
            '"' => {
                in_arg = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(unterminated("double quote")),
                        },
                        Some(c) => current.push(c),
                        None => return Err(unterminated("double quote")),
                    }
                }
            }
            '\\' => {
                in_arg = true;
                match chars.next() {
                    Some(c) => current.push(c),
                    None => return Err(unterminated("escape")),
                }
            }
            c => {
                in_arg = true;
                current.push(c);
            }
        }
    }
    if in_arg {
        args.push(current);
    }
    Ok(args)
}

/// Inputs for one subordinate compilation.
pub(crate) struct CompileRequest<'a> {
    pub module: &'a str,
    pub interface_path: &'a std::path::Path,
    pub source: &'a str,
    pub flags: &'a str,
    pub key: &'a CacheKey,
    pub tool_version: &'a ToolVersion,
    pub cancel: &'a CancellationToken,
}

/// Runs the pipeline for `request` and publishes its artifact into `store`.
///
/// Nothing becomes visible at the final path unless the pipeline succeeds,
/// its output verifies, and the load was not cancelled.
pub(crate) fn compile_and_publish<P: CompilePipeline + ?Sized>(
    pipeline: &P,
    store: &ArtifactStore,
    request: CompileRequest<'_>,
) -> Result<PublishOutcome, LoadError> {
    let failed = |source: PipelineError| match source {
        PipelineError::Cancelled => LoadError::Cancelled {
            name: request.module.to_string(),
        },
        source => LoadError::SubordinateCompileFailed {
            module: request.module.to_string(),
            path: request.interface_path.to_path_buf(),
            key: request.key.to_hex(),
            source,
        },
    };

    let args = split_flags(request.flags).map_err(failed)?;
    let job = CompileJob {
        module_name: request.module.to_string(),
        interface_path: request.interface_path.to_path_buf(),
        source: request.source.to_string(),
        flags: request.flags.to_string(),
        args,
        tool_version: request.tool_version.clone(),
        output_path: store.artifact_path(request.module, request.key),
        cancel: request.cancel.clone(),
    };

    let bytes = pipeline.compile(job).map_err(failed)?;
    if let Err(e) = stele_binary::verify(&bytes) {
        return Err(failed(PipelineError::Internal(InternalError::new(format!(
            "pipeline produced an invalid artifact: {e}"
        )))));
    }
    if request.cancel.is_cancelled() {
        return Err(failed(PipelineError::Cancelled));
    }

    let mut pending = store.begin_write(request.module, request.key)?;
    pending.write_all(&bytes)?;
    if request.cancel.is_cancelled() {
        return Err(failed(PipelineError::Cancelled));
    }
    Ok(pending.publish()?)
}
