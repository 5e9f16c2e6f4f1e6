//! Errors from driver entry points that are not loads.

use std::path::PathBuf;

use stele_binary::BinaryError;
use stele_cache::{CacheError, LoadError, PipelineError};
use stele_config::ConfigError;
use stele_diagnostics::{codes, Diagnostic};
use stele_interface::EmitError;
use stele_source::Span;

/// Errors from a [`Session`](crate::Session) operation.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// A file named on the command line could not be read or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A direct compilation failed.
    #[error("failed to compile {path}: {source}")]
    Compile {
        /// The interface being compiled.
        path: PathBuf,
        /// What the pipeline reported.
        source: PipelineError,
    },

    /// A binary module could not be read.
    #[error(transparent)]
    Binary(#[from] BinaryError),

    /// A module could not be rendered as an interface.
    #[error(transparent)]
    Emit(#[from] EmitError),

    /// A cache-aware load failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A cache maintenance operation failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl DriverError {
    /// Converts this error into a diagnostic for rendering.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            DriverError::Load(err) => err.to_diagnostic(),
            DriverError::Emit(err) => err.to_diagnostic(),
            DriverError::Compile {
                source: PipelineError::Rejected { diagnostics, .. },
                ..
            } => diagnostics.iter().fold(
                Diagnostic::error(codes::COMPILE_FAILED, self.to_string(), Span::DUMMY),
                |diag, inner| diag.with_note(format!("{}: {}", inner.code, inner.message)),
            ),
            DriverError::Compile { .. } => {
                Diagnostic::error(codes::COMPILE_FAILED, self.to_string(), Span::DUMMY)
            }
            _ => Diagnostic::error(codes::LOAD_FAILED, self.to_string(), Span::DUMMY),
        }
    }
}
