//! Error types for cache and loader operations.

use std::path::PathBuf;

use stele_diagnostics::{codes, Diagnostic};
use stele_source::Span;

use crate::invoker::PipelineError;

/// Errors from the artifact store.
///
/// Reads are fail-safe and never produce these; they come from creating the
/// cache directory, writing temporary files and publishing.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Moving a finished artifact to its final path failed.
    #[error("failed to publish cached artifact {path}: {source}")]
    Publish {
        /// The final artifact path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors returned by [`InterfaceModuleLoader::load`](crate::InterfaceModuleLoader::load).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Neither an interface nor a binary module exists for the name.
    #[error("no module named '{name}' found in {} search path(s)", searched.len())]
    NotFound {
        /// The requested module.
        name: String,
        /// Directories that were searched.
        searched: Vec<PathBuf>,
    },

    /// The interface file exists but could not be read.
    #[error("failed to read interface {path}: {source}")]
    InterfaceRead {
        /// The interface file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The subordinate compilation rejected the interface or failed.
    #[error("failed to compile interface {path} for '{module}' (key {key}): {source}")]
    SubordinateCompileFailed {
        /// The module being compiled.
        module: String,
        /// The interface file.
        path: PathBuf,
        /// Hex rendering of the cache key.
        key: String,
        /// What the pipeline reported.
        source: PipelineError,
    },

    /// Writing or publishing the cache entry failed.
    #[error(transparent)]
    CacheIo(#[from] CacheError),

    /// The artifact exists but could not be loaded as a module.
    #[error("failed to load module from {path}: {source}")]
    LoadFailed {
        /// The artifact that was handed to the module loader.
        path: PathBuf,
        /// The module loader's error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The caller cancelled the load.
    #[error("loading '{name}' was cancelled")]
    Cancelled {
        /// The requested module.
        name: String,
    },
}

impl LoadError {
    /// Converts this error into a diagnostic for rendering.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            LoadError::SubordinateCompileFailed { .. } => codes::COMPILE_FAILED,
            _ => codes::LOAD_FAILED,
        };
        let mut diag = Diagnostic::error(code, self.to_string(), Span::DUMMY);
        match self {
            LoadError::NotFound { searched, .. } => {
                for dir in searched {
                    diag = diag.with_note(format!("searched {}", dir.display()));
                }
            }
            LoadError::SubordinateCompileFailed {
                source: PipelineError::Rejected { diagnostics, .. },
                ..
            } => {
                for inner in diagnostics.iter().take(5) {
                    diag = diag.with_note(format!("{}: {}", inner.code, inner.message));
                }
            }
            _ => {}
        }
        diag
    }
}
