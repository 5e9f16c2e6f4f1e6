//! The interface-to-binary compilation cache.
//!
//! Given a module name, the [`InterfaceModuleLoader`] finds the module's
//! textual interface (or a prebuilt binary module), derives a [`CacheKey`]
//! from the interface content, its flags and the tool version, and serves the
//! cached binary artifact for that key. On a miss it runs a subordinate
//! compilation through a [`CompilePipeline`] and publishes the result
//! atomically, so concurrent loaders in this or other processes never observe
//! a partial artifact.

#![warn(missing_docs)]

pub mod cancel;
pub mod error;
pub mod invoker;
pub mod key;
pub mod loader;
pub mod store;
pub mod tracker;

pub use cancel::CancellationToken;
pub use error::{CacheError, LoadError};
pub use invoker::{split_flags, CompileJob, CompilePipeline, PipelineError};
pub use key::CacheKey;
pub use loader::{
    ArtifactSource, BinaryModuleLoader, InterfaceModuleLoader, LoadOutcome, LoadState,
    LoaderConfig,
};
pub use store::{ArtifactStore, CacheEntry, Lookup, PendingArtifact, PublishOutcome};
pub use tracker::{DependencyTracker, FileListTracker};
