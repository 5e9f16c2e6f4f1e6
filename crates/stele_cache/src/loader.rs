//! The cache-aware module loader.
//!
//! A load walks `Searching → {CacheHit, CacheMiss} → Compiling → Loading →
//! {Loaded, Failed}`. Compilations of the same key are serialized within a
//! process through a per-key slot: one caller compiles while the others wait
//! and then re-check the cache. Across processes the store's no-clobber
//! publish decides the winner, and losers adopt the winner's artifact.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use stele_common::ToolVersion;
use stele_diagnostics::{codes, Diagnostic, DiagnosticSink};
use stele_interface::{report_header, scan_header};
use stele_source::{SourceDb, Span};

use crate::cancel::CancellationToken;
use crate::error::LoadError;
use crate::invoker::{compile_and_publish, CompilePipeline, CompileRequest};
use crate::key::CacheKey;
use crate::store::{ArtifactStore, Lookup, PublishOutcome};
use crate::tracker::DependencyTracker;

/// How often a waiting caller re-checks its cancellation token.
const WAIT_POLL: Duration = Duration::from_millis(50);

/// Settings for an [`InterfaceModuleLoader`].
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Directories to search, in priority order.
    pub search_paths: Vec<PathBuf>,
    /// Where cached artifacts live.
    pub cache_dir: PathBuf,
    /// Extension of textual interfaces, without the dot.
    pub interface_extension: String,
    /// Extension of binary modules, without the dot.
    pub module_extension: String,
    /// Prefer a valid prebuilt binary module over the interface in the same directory.
    pub prefer_binary: bool,
    /// Flags used when an interface has no module-flags line.
    pub default_flags: String,
    /// Version of this tool; part of every cache key.
    pub tool_version: ToolVersion,
    /// Emit N301 notes for every state transition.
    pub trace: bool,
}

/// A state of one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadState {
    /// Looking for the module in the search paths.
    Searching,
    /// A valid cached artifact exists for the key.
    CacheHit,
    /// No valid cached artifact exists for the key.
    CacheMiss,
    /// Running the subordinate compilation.
    Compiling,
    /// Handing the artifact to the module loader.
    Loading,
    /// The module is usable.
    Loaded,
    /// The load ended in an error.
    Failed,
}

impl LoadState {
    /// Returns `true` for `Loaded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadState::Loaded | LoadState::Failed)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoadState::Searching => "searching",
            LoadState::CacheHit => "cache hit",
            LoadState::CacheMiss => "cache miss",
            LoadState::Compiling => "compiling",
            LoadState::Loading => "loading",
            LoadState::Loaded => "loaded",
            LoadState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Where the loaded artifact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactSource {
    /// A binary module found directly in a search path.
    Prebuilt,
    /// An artifact already in the cache.
    CacheHit,
    /// Compiled by this load.
    Compiled,
    /// Compiled by this load, but another process published first.
    CompiledByPeer,
}

/// A successfully loaded module.
#[derive(Debug)]
pub struct LoadOutcome<M> {
    /// The module as produced by the [`BinaryModuleLoader`].
    pub module: M,
    /// The binary artifact that was loaded.
    pub artifact: PathBuf,
    /// How the artifact was obtained.
    pub source: ArtifactSource,
    /// The cache key, unless a prebuilt module was used.
    pub key: Option<CacheKey>,
    /// The states this load went through, ending in `Loaded`.
    pub states: Vec<LoadState>,
}

/// Turns a binary artifact into a usable in-memory module.
pub trait BinaryModuleLoader: Send + Sync {
    /// The loaded module.
    type Module;
    /// Why loading failed.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Loads the binary module at `path`.
    fn load_module(&self, path: &Path) -> Result<Self::Module, Self::Error>;
}

/// What the search found.
enum Found {
    Binary(PathBuf),
    Interface(PathBuf),
}

/// Per-key in-process compile slot.
#[derive(Default)]
struct Slot {
    busy: Mutex<bool>,
    idle: Condvar,
}

/// Releases a slot when leadership ends, including by unwinding.
struct SlotGuard<'a>(&'a Slot);

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        *self.0.busy.lock() = false;
        self.0.idle.notify_all();
    }
}

/// A caller's hold on the slot for one key.
///
/// The last holder removes the slot from the map. Every clone and drop of a
/// slot happens under the map lock, so the count check cannot race.
struct SlotLease<'a> {
    slots: &'a Mutex<HashMap<CacheKey, Arc<Slot>>>,
    key: CacheKey,
    slot: Arc<Slot>,
}

impl Drop for SlotLease<'_> {
    fn drop(&mut self) {
        let mut slots = self.slots.lock();
        let slot = std::mem::take(&mut self.slot);
        // One reference in the map, one here.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(&self.key);
        }
        drop(slot);
    }
}

/// Loads modules from textual interfaces through the artifact cache.
pub struct InterfaceModuleLoader<P, L> {
    config: LoaderConfig,
    store: ArtifactStore,
    pipeline: P,
    modules: L,
    sources: Mutex<SourceDb>,
    slots: Mutex<HashMap<CacheKey, Arc<Slot>>>,
}

/// Per-call context threaded through a load.
struct LoadCtx<'a> {
    name: &'a str,
    sink: &'a DiagnosticSink,
    tracker: Option<&'a dyn DependencyTracker>,
    cancel: &'a CancellationToken,
    states: Vec<LoadState>,
}

impl LoadCtx<'_> {
    fn record(&self, path: &Path) {
        if let Some(tracker) = self.tracker {
            tracker.record(path);
        }
    }
}

impl<P: CompilePipeline, L: BinaryModuleLoader> InterfaceModuleLoader<P, L> {
    /// Creates a loader.
    pub fn new(config: LoaderConfig, pipeline: P, modules: L) -> Self {
        let store = ArtifactStore::new(&config.cache_dir, &config.module_extension);
        Self {
            config,
            store,
            pipeline,
            modules,
            sources: Mutex::new(SourceDb::new()),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The loader's configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// The artifact store backing the cache.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The pipeline run on cache misses.
    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Runs `f` with the source database holding each distinct interface text
    /// read so far.
    ///
    /// Header warnings point into these files.
    pub fn with_sources<R>(&self, f: impl FnOnce(&SourceDb) -> R) -> R {
        f(&self.sources.lock())
    }

    /// Loads the module `name`.
    pub fn load(
        &self,
        name: &str,
        sink: &DiagnosticSink,
        tracker: Option<&dyn DependencyTracker>,
    ) -> Result<LoadOutcome<L::Module>, LoadError> {
        self.load_cancellable(name, sink, tracker, &CancellationToken::new())
    }

    /// Loads the module `name`, stopping early once `cancel` is set.
    pub fn load_cancellable(
        &self,
        name: &str,
        sink: &DiagnosticSink,
        tracker: Option<&dyn DependencyTracker>,
        cancel: &CancellationToken,
    ) -> Result<LoadOutcome<L::Module>, LoadError> {
        let mut ctx = LoadCtx {
            name,
            sink,
            tracker,
            cancel,
            states: Vec::new(),
        };
        match self.run(&mut ctx) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.enter(&mut ctx, LoadState::Failed, &err.to_string());
                Err(err)
            }
        }
    }

    fn run(&self, ctx: &mut LoadCtx<'_>) -> Result<LoadOutcome<L::Module>, LoadError> {
        self.enter(ctx, LoadState::Searching, "");
        let (artifact, source, key) = match self.search(ctx)? {
            Found::Binary(path) => (path, ArtifactSource::Prebuilt, None),
            Found::Interface(path) => {
                let (artifact, source, key) = self.obtain_from_interface(ctx, &path)?;
                (artifact, source, Some(key))
            }
        };

        self.enter(ctx, LoadState::Loading, &artifact.display().to_string());
        let module = self
            .modules
            .load_module(&artifact)
            .map_err(|e| LoadError::LoadFailed {
                path: artifact.clone(),
                source: Box::new(e),
            })?;
        self.enter(ctx, LoadState::Loaded, "");

        Ok(LoadOutcome {
            module,
            artifact,
            source,
            key,
            states: std::mem::take(&mut ctx.states),
        })
    }

    fn enter(&self, ctx: &mut LoadCtx<'_>, state: LoadState, detail: &str) {
        ctx.states.push(state);
        if self.config.trace {
            let message = if detail.is_empty() {
                format!("{}: {state}", ctx.name)
            } else {
                format!("{}: {state} ({detail})", ctx.name)
            };
            ctx.sink
                .emit(Diagnostic::note(codes::CACHE_EVENT, message, Span::DUMMY));
        }
    }

    // ========================================================================
    // Searching
    // ========================================================================

    fn search(&self, ctx: &LoadCtx<'_>) -> Result<Found, LoadError> {
        let name = ctx.name;
        for dir in &self.config.search_paths {
            let binary = dir.join(format!("{name}.{}", self.config.module_extension));
            let interface = dir.join(format!("{name}.{}", self.config.interface_extension));

            if self.config.prefer_binary && self.usable_prebuilt(ctx, &binary) {
                return Ok(Found::Binary(binary));
            }
            if interface.is_file() {
                return Ok(Found::Interface(interface));
            }
            if !self.config.prefer_binary && self.usable_prebuilt(ctx, &binary) {
                return Ok(Found::Binary(binary));
            }
        }
        Err(LoadError::NotFound {
            name: name.to_string(),
            searched: self.config.search_paths.clone(),
        })
    }

    /// Returns `true` if `path` holds a binary module that verifies.
    fn usable_prebuilt(&self, ctx: &LoadCtx<'_>, path: &Path) -> bool {
        if !path.is_file() {
            return false;
        }
        ctx.record(path);
        let verdict = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| stele_binary::verify(&bytes).map_err(|e| e.to_string()));
        match verdict {
            Ok(_) => true,
            Err(reason) => {
                ctx.sink.emit(
                    Diagnostic::warning(
                        codes::INVALID_PREBUILT_MODULE,
                        format!("ignoring invalid prebuilt module {}", path.display()),
                        Span::DUMMY,
                    )
                    .with_note(reason),
                );
                false
            }
        }
    }

    // ========================================================================
    // Interface → artifact
    // ========================================================================

    fn obtain_from_interface(
        &self,
        ctx: &mut LoadCtx<'_>,
        interface: &Path,
    ) -> Result<(PathBuf, ArtifactSource, CacheKey), LoadError> {
        ctx.record(interface);
        let content = std::fs::read_to_string(interface).map_err(|e| LoadError::InterfaceRead {
            path: interface.to_path_buf(),
            source: e,
        })?;

        let scan = scan_header(&content);
        let file = self.sources.lock().intern_source(interface, &content);
        report_header(&scan, file, ctx.sink, true);

        let flags = scan.header.flags_or(&self.config.default_flags).to_string();
        let key = CacheKey::compute(content.as_bytes(), &flags, &self.config.tool_version);

        let lease = self.lease(&key);
        let slot = &*lease.slot;
        loop {
            if ctx.cancel.is_cancelled() {
                return Err(LoadError::Cancelled {
                    name: ctx.name.to_string(),
                });
            }
            if let Lookup::Hit(path) = self.store.lookup(ctx.name, &key) {
                return Ok(self.hit(ctx, path, key));
            }

            let mut busy = slot.busy.lock();
            if *busy {
                // Another caller is compiling this key; wait, then re-check.
                while *busy && !ctx.cancel.is_cancelled() {
                    slot.idle.wait_for(&mut busy, WAIT_POLL);
                }
                continue;
            }
            *busy = true;
            drop(busy);
            let _leader = SlotGuard(slot);

            // A previous leader may have published while we were acquiring.
            match self.store.lookup(ctx.name, &key) {
                Lookup::Hit(path) => return Ok(self.hit(ctx, path, key)),
                Lookup::Missing => {}
                Lookup::Invalid { path, reason } => ctx.sink.emit(
                    Diagnostic::warning(
                        codes::INVALID_CACHED_ARTIFACT,
                        format!("discarding invalid cached artifact {}", path.display()),
                        Span::DUMMY,
                    )
                    .with_note(reason),
                ),
                Lookup::Unreadable { path, source } => ctx.sink.emit(
                    Diagnostic::warning(
                        codes::CACHE_READ_FAILED,
                        format!("could not read cached artifact {}; recompiling", path.display()),
                        Span::DUMMY,
                    )
                    .with_note(source.to_string()),
                ),
            }

            self.enter(ctx, LoadState::CacheMiss, &key.to_hex());
            self.enter(ctx, LoadState::Compiling, &interface.display().to_string());
            let outcome = compile_and_publish(
                &self.pipeline,
                &self.store,
                CompileRequest {
                    module: ctx.name,
                    interface_path: interface,
                    source: &content,
                    flags: &flags,
                    key: &key,
                    tool_version: &self.config.tool_version,
                    cancel: ctx.cancel,
                },
            )?;
            ctx.record(outcome.path());
            let source = match outcome {
                PublishOutcome::Published(_) => ArtifactSource::Compiled,
                PublishOutcome::PeerWon(_) => ArtifactSource::CompiledByPeer,
            };
            return Ok((outcome.path().to_path_buf(), source, key));
        }
    }

    fn hit(
        &self,
        ctx: &mut LoadCtx<'_>,
        path: PathBuf,
        key: CacheKey,
    ) -> (PathBuf, ArtifactSource, CacheKey) {
        self.enter(ctx, LoadState::CacheHit, &key.to_hex());
        ctx.record(&path);
        (path, ArtifactSource::CacheHit, key)
    }

    fn lease(&self, key: &CacheKey) -> SlotLease<'_> {
        let slot = Arc::clone(self.slots.lock().entry(*key).or_default());
        SlotLease {
            slots: &self.slots,
            key: *key,
            slot,
        }
    }
}
