//! A configured toolchain session.

use std::path::{Path, PathBuf};

use stele_binary::SerializedModule;
use stele_cache::{
    split_flags, CacheKey, CancellationToken, CompileJob, DependencyTracker,
    InterfaceModuleLoader, LoadError, LoadOutcome, LoaderConfig,
};
use stele_config::{
    find_project_root, load_config, load_config_from_str, resolve_config, ConfigError,
    ResolvedConfig, SteleConfig,
};
use stele_diagnostics::DiagnosticSink;
use stele_interface::{report_header, scan_header, HeaderScan};
use stele_source::SourceDb;

use crate::error::DriverError;
use crate::pipeline::InterfacePipeline;
use crate::reader::BinaryModuleReader;

/// The loader type a [`Session`] drives.
pub type SessionLoader = InterfaceModuleLoader<InterfacePipeline, BinaryModuleReader>;

/// An interface read from disk with its header resolved.
#[derive(Debug)]
pub struct InterfaceInput {
    /// Module name, taken from the file stem.
    pub module: String,
    /// Full interface text.
    pub content: String,
    /// The scanned header.
    pub header: HeaderScan,
    /// Effective flags: the recorded ones, else the configured defaults.
    pub flags: String,
}

/// Owns the resolved configuration and the loader built from it.
pub struct Session {
    config: ResolvedConfig,
    loader: SessionLoader,
}

impl Session {
    /// Creates a session. With `trace`, loads emit a note per state change.
    pub fn new(config: ResolvedConfig, trace: bool) -> Self {
        let loader_config = LoaderConfig {
            search_paths: config.search_paths.clone(),
            cache_dir: config.cache_dir.clone(),
            interface_extension: config.extensions.interface.clone(),
            module_extension: config.extensions.module.clone(),
            prefer_binary: config.prefer_binary,
            default_flags: config.default_flags.clone(),
            tool_version: config.tool_version.clone(),
            trace,
        };
        let loader = InterfaceModuleLoader::new(loader_config, InterfacePipeline, BinaryModuleReader);
        Self { config, loader }
    }

    /// The resolved configuration.
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// The cache-aware loader.
    pub fn loader(&self) -> &SessionLoader {
        &self.loader
    }

    /// Loads one module through the cache.
    pub fn load(
        &self,
        name: &str,
        sink: &DiagnosticSink,
        tracker: Option<&dyn DependencyTracker>,
    ) -> Result<LoadOutcome<SerializedModule>, LoadError> {
        self.loader.load(name, sink, tracker)
    }

    /// Loads one module, giving up once `cancel` is set.
    pub fn load_cancellable(
        &self,
        name: &str,
        sink: &DiagnosticSink,
        tracker: Option<&dyn DependencyTracker>,
        cancel: &CancellationToken,
    ) -> Result<LoadOutcome<SerializedModule>, LoadError> {
        self.loader.load_cancellable(name, sink, tracker, cancel)
    }

    /// Reads the interface at `path` and reports header anomalies into `sink`.
    ///
    /// The text is added to `db`, so the caller can render the diagnostics.
    pub fn read_interface(
        &self,
        path: &Path,
        db: &mut SourceDb,
        sink: &DiagnosticSink,
    ) -> Result<InterfaceInput, DriverError> {
        let file = db.load_file(path).map_err(|e| DriverError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let content = db.get_file(file).content.clone();
        let header = scan_header(&content);
        report_header(&header, file, sink, true);
        let flags = header
            .header
            .flags_or(&self.config.default_flags)
            .to_string();
        let module = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(InterfaceInput {
            module,
            content,
            header,
            flags,
        })
    }

    /// The cache key the loader would use for `input`.
    pub fn key_for(&self, input: &InterfaceInput) -> CacheKey {
        CacheKey::compute(input.content.as_bytes(), &input.flags, &self.config.tool_version)
    }

    /// Compiles the interface at `path` directly, bypassing the cache.
    ///
    /// Returns the module and its encoded bytes; nothing is written.
    pub fn compile_file(
        &self,
        path: &Path,
        db: &mut SourceDb,
        sink: &DiagnosticSink,
    ) -> Result<(SerializedModule, Vec<u8>), DriverError> {
        let input = self.read_interface(path, db, sink)?;
        let compile_failed = |source| DriverError::Compile {
            path: path.to_path_buf(),
            source,
        };
        let job = CompileJob {
            args: split_flags(&input.flags).map_err(compile_failed)?,
            module_name: input.module,
            interface_path: path.to_path_buf(),
            source: input.content,
            flags: input.flags,
            tool_version: self.config.tool_version.clone(),
            output_path: PathBuf::new(),
            cancel: CancellationToken::new(),
        };
        let module = InterfacePipeline
            .compile_module(&job)
            .map_err(compile_failed)?;
        let bytes = stele_binary::encode(&module)?;
        Ok((module, bytes))
    }

    /// Removes orphaned temporary files, or with `all` every cache entry.
    ///
    /// Returns the number of files removed.
    pub fn clean(&self, all: bool) -> Result<usize, DriverError> {
        let store = self.loader.store();
        let removed = if all {
            store.clear()?
        } else {
            store.sweep_stale_temps(self.config.stale_temp_age)?
        };
        Ok(removed)
    }
}

/// Loads `stele.toml` for the project containing `start`.
///
/// An explicit `config_path` wins; its directory becomes the project root.
/// Without either, defaults apply with `start` as the project root.
pub fn open_config(start: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig, DriverError> {
    let (config, project_dir) = match config_path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| DriverError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| start.to_path_buf(), Path::to_path_buf);
            (load_config_from_str(&text)?, dir)
        }
        None => match find_project_root(start) {
            Ok(root) => (load_config(&root)?, root),
            Err(ConfigError::NotFound(_)) => (SteleConfig::default(), start.to_path_buf()),
            Err(e) => return Err(e.into()),
        },
    };
    Ok(resolve_config(&config, &project_dir)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stele_cache::ArtifactSource;
    use stele_diagnostics::codes;

    fn project() -> (tempfile::TempDir, ResolvedConfig) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("modules")).unwrap();
        std::fs::write(
            dir.path().join("stele.toml"),
            "[toolchain]\nversion = \"5.0\"\ndefault_flags = \"-O\"\n\n[search]\npaths = [\"modules\"]\n",
        )
        .unwrap();
        let config = open_config(dir.path(), None).unwrap();
        (dir, config)
    }

    #[test]
    fn open_config_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = open_config(dir.path(), None).unwrap();
        assert_eq!(config.cache_dir, dir.path().join(".stele-cache"));
        assert!(config.search_paths.is_empty());
    }

    #[test]
    fn session_loads_through_cache() {
        let (dir, config) = project();
        std::fs::write(
            dir.path().join("modules/Geometry.swiftinterface"),
            "// swift-tools-version: 5.0\n// swift-module-flags: -foo -bar\npublic func area()\n",
        )
        .unwrap();
        let session = Session::new(config, false);
        let sink = DiagnosticSink::new();
        let first = session.load("Geometry", &sink, None).unwrap();
        let second = session.load("Geometry", &sink, None).unwrap();
        assert_eq!(first.source, ArtifactSource::Compiled);
        assert_eq!(second.source, ArtifactSource::CacheHit);
        assert_eq!(second.module.flags, "-foo -bar");
    }

    #[test]
    fn compile_file_uses_default_flags_and_warns() {
        let (dir, config) = project();
        let path = dir.path().join("modules/Plain.swiftinterface");
        std::fs::write(&path, "public func f()\n").unwrap();
        let session = Session::new(config, false);
        let mut db = SourceDb::new();
        let sink = DiagnosticSink::new();
        let (module, bytes) = session.compile_file(&path, &mut db, &sink).unwrap();
        assert_eq!(module.name, "Plain");
        assert_eq!(module.flags, "-O");
        assert_eq!(stele_binary::decode(&bytes).unwrap(), module);
        assert_eq!(sink.count_code(codes::MISSING_MODULE_FLAGS), 1);
    }

    #[test]
    fn key_matches_loader_key() {
        let (dir, config) = project();
        let path = dir.path().join("modules/K.swiftinterface");
        std::fs::write(&path, "// swift-module-flags: -x\npublic func f()\n").unwrap();
        let session = Session::new(config, false);
        let input = session
            .read_interface(&path, &mut SourceDb::new(), &DiagnosticSink::new())
            .unwrap();
        let outcome = session.load("K", &DiagnosticSink::new(), None).unwrap();
        assert_eq!(outcome.key, Some(session.key_for(&input)));
    }

    #[test]
    fn clean_all_removes_entries() {
        let (dir, config) = project();
        std::fs::write(
            dir.path().join("modules/M.swiftinterface"),
            "public func f()\n",
        )
        .unwrap();
        let session = Session::new(config, false);
        session.load("M", &DiagnosticSink::new(), None).unwrap();
        assert_eq!(session.clean(false).unwrap(), 0);
        assert_eq!(session.clean(true).unwrap(), 1);
        assert!(session.loader().store().entries().unwrap().is_empty());
    }
}
