//! Conformance test helpers for the stele interface cache.
//!
//! Provides a throwaway project layout with a module search directory and a
//! cache directory, a pipeline wrapper that counts subordinate compilations,
//! and builders for interface text, for assertion in integration tests.

#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use stele_binary::SerializedModule;
use stele_cache::{
    CompileJob, CompilePipeline, InterfaceModuleLoader, LoaderConfig, PipelineError,
};
use stele_common::ToolVersion;
use stele_driver::{BinaryModuleReader, InterfacePipeline};
use stele_ir::ModuleDecl;
use tempfile::TempDir;

/// The loader used throughout the conformance tests.
pub type TestLoader = InterfaceModuleLoader<CountingPipeline, BinaryModuleReader>;

/// Tool version used by every fixture.
pub fn tool_version() -> ToolVersion {
    "5.0".parse().unwrap()
}

/// Builds interface text with a tools-version line, an optional flags line
/// and `body`.
pub fn interface(flags: Option<&str>, body: &str) -> String {
    let mut text = String::from("// swift-tools-version: 5.0\n");
    if let Some(flags) = flags {
        text.push_str(&format!("// swift-module-flags: {flags}\n"));
    }
    text.push('\n');
    text.push_str(body);
    text
}

/// A small valid interface body.
pub const GEOMETRY_BODY: &str = "\
import Foundation

public struct Point {
  public var x: Double
  public var y: Double
}

public func distance(from a: Point, to b: Point) -> Double
";

/// Wraps [`InterfacePipeline`], counting invocations and optionally
/// stalling each one so concurrent callers overlap.
#[derive(Default)]
pub struct CountingPipeline {
    inner: InterfacePipeline,
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingPipeline {
    /// A pipeline that compiles immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// A pipeline that sleeps for `delay` before compiling.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Number of compilations started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompilePipeline for CountingPipeline {
    fn compile(&self, job: CompileJob) -> Result<Vec<u8>, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.inner.compile(job)
    }
}

/// A temporary project: `modules/` for search, `cache/` for artifacts.
pub struct Workspace {
    dir: TempDir,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// Creates an empty workspace.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("modules")).unwrap();
        Self { dir }
    }

    /// The workspace root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// The module search directory.
    pub fn modules_dir(&self) -> PathBuf {
        self.root().join("modules")
    }

    /// The cache directory (created on first publish).
    pub fn cache_dir(&self) -> PathBuf {
        self.root().join("cache")
    }

    /// Writes `content` to `modules/<file>` and returns its path.
    pub fn write_module_file(&self, file: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.modules_dir().join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Writes `modules/<name>.swiftinterface`.
    pub fn write_interface(&self, name: &str, text: &str) -> PathBuf {
        self.write_module_file(&format!("{name}.swiftinterface"), text)
    }

    /// Writes a valid prebuilt `modules/<name>.swiftmodule` with `flags`.
    pub fn write_prebuilt(&self, name: &str, flags: &str) -> PathBuf {
        let bytes = stele_binary::encode(&SerializedModule {
            name: name.to_string(),
            flags: flags.to_string(),
            tool_version: tool_version(),
            module: ModuleDecl::new(name),
        })
        .unwrap();
        self.write_module_file(&format!("{name}.swiftmodule"), bytes)
    }

    /// Loader settings for this workspace.
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            search_paths: vec![self.modules_dir()],
            cache_dir: self.cache_dir(),
            interface_extension: "swiftinterface".to_string(),
            module_extension: "swiftmodule".to_string(),
            prefer_binary: true,
            default_flags: String::new(),
            tool_version: tool_version(),
            trace: false,
        }
    }

    /// A loader with a fresh counting pipeline.
    pub fn loader(&self) -> TestLoader {
        self.loader_with(self.loader_config(), CountingPipeline::new())
    }

    /// A loader with explicit settings and pipeline.
    pub fn loader_with(&self, config: LoaderConfig, pipeline: CountingPipeline) -> TestLoader {
        InterfaceModuleLoader::new(config, pipeline, BinaryModuleReader)
    }

    /// Every file in the cache directory, sorted.
    pub fn cache_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = match std::fs::read_dir(self.cache_dir()) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        };
        files.sort();
        files
    }

    /// Cache files whose names mark them as in-progress temporaries.
    pub fn temp_files(&self) -> Vec<PathBuf> {
        self.cache_files()
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.') && n.ends_with(".tmp"))
            })
            .collect()
    }
}
