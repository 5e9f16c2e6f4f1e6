//! The on-disk artifact store.
//!
//! One binary artifact per cache key, stored as `<Name>-<key>.<ext>` directly
//! under the cache directory. Artifacts are written to a temporary file in the
//! same directory and then linked into place without overwriting, so a reader
//! sees either nothing or a complete file. Temporary files start with `.` and
//! end with `.tmp` and are never mistaken for artifacts.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::NamedTempFile;

use crate::error::CacheError;
use crate::key::CacheKey;

const TEMP_SUFFIX: &str = ".tmp";

/// The state of a cache slot as seen by a reader.
#[derive(Debug)]
pub enum Lookup {
    /// A valid artifact exists at the path.
    Hit(PathBuf),
    /// No file exists for the key.
    Missing,
    /// A file exists but fails verification.
    Invalid {
        /// The artifact path.
        path: PathBuf,
        /// Why verification failed.
        reason: String,
    },
    /// The file could not be read.
    Unreadable {
        /// The artifact path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// How a publish attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// This writer's artifact is now at the path.
    Published(PathBuf),
    /// Another writer published a valid artifact first; ours was discarded.
    PeerWon(PathBuf),
}

impl PublishOutcome {
    /// The final artifact path.
    pub fn path(&self) -> &Path {
        match self {
            PublishOutcome::Published(path) | PublishOutcome::PeerWon(path) => path,
        }
    }
}

/// A published artifact found by [`ArtifactStore::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Module name.
    pub module: String,
    /// The key the artifact is stored under.
    pub key: CacheKey,
    /// Full path of the artifact.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

/// Content-keyed store for binary module artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// Root cache directory.
    cache_dir: PathBuf,

    /// Artifact file extension, without the dot.
    extension: String,
}

impl ArtifactStore {
    /// Creates a store rooted at `cache_dir` writing `*.extension` artifacts.
    pub fn new(cache_dir: &Path, extension: &str) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            extension: extension.to_string(),
        }
    }

    /// The cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Creates the cache directory if needed.
    pub fn ensure_dir(&self) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.cache_dir).map_err(|e| CacheError::Io {
            path: self.cache_dir.clone(),
            source: e,
        })
    }

    /// Returns the final path of the artifact for `module` under `key`.
    pub fn artifact_path(&self, module: &str, key: &CacheKey) -> PathBuf {
        self.cache_dir
            .join(format!("{module}-{key}.{}", self.extension))
    }

    /// Looks up and verifies the artifact for `module` under `key`.
    ///
    /// Fail-safe: every outcome other than [`Lookup::Hit`] is a cache miss.
    pub fn lookup(&self, module: &str, key: &CacheKey) -> Lookup {
        let path = self.artifact_path(module, key);
        match std::fs::read(&path) {
            Ok(bytes) => match stele_binary::verify(&bytes) {
                Ok(_) => Lookup::Hit(path),
                Err(e) => Lookup::Invalid {
                    path,
                    reason: e.to_string(),
                },
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Lookup::Missing,
            Err(e) => Lookup::Unreadable { path, source: e },
        }
    }

    /// Starts writing the artifact for `module` under `key`.
    ///
    /// The bytes go to a temporary file next to the final path. Dropping the
    /// returned [`PendingArtifact`] without publishing deletes it.
    pub fn begin_write(&self, module: &str, key: &CacheKey) -> Result<PendingArtifact, CacheError> {
        self.ensure_dir()?;
        let temp = tempfile::Builder::new()
            .prefix(&format!(".{module}-{key}."))
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.cache_dir)
            .map_err(|e| CacheError::Io {
                path: self.cache_dir.clone(),
                source: e,
            })?;
        Ok(PendingArtifact {
            temp,
            final_path: self.artifact_path(module, key),
        })
    }

    /// Lists published artifacts, sorted by path.
    pub fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        let mut entries = Vec::new();
        for path in self.dir_files()? {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((module, key)) = self.parse_artifact_name(file_name) else {
                continue;
            };
            let size = std::fs::metadata(&path)
                .map_err(|e| CacheError::Io {
                    path: path.clone(),
                    source: e,
                })?
                .len();
            entries.push(CacheEntry {
                module,
                key,
                path,
                size,
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Removes temporary files older than `max_age`.
    ///
    /// A process killed mid-compilation leaves its temporary file behind; it
    /// is never read as an artifact, and this reclaims the space. Younger
    /// files may belong to a compilation still in progress and are kept.
    /// Returns the number of files removed.
    pub fn sweep_stale_temps(&self, max_age: Duration) -> Result<usize, CacheError> {
        let now = SystemTime::now();
        let mut removed = 0;
        for path in self.dir_files()? {
            if !is_temp_name(&path) {
                continue;
            }
            let modified = std::fs::metadata(&path).and_then(|m| m.modified());
            let age = match modified {
                Ok(time) => now.duration_since(time).unwrap_or(Duration::ZERO),
                // Already gone: its writer finished or another sweeper got it.
                Err(_) => continue,
            };
            if age >= max_age && remove_if_present(&path)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Removes every artifact and temporary file. Returns the number removed.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let mut removed = 0;
        for path in self.dir_files()? {
            let is_artifact = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| self.parse_artifact_name(n).is_some());
            if (is_artifact || is_temp_name(&path)) && remove_if_present(&path)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn dir_files(&self) -> Result<Vec<PathBuf>, CacheError> {
        let read_dir = match std::fs::read_dir(&self.cache_dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CacheError::Io {
                    path: self.cache_dir.clone(),
                    source: e,
                })
            }
        };
        let mut files = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| CacheError::Io {
                path: self.cache_dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Splits `<Name>-<64 hex>.<ext>` into module name and key.
    fn parse_artifact_name(&self, file_name: &str) -> Option<(String, CacheKey)> {
        let stem = file_name
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;
        let (module, key) = stem.rsplit_once('-')?;
        if module.is_empty() || module.starts_with('.') {
            return None;
        }
        Some((module.to_string(), CacheKey::from_hex(key)?))
    }
}

fn is_temp_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.') && n.ends_with(TEMP_SUFFIX))
}

fn remove_if_present(path: &Path) -> Result<bool, CacheError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// An artifact being written, not yet visible at its final path.
#[derive(Debug)]
pub struct PendingArtifact {
    temp: NamedTempFile,
    final_path: PathBuf,
}

impl PendingArtifact {
    /// Appends bytes to the temporary file.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), CacheError> {
        self.temp.write_all(bytes).map_err(|e| CacheError::Io {
            path: self.temp.path().to_path_buf(),
            source: e,
        })
    }

    /// The temporary file's path.
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// The path the artifact will be published at.
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Makes the artifact visible at its final path.
    ///
    /// Never overwrites a valid artifact: if another writer got there first
    /// and its file verifies, ours is discarded. An existing file that fails
    /// verification is replaced atomically.
    pub fn publish(self) -> Result<PublishOutcome, CacheError> {
        let PendingArtifact { temp, final_path } = self;
        temp.as_file().sync_all().map_err(|e| CacheError::Io {
            path: temp.path().to_path_buf(),
            source: e,
        })?;

        match temp.persist_noclobber(&final_path) {
            Ok(_) => Ok(PublishOutcome::Published(final_path)),
            Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => {
                let existing_valid = std::fs::read(&final_path)
                    .map(|bytes| stele_binary::verify(&bytes).is_ok())
                    .unwrap_or(false);
                if existing_valid {
                    // Dropping the temp file deletes it.
                    drop(err.file);
                    Ok(PublishOutcome::PeerWon(final_path))
                } else {
                    err.file
                        .persist(&final_path)
                        .map_err(|e| CacheError::Publish {
                            path: final_path.clone(),
                            source: e.error,
                        })?;
                    Ok(PublishOutcome::Published(final_path))
                }
            }
            Err(err) => Err(CacheError::Publish {
                path: final_path,
                source: err.error,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stele_binary::SerializedModule;
    use stele_ir::ModuleDecl;

    fn make_store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(&dir.path().join("cache"), "swiftmodule");
        (dir, store)
    }

    fn key(n: u8) -> CacheKey {
        CacheKey::compute(&[n], "-O", &"5.0".parse().unwrap())
    }

    fn artifact(flags: &str) -> Vec<u8> {
        stele_binary::encode(&SerializedModule {
            name: "M".to_string(),
            flags: flags.to_string(),
            tool_version: "5.0".parse().unwrap(),
            module: ModuleDecl::new("M"),
        })
        .unwrap()
    }

    fn publish(store: &ArtifactStore, k: &CacheKey, bytes: &[u8]) -> PublishOutcome {
        let mut pending = store.begin_write("M", k).unwrap();
        pending.write_all(bytes).unwrap();
        pending.publish().unwrap()
    }

    #[test]
    fn artifact_path_format() {
        let (_dir, store) = make_store();
        let k = key(1);
        let path = store.artifact_path("Geometry", &k);
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("Geometry-{}.swiftmodule", k.to_hex())
        );
    }

    #[test]
    fn lookup_missing_when_dir_absent() {
        let (_dir, store) = make_store();
        assert!(matches!(store.lookup("M", &key(1)), Lookup::Missing));
    }

    #[test]
    fn publish_then_hit() {
        let (_dir, store) = make_store();
        let k = key(1);
        let outcome = publish(&store, &k, &artifact("-O"));
        assert_eq!(outcome, PublishOutcome::Published(store.artifact_path("M", &k)));
        assert!(matches!(store.lookup("M", &k), Lookup::Hit(_)));
    }

    #[test]
    fn pending_is_invisible_until_published() {
        let (_dir, store) = make_store();
        let k = key(1);
        let mut pending = store.begin_write("M", &k).unwrap();
        pending.write_all(&artifact("-O")).unwrap();
        assert!(pending.temp_path().exists());
        assert!(matches!(store.lookup("M", &k), Lookup::Missing));
        let temp = pending.temp_path().to_path_buf();
        drop(pending);
        assert!(!temp.exists());
        assert!(matches!(store.lookup("M", &k), Lookup::Missing));
    }

    #[test]
    fn truncated_artifact_is_invalid() {
        let (_dir, store) = make_store();
        let k = key(1);
        store.ensure_dir().unwrap();
        let bytes = artifact("-O");
        std::fs::write(store.artifact_path("M", &k), &bytes[..bytes.len() / 2]).unwrap();
        assert!(matches!(store.lookup("M", &k), Lookup::Invalid { .. }));
    }

    #[test]
    fn peer_artifact_is_kept() {
        let (_dir, store) = make_store();
        let k = key(1);
        publish(&store, &k, &artifact("-peer"));
        let outcome = publish(&store, &k, &artifact("-mine"));
        assert!(matches!(outcome, PublishOutcome::PeerWon(_)));
        let kept = stele_binary::read_module(outcome.path()).unwrap();
        assert_eq!(kept.flags, "-peer");
        assert_eq!(store.sweep_stale_temps(Duration::ZERO).unwrap(), 0);
    }

    #[test]
    fn invalid_existing_file_is_replaced() {
        let (_dir, store) = make_store();
        let k = key(1);
        store.ensure_dir().unwrap();
        std::fs::write(store.artifact_path("M", &k), b"garbage").unwrap();
        let outcome = publish(&store, &k, &artifact("-O"));
        assert!(matches!(outcome, PublishOutcome::Published(_)));
        assert!(matches!(store.lookup("M", &k), Lookup::Hit(_)));
    }

    #[test]
    fn entries_lists_only_artifacts() {
        let (_dir, store) = make_store();
        publish(&store, &key(1), &artifact("-O"));
        publish(&store, &key(2), &artifact("-O"));
        let orphan = store.begin_write("M", &key(3)).unwrap();
        let _kept = orphan.temp_path().to_path_buf();
        std::fs::write(store.cache_dir().join("notes.txt"), b"x").unwrap();
        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.module == "M" && e.size > 0));
        drop(orphan);
    }

    #[test]
    fn sweep_removes_only_old_temps() {
        let (_dir, store) = make_store();
        publish(&store, &key(1), &artifact("-O"));
        let orphan = store.begin_write("M", &key(2)).unwrap();
        let (_file, temp_path) = orphan.temp.keep().unwrap();
        assert_eq!(store.sweep_stale_temps(Duration::from_secs(3600)).unwrap(), 0);
        assert!(temp_path.exists());
        assert_eq!(store.sweep_stale_temps(Duration::ZERO).unwrap(), 1);
        assert!(!temp_path.exists());
        assert_eq!(store.entries().unwrap().len(), 1);
    }

    #[test]
    fn clear_removes_everything() {
        let (_dir, store) = make_store();
        publish(&store, &key(1), &artifact("-O"));
        let orphan = store.begin_write("M", &key(2)).unwrap();
        let (_file, _path) = orphan.temp.keep().unwrap();
        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.entries().unwrap().is_empty());
    }

    #[test]
    fn module_names_with_dashes_parse() {
        let (_dir, store) = make_store();
        let k = key(9);
        let name = format!("My-Lib-{}.swiftmodule", k.to_hex());
        assert_eq!(store.parse_artifact_name(&name), Some(("My-Lib".to_string(), k)));
        assert_eq!(store.parse_artifact_name("My-Lib-abc.swiftmodule"), None);
    }
}
