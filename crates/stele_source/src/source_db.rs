//! Central store of every interface text read during a session.

use crate::source_file::SourceFile;
use crate::span::{FileId, Span};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use stele_common::ContentHash;

/// A span resolved to 1-indexed line/column coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpan {
    /// The path of the source file.
    pub file_path: PathBuf,
    /// Starting line (1-indexed).
    pub start_line: u32,
    /// Starting column (1-indexed).
    pub start_col: u32,
    /// Ending line (1-indexed).
    pub end_line: u32,
    /// Ending column (1-indexed).
    pub end_col: u32,
}

impl fmt::Display for ResolvedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file_path.display(),
            self.start_line,
            self.start_col
        )
    }
}

/// Owns all loaded source text and resolves spans for diagnostics.
///
/// Each subordinate compilation gets its own `SourceDb`, so file identifiers
/// are only meaningful within the database that issued them.
#[derive(Default)]
pub struct SourceDb {
    files: Vec<SourceFile>,
    interned: HashMap<(PathBuf, ContentHash), FileId>,
}

impl SourceDb {
    /// Creates an empty source database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a file from disk and returns its [`FileId`].
    pub fn load_file(&mut self, path: &Path) -> Result<FileId, io::Error> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.add_source(path, content))
    }

    /// Adds in-memory text under the given display name.
    pub fn add_source(&mut self, name: impl Into<PathBuf>, content: String) -> FileId {
        let id = FileId::from_raw(self.files.len() as u32);
        self.files.push(SourceFile::new(id, name.into(), content));
        id
    }

    /// Returns the id of an identical file already added through this method,
    /// adding `content` only if the path or its text is new.
    ///
    /// Repeated reads of an unchanged file share one entry.
    pub fn intern_source(&mut self, name: &Path, content: &str) -> FileId {
        let hash = ContentHash::from_bytes(content.as_bytes());
        if let Some(id) = self.interned.get(&(name.to_path_buf(), hash)) {
            return *id;
        }
        let id = self.add_source(name, content.to_string());
        self.interned.insert((name.to_path_buf(), hash), id);
        id
    }

    /// Returns the file for `id`, or `None` for ids issued by another database.
    pub fn try_get_file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.as_raw() as usize)
    }

    /// Returns the file for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this database.
    pub fn get_file(&self, id: FileId) -> &SourceFile {
        &self.files[id.as_raw() as usize]
    }

    /// Resolves a span to line/column coordinates.
    ///
    /// Returns `None` for dummy spans and spans from other databases.
    pub fn resolve_span(&self, span: Span) -> Option<ResolvedSpan> {
        if span.is_dummy() {
            return None;
        }
        let file = self.try_get_file(span.file)?;
        let (start_line, start_col) = file.line_col(span.start);
        let (end_line, end_col) = file.line_col(span.end.saturating_sub(1).max(span.start));
        Some(ResolvedSpan {
            file_path: file.path.clone(),
            start_line,
            start_col,
            end_line,
            end_col,
        })
    }

    /// Returns the number of files loaded.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if no files are loaded.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
