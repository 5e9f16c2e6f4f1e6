//! A loaded interface file with line-start indexing.

use crate::span::{FileId, Span};
use stele_common::ContentHash;
use std::path::PathBuf;

/// A single line of a [`SourceFile`], without its line terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// Zero-based line index.
    pub index: usize,
    /// Byte offset of the first character of the line.
    pub start: u32,
    /// The line text, without `\n` or a trailing `\r`.
    pub text: &'a str,
}

/// A source file loaded into a session.
pub struct SourceFile {
    /// The identifier of this file within its [`SourceDb`](crate::SourceDb).
    pub id: FileId,
    /// The filesystem path, or a synthetic name for in-memory text.
    pub path: PathBuf,
    /// The full text content.
    pub content: String,
    /// Hash of `content`.
    pub content_hash: ContentHash,
    line_starts: Vec<u32>,
}

impl SourceFile {
    /// Creates a new `SourceFile`, indexing line starts up front.
    pub fn new(id: FileId, path: PathBuf, content: String) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                content
                    .bytes()
                    .enumerate()
                    .filter(|(_, b)| *b == b'\n')
                    .map(|(i, _)| (i + 1) as u32),
            )
            .collect();
        let content_hash = ContentHash::from_bytes(content.as_bytes());
        Self {
            id,
            path,
            content,
            content_hash,
            line_starts,
        }
    }

    /// Converts a byte offset into 1-indexed (line, column) coordinates.
    pub fn line_col(&self, byte_offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let col = byte_offset - self.line_starts[line_idx] + 1;
        (line_idx as u32 + 1, col)
    }

    /// Returns the text of the line containing `byte_offset`.
    pub fn line_text_at(&self, byte_offset: u32) -> &str {
        let (line, _) = self.line_col(byte_offset);
        self.lines()
            .nth(line as usize - 1)
            .map(|l| l.text)
            .unwrap_or("")
    }

    /// Iterates over the lines of the file.
    pub fn lines(&self) -> impl Iterator<Item = Line<'_>> + '_ {
        self.line_starts.iter().enumerate().map(move |(index, &start)| {
            let end = self
                .line_starts
                .get(index + 1)
                .map_or(self.content.len(), |next| *next as usize - 1);
            let text = &self.content[start as usize..end];
            Line {
                index,
                start,
                text: text.strip_suffix('\r').unwrap_or(text),
            }
        })
    }

    /// Returns a span covering the given zero-based line, without its terminator.
    pub fn line_span(&self, index: usize) -> Span {
        match self.lines().nth(index) {
            Some(line) => Span::new(self.id, line.start, line.start + line.text.len() as u32),
            None => Span::new(self.id, self.content.len() as u32, self.content.len() as u32),
        }
    }

    /// Returns the text between two byte offsets.
    pub fn snippet(&self, start: u32, end: u32) -> &str {
        &self.content[start as usize..end as usize]
    }
}
