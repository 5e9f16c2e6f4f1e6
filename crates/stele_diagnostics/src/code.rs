//! Diagnostic codes with category prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Errors, prefixed with `E`.
    Error,
    /// Warnings, prefixed with `W`.
    Warning,
    /// Informational notes, prefixed with `N`.
    Note,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Note => 'N',
        }
    }
}

/// A category prefix plus a three-digit number, e.g. `W101`.
///
/// The hundreds digit groups codes by subsystem: 1xx for interface text,
/// 2xx for emission, 3xx for the module cache.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

/// The catalogue of codes emitted by the workspace.
pub mod codes {
    use super::{Category, DiagnosticCode};

    /// Unrecognized character or unterminated literal in an interface body.
    pub const LEX_ERROR: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);
    /// Syntax error in an interface body.
    pub const SYNTAX_ERROR: DiagnosticCode = DiagnosticCode::new(Category::Error, 102);
    /// A declaration cannot be rendered in the stable interface format.
    pub const UNSUPPORTED_DECLARATION: DiagnosticCode = DiagnosticCode::new(Category::Error, 201);
    /// A subordinate compilation failed.
    pub const COMPILE_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Error, 301);
    /// A cached or prebuilt artifact could not be loaded as a module.
    pub const LOAD_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Error, 302);

    /// A line opening with `swift-tools-version` does not match its pattern.
    pub const MALFORMED_TOOLS_VERSION: DiagnosticCode = DiagnosticCode::new(Category::Warning, 101);
    /// A line opening with `swift-module-flags` does not match its pattern.
    pub const MALFORMED_MODULE_FLAGS: DiagnosticCode = DiagnosticCode::new(Category::Warning, 102);
    /// A header marker appears more than once.
    pub const DUPLICATE_MARKER: DiagnosticCode = DiagnosticCode::new(Category::Warning, 103);
    /// The module-flags marker is absent; default flags apply.
    pub const MISSING_MODULE_FLAGS: DiagnosticCode = DiagnosticCode::new(Category::Warning, 104);
    /// A cached artifact failed validation and was treated as a miss.
    pub const INVALID_CACHED_ARTIFACT: DiagnosticCode = DiagnosticCode::new(Category::Warning, 301);
    /// A prebuilt binary module failed validation and was ignored.
    pub const INVALID_PREBUILT_MODULE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 302);
    /// Reading the cache failed; the entry was treated as a miss.
    pub const CACHE_READ_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Warning, 303);

    /// A cache event (hit, miss, publish, lost race).
    pub const CACHE_EVENT: DiagnosticCode = DiagnosticCode::new(Category::Note, 301);
}
