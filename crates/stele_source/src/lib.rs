//! Source text management and span tracking for textual interfaces.
//!
//! [`SourceDb`] owns the text of every interface file read during a session,
//! [`Span`] ties byte ranges to a [`FileId`], and [`ResolvedSpan`] turns them
//! into line/column positions for diagnostics.

#![warn(missing_docs)]

pub mod source_db;
pub mod source_file;
pub mod span;

pub use source_db::{ResolvedSpan, SourceDb};
pub use source_file::{Line, SourceFile};
pub use span::{FileId, Span};
