//! Secondary annotations attached to a diagnostic.

use serde::{Deserialize, Serialize};
use stele_source::Span;

/// Whether a label marks the main location or extra context.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LabelStyle {
    /// Rendered with `^^^`.
    Primary,
    /// Rendered with `---`.
    Secondary,
}

/// A message attached to a source span.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Label {
    /// The annotated span.
    pub span: Span,
    /// Text printed next to the underline.
    pub message: String,
    /// Primary or secondary.
    pub style: LabelStyle,
}

impl Label {
    /// Creates a primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    /// Creates a secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}
