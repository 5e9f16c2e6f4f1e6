//! Structured diagnostics for interface parsing, emission and caching.
//!
//! Every recoverable anomaly (a malformed header line, a discarded cache
//! entry) and every user-facing failure is a [`Diagnostic`] with a stable
//! [`DiagnosticCode`]. A thread-safe [`DiagnosticSink`] collects them from
//! concurrent loads, and a [`DiagnosticRenderer`] formats them for a terminal
//! or as JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod label;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{codes, Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use label::{Label, LabelStyle};
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
