//! The textual interface format.
//!
//! A textual interface starts with two metadata lines, a tool-version marker
//! and a module-flags marker, followed by a stable rendering of the module's
//! public declarations:
//!
//! ```text
//! // swift-tools-version: 5.0
//! // swift-module-flags: -module-name Geometry -O
//!
//! import Foundation
//!
//! @inlinable public func square(_ x: Int) -> Int {
//!   return x * x
//! }
//! ```
//!
//! [`scan_header`] reads the markers without touching the body, [`emit`]
//! writes a module in this format, and [`parse_interface`] reads the body
//! back into a [`stele_ir::ModuleDecl`].

#![warn(missing_docs)]

pub mod emit;
pub mod header;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod token;

pub use emit::{emit, emit_to_string, EmitError};
pub use header::{
    match_module_flags, match_tools_version, report_header, scan_header, AnomalyKind,
    HeaderAnomaly, HeaderScan, InterfaceHeader, Marker,
};
pub use options::TextualInterfaceOptions;
pub use parser::{parse_interface, ParsedInterface};
