//! Shared foundational types used across the stele workspace.
//!
//! This crate provides content hashing for artifact integrity checks, the
//! dotted tool version carried in interface headers and binary artifacts, and
//! the common internal-error result type.

#![warn(missing_docs)]

pub mod hash;
pub mod result;
pub mod version;

pub use hash::ContentHash;
pub use result::{InternalError, SteleResult};
pub use version::{ParseVersionError, ToolVersion};
