//! Binary module artifacts.
//!
//! A binary module is the compiled, tool-version-specific form of a module.
//! Its layout is a 4-byte little-endian header length, a bincode-encoded
//! [`ModuleHeader`], and a bincode-encoded [`SerializedModule`] payload. The
//! header carries a checksum of the payload so [`verify`] can reject a
//! truncated or corrupted file without decoding it.

#![warn(missing_docs)]

pub mod error;
pub mod format;

pub use error::BinaryError;
pub use format::{
    decode, encode, read_module, verify, ModuleHeader, SerializedModule, FORMAT_VERSION,
    MODULE_MAGIC,
};
