//! Error types for binary module encoding and decoding.

use std::path::PathBuf;

/// Errors that can occur while reading or writing a binary module.
#[derive(Debug, thiserror::Error)]
pub enum BinaryError {
    /// The file is shorter than its declared header.
    #[error("binary module is truncated ({len} bytes)")]
    Truncated {
        /// Number of bytes available.
        len: usize,
    },

    /// The header could not be decoded.
    #[error("invalid binary module header: {reason}")]
    InvalidHeader {
        /// Description of the header problem.
        reason: String,
    },

    /// The magic bytes do not identify a binary module.
    #[error("not a binary module (magic {found:?})")]
    BadMagic {
        /// The bytes found where the magic was expected.
        found: [u8; 4],
    },

    /// The file was written by an incompatible format version.
    #[error("format version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The format version this build reads.
        expected: u32,
        /// The format version found in the file.
        actual: u32,
    },

    /// The payload does not match the checksum in the header.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Checksum recorded in the header.
        expected: String,
        /// Checksum of the payload as read.
        actual: String,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// Reading a module file failed.
    #[error("failed to read binary module {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
