//! Encoding, verification and decoding of binary modules.

use std::path::Path;

use serde::{Deserialize, Serialize};
use stele_common::{ContentHash, ToolVersion};
use stele_ir::ModuleDecl;

use crate::error::BinaryError;

/// Magic bytes identifying a binary module.
pub const MODULE_MAGIC: [u8; 4] = *b"STLM";

/// Current binary module format version. Increment on breaking changes to
/// the header or payload layout.
pub const FORMAT_VERSION: u32 = 1;

/// Header prepended to every binary module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleHeader {
    /// Magic bytes: must be `b"STLM"`.
    pub magic: [u8; 4],

    /// Binary module format version.
    pub format_version: u32,

    /// Version of the tool that produced this module.
    pub tool_version: ToolVersion,

    /// Content hash of the payload bytes.
    pub checksum: ContentHash,
}

/// The payload of a binary module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedModule {
    /// Module name.
    pub name: String,
    /// The flags the module was compiled with, verbatim.
    pub flags: String,
    /// Version of the producing tool.
    pub tool_version: ToolVersion,
    /// The compiled declarations.
    pub module: ModuleDecl,
}

/// Encodes a module into the binary format.
pub fn encode(module: &SerializedModule) -> Result<Vec<u8>, BinaryError> {
    let payload = bincode::serde::encode_to_vec(module, bincode::config::standard()).map_err(
        |e| BinaryError::Serialization {
            reason: e.to_string(),
        },
    )?;

    let header = ModuleHeader {
        magic: MODULE_MAGIC,
        format_version: FORMAT_VERSION,
        tool_version: module.tool_version.clone(),
        checksum: ContentHash::from_bytes(&payload),
    };
    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| BinaryError::Serialization {
            reason: e.to_string(),
        })?;

    // 4-byte header length (little-endian) + header + payload
    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Splits `bytes` into a validated header and the payload it describes.
fn split(bytes: &[u8]) -> Result<(ModuleHeader, &[u8]), BinaryError> {
    let truncated = || BinaryError::Truncated { len: bytes.len() };
    let len_bytes: [u8; 4] = bytes
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(truncated)?;
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    let header_end = 4usize.checked_add(header_len).ok_or_else(truncated)?;
    let header_bytes = bytes.get(4..header_end).ok_or_else(truncated)?;

    let (header, _): (ModuleHeader, usize) =
        bincode::serde::decode_from_slice(header_bytes, bincode::config::standard()).map_err(
            |e| BinaryError::InvalidHeader {
                reason: e.to_string(),
            },
        )?;

    if header.magic != MODULE_MAGIC {
        return Err(BinaryError::BadMagic {
            found: header.magic,
        });
    }
    if header.format_version != FORMAT_VERSION {
        return Err(BinaryError::VersionMismatch {
            expected: FORMAT_VERSION,
            actual: header.format_version,
        });
    }

    let payload = &bytes[header_end..];
    let actual = ContentHash::from_bytes(payload);
    if actual != header.checksum {
        return Err(BinaryError::ChecksumMismatch {
            expected: header.checksum.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok((header, payload))
}

/// Checks that `bytes` is an intact binary module without decoding the payload.
pub fn verify(bytes: &[u8]) -> Result<ModuleHeader, BinaryError> {
    split(bytes).map(|(header, _)| header)
}

/// Verifies and decodes a binary module.
pub fn decode(bytes: &[u8]) -> Result<SerializedModule, BinaryError> {
    let (_, payload) = split(bytes)?;
    let (module, _): (SerializedModule, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard()).map_err(|e| {
            BinaryError::Serialization {
                reason: e.to_string(),
            }
        })?;
    Ok(module)
}

/// Reads and decodes the binary module at `path`.
pub fn read_module(path: &Path) -> Result<SerializedModule, BinaryError> {
    let bytes = std::fs::read(path).map_err(|e| BinaryError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stele_ir::{Decl, DeclKind, FuncDecl};

    fn sample() -> SerializedModule {
        SerializedModule {
            name: "Geometry".to_string(),
            flags: "-foo -bar".to_string(),
            tool_version: "5.0".parse().unwrap(),
            module: ModuleDecl::new("Geometry")
                .with_import("Foundation")
                .with_decl(Decl::public("area", DeclKind::Func(FuncDecl::default()))),
        }
    }

    fn with_header(header: &ModuleHeader, payload: &[u8]) -> Vec<u8> {
        let header_bytes =
            bincode::serde::encode_to_vec(header, bincode::config::standard()).unwrap();
        let mut output = Vec::new();
        output.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(payload);
        output
    }

    #[test]
    fn encode_then_decode() {
        let bytes = encode(&sample()).unwrap();
        let header = verify(&bytes).unwrap();
        assert_eq!(header.magic, MODULE_MAGIC);
        assert_eq!(header.tool_version.to_string(), "5.0");
        assert_eq!(decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn encoding_is_deterministic() {
        assert_eq!(encode(&sample()).unwrap(), encode(&sample()).unwrap());
    }

    #[test]
    fn truncated_payload_fails_checksum() {
        let bytes = encode(&sample()).unwrap();
        let cut = &bytes[..bytes.len() - 3];
        assert!(matches!(verify(cut), Err(BinaryError::ChecksumMismatch { .. })));
    }

    #[test]
    fn truncated_header_is_reported() {
        assert!(matches!(verify(b"AB"), Err(BinaryError::Truncated { len: 2 })));
        let bytes = encode(&sample()).unwrap();
        assert!(matches!(verify(&bytes[..6]), Err(BinaryError::Truncated { .. })));
    }

    #[test]
    fn wrong_magic() {
        let header = ModuleHeader {
            magic: *b"BAAD",
            format_version: FORMAT_VERSION,
            tool_version: "5.0".parse().unwrap(),
            checksum: ContentHash::from_bytes(b"data"),
        };
        let bytes = with_header(&header, b"data");
        assert!(matches!(verify(&bytes), Err(BinaryError::BadMagic { .. })));
    }

    #[test]
    fn wrong_format_version() {
        let header = ModuleHeader {
            magic: MODULE_MAGIC,
            format_version: 999,
            tool_version: "5.0".parse().unwrap(),
            checksum: ContentHash::from_bytes(b"data"),
        };
        let bytes = with_header(&header, b"data");
        assert!(matches!(
            verify(&bytes),
            Err(BinaryError::VersionMismatch { actual: 999, .. })
        ));
    }

    #[test]
    fn garbage_payload_with_valid_checksum_fails_decode() {
        let header = ModuleHeader {
            magic: MODULE_MAGIC,
            format_version: FORMAT_VERSION,
            tool_version: "5.0".parse().unwrap(),
            checksum: ContentHash::from_bytes(b"\xff\xff"),
        };
        let bytes = with_header(&header, b"\xff\xff");
        assert!(verify(&bytes).is_ok());
        assert!(matches!(decode(&bytes), Err(BinaryError::Serialization { .. })));
    }

    #[test]
    fn read_module_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Geometry.swiftmodule");
        std::fs::write(&path, encode(&sample()).unwrap()).unwrap();
        assert_eq!(read_module(&path).unwrap().flags, "-foo -bar");
        let missing = dir.path().join("Missing.swiftmodule");
        assert!(matches!(read_module(&missing), Err(BinaryError::Io { .. })));
    }
}
