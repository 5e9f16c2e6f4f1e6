//! Cache key derivation.

use sha2::{Digest, Sha256};
use std::fmt;
use stele_common::ToolVersion;

const KEY_DOMAIN: &[u8] = b"stele.interface-cache.v1";

/// Identifies a cached binary artifact.
///
/// A SHA-256 digest over the interface content, the effective flags string
/// and the tool version. Each field is length-prefixed, so moving bytes from
/// one field to the next changes the key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Derives the key for one (content, flags, tool version) triple.
    pub fn compute(content: &[u8], flags: &str, tool_version: &ToolVersion) -> Self {
        let version = tool_version.to_string();
        let mut hasher = Sha256::new();
        hasher.update(KEY_DOMAIN);
        for field in [content, flags.as_bytes(), version.as_bytes()] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field);
        }
        Self(hasher.finalize().into())
    }

    /// Returns the raw digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Renders the key as 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a key from its hex rendering.
    pub fn from_hex(s: &str) -> Option<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({}…)", &self.to_hex()[..12])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ToolVersion {
        s.parse().unwrap()
    }

    #[test]
    fn deterministic() {
        let a = CacheKey::compute(b"public func f()", "-O", &v("5.0"));
        let b = CacheKey::compute(b"public func f()", "-O", &v("5.0"));
        assert_eq!(a, b);
    }

    #[test]
    fn each_input_matters() {
        let base = CacheKey::compute(b"content", "-O", &v("5.0"));
        assert_ne!(base, CacheKey::compute(b"content2", "-O", &v("5.0")));
        assert_ne!(base, CacheKey::compute(b"content", "-Onone", &v("5.0")));
        assert_ne!(base, CacheKey::compute(b"content", "-O", &v("5.1")));
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        let a = CacheKey::compute(b"ab", "c", &v("5.0"));
        let b = CacheKey::compute(b"a", "bc", &v("5.0"));
        assert_ne!(a, b);
    }

    #[test]
    fn hex_rendering() {
        let key = CacheKey::compute(b"x", "", &v("5.0"));
        let hex = key.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
        assert_eq!(CacheKey::from_hex(&hex), Some(key));
        assert_eq!(key.to_string(), hex);
        assert!(CacheKey::from_hex("zz").is_none());
    }
}
