//! Dotted numeric tool versions such as `5.0` or `5.9.2`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The version of the tool that produced an interface or a binary artifact.
///
/// Stored as its numeric components so that `5.0` and `5.0.1` compare
/// numerically. Displays exactly as it was parsed.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ToolVersion(Vec<u32>);

impl ToolVersion {
    /// Creates a version from its numeric components.
    ///
    /// Returns `None` if `components` is empty.
    pub fn new(components: Vec<u32>) -> Option<Self> {
        if components.is_empty() {
            None
        } else {
            Some(Self(components))
        }
    }

    /// Returns the numeric components of this version.
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Returns the major component.
    pub fn major(&self) -> u32 {
        self.0[0]
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ToolVersion({self})")
    }
}

/// Error type for parsing tool version strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid tool version: '{input}'")]
pub struct ParseVersionError {
    /// The input string that failed to parse.
    pub input: String,
}

impl FromStr for ToolVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseVersionError {
            input: s.to_string(),
        };
        if s.is_empty() {
            return Err(err());
        }
        let mut parts = Vec::new();
        for piece in s.split('.') {
            if piece.is_empty() || !piece.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            parts.push(piece.parse::<u32>().map_err(|_| err())?);
        }
        Ok(Self(parts))
    }
}
