//! Options captured when a textual interface is emitted.

use crate::header::InterfaceHeader;

/// Options carried from emission to a later rebuild of the module.
///
/// Holds the flags string that produced the module. The emitter writes it
/// verbatim into the module-flags marker so that reading the interface back
/// reconstructs an equivalent compilation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextualInterfaceOptions {
    flags: String,
}

impl TextualInterfaceOptions {
    /// Creates options holding `flags`.
    pub fn new(flags: impl Into<String>) -> Self {
        Self {
            flags: flags.into(),
        }
    }

    /// Recovers the options recorded in a parsed header, falling back to
    /// `default_flags` when the header has no flags line.
    pub fn from_header(header: &InterfaceHeader, default_flags: &str) -> Self {
        Self::new(header.flags_or(default_flags))
    }

    /// The flags string.
    pub fn flags(&self) -> &str {
        &self.flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_header_prefers_recorded_flags() {
        let header = InterfaceHeader {
            tools_version: None,
            module_flags: Some("-foo -bar".to_string()),
        };
        assert_eq!(TextualInterfaceOptions::from_header(&header, "-O").flags(), "-foo -bar");
        let bare = InterfaceHeader::default();
        assert_eq!(TextualInterfaceOptions::from_header(&bare, "-O").flags(), "-O");
    }
}
