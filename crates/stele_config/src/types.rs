//! Configuration types deserialized from `stele.toml`.

use serde::Deserialize;

/// The top-level configuration. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SteleConfig {
    /// Toolchain identity used in cache keys and emitted headers.
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    /// Module cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Module search settings.
    #[serde(default)]
    pub search: SearchConfig,
    /// File extensions for interfaces and binary modules.
    #[serde(default)]
    pub extensions: ExtensionConfig,
}

/// The `[toolchain]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainConfig {
    /// Dotted tool version, e.g. `"5.0"`.
    #[serde(default = "default_tool_version")]
    pub version: String,
    /// Flags used when an interface has no module-flags line.
    #[serde(default)]
    pub default_flags: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            version: default_tool_version(),
            default_flags: String::new(),
        }
    }
}

fn default_tool_version() -> String {
    "5.0".to_string()
}

/// The `[cache]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Cache directory, relative to the project root unless absolute.
    #[serde(default = "default_cache_dir")]
    pub dir: String,
    /// Orphaned temporary files older than this are removed by `stele clean`.
    #[serde(default = "default_stale_temp_secs")]
    pub stale_temp_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            stale_temp_secs: default_stale_temp_secs(),
        }
    }
}

fn default_cache_dir() -> String {
    ".stele-cache".to_string()
}

fn default_stale_temp_secs() -> u64 {
    3600
}

/// The `[search]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Directories searched for modules, in priority order.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Prefer a binary module over a textual interface in the same directory.
    #[serde(default = "default_true")]
    pub prefer_binary: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            prefer_binary: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// The `[extensions]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionConfig {
    /// Extension of textual interface files, without the dot.
    #[serde(default = "default_interface_ext")]
    pub interface: String,
    /// Extension of binary module files, without the dot.
    #[serde(default = "default_module_ext")]
    pub module: String,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            interface: default_interface_ext(),
            module: default_module_ext(),
        }
    }
}

fn default_interface_ext() -> String {
    "swiftinterface".to_string()
}

fn default_module_ext() -> String {
    "swiftmodule".to_string()
}
