//! Parsing and validation of `stele.toml` configuration files.
//!
//! The configuration names the module cache directory, the module search
//! path, the toolchain version baked into cache keys, and the file extensions
//! of textual interfaces and binary modules.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{find_project_root, load_config, load_config_from_str, CONFIG_FILE};
pub use resolve::{resolve_config, ResolvedConfig};
pub use types::*;
