//! Configuration file discovery, loading and validation.

use crate::error::ConfigError;
use crate::types::SteleConfig;
use stele_common::ToolVersion;
use std::path::{Path, PathBuf};

/// Name of the configuration file at a project root.
pub const CONFIG_FILE: &str = "stele.toml";

/// Loads and validates `<project_dir>/stele.toml`.
pub fn load_config(project_dir: &Path) -> Result<SteleConfig, ConfigError> {
    let content = std::fs::read_to_string(project_dir.join(CONFIG_FILE))?;
    load_config_from_str(&content)
}

/// Parses and validates configuration text.
pub fn load_config_from_str(content: &str) -> Result<SteleConfig, ConfigError> {
    let config: SteleConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Walks up from `start` to the nearest directory containing `stele.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ConfigError::NotFound(start.display().to_string()));
        }
    }
}

fn validate_config(config: &SteleConfig) -> Result<(), ConfigError> {
    config
        .toolchain
        .version
        .parse::<ToolVersion>()
        .map_err(|e| ConfigError::ValidationError(format!("toolchain.version: {e}")))?;

    let ext = &config.extensions;
    for (field, value) in [("extensions.interface", &ext.interface), ("extensions.module", &ext.module)] {
        if value.is_empty() {
            return Err(ConfigError::ValidationError(format!("{field} is empty")));
        }
        if value.starts_with('.') || value.contains('/') {
            return Err(ConfigError::ValidationError(format!(
                "{field} must be a bare extension, got '{value}'"
            )));
        }
    }
    if ext.interface == ext.module {
        return Err(ConfigError::ValidationError(
            "extensions.interface and extensions.module must differ".to_string(),
        ));
    }
    if config.cache.dir.is_empty() {
        return Err(ConfigError::ValidationError("cache.dir is empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.toolchain.version, "5.0");
        assert_eq!(config.toolchain.default_flags, "");
        assert_eq!(config.cache.dir, ".stele-cache");
        assert_eq!(config.cache.stale_temp_secs, 3600);
        assert!(config.search.paths.is_empty());
        assert!(config.search.prefer_binary);
        assert_eq!(config.extensions.interface, "swiftinterface");
        assert_eq!(config.extensions.module, "swiftmodule");
    }

    #[test]
    fn full_config() {
        let toml = r#"
[toolchain]
version = "5.9.2"
default_flags = "-O -enable-library-evolution"

[cache]
dir = "build/module-cache"
stale_temp_secs = 60

[search]
paths = ["modules", "sdk/lib"]
prefer_binary = false

[extensions]
interface = "iface"
module = "mod"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.toolchain.version, "5.9.2");
        assert_eq!(config.toolchain.default_flags, "-O -enable-library-evolution");
        assert_eq!(config.cache.dir, "build/module-cache");
        assert_eq!(config.cache.stale_temp_secs, 60);
        assert_eq!(config.search.paths, vec!["modules", "sdk/lib"]);
        assert!(!config.search.prefer_binary);
        assert_eq!(config.extensions.interface, "iface");
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("[cache\ndir = 1").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn unknown_field_errors() {
        let err = load_config_from_str("[cache]\ndirectory = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn bad_version_rejected() {
        let err = load_config_from_str("[toolchain]\nversion = \"five\"").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn same_extensions_rejected() {
        let toml = "[extensions]\ninterface = \"m\"\nmodule = \"m\"";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn dotted_extension_rejected() {
        let err = load_config_from_str("[extensions]\nmodule = \".swiftmodule\"").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn find_root_in_parent() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "").unwrap();
        let sub = tmp.path().join("modules").join("deep");
        std::fs::create_dir_all(&sub).unwrap();
        assert_eq!(find_project_root(&sub).unwrap(), tmp.path());
    }

    #[test]
    fn load_from_missing_dir_is_io_error() {
        let err = load_config(Path::new("/nonexistent/stele/project")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
