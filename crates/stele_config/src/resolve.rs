//! Resolution of configured paths against the project root.

use crate::error::ConfigError;
use crate::types::{ExtensionConfig, SteleConfig};
use stele_common::ToolVersion;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A configuration with every path made absolute and every value parsed.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Project root the relative paths were resolved against.
    pub project_dir: PathBuf,
    /// Parsed toolchain version.
    pub tool_version: ToolVersion,
    /// Flags applied when an interface carries none.
    pub default_flags: String,
    /// Absolute module cache directory.
    pub cache_dir: PathBuf,
    /// Age after which orphaned temp files may be removed.
    pub stale_temp_age: Duration,
    /// Absolute search directories, in priority order.
    pub search_paths: Vec<PathBuf>,
    /// Whether a binary module beats an interface in the same directory.
    pub prefer_binary: bool,
    /// File extensions.
    pub extensions: ExtensionConfig,
}

/// Resolves `config` relative to `project_dir`.
///
/// Search paths given on the command line should be appended by the caller;
/// configured paths keep their order.
pub fn resolve_config(
    config: &SteleConfig,
    project_dir: &Path,
) -> Result<ResolvedConfig, ConfigError> {
    let tool_version = config
        .toolchain
        .version
        .parse::<ToolVersion>()
        .map_err(|e| ConfigError::ValidationError(format!("toolchain.version: {e}")))?;

    let absolute = |p: &str| {
        let path = Path::new(p);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            project_dir.join(path)
        }
    };

    Ok(ResolvedConfig {
        project_dir: project_dir.to_path_buf(),
        tool_version,
        default_flags: config.toolchain.default_flags.trim().to_string(),
        cache_dir: absolute(&config.cache.dir),
        stale_temp_age: Duration::from_secs(config.cache.stale_temp_secs),
        search_paths: config.search.paths.iter().map(|p| absolute(p)).collect(),
        prefer_binary: config.search.prefer_binary,
        extensions: config.extensions.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn relative_paths_join_project_dir() {
        let config = load_config_from_str("[search]\npaths = [\"modules\", \"/opt/sdk\"]").unwrap();
        let resolved = resolve_config(&config, Path::new("/work/app")).unwrap();
        assert_eq!(resolved.cache_dir, PathBuf::from("/work/app/.stele-cache"));
        assert_eq!(
            resolved.search_paths,
            vec![PathBuf::from("/work/app/modules"), PathBuf::from("/opt/sdk")]
        );
    }

    #[test]
    fn parses_version_and_trims_flags() {
        let config = load_config_from_str(
            "[toolchain]\nversion = \"5.1\"\ndefault_flags = \"  -O  \"",
        )
        .unwrap();
        let resolved = resolve_config(&config, Path::new("/p")).unwrap();
        assert_eq!(resolved.tool_version.to_string(), "5.1");
        assert_eq!(resolved.default_flags, "-O");
        assert_eq!(resolved.stale_temp_age, Duration::from_secs(3600));
    }
}
