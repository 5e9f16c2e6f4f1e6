//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating a `stele.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// No `stele.toml` was found walking up from the given directory.
    #[error("could not find stele.toml in {0} or any parent directory")]
    NotFound(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}
