//! Configuration error types.

use std::path::PathBuf;

use strata_core::ChainError;
use thiserror::Error;

/// Errors that can occur while loading a chain configuration or building a
/// chain from it.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read configuration file.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration format.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// Invalid configuration value.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// The field with the invalid value.
        field: String,
        /// Explanation of why the value is invalid.
        reason: String,
    },

    /// Environment variable parsing error.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParseError {
        /// The environment variable name.
        var: String,
        /// Explanation of the parsing error.
        reason: String,
    },

    /// A stage names a transform that is not registered.
    #[error("stage #{index} references unknown transform `{name}`")]
    UnknownTransform {
        /// Position of the stage in the configuration.
        index: usize,
        /// The unregistered name.
        name: String,
    },

    /// A stage names a post-load hook that is not registered.
    #[error("stage #{index} references unknown post-load hook `{name}`")]
    UnknownHook {
        /// Position of the stage in the configuration.
        index: usize,
        /// The unregistered name.
        name: String,
    },

    /// A stage definition was rejected while building the chain.
    #[error("invalid stage #{index}: {source}")]
    Stage {
        /// Position of the stage in the configuration.
        index: usize,
        /// Underlying stage error.
        #[source]
        source: ChainError,
    },
}

impl ConfigError {
    /// Create a new file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Create a new invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new environment variable parse error.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Create a new stage error.
    pub fn stage(index: usize, source: ChainError) -> Self {
        Self::Stage { index, source }
    }
}
