//! Layered configuration loading.
//!
//! This module provides the [`ConfigLoader`] for loading a chain
//! configuration from defaults, files and environment variables.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use strata_telemetry::LogFormat;

use crate::config::SinkKind;
use crate::{ChainConfig, ConfigError};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// Stages only come from files. Environment variables can adjust the
/// logging section and the chain-wide verbosity.
///
/// # Example
///
/// ```no_run
/// use strata_config::ConfigLoader;
///
/// # fn main() -> Result<(), strata_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_file("strata.toml")?
///     .with_env_prefix("STRATA")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: ChainConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new loader starting from default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ChainConfig::default(),
            env_prefix: None,
        }
    }

    /// Start from the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert!(config.verbose);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = ChainConfig::development();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        self.config = parse(&content, &extension)?;
        tracing::debug!(
            path = %path.display(),
            stages = self.config.stages.len(),
            "Loaded chain configuration"
        );

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unknown or parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [[stages]]
    ///     transform = "coffee"
    ///     extensions = [".coffee"]
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.stages[0].transform.as_deref(), Some("coffee"));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Recognized variables, with prefix `STRATA`:
    /// - `STRATA__VERBOSE`
    /// - `STRATA__LOGGING__ENABLED`
    /// - `STRATA__LOGGING__LEVEL`
    /// - `STRATA__LOGGING__FORMAT`
    /// - `STRATA__LOGGING__SINK`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file into the process environment, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a `.env` file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::env_parse_error(".env", e.to_string())),
        }
    }

    /// Apply environment overrides, validate and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or the
    /// configuration is invalid.
    pub fn load(mut self) -> Result<ChainConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Return the configuration without env overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> ChainConfig {
        self.config
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let env_vars: HashMap<String, String> =
            env::vars().filter(|(k, _)| k.starts_with(prefix)).collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();
        let logging = &mut self.config.logging;

        match parts.as_slice() {
            ["VERBOSE"] => {
                self.config.verbose = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "ENABLED"] => {
                logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    "compact" => LogFormat::Compact,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json', 'pretty' or 'compact'",
                        ))
                    }
                };
            }
            ["LOGGING", "SINK"] => {
                logging.sink = match value.to_lowercase().as_str() {
                    "stderr" => SinkKind::Stderr,
                    "tracing" => SinkKind::Tracing,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'stderr' or 'tracing'",
                        ))
                    }
                };
            }
            _ => {
                tracing::trace!(var = key, "Ignoring unknown configuration variable");
            }
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<ChainConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, ChainConfig::default());
    }

    #[test]
    fn test_loader_with_string_toml() {
        let toml = r#"
            verbose = true

            [logging]
            level = "debug"
            sink = "tracing"

            [[stages]]
            transform = "coffee"
            name = "coffee-script"
            extensions = [".coffee"]

            [[stages]]
            transform = "instrument"
            match = ["src/**/*.js", "!**/*.spec.js"]
            verbose = false
        "#;

        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap();

        assert!(config.verbose);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.sink, SinkKind::Tracing);
        assert_eq!(config.stages.len(), 2);
        assert_eq!(config.stages[0].name.as_deref(), Some("coffee-script"));
        assert_eq!(config.stages[0].extensions, Some(vec![".coffee".to_string()]));
        assert_eq!(
            config.stages[1].matcher,
            Some(serde_json::json!(["src/**/*.js", "!**/*.spec.js"]))
        );
        assert_eq!(config.stages[1].verbose, Some(false));
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"stages": [{"transform": "t", "match": {"regex": "\\.js$"}}]}"#;

        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.stages[0].matcher, Some(serde_json::json!({"regex": "\\.js$"})));
    }

    #[test]
    fn test_loader_rejects_unknown_fields() {
        let result = ConfigLoader::new().with_string("[[stages]]\ntransfrom = \"t\"\n", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_loader_unsupported_format() {
        let result = ConfigLoader::new().with_string("stages:", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(f)) if f == "yaml"));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/strata.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/strata.toml")
            .unwrap()
            .load()
            .unwrap();
        assert!(config.stages.is_empty());
    }

    #[test]
    fn test_load_validates() {
        let loader = ConfigLoader::new()
            .with_string("[[stages]]\nname = \"nothing\"\n", "toml")
            .unwrap();
        assert!(loader.load().is_err());

        let config = ConfigLoader::new()
            .with_string("[[stages]]\nname = \"nothing\"\n", "toml")
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.stages.len(), 1);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_load_reads_prefixed_environment() {
        env::set_var("STRATA_LOADER_ENV_TEST__LOGGING__LEVEL", "strata_core=debug");
        env::set_var("STRATA_LOADER_ENV_TEST__VERBOSE", "true");
        env::set_var("STRATA_LOADER_ENV_TEST__STAGES", "ignored");

        let config = ConfigLoader::new()
            .with_string("[logging]\nlevel = \"warn\"\n", "toml")
            .unwrap()
            .with_env_prefix("strata_loader_env_test")
            .load()
            .unwrap();

        assert_eq!(config.logging.level, "strata_core=debug");
        assert!(config.verbose);
        assert!(config.stages.is_empty());
    }

    #[test]
    fn test_load_rejects_unparsable_environment() {
        let key = "STRATA_LOADER_BAD_ENV__LOGGING__SINK";
        env::set_var(key, "syslog");

        let result = ConfigLoader::new().with_env_prefix("STRATA_LOADER_BAD_ENV").load();
        assert!(matches!(result, Err(ConfigError::EnvParseError { ref var, .. }) if var == key));
    }

    // Mapping of single variables, without touching the process environment.

    #[test]
    fn test_apply_env_var_logging() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__LOGGING__LEVEL", "strata_core=trace", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__FORMAT", "compact", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__SINK", "tracing", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__ENABLED", "off", "TEST").unwrap();

        let logging = &loader.config.logging;
        assert_eq!(logging.level, "strata_core=trace");
        assert_eq!(logging.format, LogFormat::Compact);
        assert_eq!(logging.sink, SinkKind::Tracing);
        assert!(!logging.enabled);
    }

    #[test]
    fn test_apply_env_var_verbose() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__VERBOSE", "yes", "TEST").unwrap();
        assert!(loader.config.verbose);

        let result = loader.apply_env_var("TEST__VERBOSE", "loud", "TEST");
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_apply_env_var_ignores_unknown() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__STAGES__0", "x", "TEST").unwrap();
        loader.apply_env_var("TESTING", "x", "TEST").unwrap();
        assert_eq!(loader.config, ChainConfig::default());
    }
}
