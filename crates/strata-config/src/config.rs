//! Chain configuration types.
//!
//! This module provides the top-level [`ChainConfig`] struct, its sections,
//! and the conversion from a configuration into a running
//! [`TransformChain`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strata_core::{LogSink, MatchSpec, Stage, StderrSink, TracingSink, TransformChain};
use strata_telemetry::{LogConfig, LogFormat};

use crate::{ConfigError, TransformRegistry};

/// Complete chain configuration.
///
/// # Example
///
/// ```
/// use strata_config::ChainConfig;
///
/// let config = ChainConfig::default();
/// assert!(config.stages.is_empty());
/// assert!(!config.verbose);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Verbosity for stages that do not set their own.
    #[serde(default)]
    pub verbose: bool,

    /// Stages, head of the chain first.
    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

/// One stage of the chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    /// Registered transformer name.
    #[serde(default)]
    pub transform: Option<String>,

    /// Registered post-load hook name.
    #[serde(default)]
    pub post_load_hook: Option<String>,

    /// Name used in log messages.
    #[serde(default)]
    pub name: Option<String>,

    /// Matcher definition: a glob, an array of globs, or `{ regex = "..." }`.
    #[serde(default, rename = "match")]
    pub matcher: Option<serde_json::Value>,

    /// Recognized extensions, each with its leading dot.
    #[serde(default)]
    pub extensions: Option<Vec<String>>,

    /// Overrides the chain-wide verbosity.
    #[serde(default)]
    pub verbose: Option<bool>,
}

/// Where stage log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Plain lines on standard error.
    #[default]
    Stderr,
    /// `tracing` events under the `strata::stage` target.
    Tracing,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Whether the log subscriber is installed.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Destination of stage log lines.
    #[serde(default)]
    pub sink: SinkKind,
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            format: LogFormat::default(),
            sink: SinkKind::default(),
        }
    }
}

impl LoggingConfig {
    /// Subscriber settings for `strata_telemetry::init_logging`.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            ..LogConfig::default()
        }
    }

    /// The sink every configured stage logs to.
    #[must_use]
    pub fn log_sink(&self) -> Arc<dyn LogSink> {
        match self.sink {
            SinkKind::Stderr => Arc::new(StderrSink),
            SinkKind::Tracing => Arc::new(TracingSink),
        }
    }
}

impl ChainConfig {
    /// Development preset: every stage verbose, debug logging.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LoggingConfig {
                level: "debug".to_string(),
                ..LoggingConfig::default()
            },
            verbose: true,
            stages: Vec::new(),
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - the log level is not a valid filter directive
    /// - a stage has neither a transform nor a post-load hook
    /// - an extension is neither empty nor starts with a dot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if strata_telemetry::create_env_filter(&self.logging.level).is_err() {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("invalid filter directive: {}", self.logging.level),
            ));
        }

        for (index, stage) in self.stages.iter().enumerate() {
            if stage.transform.is_none() && stage.post_load_hook.is_none() {
                return Err(ConfigError::invalid_value(
                    format!("stages[{index}]"),
                    "a stage needs a transform or a post_load_hook",
                ));
            }

            let bad_extension = stage
                .extensions
                .iter()
                .flatten()
                .find(|ext| !ext.is_empty() && !ext.starts_with('.'));
            if let Some(ext) = bad_extension {
                return Err(ConfigError::invalid_value(
                    format!("stages[{index}].extensions"),
                    format!("`{ext}` must start with a dot"),
                ));
            }
        }

        Ok(())
    }

    /// Builds a chain from this configuration, resolving names against
    /// `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error for unregistered transforms or hooks and for
    /// stages whose matcher is rejected.
    pub fn build_chain<V: Clone>(
        &self,
        registry: &TransformRegistry<V>,
    ) -> Result<TransformChain<V>, ConfigError> {
        let sink = self.logging.log_sink();
        let mut chain = TransformChain::new();

        for (index, stage) in self.stages.iter().enumerate() {
            let mut builder = Stage::builder()
                .verbose(stage.verbose.unwrap_or(self.verbose))
                .log_sink(Arc::clone(&sink));

            if let Some(name) = &stage.transform {
                let transformer = registry.transformer(name).ok_or_else(|| {
                    ConfigError::UnknownTransform {
                        index,
                        name: name.clone(),
                    }
                })?;
                builder = builder.transformer(transformer.clone());
            }
            if let Some(name) = &stage.post_load_hook {
                let hook = registry.hook(name).ok_or_else(|| ConfigError::UnknownHook {
                    index,
                    name: name.clone(),
                })?;
                builder = builder.shared_post_load_hook(Arc::clone(hook));
            }
            if let Some(name) = &stage.name {
                builder = builder.name(name.clone());
            }
            if let Some(value) = &stage.matcher {
                if let Some(spec) =
                    MatchSpec::from_value(value).map_err(|e| ConfigError::stage(index, e))?
                {
                    builder = builder.matcher(spec);
                }
            }
            if let Some(extensions) = &stage.extensions {
                builder = builder.extensions(extensions.iter().cloned());
            }

            chain
                .append_transform(builder)
                .map_err(|e| ConfigError::stage(index, e))?;
        }

        tracing::debug!(stages = chain.len(), "Built transform chain from configuration");
        Ok(chain)
    }
}
