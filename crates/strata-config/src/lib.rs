//! Declarative configuration for Strata transform chains.
//!
//! A chain can be assembled in code with `strata_core`, or described in a
//! TOML or JSON file that names its stages. Transformers and post-load hooks
//! are code, so the host registers them in a [`TransformRegistry`] and the
//! file refers to them by name.
//!
//! - [`ChainConfig`]: logging section, chain-wide verbosity, stage list
//! - [`ConfigLoader`]: layered loading (defaults → file → env)
//! - [`TransformRegistry`]: name → transformer / hook lookup
//!
//! # Example
//!
//! ```
//! use strata_config::{ConfigLoader, TransformRegistry};
//!
//! # fn main() -> Result<(), strata_config::ConfigError> {
//! let mut registry = TransformRegistry::<String>::new();
//! registry.register("semi", |code, file, next| Ok(next.advance(code + ";", file)));
//!
//! let config = ConfigLoader::new()
//!     .with_string(
//!         r#"
//!         [[stages]]
//!         transform = "semi"
//!         match = "**/*.js"
//!         "#,
//!         "toml",
//!     )?
//!     .load()?;
//!
//! let chain = config.build_chain(&registry)?;
//! assert_eq!(chain.transform("x = 1".to_string(), "/app/a.js"), "x = 1;");
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! verbose = false
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "pretty"   # json | pretty | compact
//! sink = "stderr"     # stderr | tracing
//!
//! [[stages]]
//! transform = "coffee"
//! extensions = [".coffee"]
//!
//! [[stages]]
//! transform = "instrument"
//! name = "coverage"
//! match = ["**/src/**/*.js", "!**/*.spec.js"]
//! verbose = true
//!
//! [[stages]]
//! transform = "strip-bom"
//! match = { regex = "\\.m?js$" }
//!
//! [[stages]]
//! post_load_hook = "record"
//! ```
//!
//! # Environment Variable Overrides
//!
//! With [`ConfigLoader::with_env_prefix`], `PREFIX__VERBOSE` and
//! `PREFIX__LOGGING__{ENABLED,LEVEL,FORMAT,SINK}` override the file.

#![doc(html_root_url = "https://docs.rs/strata-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod registry;

pub use config::{ChainConfig, LoggingConfig, SinkKind, StageConfig};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use registry::TransformRegistry;
pub use strata_telemetry::LogFormat;
