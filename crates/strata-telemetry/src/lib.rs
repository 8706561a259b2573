//! Logging setup for Strata.
//!
//! Strata libraries only emit `tracing` events; binaries and test harnesses
//! decide where they go. This crate provides the subscriber setup used by
//! `strata-config` and by hosts that want the chain's diagnostics:
//!
//! - [`LogConfig`] with development and production presets
//! - [`init_logging`] installing a `tracing-subscriber` registry with an
//!   `EnvFilter` and a JSON, pretty or compact formatter on standard error
//!
//! # Example
//!
//! ```rust,ignore
//! use strata_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! ```

#![doc(html_root_url = "https://docs.rs/strata-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
