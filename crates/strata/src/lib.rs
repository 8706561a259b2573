//! # Strata
//!
//! **Filename-aware transform chains for source loaders**
//!
//! A module loader hands every file it reads to a [`TransformChain`]; the
//! chain runs the stages that match the file, each one deciding whether
//! and how the rest of the chain runs:
//!
//! - stages filter by extension and by glob, glob list or regex on the
//!   absolute path
//! - a stage may rename the file for every stage after it
//! - a failing or panicking stage is logged and skipped
//! - post-load hooks observe every loaded file
//!
//! ## Quick Start
//!
//! ```
//! use strata::prelude::*;
//!
//! let mut chain = TransformChain::<String>::new();
//! chain.append_transform(
//!     Stage::<String>::builder()
//!         .extensions([".ts"])
//!         .transform(|code, file, next| {
//!             Ok(next.advance(code.replace(": number", ""), &file.replace(".ts", ".js")))
//!         }),
//! )?;
//! chain.append_transform(
//!     Stage::<String>::builder().transform(|code, file, next| Ok(next.advance(code + ";", file))),
//! )?;
//!
//! assert_eq!(chain.transform("let x: number = 1".into(), "/app/x.ts"), "let x = 1;");
//! # Ok::<(), ChainError>(())
//! ```
//!
//! ## Crates
//!
//! - [`core`]: stages, matchers, the continuation protocol and the chain
//! - [`config`]: TOML/JSON chain descriptions and the transform registry
//! - [`telemetry`]: `tracing` subscriber setup

#![doc(html_root_url = "https://docs.rs/strata/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the chain itself
pub use strata_core as core;

// Re-export declarative configuration
pub use strata_config as config;

// Re-export logging setup
pub use strata_telemetry as telemetry;

pub use strata_core::{Stage, TransformChain};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use strata::prelude::*;
///
/// let chain = TransformChain::<String>::new();
/// assert!(chain.is_empty());
/// ```
pub mod prelude {
    pub use strata_core::{
        ChainError, ChainResult, Continuation, IntoStage, LogSink, MatchSpec, MemorySink, Stage,
        StageBuilder, StderrSink, TracingSink, TransformChain, Transformer,
    };

    // Re-export configuration types
    pub use strata_config::{ChainConfig, ConfigError, ConfigLoader, TransformRegistry};

    // Re-export logging setup
    pub use strata_telemetry::{init_logging, LogConfig, LogFormat};
}
