//! # Strata Core
//!
//! A synchronous, filename-aware transform chain.
//!
//! A [`TransformChain`] holds an ordered list of [`Stage`]s. Each stage
//! wraps a transformer `(value, filename, next) -> value` plus the rules
//! deciding which files it applies to (extensions and an optional
//! [`MatchSpec`]). Running the chain hands the value to the first matching
//! stage together with a [`Continuation`] for the rest of the chain, so
//! every stage controls whether and how downstream stages run.
//!
//! ```text
//! transform("src", "a.js")
//!     │
//!     ▼
//! ┌─────────┐  next  ┌─────────┐  next  ┌─────────┐
//! │ stage 1 │ ─────► │ stage 2 │ ─────► │ stage 3 │ ─► identity
//! └─────────┘        └─────────┘        └─────────┘
//!   (skipped stages never see the value)
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use strata_core::{Stage, TransformChain};
//!
//! let mut chain = TransformChain::<String>::new();
//!
//! chain.append_transform(
//!     Stage::<String>::builder()
//!         .name("banner")
//!         .transform(|code, file, next| Ok(format!("// {file}\n{}", next.advance(code, file)))),
//! )?;
//! chain.append_transform(
//!     Stage::<String>::builder()
//!         .name("semicolons")
//!         .matcher(vec!["**/*.js", "!**/vendor/**"])
//!         .transform(|code, file, next| Ok(next.advance(code + ";", file))),
//! )?;
//!
//! assert_eq!(chain.transform("x = 1".to_string(), "/app/a.js"), "// /app/a.js\nx = 1;");
//! assert_eq!(chain.transform("x = 1".to_string(), "/app/vendor/a.js"), "// /app/vendor/a.js\nx = 1");
//! # Ok::<(), strata_core::ChainError>(())
//! ```
//!
//! ## Failure containment
//!
//! A transformer returning `Err` (or panicking) is logged through the
//! stage's [`LogSink`] and skipped: its original input goes on to the next
//! matching stage, or is returned unchanged if there is none. Only stage
//! construction errors ([`ChainError`]) ever reach the caller.

#![doc(html_root_url = "https://docs.rs/strata-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod continuation;
pub mod error;
pub mod log;
pub mod matcher;
pub mod name;
pub mod path;
pub mod stage;

pub use chain::{Next, TransformChain};
pub use continuation::{Continuation, Terminal};
pub use error::{ChainError, ChainResult};
pub use log::{LogSink, MemorySink, StderrSink, TracingSink};
pub use matcher::{GlobList, MatchFn, MatchSpec, Matcher};
pub use name::ANONYMOUS;
pub use stage::{
    IntoStage, PostLoadHook, Stage, StageBuilder, TransformFn, Transformer, DEFAULT_EXTENSIONS,
};
