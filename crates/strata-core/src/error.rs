//! Stage construction error types.

use thiserror::Error;

/// Errors raised while building stages or inserting them into a chain.
///
/// These are configuration errors: they surface synchronously when a stage
/// is defined and must halt chain setup. Failures inside a running
/// transformer are never reported through this type.
#[derive(Error, Debug)]
pub enum ChainError {
    /// The matcher definition has an unsupported shape.
    #[error(
        "Bad matcher, if supplied it should be a function, regexp, string, or array of strings. Got: {kind}"
    )]
    BadMatcher {
        /// Type name of the offending value.
        kind: String,
    },

    /// A glob pattern could not be compiled.
    #[error("invalid glob pattern `{pattern}`: {source}")]
    InvalidGlob {
        /// The glob as written, negation prefix included.
        pattern: String,
        /// Underlying compile error.
        #[source]
        source: regex::Error,
    },

    /// A regular expression matcher could not be compiled.
    #[error("invalid regular expression `{pattern}`: {source}")]
    InvalidRegex {
        /// The regex source.
        pattern: String,
        /// Underlying compile error.
        #[source]
        source: regex::Error,
    },
}

impl ChainError {
    /// Create a new bad matcher error.
    pub fn bad_matcher(kind: impl Into<String>) -> Self {
        Self::BadMatcher { kind: kind.into() }
    }

    /// Create a new invalid glob error.
    pub fn invalid_glob(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidGlob {
            pattern: pattern.into(),
            source,
        }
    }

    /// Create a new invalid regex error.
    pub fn invalid_regex(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidRegex {
            pattern: pattern.into(),
            source,
        }
    }
}

/// Result alias for stage construction.
pub type ChainResult<T> = Result<T, ChainError>;
