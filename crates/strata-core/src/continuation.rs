//! The continuation handed to every transformer.
//!
//! A transformer receives the value, the filename and a `&mut dyn
//! Continuation`. Calling [`Continuation::advance`] runs the rest of the
//! chain and returns its result, so a transformer can:
//!
//! - pre-process, then advance (pass modified input downstream);
//! - advance, then post-process (wrap the downstream output);
//! - not advance at all (short-circuit the chain);
//! - advance with a different filename (rename the file for later stages).
//!
//! # Example
//!
//! ```
//! use strata_core::{Continuation, Stage, Terminal};
//!
//! let stage = Stage::from_fn(|code: String, file: &str, next: &mut dyn Continuation<String>| {
//!     let inner = next.advance(code, file);
//!     Ok(format!("/* {file} */\n{inner}"))
//! });
//!
//! let out = stage.apply("x = 1".to_string(), "a.js", &mut Terminal);
//! assert_eq!(out, "/* a.js */\nx = 1");
//! ```

/// Access to the remainder of a transform chain.
pub trait Continuation<V> {
    /// Runs the remaining stages on `value` and returns the result.
    ///
    /// `filename` becomes the filename seen by every later stage and the
    /// default for [`has_match`](Self::has_match).
    fn advance(&mut self, value: V, filename: &str) -> V;

    /// Returns true if a stage that has not run yet matches `filename`, or
    /// the most recent filename passed down the chain when `None`.
    fn has_match(&self, filename: Option<&str>) -> bool;

    /// Returns true if at least one more stage would fire for the current
    /// filename.
    fn has_next(&self) -> bool {
        self.has_match(None)
    }
}

/// The end of a chain: returns the value untouched and matches nothing.
///
/// Useful for applying a single [`Stage`](crate::Stage) on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct Terminal;

impl<V> Continuation<V> for Terminal {
    fn advance(&mut self, value: V, _filename: &str) -> V {
        value
    }

    fn has_match(&self, _filename: Option<&str>) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_is_identity() {
        let mut end = Terminal;
        assert_eq!(end.advance(41, "a.js"), 41);
        assert!(!Continuation::<i32>::has_match(&end, Some("a.js")));
        assert!(!Continuation::<i32>::has_next(&end));
    }
}
