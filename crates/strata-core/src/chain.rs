//! The transform chain.
//!
//! A [`TransformChain`] is an ordered list of [`Stage`]s. Running it on a
//! value walks the list head to tail: stages that do not match the current
//! filename are skipped, the first one that does is applied and receives a
//! [`Next`] cursor positioned just after it. Whatever that stage returns is
//! the result of the run; it decides itself whether, when and with which
//! filename the rest of the chain runs.
//!
//! ```text
//! transform(value, file)
//!   └─ Next::advance ── skip ── skip ── Stage::apply ──┐
//!                                       transformer(value, file, next)
//!                                            └─ next.advance ── ... ── identity
//! ```
//!
//! Each run works on a snapshot of the stage list, so adding stages while a
//! run is in flight (for instance from inside a transformer holding another
//! handle) never disturbs it.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::continuation::Continuation;
use crate::error::ChainResult;
use crate::name::ANONYMOUS;
use crate::stage::{IntoStage, Stage};

/// An ordered, growable list of transform stages.
///
/// # Example
///
/// ```
/// use strata_core::{Continuation, Stage, TransformChain};
///
/// fn bar(code: String, file: &str, next: &mut dyn Continuation<String>) -> anyhow::Result<String> {
///     Ok(next.advance(code + " bar", file))
/// }
///
/// fn baz(code: String, file: &str, next: &mut dyn Continuation<String>) -> anyhow::Result<String> {
///     Ok(next.advance(code + " baz", file))
/// }
///
/// let mut chain = TransformChain::new();
/// chain.append_transform(Stage::from_fn(bar)).unwrap();
/// chain.append_transform(Stage::from_fn(baz)).unwrap();
///
/// assert_eq!(chain.transform("foo".to_string(), "foo.js"), "foo bar baz");
/// ```
#[derive(Debug)]
pub struct TransformChain<V> {
    stages: VecDeque<Arc<Stage<V>>>,
}

impl<V> Default for TransformChain<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TransformChain<V> {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: VecDeque::new(),
        }
    }

    /// Adds a stage at the end of the chain.
    ///
    /// # Errors
    ///
    /// Returns the stage construction error, leaving the chain unchanged.
    pub fn append_transform(&mut self, stage: impl IntoStage<V>) -> ChainResult<()> {
        let stage = stage.into_stage()?;
        tracing::debug!(
            stage = stage.name().unwrap_or(ANONYMOUS),
            position = self.stages.len(),
            "Appending transform"
        );
        self.stages.push_back(stage);
        Ok(())
    }

    /// Adds a stage at the start of the chain.
    ///
    /// # Errors
    ///
    /// Returns the stage construction error, leaving the chain unchanged.
    pub fn prepend_transform(&mut self, stage: impl IntoStage<V>) -> ChainResult<()> {
        let stage = stage.into_stage()?;
        tracing::debug!(stage = stage.name().unwrap_or(ANONYMOUS), "Prepending transform");
        self.stages.push_front(stage);
        Ok(())
    }

    /// Returns true if at least one stage matches `filename`.
    pub fn has_match(&self, filename: &str) -> bool {
        self.stages.iter().any(|stage| stage.matches(filename))
    }

    /// Calls every post-load hook with `filename`, in chain order, whether
    /// or not the stage matches the file.
    pub fn notify_post_load_hooks(&self, filename: &str) {
        let snapshot = self.snapshot();
        tracing::debug!(filename, stages = snapshot.len(), "Notifying post-load hooks");
        for stage in &snapshot {
            if let Some(hook) = stage.post_load_hook() {
                hook(filename);
            }
        }
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages
            .iter()
            .map(|stage| stage.name().unwrap_or(ANONYMOUS))
            .collect()
    }

    /// Returns the stages in order.
    pub fn stages(&self) -> impl Iterator<Item = &Arc<Stage<V>>> {
        self.stages.iter()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<Stage<V>>> {
        self.stages.iter().cloned().collect()
    }
}

impl<V: Clone> TransformChain<V> {
    /// Runs `value` through the chain.
    ///
    /// Returns `value` untouched when no stage matches. Transformer failures
    /// are contained by their stage and never surface here.
    pub fn transform(&self, value: V, filename: &str) -> V {
        let snapshot = self.snapshot();
        let mut next = Next::new(&snapshot, filename);
        next.advance(value, filename)
    }
}

/// Cursor over the stages a run has not consumed yet.
///
/// This is the [`Continuation`] a chain hands to its transformers.
pub struct Next<'a, V> {
    remaining: &'a [Arc<Stage<V>>],
    filename: String,
}

impl<'a, V> Next<'a, V> {
    /// Creates a cursor at the start of `stages`.
    pub fn new(stages: &'a [Arc<Stage<V>>], filename: &str) -> Self {
        Self {
            remaining: stages,
            filename: filename.to_string(),
        }
    }

    /// The most recent filename passed down the chain.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Number of stages not consumed yet.
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

impl<V: Clone> Continuation<V> for Next<'_, V> {
    fn advance(&mut self, value: V, filename: &str) -> V {
        filename.clone_into(&mut self.filename);

        let mut remaining = self.remaining;
        while let Some((stage, rest)) = remaining.split_first() {
            remaining = rest;
            self.remaining = rest;

            if stage.matches(filename) {
                let name = stage.name().unwrap_or(ANONYMOUS);
                tracing::trace!(stage = name, filename, "Applying stage");
                return stage.apply(value, filename, self);
            }
            tracing::trace!(stage = stage.name().unwrap_or(ANONYMOUS), filename, "Skipping stage");
        }

        value
    }

    fn has_match(&self, filename: Option<&str>) -> bool {
        let filename = filename.unwrap_or(&self.filename);
        self.remaining.iter().any(|stage| stage.matches(filename))
    }
}
