//! Named transformers and hooks.
//!
//! Configuration files cannot carry code, so stages refer to transformers
//! and post-load hooks by name. The host registers the functions under
//! those names before building the chain.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use strata_core::{Continuation, PostLoadHook, Transformer};

/// Transformers and post-load hooks addressable from configuration.
///
/// # Example
///
/// ```
/// use strata_config::TransformRegistry;
///
/// let mut registry = TransformRegistry::<String>::new();
/// registry
///     .register("trim", |code, file, next| Ok(next.advance(code.trim().to_string(), file)))
///     .register_hook("loaded", |file| println!("loaded {file}"));
///
/// assert!(registry.transformer("trim").is_some());
/// assert!(registry.hook("loaded").is_some());
/// assert!(registry.transformer("minify").is_none());
/// ```
pub struct TransformRegistry<V> {
    transforms: IndexMap<String, Transformer<V>>,
    hooks: IndexMap<String, PostLoadHook>,
}

impl<V> Default for TransformRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TransformRegistry<V> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transforms: IndexMap::new(),
            hooks: IndexMap::new(),
        }
    }

    /// Registers a transformer, replacing any previous one with that name.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(V, &str, &mut dyn Continuation<V>) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.transforms.insert(name.into(), Transformer::new(f));
        self
    }

    /// Registers a post-load hook, replacing any previous one with that name.
    pub fn register_hook<F>(&mut self, name: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.hooks.insert(name.into(), Arc::new(hook));
        self
    }

    /// Looks up a transformer.
    pub fn transformer(&self, name: &str) -> Option<&Transformer<V>> {
        self.transforms.get(name)
    }

    /// Looks up a post-load hook.
    pub fn hook(&self, name: &str) -> Option<&PostLoadHook> {
        self.hooks.get(name)
    }

    /// Registered transformer names, in registration order.
    pub fn transform_names(&self) -> impl Iterator<Item = &str> {
        self.transforms.keys().map(String::as_str)
    }
}

impl<V> fmt::Debug for TransformRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("transforms", &self.transforms.keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}
