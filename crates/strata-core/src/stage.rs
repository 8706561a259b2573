//! A single transform stage.
//!
//! A [`Stage`] wraps one transformer together with the rules deciding which
//! files it applies to. Stages are immutable once built and are shared by
//! reference count, so the same stage can sit in several chains, or several
//! times in one chain.
//!
//! ## Matching
//!
//! A stage matches a filename when both hold:
//!
//! 1. the raw filename's extension is one of the stage's extensions
//!    (default [`DEFAULT_EXTENSIONS`]);
//! 2. there is no matcher, or the matcher accepts the filename resolved to
//!    an absolute path.
//!
//! ## Failures
//!
//! A transformer that returns an error, or panics, does not abort the chain.
//! The stage logs the failure and either forwards the original input to the
//! next matching stage or, when there is none, returns it unchanged.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;

use crate::continuation::Continuation;
use crate::error::ChainResult;
use crate::log::{LogSink, StderrSink};
use crate::matcher::{MatchSpec, Matcher};
use crate::name::{fn_name, ANONYMOUS};
use crate::path::{extname, resolve};

/// Extensions a stage applies to when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js"];

/// A shared transformer function.
pub type TransformFn<V> =
    Arc<dyn Fn(V, &str, &mut dyn Continuation<V>) -> anyhow::Result<V> + Send + Sync>;

/// A shared post-load hook.
pub type PostLoadHook = Arc<dyn Fn(&str) + Send + Sync>;

/// A transformer function paired with its introspected name.
pub struct Transformer<V> {
    func: TransformFn<V>,
    name: Option<&'static str>,
}

impl<V> Transformer<V> {
    /// Wraps `f`, recording its function name when it has one.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(V, &str, &mut dyn Continuation<V>) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        Self {
            name: fn_name::<F>(),
            func: Arc::new(f),
        }
    }

    /// The introspected name, if any.
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }
}

impl<V> Clone for Transformer<V> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            name: self.name,
        }
    }
}

impl<V> fmt::Debug for Transformer<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// One stage of a transform chain.
pub struct Stage<V> {
    transformer: Option<TransformFn<V>>,
    extensions: Vec<String>,
    matcher: Option<Matcher>,
    verbose: bool,
    name: Option<String>,
    post_load_hook: Option<PostLoadHook>,
    log: Arc<dyn LogSink>,
}

impl<V> Stage<V> {
    /// Creates a new stage builder.
    #[must_use]
    pub fn builder() -> StageBuilder<V> {
        StageBuilder::new()
    }

    /// Creates a stage from a bare transformer, with default extensions and
    /// no matcher.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(V, &str, &mut dyn Continuation<V>) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        let transformer = Transformer::new(f);
        Self {
            name: Some(transformer.name.unwrap_or(ANONYMOUS).to_string()),
            transformer: Some(transformer.func),
            extensions: default_extensions(),
            matcher: None,
            verbose: false,
            post_load_hook: None,
            log: Arc::new(StderrSink),
        }
    }

    /// The resolved stage name.
    ///
    /// `None` only for stages built without both a name and a transformer.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The extensions this stage applies to.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether every application is logged.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Whether the stage carries a transformer.
    pub fn has_transformer(&self) -> bool {
        self.transformer.is_some()
    }

    /// The post-load hook, if any.
    pub fn post_load_hook(&self) -> Option<&PostLoadHook> {
        self.post_load_hook.as_ref()
    }

    /// Returns true if this stage applies to `filename`.
    ///
    /// The extension check uses `filename` as given; the matcher sees it
    /// resolved to an absolute path.
    pub fn matches(&self, filename: &str) -> bool {
        let ext = extname(filename);
        self.extensions.iter().any(|e| e == ext)
            && self
                .matcher
                .as_ref()
                .map_or(true, |matcher| matcher.is_match(&resolve(filename)))
    }

    /// Like [`matches`](Self::matches), but for a path. Paths that are not
    /// valid UTF-8 never match.
    pub fn matches_path(&self, path: &Path) -> bool {
        path.to_str().is_some_and(|filename| self.matches(filename))
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS)
    }
}

impl<V: Clone> Stage<V> {
    /// Runs this stage.
    ///
    /// Without a transformer, or when `filename` does not match, the value
    /// goes straight to `next`. Otherwise the transformer runs and its
    /// result is returned as is; a failure is handed to
    /// [`handle_failure`](Self::handle_failure).
    pub fn apply(&self, value: V, filename: &str, next: &mut dyn Continuation<V>) -> V {
        let transformer = match &self.transformer {
            Some(transformer) if self.matches(filename) => transformer,
            _ => return next.advance(value, filename),
        };

        if self.verbose {
            self.log.log(
                Level::INFO,
                format_args!("Applying transform {} to {}", self.display_name(), filename),
            );
        }

        let original = value.clone();
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| transformer(value, filename, &mut *next)));

        match outcome {
            Ok(Ok(transformed)) => transformed,
            Ok(Err(err)) => self.handle_failure(&err, original, filename, next),
            Err(payload) => {
                let err = anyhow::anyhow!("transform panicked: {}", panic_message(&*payload));
                self.handle_failure(&err, original, filename, next)
            }
        }
    }

    /// Recovers from a failed transformer.
    ///
    /// Logs the failure, then forwards the untouched `value` to the next
    /// stage if one would fire, or returns it unchanged.
    pub fn handle_failure(
        &self,
        err: &anyhow::Error,
        value: V,
        filename: &str,
        next: &mut dyn Continuation<V>,
    ) -> V {
        let has_next = next.has_next();
        self.log.log(
            Level::ERROR,
            format_args!(
                "Error in transform {} for {}{}",
                self.display_name(),
                filename,
                if has_next {
                    "; calling next transform"
                } else {
                    "; returning original code"
                }
            ),
        );
        self.log.log(Level::ERROR, format_args!("{err:#}"));
        self.log.log(Level::ERROR, format_args!("{err:?}"));

        if has_next {
            next.advance(value, filename)
        } else {
            value
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect()
}

impl<V> fmt::Debug for Stage<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("extensions", &self.extensions)
            .field("matcher", &self.matcher)
            .field("verbose", &self.verbose)
            .field("has_transformer", &self.transformer.is_some())
            .field("has_post_load_hook", &self.post_load_hook.is_some())
            .finish()
    }
}

/// Builder for [`Stage`].
///
/// # Example
///
/// ```
/// use strata_core::Stage;
///
/// let stage = Stage::<String>::builder()
///     .transform(|code, file, next| Ok(next.advance(code.replace("coffee", "js"), file)))
///     .extensions([".coffee"])
///     .matcher("**/src/**")
///     .name("coffee")
///     .build()
///     .unwrap();
///
/// assert_eq!(stage.name(), Some("coffee"));
/// assert!(stage.matches("/app/src/main.coffee"));
/// assert!(!stage.matches("/app/src/main.js"));
/// ```
pub struct StageBuilder<V> {
    transformer: Option<Transformer<V>>,
    matcher: Option<MatchSpec>,
    extensions: Option<Vec<String>>,
    verbose: bool,
    name: Option<String>,
    post_load_hook: Option<PostLoadHook>,
    log: Option<Arc<dyn LogSink>>,
}

impl<V> Default for StageBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> StageBuilder<V> {
    /// Creates an empty builder: no transformer, no matcher, default
    /// extensions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transformer: None,
            matcher: None,
            extensions: None,
            verbose: false,
            name: None,
            post_load_hook: None,
            log: None,
        }
    }

    /// Sets the transformer function.
    #[must_use]
    pub fn transform<F>(self, f: F) -> Self
    where
        F: Fn(V, &str, &mut dyn Continuation<V>) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.transformer(Transformer::new(f))
    }

    /// Sets an already wrapped transformer.
    #[must_use]
    pub fn transformer(mut self, transformer: Transformer<V>) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// Restricts the stage to files accepted by `spec`.
    #[must_use]
    pub fn matcher(mut self, spec: impl Into<MatchSpec>) -> Self {
        self.matcher = Some(spec.into());
        self
    }

    /// Sets the recognized extensions, each with its leading dot.
    #[must_use]
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    /// Logs every application of the transformer.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Sets the name used in log messages.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the hook called by
    /// [`TransformChain::notify_post_load_hooks`](crate::TransformChain::notify_post_load_hooks).
    #[must_use]
    pub fn post_load_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.post_load_hook = Some(Arc::new(hook));
        self
    }

    /// Sets an already shared post-load hook.
    #[must_use]
    pub fn shared_post_load_hook(mut self, hook: PostLoadHook) -> Self {
        self.post_load_hook = Some(hook);
        self
    }

    /// Replaces the default standard error sink.
    #[must_use]
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log = Some(sink);
        self
    }

    /// Builds the stage, normalizing its matcher.
    ///
    /// # Errors
    ///
    /// Returns a [`ChainError`](crate::ChainError) if the matcher cannot be
    /// compiled.
    pub fn build(self) -> ChainResult<Stage<V>> {
        let matcher = self.matcher.map(Matcher::try_from).transpose()?;
        let name = self.name.or_else(|| {
            self.transformer
                .as_ref()
                .map(|t| t.name.unwrap_or(ANONYMOUS).to_string())
        });

        Ok(Stage {
            transformer: self.transformer.map(|t| t.func),
            extensions: self.extensions.unwrap_or_else(default_extensions),
            matcher,
            verbose: self.verbose,
            name,
            post_load_hook: self.post_load_hook,
            log: self.log.unwrap_or_else(|| Arc::new(StderrSink)),
        })
    }
}

/// Conversion into a shared stage, used by chain insertion.
///
/// Converting an `Arc<Stage>` returns that same `Arc`, so a stage inserted
/// twice is the same stage twice rather than a copy.
pub trait IntoStage<V> {
    /// Performs the conversion.
    fn into_stage(self) -> ChainResult<Arc<Stage<V>>>;
}

impl<V> IntoStage<V> for Arc<Stage<V>> {
    fn into_stage(self) -> ChainResult<Arc<Stage<V>>> {
        Ok(self)
    }
}

impl<V> IntoStage<V> for Stage<V> {
    fn into_stage(self) -> ChainResult<Arc<Stage<V>>> {
        Ok(Arc::new(self))
    }
}

impl<V> IntoStage<V> for StageBuilder<V> {
    fn into_stage(self) -> ChainResult<Arc<Stage<V>>> {
        self.build().map(Arc::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::continuation::Terminal;
    use crate::log::MemorySink;
    use crate::ChainError;

    type Next<'a> = &'a mut dyn Continuation<String>;

    /// Continuation that records what it was called with.
    struct Recorder {
        has_next: bool,
        calls: Vec<(String, String)>,
        reply: &'static str,
    }

    impl Recorder {
        fn new(has_next: bool, reply: &'static str) -> Self {
            Self {
                has_next,
                calls: Vec::new(),
                reply,
            }
        }
    }

    impl Continuation<String> for Recorder {
        fn advance(&mut self, value: String, filename: &str) -> String {
            self.calls.push((value.clone(), filename.to_string()));
            value + self.reply
        }

        fn has_match(&self, _filename: Option<&str>) -> bool {
            self.has_next
        }
    }

    fn replace_foo(code: String, _file: &str, _next: Next<'_>) -> anyhow::Result<String> {
        Ok(code.replacen("foo", "bar", 1))
    }

    fn failing(_code: String, _file: &str, _next: Next<'_>) -> anyhow::Result<String> {
        anyhow::bail!("blah")
    }

    #[test]
    fn test_matcher_can_be_a_function() {
        let stage = Stage::<String>::builder()
            .matcher(MatchSpec::predicate(|f| f == "/foo.js"))
            .build()
            .unwrap();

        assert!(!stage.matches("/bar.js"));
        assert!(stage.matches("/foo.js"));
    }

    #[test]
    fn test_matches_on_extension_without_matcher() {
        let plain = Stage::<String>::builder().build().unwrap();
        let coffee = Stage::<String>::builder()
            .extensions([".coffee"])
            .build()
            .unwrap();

        assert!(!plain.matches("/foo.coffee"));
        assert!(!coffee.matches("/foo.js"));
        assert!(plain.matches("/foo.js"));
        assert!(coffee.matches("/foo.coffee"));
    }

    #[test]
    fn test_extension_of_dot_prefixed_names() {
        let plain = Stage::<String>::builder().build().unwrap();
        let coffee = Stage::<String>::builder()
            .extensions([".coffee"])
            .build()
            .unwrap();

        assert!(plain.matches("/lib/..js"));
        assert!(coffee.matches("/lib/...coffee"));
        assert!(!plain.matches("/lib/.js"));
    }

    #[test]
    fn test_glob_with_angle_brackets_in_class() {
        let stage = Stage::<String>::builder()
            .matcher("/[<>]x.js")
            .build()
            .unwrap();

        assert!(stage.matches("/<x.js"));
        assert!(!stage.matches("/x.js"));
    }

    #[test]
    fn test_matcher_can_be_a_regex() {
        let stage = Stage::<String>::builder()
            .matcher(MatchSpec::regex(r"/foo\.js$").unwrap())
            .build()
            .unwrap();

        assert!(stage.matches("foo.js"));
        assert!(!stage.matches("bar.js"));
    }

    #[test]
    fn test_matcher_can_be_a_glob() {
        let stage = Stage::<String>::builder()
            .matcher("**/{a,b}*.js")
            .build()
            .unwrap();

        assert!(stage.matches("./at.js"));
        assert!(stage.matches("./bat.js"));
        assert!(stage.matches("./boy.js"));
        assert!(!stage.matches("./cat.js"));
    }

    #[test]
    fn test_matcher_can_be_a_glob_list() {
        let stage = Stage::<String>::builder()
            .matcher(vec!["**/{a,b}*.js", "!**/*oy.js"])
            .build()
            .unwrap();

        assert!(stage.matches("./at.js"));
        assert!(stage.matches("./bat.js"));
        assert!(!stage.matches("./boy.js"));
    }

    #[test]
    fn test_matcher_and_extension_must_both_pass() {
        let stage = Stage::<String>::builder()
            .matcher("**/*")
            .extensions([".ts"])
            .build()
            .unwrap();

        assert!(stage.matches("/src/a.ts"));
        assert!(!stage.matches("/src/a.js"));
    }

    #[cfg(unix)]
    #[test]
    fn test_extension_checked_on_raw_filename() {
        let stage = Stage::<String>::builder()
            .matcher(MatchSpec::predicate(|f| f.starts_with('/')))
            .extensions([""])
            .build()
            .unwrap();

        assert!(stage.matches("Makefile"));
        assert!(!stage.matches("Makefile.js"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_never_matches() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let stage = Stage::<String>::builder().build().unwrap();
        assert!(stage.matches_path(Path::new("/a.js")));
        assert!(!stage.matches_path(Path::new(OsStr::from_bytes(b"/\xff.js"))));
    }

    #[test]
    fn test_transform_function_is_used() {
        let stage = Stage::<String>::builder()
            .transform(replace_foo)
            .build()
            .unwrap();

        assert_eq!(stage.apply("food".into(), "test.js", &mut Terminal), "bard");
    }

    #[test]
    fn test_transform_function_can_be_the_only_argument() {
        let stage = Stage::from_fn(replace_foo);
        assert_eq!(stage.apply("food".into(), "test.js", &mut Terminal), "bard");
    }

    #[test]
    fn test_no_transform_forwards_to_next() {
        let stage = Stage::<String>::builder().build().unwrap();
        let mut next = Recorder::new(false, "bar");

        assert_eq!(stage.apply("foo".into(), "test.js", &mut next), "foobar");
        assert_eq!(next.calls, vec![("foo".to_string(), "test.js".to_string())]);
    }

    #[test]
    fn test_no_match_forwards_to_next() {
        let stage = Stage::<String>::builder()
            .transform(|_, _, _| Ok("baz".to_string()))
            .build()
            .unwrap();
        let mut next = Recorder::new(false, "bar");

        assert_eq!(stage.apply("foo".into(), "test.coffee", &mut next), "foobar");
        assert_eq!(next.calls[0].1, "test.coffee");
    }

    #[test]
    fn test_name_resolution() {
        let named = Stage::<String>::builder()
            .transform(replace_foo)
            .name("foo")
            .build()
            .unwrap();
        let introspected = Stage::from_fn(replace_foo);
        let anonymous = Stage::<String>::builder()
            .transform(|code, _, _| Ok(code))
            .build()
            .unwrap();
        let nameless = Stage::<String>::builder().build().unwrap();

        assert_eq!(named.name(), Some("foo"));
        assert_eq!(introspected.name(), Some("replace_foo"));
        assert_eq!(anonymous.name(), Some(ANONYMOUS));
        assert_eq!(nameless.name(), None);
    }

    #[test]
    fn test_verbose_logs_each_application() {
        let sink = MemorySink::shared();
        let stage = Stage::<String>::builder()
            .transform(replace_foo)
            .verbose(true)
            .log_sink(sink.clone())
            .build()
            .unwrap();

        stage.apply("foo".into(), "bar.js", &mut Terminal);

        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("transform replace_foo to bar.js"));
    }

    #[test]
    fn test_not_verbose_is_silent() {
        let sink = MemorySink::shared();
        let stage = Stage::<String>::builder()
            .transform(replace_foo)
            .log_sink(sink.clone())
            .build()
            .unwrap();

        stage.apply("foo".into(), "bar.js", &mut Terminal);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_bad_glob_fails_construction() {
        let err = Stage::<String>::builder().matcher("{a").build().unwrap_err();
        assert!(matches!(err, ChainError::InvalidGlob { .. }));
    }

    #[test]
    fn test_failure_falls_through_to_downstream_handler() {
        let sink = MemorySink::shared();
        let stage = Stage::<String>::builder()
            .transform(failing)
            .log_sink(sink.clone())
            .build()
            .unwrap();
        let mut next = Recorder::new(true, "bar");

        assert_eq!(stage.apply("foo".into(), "foo.js", &mut next), "foobar");
        assert_eq!(next.calls, vec![("foo".to_string(), "foo.js".to_string())]);

        let messages = sink.messages();
        assert!(messages[0].contains("calling next transform"));
        assert!(messages[0].contains("failing"));
        assert_eq!(messages[1], "blah");
        assert_eq!(messages.len(), 3);
    }

    #[test]
    fn test_failure_returns_original_without_downstream_handler() {
        let sink = MemorySink::shared();
        let stage = Stage::<String>::builder()
            .transform(failing)
            .log_sink(sink.clone())
            .build()
            .unwrap();
        let mut next = Recorder::new(false, "bar");

        assert_eq!(stage.apply("foo".into(), "foo.js", &mut next), "foo");
        assert!(next.calls.is_empty());
        assert!(sink.messages()[0].contains("returning original code"));
    }

    #[test]
    fn test_panic_is_contained() {
        let sink = MemorySink::shared();
        let stage = Stage::<String>::builder()
            .transform(|_, _, _| -> anyhow::Result<String> { panic!("kaboom") })
            .log_sink(sink.clone())
            .build()
            .unwrap();

        assert_eq!(stage.apply("foo".into(), "foo.js", &mut Terminal), "foo");
        assert!(sink.messages()[1].contains("kaboom"));
    }

    #[test]
    fn test_into_stage_reuses_shared_stage() {
        let stage = Arc::new(Stage::from_fn(replace_foo));
        let again = Arc::clone(&stage).into_stage().unwrap();
        assert!(Arc::ptr_eq(&stage, &again));
    }
}
