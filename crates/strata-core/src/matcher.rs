//! File matchers.
//!
//! A stage may restrict itself to some files through a [`MatchSpec`]. The
//! spec comes in several shapes (predicate, regex, one glob, an ordered glob
//! list) and is normalized once, at stage construction, into a [`Matcher`]
//! so that matching never has to inspect the shape again.
//!
//! ## Glob lists
//!
//! Globs are evaluated in order. A plain pattern includes the files it
//! matches, a pattern prefixed with `!` excludes them again:
//!
//! ```
//! use strata_core::matcher::{Matcher, MatchSpec};
//!
//! let matcher = Matcher::try_from(MatchSpec::from(vec!["**/{a,b}*.js", "!**/*oy.js"])).unwrap();
//!
//! assert!(matcher.is_match("/src/bat.js"));
//! assert!(!matcher.is_match("/src/boy.js"));
//! assert!(!matcher.is_match("/src/cat.js"));
//! ```
//!
//! Wildcards do not match hidden files or directories: `**/*.js` skips
//! `/src/.eslintrc.js`, while `**/.eslintrc.js` selects it.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::error::{ChainError, ChainResult};

/// A predicate over absolute filenames.
pub type MatchFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// The shapes a stage matcher can be defined with.
#[derive(Clone)]
pub enum MatchSpec {
    /// Arbitrary predicate, used as-is.
    Predicate(MatchFn),
    /// Regular expression tested against the filename.
    Regex(Regex),
    /// A single glob pattern.
    Glob(String),
    /// Ordered glob patterns; `!` entries exclude.
    Globs(Vec<String>),
}

impl MatchSpec {
    /// Creates a predicate matcher.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Compiles `source` into a regex matcher.
    pub fn regex(source: &str) -> ChainResult<Self> {
        Regex::new(source)
            .map(Self::Regex)
            .map_err(|e| ChainError::invalid_regex(source, e))
    }

    /// Reads a matcher from a dynamically-typed definition.
    ///
    /// Accepted values:
    ///
    /// - a string: one glob;
    /// - an array of strings: ordered globs;
    /// - an object `{ "regex": "<source>" }`: a regular expression;
    /// - `null`, `false`, `0` or `""`: no matcher at all.
    ///
    /// Anything else is a [`ChainError::BadMatcher`] naming the type found.
    pub fn from_value(value: &Value) -> ChainResult<Option<Self>> {
        match value {
            Value::Null | Value::Bool(false) => Ok(None),
            Value::String(s) if s.is_empty() => Ok(None),
            Value::Number(n) if n.as_f64() == Some(0.0) => Ok(None),
            Value::String(s) => Ok(Some(Self::Glob(s.clone()))),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(ChainError::bad_matcher(format!(
                        "array containing {}",
                        type_of(other)
                    ))),
                })
                .collect::<ChainResult<Vec<_>>>()
                .map(|globs| Some(Self::Globs(globs))),
            Value::Object(map) => match (map.len(), map.get("regex")) {
                (1, Some(Value::String(source))) => Self::regex(source).map(Some),
                _ => Err(ChainError::bad_matcher(type_of(value))),
            },
            other => Err(ChainError::bad_matcher(type_of(other))),
        }
    }
}

fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl fmt::Debug for MatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            Self::Glob(glob) => f.debug_tuple("Glob").field(glob).finish(),
            Self::Globs(globs) => f.debug_tuple("Globs").field(globs).finish(),
        }
    }
}

impl From<Regex> for MatchSpec {
    fn from(re: Regex) -> Self {
        Self::Regex(re)
    }
}

impl From<&str> for MatchSpec {
    fn from(glob: &str) -> Self {
        Self::Glob(glob.to_string())
    }
}

impl From<String> for MatchSpec {
    fn from(glob: String) -> Self {
        Self::Glob(glob)
    }
}

impl From<Vec<String>> for MatchSpec {
    fn from(globs: Vec<String>) -> Self {
        Self::Globs(globs)
    }
}

impl From<Vec<&str>> for MatchSpec {
    fn from(globs: Vec<&str>) -> Self {
        Self::Globs(globs.into_iter().map(str::to_string).collect())
    }
}

/// A normalized matcher, ready to test filenames.
#[derive(Clone)]
pub enum Matcher {
    /// Arbitrary predicate.
    Predicate(MatchFn),
    /// Regular expression.
    Regex(Regex),
    /// Compiled ordered glob list.
    Globs(GlobList),
}

impl Matcher {
    /// Tests an (absolute) filename.
    pub fn is_match(&self, filename: &str) -> bool {
        match self {
            Self::Predicate(f) => f(filename),
            Self::Regex(re) => re.is_match(filename),
            Self::Globs(globs) => globs.is_match(filename),
        }
    }
}

impl TryFrom<MatchSpec> for Matcher {
    type Error = ChainError;

    fn try_from(spec: MatchSpec) -> ChainResult<Self> {
        Ok(match spec {
            MatchSpec::Predicate(f) => Self::Predicate(f),
            MatchSpec::Regex(re) => Self::Regex(re),
            MatchSpec::Glob(glob) => Self::Globs(GlobList::new([glob])?),
            MatchSpec::Globs(globs) => Self::Globs(GlobList::new(globs)?),
        })
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            Self::Globs(globs) => f.debug_tuple("Globs").field(globs).finish(),
        }
    }
}

/// An ordered list of include and exclude globs.
#[derive(Debug, Clone)]
pub struct GlobList {
    patterns: Vec<Glob>,
}

#[derive(Debug, Clone)]
struct Glob {
    negated: bool,
    regex: Regex,
}

impl GlobList {
    /// Compiles the patterns, keeping their order.
    pub fn new<I, S>(patterns: I) -> ChainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                let bangs = pattern.len() - pattern.trim_start_matches('!').len();
                let body = &pattern[bangs..];
                Regex::new(&glob_to_regex(body))
                    .map(|regex| Glob {
                        negated: bangs % 2 == 1,
                        regex,
                    })
                    .map_err(|e| ChainError::invalid_glob(pattern, e))
            })
            .collect::<ChainResult<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Returns true if the filename is still selected after every include
    /// and exclude pattern has been applied in order.
    pub fn is_match(&self, filename: &str) -> bool {
        self.patterns.iter().fold(false, |selected, glob| {
            if glob.regex.is_match(filename) {
                !glob.negated
            } else {
                selected
            }
        })
    }
}

/// One path segment that does not start with a dot.
const SEGMENT: &str = "[^./][^/]*";

/// Translates a glob into an anchored regex.
///
/// Supports `*`, `?`, `**` as a whole segment, `{a,b}` alternation,
/// `[...]` classes (with `!` or `^` negation) and `\` escapes.
///
/// Wildcards never match a leading `.` in a path segment; only a pattern
/// segment starting with a literal `.` selects hidden files and
/// directories.
fn glob_to_regex(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let mut re = String::with_capacity(glob.len() * 2 + 2);
    re.push('^');

    // True while the current path segment may still be empty, so the next
    // wildcard would be the one matching its first character.
    let mut at_segment_start = true;
    let mut braces: Vec<bool> = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' if chars.get(i + 1) == Some(&'*')
                && (i == 0 || chars[i - 1] == '/')
                && matches!(chars.get(i + 2), None | Some('/')) =>
            {
                if chars.get(i + 2).is_some() {
                    re.push_str(&format!("(?:(?:{SEGMENT})?/)*"));
                    i += 3;
                    at_segment_start = true;
                } else {
                    re.push_str(&format!("(?:{SEGMENT})?(?:/(?:{SEGMENT})?)*"));
                    i += 2;
                }
                continue;
            }
            '*' => {
                let mut end = i;
                while chars.get(end) == Some(&'*') {
                    end += 1;
                }
                if at_segment_start {
                    let dot_follows = match chars.get(end) {
                        None | Some('/' | '.') => true,
                        Some('\\') => chars.get(end + 1) == Some(&'.'),
                        Some(_) => false,
                    };
                    if dot_follows {
                        re.push_str(SEGMENT);
                        at_segment_start = false;
                    } else {
                        re.push_str(&format!("(?:{SEGMENT})?"));
                    }
                } else {
                    re.push_str("[^/]*");
                }
                i = end;
                continue;
            }
            '?' => {
                re.push_str(if at_segment_start { "[^./]" } else { "[^/]" });
                at_segment_start = false;
            }
            '/' => {
                re.push('/');
                at_segment_start = true;
            }
            '{' => {
                braces.push(at_segment_start);
                re.push_str("(?:");
            }
            '}' if !braces.is_empty() => {
                braces.pop();
                re.push(')');
                at_segment_start = false;
            }
            ',' if !braces.is_empty() => {
                re.push('|');
                at_segment_start = braces.last().copied().unwrap_or(false);
            }
            '[' => {
                let class = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == ']')
                    .and_then(|len| {
                        class_to_regex(&chars[i + 1..i + 1 + len], at_segment_start)
                            .map(|class| (len, class))
                    });
                match class {
                    Some((len, class)) => {
                        re.push_str(&class);
                        i += len + 1;
                    }
                    None => re.push_str(r"\["),
                }
                at_segment_start = false;
            }
            '\\' if i + 1 < chars.len() => {
                i += 1;
                re.push_str(&regex::escape(&chars[i].to_string()));
                at_segment_start = false;
            }
            _ => {
                re.push_str(&regex::escape(&c.to_string()));
                at_segment_start = false;
            }
        }
        i += 1;
    }

    // An unclosed `{` leaves an unbalanced group behind, which fails to
    // compile and is reported as an invalid glob.
    re.push('$');
    re
}

/// Translates the body of a `[...]` class. The result never matches `/`,
/// nor `.` when it opens a path segment. `None` for an empty class.
fn class_to_regex(body: &[char], at_segment_start: bool) -> Option<String> {
    let (negated, body) = match body.split_first() {
        Some((&('!' | '^'), rest)) => (true, rest),
        _ => (false, body),
    };
    if body.is_empty() {
        return None;
    }

    let mut class = String::from(if negated { "[[^" } else { "[[" });
    for (idx, &ch) in body.iter().enumerate() {
        let is_range = ch == '-' && idx > 0 && idx + 1 < body.len();
        if matches!(ch, '\\' | '[' | ']' | '^' | '&' | '~') || (ch == '-' && !is_range) {
            class.push('\\');
        }
        class.push(ch);
    }
    class.push_str(if at_segment_start { "]&&[^./]]" } else { "]&&[^/]]" });
    Some(class)
}
