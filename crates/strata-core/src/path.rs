//! Filename helpers used by stage matching.
//!
//! Extension checks run against the raw filename while matchers see the
//! absolute form, so both helpers are kept side by side.

use std::env;
use std::path::{is_separator, Component, Path, PathBuf};

/// Returns the extension of the last path segment, leading dot included.
///
/// Mirrors the usual `extname` rules: a name whose only dot is its first
/// character (`.bashrc`) has no extension, neither does `..`, and a
/// trailing dot yields `"."`.
///
/// ```
/// use strata_core::path::extname;
///
/// assert_eq!(extname("src/index.js"), ".js");
/// assert_eq!(extname("archive.tar.gz"), ".gz");
/// assert_eq!(extname(".bashrc"), "");
/// assert_eq!(extname("..js"), ".js");
/// assert_eq!(extname("Makefile"), "");
/// ```
pub fn extname(filename: &str) -> &str {
    let trimmed = filename.trim_end_matches(is_separator);
    let base = trimmed.rsplit(is_separator).next().unwrap_or(trimmed);

    match base.rfind('.') {
        None | Some(0) => "",
        Some(_) if base == ".." => "",
        Some(idx) => &base[idx..],
    }
}

/// Resolves `filename` against the current directory and normalizes `.`
/// and `..` segments lexically.
///
/// The filesystem is never touched, so the file does not need to exist.
/// If the current directory cannot be read, a relative filename is only
/// normalized.
pub fn resolve(filename: &str) -> String {
    let path = Path::new(filename);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    normalize(&joined).to_string_lossy().into_owned()
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extname() {
        assert_eq!(extname("foo.js"), ".js");
        assert_eq!(extname("/a/b.c/foo.coffee"), ".coffee");
        assert_eq!(extname("/a/b.c/foo"), "");
        assert_eq!(extname("foo."), ".");
        assert_eq!(extname("foo.js/"), ".js");
        assert_eq!(extname(".."), "");
        assert_eq!(extname(""), "");
    }

    #[test]
    fn test_extname_after_leading_dots() {
        assert_eq!(extname("..js"), ".js");
        assert_eq!(extname("/a/...coffee"), ".coffee");
        assert_eq!(extname("/a/.x.js"), ".js");
        assert_eq!(extname("..."), ".");
        assert_eq!(extname("/a/.."), "");
        assert_eq!(extname(".bashrc"), "");
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_absolute_is_normalized() {
        assert_eq!(resolve("/foo.js"), "/foo.js");
        assert_eq!(resolve("/a/./b/../c.js"), "/a/c.js");
        assert_eq!(resolve("/../x.js"), "/x.js");
    }

    #[test]
    fn test_resolve_relative_uses_cwd() {
        let cwd = env::current_dir().unwrap();
        let expected = normalize(&cwd.join("at.js"));
        assert_eq!(resolve("./at.js"), expected.to_string_lossy());
        assert!(Path::new(&resolve("at.js")).is_absolute());
    }
}
