//! Lexical path helpers.
//!
//! None of these touch the filesystem: `..` is collapsed textually and
//! symlinks are left alone.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components without consulting the filesystem.
///
/// `..` at the root stays at the root; leading `..` in a relative path is kept.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    out
}

/// Resolve `target` against `base` and normalize the result.
///
/// An absolute `target` ignores `base`.
#[must_use]
pub fn resolve(base: &Path, target: impl AsRef<Path>) -> PathBuf {
    normalize(&base.join(target))
}

/// Path of `path` relative to `base`, or `None` when `path` is not below `base`.
///
/// `path == base` yields an empty path.
#[must_use]
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    normalize(path)
        .strip_prefix(normalize(base))
        .ok()
        .map(Path::to_path_buf)
}

/// Append `suffix` to the final component verbatim (`a.min` + `.js` = `a.min.js`).
#[must_use]
pub fn append_extension(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Whether a specifier string ends in a path separator.
#[must_use]
pub fn ends_with_separator(s: &str) -> bool {
    s.ends_with('/') || (cfg!(windows) && s.ends_with('\\'))
}

/// Whether `path` is the last stop of an upward walk (filesystem or drive root).
#[must_use]
pub fn is_root(path: &Path) -> bool {
    path.as_os_str().is_empty() || path.parent().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/a/b/")), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_normalize_parent_at_root() {
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn test_normalize_relative_leading_parent() {
        assert_eq!(normalize(Path::new("../a/./b")), PathBuf::from("../a/b"));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let base = Path::new("/proj/src");
        assert_eq!(resolve(base, "./lib/x.js"), PathBuf::from("/proj/src/lib/x.js"));
        assert_eq!(resolve(base, "../index"), PathBuf::from("/proj/index"));
        assert_eq!(resolve(base, "/abs/y"), PathBuf::from("/abs/y"));
    }

    #[test]
    fn test_relative_to() {
        let base = Path::new("/proj/pkg");
        assert_eq!(
            relative_to(Path::new("/proj/pkg/lib/a.js"), base),
            Some(PathBuf::from("lib/a.js"))
        );
        assert_eq!(relative_to(base, base), Some(PathBuf::new()));
        assert_eq!(relative_to(Path::new("/other/a.js"), base), None);
    }

    #[test]
    fn test_append_extension_keeps_existing_dots() {
        assert_eq!(
            append_extension(Path::new("/p/a.min"), ".js"),
            PathBuf::from("/p/a.min.js")
        );
    }

    #[test]
    fn test_ends_with_separator() {
        assert!(ends_with_separator("./lib/"));
        assert!(!ends_with_separator("./lib"));
    }

    #[test]
    fn test_is_root() {
        assert!(is_root(Path::new("/")));
        assert!(is_root(Path::new("")));
        assert!(!is_root(Path::new("/a")));
    }
}
