//! Specifier classification.

use cjs_resolve_util::path::ends_with_separator;

/// Which resolution branch a specifier takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// Relative (`./`, `../`, `.`, `..`) or absolute path.
    Path,
    /// Package name, optionally with a subpath; may also be a core module.
    Bare,
}

impl SpecifierKind {
    #[must_use]
    pub fn classify(specifier: &str) -> Self {
        if is_path_specifier(specifier) {
            Self::Path
        } else {
            Self::Bare
        }
    }
}

/// Whether `specifier` is relative or absolute rather than a package name.
///
/// Drive-letter (`C:\`, `C:/`) and leading-backslash prefixes count as absolute.
/// Relative forms must use `/` (`.\x` is a package name).
#[must_use]
pub fn is_path_specifier(specifier: &str) -> bool {
    match specifier.as_bytes() {
        b"." | b".." | [b'.', b'/', ..] | [b'.', b'.', b'/', ..] | [b'/' | b'\\', ..] => true,
        [drive, b':', b'/' | b'\\', ..] => drive.is_ascii_alphabetic(),
        _ => false,
    }
}

/// Whether a path specifier names a directory (`.`, `..`, or a trailing separator).
#[must_use]
pub fn is_directory_specifier(specifier: &str) -> bool {
    matches!(specifier, "." | "..") || ends_with_separator(specifier)
}

/// Split a bare specifier into package name and subpath.
///
/// - `lodash` → (`lodash`, None)
/// - `lodash/fp` → (`lodash`, Some(`fp`))
/// - `@scope/pkg/sub/path` → (`@scope/pkg`, Some(`sub/path`))
///
/// An empty subpath (`pkg/`) is treated as none.
#[must_use]
pub fn split_package_specifier(specifier: &str) -> (&str, Option<&str>) {
    let name_end = if specifier.starts_with('@') {
        specifier
            .match_indices('/')
            .nth(1)
            .map(|(i, _)| i)
    } else {
        specifier.find('/')
    };

    match name_end {
        Some(i) => {
            let subpath = &specifier[i + 1..];
            (&specifier[..i], (!subpath.is_empty()).then_some(subpath))
        }
        None => (specifier, None),
    }
}
