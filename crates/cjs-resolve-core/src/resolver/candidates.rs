//! Bare-specifier search locations.

use std::path::{Path, PathBuf};

/// Module directories searched from `start`, nearest ancestor first, then `global_paths`.
#[must_use]
pub fn node_modules_paths(
    start: &Path,
    module_directories: &[String],
    global_paths: &[PathBuf],
) -> Vec<PathBuf> {
    start
        .ancestors()
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| module_directories.iter().map(move |name| dir.join(name)))
        .chain(global_paths.iter().cloned())
        .collect()
}

/// Candidate paths for `specifier`: every search location joined with it.
#[must_use]
pub fn package_candidates(
    specifier: &str,
    start: &Path,
    module_directories: &[String],
    global_paths: &[PathBuf],
) -> Vec<PathBuf> {
    node_modules_paths(start, module_directories, global_paths)
        .into_iter()
        .map(|dir| dir.join(specifier))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_nearest_first_then_globals() {
        let paths = node_modules_paths(
            Path::new("/a/b"),
            &["node_modules".to_string()],
            &[PathBuf::from("/home/u/.node_modules")],
        );
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/a/b/node_modules"),
                PathBuf::from("/a/node_modules"),
                PathBuf::from("/node_modules"),
                PathBuf::from("/home/u/.node_modules"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_multiple_module_directories() {
        let dirs = ["node_modules".to_string(), "web_modules".to_string()];
        let candidates = package_candidates("pkg", Path::new("/a"), &dirs, &[]);
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/a/node_modules/pkg"),
                PathBuf::from("/a/web_modules/pkg"),
                PathBuf::from("/node_modules/pkg"),
                PathBuf::from("/web_modules/pkg"),
            ]
        );
    }
}
