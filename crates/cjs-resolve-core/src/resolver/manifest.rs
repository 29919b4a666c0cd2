//! `package.json` lookup.

use super::probe::Probe;
use crate::error::ResolveError;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "package.json";

const NODE_MODULES: &str = "node_modules";

/// A parsed package manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageManifest {
    /// Directory holding the manifest.
    pub dir: PathBuf,
    /// Path of the manifest file.
    pub path: PathBuf,
    /// Parsed content, after any package filter.
    pub content: Value,
}

impl PackageManifest {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.content.get("name").and_then(Value::as_str)
    }

    #[must_use]
    pub fn main(&self) -> Option<&Value> {
        self.content.get("main")
    }

    #[must_use]
    pub fn exports(&self) -> Option<&Value> {
        self.content.get("exports")
    }
}

/// Read the manifest directly inside `dir`, without walking upward.
///
/// The directory is symlink-resolved (unless symlinks are preserved)
/// before `package.json` is looked up.
pub(crate) fn read_manifest(
    probe: &Probe,
    dir: &Path,
) -> Result<Option<PackageManifest>, ResolveError> {
    let pkg_dir = if probe.is_dir(dir)? {
        probe.maybe_realpath(dir)?
    } else {
        dir.to_path_buf()
    };
    let path = pkg_dir.join(MANIFEST_FILE);

    if !probe.is_file(&path)? {
        return Ok(None);
    }
    let Some(content) = probe.read_package(&path)? else {
        return Ok(None);
    };
    let content = probe.filter_package(content, &path, dir);

    Ok(Some(PackageManifest {
        dir: pkg_dir,
        path,
        content,
    }))
}

/// Find the nearest manifest at or above `start`.
///
/// The walk stops at the filesystem root and never looks past a
/// `node_modules` directory. Unparsable manifests are skipped.
pub(crate) fn find_manifest(
    probe: &Probe,
    start: &Path,
) -> Result<Option<PackageManifest>, ResolveError> {
    let mut dir = start.to_path_buf();

    loop {
        if is_walk_boundary(&dir) {
            return Ok(None);
        }

        if let Some(mut manifest) = read_manifest(probe, &dir)? {
            manifest.dir = dir;
            return Ok(Some(manifest));
        }

        let Some(parent) = dir.parent() else {
            return Ok(None);
        };
        dir = parent.to_path_buf();
    }
}

fn is_walk_boundary(dir: &Path) -> bool {
    cjs_resolve_util::path::is_root(dir)
        || dir.file_name().is_some_and(|name| name == NODE_MODULES)
}
