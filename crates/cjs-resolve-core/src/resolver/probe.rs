//! Filesystem capabilities used by the resolver.
//!
//! A [`FileSystem`] backend answers stat/read/realpath questions; [`Hooks`]
//! override individual capabilities per call. The two are combined once per
//! call into a [`Probe`], which is the only way the algorithm touches storage.

use crate::error::ResolveError;
use serde_json::Value;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Filesystem abstraction so resolution can run against non-disk hosts.
pub trait FileSystem: Send + Sync + fmt::Debug {
    /// True for regular files and FIFOs. Missing paths are `Ok(false)`.
    fn is_file(&self, path: &Path) -> io::Result<bool>;
    /// True for directories. Missing paths are `Ok(false)`.
    fn is_dir(&self, path: &Path) -> io::Result<bool>;
    /// Read a file as UTF-8 text.
    fn read_file(&self, path: &Path) -> io::Result<String>;
    /// Resolve symlinks. Missing paths are returned unchanged.
    fn realpath(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FileSystem for RealFs {
    fn is_file(&self, path: &Path) -> io::Result<bool> {
        cjs_resolve_util::fs::is_file(path)
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        cjs_resolve_util::fs::is_dir(path)
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        cjs_resolve_util::fs::read_to_string_lossy(path)
    }

    fn realpath(&self, path: &Path) -> io::Result<PathBuf> {
        cjs_resolve_util::fs::realpath(path)
    }
}

/// Failure reading a manifest. Syntax errors are recoverable, I/O errors are not.
#[derive(Debug, Error)]
pub enum ReadManifestError {
    #[error("invalid manifest JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type PathPredicateHook = Arc<dyn Fn(&Path) -> io::Result<bool> + Send + Sync>;
pub type ReadFileHook = Arc<dyn Fn(&Path) -> io::Result<String> + Send + Sync>;
/// Receives the host filesystem and the manifest path.
pub type ReadPackageHook =
    Arc<dyn Fn(&dyn FileSystem, &Path) -> Result<Value, ReadManifestError> + Send + Sync>;
pub type RealpathHook = Arc<dyn Fn(&Path) -> io::Result<PathBuf> + Send + Sync>;
/// `(manifest, manifest_path, directory) -> manifest`
pub type PackageFilterHook = Arc<dyn Fn(Value, &Path, &Path) -> Value + Send + Sync>;
/// `(manifest, absolute_path, path_relative_to_package) -> replacement relative path`
pub type PathFilterHook = Arc<dyn Fn(&Value, &Path, &Path) -> Option<PathBuf> + Send + Sync>;
/// `(request, start_dir, default_candidates) -> candidates`
pub type PackageIteratorHook =
    Arc<dyn Fn(&str, &Path, &dyn Fn() -> Vec<PathBuf>) -> Vec<PathBuf> + Send + Sync>;

/// Optional per-call overrides of the resolver's capabilities.
#[derive(Clone, Default)]
pub struct Hooks {
    pub is_file: Option<PathPredicateHook>,
    pub is_dir: Option<PathPredicateHook>,
    pub read_file: Option<ReadFileHook>,
    /// Mutually exclusive with `read_file`.
    pub read_package: Option<ReadPackageHook>,
    pub realpath: Option<RealpathHook>,
    pub package_filter: Option<PackageFilterHook>,
    pub path_filter: Option<PathFilterHook>,
    pub package_iterator: Option<PackageIteratorHook>,
}

impl Hooks {
    /// Reject hook combinations that cannot be honored together.
    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.read_file.is_some() && self.read_package.is_some() {
            return Err(ResolveError::invalid_options(
                "`read_file` and `read_package` are mutually exclusive.",
            ));
        }
        Ok(())
    }

    fn names(&self) -> Vec<&'static str> {
        [
            ("is_file", self.is_file.is_some()),
            ("is_dir", self.is_dir.is_some()),
            ("read_file", self.read_file.is_some()),
            ("read_package", self.read_package.is_some()),
            ("realpath", self.realpath.is_some()),
            ("package_filter", self.package_filter.is_some()),
            ("path_filter", self.path_filter.is_some()),
            ("package_iterator", self.package_iterator.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hooks").field(&self.names()).finish()
    }
}

/// Capability set for one resolution call.
#[derive(Debug, Clone)]
pub(crate) struct Probe {
    fs: Arc<dyn FileSystem>,
    hooks: Hooks,
    preserve_symlinks: bool,
}

impl Probe {
    pub(crate) fn new(fs: Arc<dyn FileSystem>, hooks: Hooks, preserve_symlinks: bool) -> Self {
        Self {
            fs,
            hooks,
            preserve_symlinks,
        }
    }

    pub(crate) fn is_file(&self, path: &Path) -> Result<bool, ResolveError> {
        match &self.hooks.is_file {
            Some(hook) => hook(path),
            None => self.fs.is_file(path),
        }
        .map_err(|err| ResolveError::io(path, err))
    }

    pub(crate) fn is_dir(&self, path: &Path) -> Result<bool, ResolveError> {
        match &self.hooks.is_dir {
            Some(hook) => hook(path),
            None => self.fs.is_dir(path),
        }
        .map_err(|err| ResolveError::io(path, err))
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        match &self.hooks.read_file {
            Some(hook) => hook(path),
            None => self.fs.read_file(path),
        }
    }

    /// Read and parse a manifest. A syntax error yields `Ok(None)`.
    pub(crate) fn read_package(&self, path: &Path) -> Result<Option<Value>, ResolveError> {
        let parsed = match &self.hooks.read_package {
            Some(hook) => hook(self.fs.as_ref(), path),
            None => self
                .read_file(path)
                .map_err(ReadManifestError::from)
                .and_then(|text| serde_json::from_str(&text).map_err(ReadManifestError::from)),
        };

        match parsed {
            Ok(value) => Ok(Some(value)),
            Err(ReadManifestError::Syntax(err)) => {
                tracing::debug!(path = %path.display(), error = %err, "ignoring unparsable manifest");
                Ok(None)
            }
            Err(ReadManifestError::Io(err)) => Err(ResolveError::io(path, err)),
        }
    }

    pub(crate) fn realpath(&self, path: &Path) -> Result<PathBuf, ResolveError> {
        match &self.hooks.realpath {
            Some(hook) => hook(path),
            None => self.fs.realpath(path),
        }
        .map_err(|err| ResolveError::io(path, err))
    }

    /// Symlink-resolve `path` unless symlinks are preserved.
    pub(crate) fn maybe_realpath(&self, path: &Path) -> Result<PathBuf, ResolveError> {
        if self.preserve_symlinks {
            Ok(path.to_path_buf())
        } else {
            self.realpath(path)
        }
    }

    pub(crate) fn filter_package(&self, manifest: Value, path: &Path, dir: &Path) -> Value {
        match &self.hooks.package_filter {
            Some(filter) => filter(manifest, path, dir),
            None => manifest,
        }
    }

    pub(crate) fn path_filter(&self) -> Option<&PathFilterHook> {
        self.hooks.path_filter.as_ref()
    }

    pub(crate) fn package_iterator(&self) -> Option<&PackageIteratorHook> {
        self.hooks.package_iterator.as_ref()
    }
}
