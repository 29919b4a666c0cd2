//! Resolution algorithm: relative/absolute paths, core modules and
//! `node_modules` search, with package entry points and `exports`.

use super::candidates::package_candidates;
use super::exports::{ExportsContext, ExportsOutcome, ExportsRequest};
use super::manifest::{find_manifest, read_manifest, PackageManifest};
use super::probe::{Probe, RealFs};
use super::specifier::{is_directory_specifier, split_package_specifier, SpecifierKind};
use crate::category::Category;
use crate::config::{Config, ResolveOptions};
use crate::core_modules::is_core_module;
use crate::error::ResolveError;
use crate::paths::ProcessDefaults;
use cjs_resolve_util::path as upath;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Nesting limit for `main` fields pointing at further package directories.
const MAX_MAIN_DEPTH: usize = 32;

/// Resolve `specifier` using the process-wide defaults.
///
/// Returns the absolute path of the resolved file, or the specifier itself
/// for a core module.
pub fn resolve(specifier: &str, options: &ResolveOptions) -> Result<PathBuf, ResolveError> {
    resolve_with_defaults(specifier, options, ProcessDefaults::global())
}

/// Resolve `specifier` with explicitly supplied process defaults.
pub fn resolve_with_defaults(
    specifier: &str,
    options: &ResolveOptions,
    defaults: &ProcessDefaults,
) -> Result<PathBuf, ResolveError> {
    let config = Config::normalize(options, defaults)?;
    let probe = probe_for(options);
    let kind = SpecifierKind::classify(specifier);

    debug!(specifier, categories = ?config.categories, "resolving");

    // A caller-supplied basedir is validated before any branch; the implicit
    // one is only canonicalized once a filesystem branch needs it.
    let explicit_start = if config.explicit_basedir {
        let start = probe.maybe_realpath(&config.basedir)?;
        if !probe.is_dir(&start)? {
            return Err(ResolveError::InvalidBasedir {
                basedir: options.basedir.clone().unwrap_or_default(),
                preserve_symlinks: config.preserve_symlinks,
            });
        }
        Some(start)
    } else {
        None
    };

    if kind == SpecifierKind::Bare && config.include_core_modules && is_core_module(specifier) {
        debug!(specifier, "core module");
        return Ok(PathBuf::from(specifier));
    }

    let start = match explicit_start {
        Some(start) => start,
        None => probe.maybe_realpath(&config.basedir)?,
    };

    let mut first_failure = None;

    for &category in &config.categories {
        let resolver = Resolver {
            config: &config,
            probe: &probe,
            category,
        };

        let failure = match resolver.resolve_specifier(specifier, kind, &start) {
            Ok(Some(found)) => {
                let resolved = probe.maybe_realpath(&found)?;
                debug!(specifier, %category, resolved = %resolved.display(), "resolved");
                return Ok(resolved);
            }
            Ok(None) => not_found(specifier, &config),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => err,
        };

        debug!(specifier, %category, error = %failure, "category failed");
        first_failure.get_or_insert(failure);
    }

    Err(first_failure.unwrap_or_else(|| not_found(specifier, &config)))
}

/// Find the nearest `package.json` at or above `start`.
///
/// Honors the filesystem backend, `preserve_symlinks` and the manifest hooks
/// in `options`.
pub fn nearest_manifest(
    start: &Path,
    options: &ResolveOptions,
) -> Result<Option<PackageManifest>, ResolveError> {
    options.hooks.validate()?;
    find_manifest(&probe_for(options), start)
}

fn probe_for(options: &ResolveOptions) -> Probe {
    let fs = options.fs.clone().unwrap_or_else(|| Arc::new(RealFs));
    Probe::new(fs, options.hooks.clone(), options.preserve_symlinks)
}

fn not_found(specifier: &str, config: &Config) -> ResolveError {
    ResolveError::ModuleNotFound {
        specifier: specifier.to_string(),
        parent: config.parent.clone(),
    }
}

/// One resolution attempt under a single category.
struct Resolver<'a> {
    config: &'a Config,
    probe: &'a Probe,
    category: Category,
}

impl Resolver<'_> {
    fn resolve_specifier(
        &self,
        specifier: &str,
        kind: SpecifierKind,
        start: &Path,
    ) -> Result<Option<PathBuf>, ResolveError> {
        match kind {
            SpecifierKind::Path => self.resolve_path(specifier, start),
            SpecifierKind::Bare => self.load_node_modules(specifier, start),
        }
    }

    fn resolve_path(&self, specifier: &str, start: &Path) -> Result<Option<PathBuf>, ResolveError> {
        let target = upath::resolve(start, specifier);

        if !is_directory_specifier(specifier) {
            if let Some(file) = self.load_as_file(&target)? {
                return Ok(Some(file));
            }
        }
        self.load_as_directory(&target, 0)
    }

    /// The candidate itself if it is a file, else the candidate with each extension appended.
    fn load_as_file(&self, candidate: &Path) -> Result<Option<PathBuf>, ResolveError> {
        let candidate = self.apply_path_filter(candidate)?;

        if self.probe.is_file(&candidate)? {
            return Ok(Some(candidate));
        }

        for extension in &self.config.extensions {
            let file = upath::append_extension(&candidate, extension);
            if self.probe.is_file(&file)? {
                return Ok(Some(file));
            }
        }

        trace!(candidate = %candidate.display(), "no file");
        Ok(None)
    }

    fn apply_path_filter(&self, candidate: &Path) -> Result<PathBuf, ResolveError> {
        let Some(filter) = self.probe.path_filter() else {
            return Ok(candidate.to_path_buf());
        };
        let Some(dir) = candidate.parent() else {
            return Ok(candidate.to_path_buf());
        };
        let Some(manifest) = find_manifest(self.probe, dir)? else {
            return Ok(candidate.to_path_buf());
        };

        let relative =
            upath::relative_to(candidate, &manifest.dir).unwrap_or_else(|| candidate.to_path_buf());
        Ok(match filter(&manifest.content, candidate, &relative) {
            Some(rewritten) => upath::resolve(&manifest.dir, rewritten),
            None => candidate.to_path_buf(),
        })
    }

    /// Entry point of a package directory: `exports`, then `main`, then `index`.
    fn load_as_directory(&self, dir: &Path, depth: usize) -> Result<Option<PathBuf>, ResolveError> {
        if depth > MAX_MAIN_DEPTH {
            debug!(dir = %dir.display(), "main nesting too deep");
            return Ok(None);
        }

        if let Some(manifest) = read_manifest(self.probe, dir)? {
            match self.resolve_exports(&manifest, dir, dir)? {
                ExportsOutcome::Resolved(file) => return Ok(Some(file)),
                ExportsOutcome::Unmatched => return Ok(None),
                ExportsOutcome::Ignored => {}
            }

            if let Some(file) = self.load_main(&manifest, dir, depth)? {
                return Ok(Some(file));
            }
        }

        self.load_as_file(&dir.join("index"))
    }

    /// `Ok(None)` when the manifest declares no `main`.
    fn load_main(
        &self,
        manifest: &PackageManifest,
        dir: &Path,
        depth: usize,
    ) -> Result<Option<PathBuf>, ResolveError> {
        let Some(main) = manifest.main().filter(|main| is_truthy(main)) else {
            return Ok(None);
        };
        let Some(main) = main.as_str() else {
            return Err(ResolveError::InvalidPackageMain {
                name: manifest.name().unwrap_or_default().to_string(),
            });
        };
        let main = if matches!(main, "." | "./") { "index" } else { main };
        let main_path = upath::resolve(dir, main);

        let attempt = self.load_as_file(&main_path).and_then(|found| match found {
            Some(file) => Ok(Some(file)),
            None => match self.load_as_directory(&main_path, depth + 1)? {
                Some(file) => Ok(Some(file)),
                None => self.load_as_file(&dir.join("index")),
            },
        });

        match attempt {
            Ok(Some(file)) => Ok(Some(file)),
            Ok(None) => Err(ResolveError::IncorrectPackageMain { path: main_path }),
            Err(err) => {
                debug!(main = %main_path.display(), error = %err, "main failed");
                Err(ResolveError::IncorrectPackageMain { path: main_path })
            }
        }
    }

    fn resolve_exports(
        &self,
        manifest: &PackageManifest,
        root: &Path,
        target: &Path,
    ) -> Result<ExportsOutcome, ResolveError> {
        let Some(exports) = manifest.exports() else {
            return Ok(ExportsOutcome::Ignored);
        };

        let ctx = ExportsContext {
            package_dir: &manifest.dir,
            manifest: &manifest.path,
            request: ExportsRequest { root, target },
            category: self.category,
            conditions: &self.config.conditions,
        };
        ctx.resolve_package(exports, &mut |file: &Path| self.load_as_file(file))
    }

    fn load_node_modules(&self, specifier: &str, start: &Path) -> Result<Option<PathBuf>, ResolveError> {
        let defaults = || {
            package_candidates(
                specifier,
                start,
                &self.config.module_directories,
                &self.config.paths,
            )
        };
        let candidates = match self.probe.package_iterator() {
            Some(iterator) => iterator(specifier, start, &defaults),
            None => defaults(),
        };
        let (_, subpath) = split_package_specifier(specifier);

        for candidate in candidates {
            trace!(candidate = %candidate.display(), "trying candidate");

            // Declared subpaths need not exist on disk, so exports are
            // consulted as soon as the package root does.
            if let Some(root) = subpath.and_then(|sub| package_root(&candidate, sub)) {
                if self.probe.is_dir(&root)? {
                    match self.resolve_subpath_exports(&root, &candidate)? {
                        ExportsOutcome::Resolved(file) => return Ok(Some(file)),
                        ExportsOutcome::Unmatched => continue,
                        ExportsOutcome::Ignored => {}
                    }
                }
            }

            let Some(parent) = candidate.parent() else {
                continue;
            };
            if !self.probe.is_dir(parent)? {
                continue;
            }

            if let Some(file) = self.load_as_file(&candidate)? {
                return Ok(Some(file));
            }
            if let Some(file) = self.load_as_directory(&candidate, 0)? {
                return Ok(Some(file));
            }
        }

        Ok(None)
    }

    fn resolve_subpath_exports(&self, root: &Path, target: &Path) -> Result<ExportsOutcome, ResolveError> {
        match read_manifest(self.probe, root)? {
            Some(manifest) => self.resolve_exports(&manifest, root, target),
            None => Ok(ExportsOutcome::Ignored),
        }
    }
}

/// Package directory of a candidate `.../node_modules/<name>/<subpath>`.
fn package_root(candidate: &Path, subpath: &str) -> Option<PathBuf> {
    let subpath = Path::new(subpath);
    if !candidate.ends_with(subpath) {
        return None;
    }

    let mut root = candidate.to_path_buf();
    for _ in subpath.components() {
        root.pop();
    }
    Some(root)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
