//! Package.json `exports` field evaluation.
//!
//! Implements the category-dependent subset of Node.js exports resolution:
//! - Leaf and array targets
//! - Conditional maps, tried in active-condition order
//! - Subpath maps with exact key matching (no `*` patterns)
//!
//! Object nodes are validated structurally before they are evaluated; any
//! problem makes the whole request fail as not exported.

use crate::category::Category;
use crate::error::ResolveError;
use cjs_resolve_util::path as upath;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Shape of an `exports` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportsStatus {
    /// No keys at all.
    Empty,
    /// Only condition keys.
    Conditions,
    /// Only subpath keys (beginning with `.`).
    Files,
    /// Shape could not be determined.
    Problems,
}

/// A structural problem found in an `exports` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportsProblem {
    /// Subpath and condition keys at the same level.
    MixedKeys {
        subpaths: Vec<String>,
        conditions: Vec<String>,
    },
    /// A subpath key that is neither `.` nor starts with `./`.
    InvalidSubpathKey(String),
    /// A condition key that is an integer.
    NumericConditionKey(String),
    /// A target that is neither a string, array, object nor `null`.
    InvalidTarget { key: String, kind: &'static str },
}

impl fmt::Display for ExportsProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MixedKeys {
                subpaths,
                conditions,
            } => write!(
                f,
                "subpath keys ({}) cannot be mixed with condition keys ({})",
                subpaths.join(", "),
                conditions.join(", ")
            ),
            Self::InvalidSubpathKey(key) => {
                write!(f, "subpath key `{key}` must be `.` or start with `./`")
            }
            Self::NumericConditionKey(key) => {
                write!(f, "condition key `{key}` must not be an integer")
            }
            Self::InvalidTarget { key, kind } => {
                write!(f, "target for `{key}` must not be a {kind}")
            }
        }
    }
}

/// Result of [`validate_exports_object`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportsValidation {
    pub status: ExportsStatus,
    pub problems: Vec<ExportsProblem>,
}

impl ExportsValidation {
    /// Whether the object can be evaluated.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.problems.is_empty()
            && matches!(
                self.status,
                ExportsStatus::Conditions | ExportsStatus::Files
            )
    }
}

/// Classify an `exports` object and collect its structural problems.
#[must_use]
pub fn validate_exports_object(map: &Map<String, Value>) -> ExportsValidation {
    if map.is_empty() {
        return ExportsValidation {
            status: ExportsStatus::Empty,
            problems: Vec::new(),
        };
    }

    let (subpaths, conditions): (Vec<&String>, Vec<&String>) =
        map.keys().partition(|key| key.starts_with('.'));

    let mut problems: Vec<ExportsProblem> = map
        .iter()
        .filter_map(|(key, value)| {
            invalid_target_kind(value).map(|kind| ExportsProblem::InvalidTarget {
                key: key.clone(),
                kind,
            })
        })
        .collect();

    let status = match (subpaths.is_empty(), conditions.is_empty()) {
        (false, false) => {
            problems.push(ExportsProblem::MixedKeys {
                subpaths: subpaths.into_iter().cloned().collect(),
                conditions: conditions.into_iter().cloned().collect(),
            });
            ExportsStatus::Problems
        }
        (false, true) => {
            problems.extend(
                subpaths
                    .into_iter()
                    .filter(|key| *key != "." && !key.starts_with("./"))
                    .map(|key| ExportsProblem::InvalidSubpathKey(key.clone())),
            );
            ExportsStatus::Files
        }
        _ => {
            problems.extend(
                conditions
                    .into_iter()
                    .filter(|key| key.parse::<i64>().is_ok())
                    .map(|key| ExportsProblem::NumericConditionKey(key.clone())),
            );
            ExportsStatus::Conditions
        }
    };

    ExportsValidation { status, problems }
}

fn invalid_target_kind(value: &Value) -> Option<&'static str> {
    match value {
        Value::Bool(_) => Some("boolean"),
        Value::Number(_) => Some("number"),
        _ => None,
    }
}

/// One node of an `exports` tree, as honored by a category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportsNode<'a> {
    Leaf(&'a str),
    Array(&'a [Value]),
    Conditions(&'a Map<String, Value>),
    Subpaths(&'a Map<String, Value>),
}

impl<'a> ExportsNode<'a> {
    /// Classify `value` under `category`.
    ///
    /// `Ok(None)` for shapes that never match here (`null`, scalars, and
    /// objects in categories without object support). Objects that fail
    /// validation return the validation.
    pub fn classify(
        value: &'a Value,
        category: Category,
    ) -> Result<Option<Self>, ExportsValidation> {
        match value {
            Value::String(target) => Ok(Some(Self::Leaf(target))),
            Value::Array(items) => Ok(Some(Self::Array(items))),
            Value::Object(map) if category.supports_object_exports() => {
                let validation = validate_exports_object(map);
                if !validation.is_usable() {
                    return Err(validation);
                }
                Ok(Some(match validation.status {
                    ExportsStatus::Conditions => Self::Conditions(map),
                    _ => Self::Subpaths(map),
                }))
            }
            _ => Ok(None),
        }
    }
}

/// The path a request addresses inside a package.
#[derive(Debug, Clone, Copy)]
pub struct ExportsRequest<'a> {
    /// Package directory as reached by the request.
    pub root: &'a Path,
    /// Requested absolute path; equal to `root` for the package itself.
    pub target: &'a Path,
}

impl ExportsRequest<'_> {
    #[must_use]
    pub fn is_root(&self) -> bool {
        upath::normalize(self.target) == upath::normalize(self.root)
    }

    /// Request as a subpath key (`.`, `./feature`).
    #[must_use]
    pub fn subpath(&self) -> String {
        match upath::relative_to(self.target, self.root) {
            Some(rel) if !rel.as_os_str().is_empty() => {
                let parts: Vec<_> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                format!("./{}", parts.join("/"))
            }
            Some(_) => ".".to_string(),
            None => self.target.display().to_string(),
        }
    }

    /// Whether the request was written with a trailing separator (`pkg/lib/`).
    fn names_directory(&self) -> bool {
        upath::ends_with_separator(&self.target.to_string_lossy())
    }

    /// Directory keys (`./lib/`) only match directory requests, and vice versa.
    fn matches_key(&self, key: &str) -> bool {
        if key == "." {
            return self.is_root();
        }
        upath::ends_with_separator(key) == self.names_directory()
            && upath::resolve(self.root, key) == upath::normalize(self.target)
    }
}

/// How a package's `exports` field answered a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportsOutcome {
    /// Absent or not honored by the category; fall back to `main`.
    Ignored,
    /// Root-only declaration asked for a subpath.
    Unmatched,
    Resolved(PathBuf),
}

/// Everything `exports` evaluation needs for one package and request.
#[derive(Debug, Clone, Copy)]
pub struct ExportsContext<'a> {
    /// Directory targets are resolved against.
    pub package_dir: &'a Path,
    /// Manifest location, for error reporting.
    pub manifest: &'a Path,
    pub request: ExportsRequest<'a>,
    pub category: Category,
    /// Active conditions, in trial order.
    pub conditions: &'a [String],
}

impl ExportsContext<'_> {
    /// Evaluate a package's top-level `exports` value.
    ///
    /// `load_file` applies file resolution to a leaf target.
    pub fn resolve_package<F>(
        &self,
        exports: &Value,
        load_file: &mut F,
    ) -> Result<ExportsOutcome, ResolveError>
    where
        F: FnMut(&Path) -> Result<Option<PathBuf>, ResolveError>,
    {
        if !self.category.honors_exports() {
            return Ok(ExportsOutcome::Ignored);
        }

        match exports {
            Value::Null => Ok(ExportsOutcome::Ignored),
            Value::String(_) | Value::Array(_) if !self.request.is_root() => {
                tracing::trace!(subpath = %self.request.subpath(), "root-only exports");
                Ok(ExportsOutcome::Unmatched)
            }
            Value::Object(_) if !self.category.supports_object_exports() => {
                Ok(ExportsOutcome::Ignored)
            }
            Value::Object(map)
                if !self.request.is_root()
                    && validate_exports_object(map).status == ExportsStatus::Conditions =>
            {
                // A top-level condition map only describes the package root.
                tracing::trace!(
                    subpath = %self.request.subpath(),
                    "root-only conditional exports"
                );
                Err(self.not_exported(validate_exports_object(map).problems))
            }
            Value::String(_) | Value::Array(_) | Value::Object(_) => {
                match self.evaluate(exports, load_file)? {
                    Some(path) => Ok(ExportsOutcome::Resolved(path)),
                    None => Err(self.not_exported(Vec::new())),
                }
            }
            Value::Bool(_) | Value::Number(_) => {
                let kind = invalid_target_kind(exports).unwrap_or("scalar");
                Err(self.not_exported(vec![ExportsProblem::InvalidTarget {
                    key: ".".to_string(),
                    kind,
                }]))
            }
        }
    }

    /// Evaluate one node. `Ok(None)` means no match.
    pub fn evaluate<F>(
        &self,
        value: &Value,
        load_file: &mut F,
    ) -> Result<Option<PathBuf>, ResolveError>
    where
        F: FnMut(&Path) -> Result<Option<PathBuf>, ResolveError>,
    {
        let node = ExportsNode::classify(value, self.category)
            .map_err(|validation| self.not_exported(validation.problems))?;

        match node {
            None => Ok(None),
            Some(ExportsNode::Leaf(target)) => self.evaluate_leaf(target, load_file),
            Some(ExportsNode::Array(items)) => self.evaluate_array(items, load_file),
            Some(ExportsNode::Conditions(map)) => self.evaluate_conditions(map, load_file),
            Some(ExportsNode::Subpaths(map)) => self.evaluate_subpaths(map, load_file),
        }
    }

    fn evaluate_leaf<F>(
        &self,
        target: &str,
        load_file: &mut F,
    ) -> Result<Option<PathBuf>, ResolveError>
    where
        F: FnMut(&Path) -> Result<Option<PathBuf>, ResolveError>,
    {
        match self.target_path(target) {
            Some(path) => load_file(&path),
            None => {
                tracing::trace!(target, "rejected exports target");
                Ok(None)
            }
        }
    }

    fn evaluate_array<F>(
        &self,
        items: &[Value],
        load_file: &mut F,
    ) -> Result<Option<PathBuf>, ResolveError>
    where
        F: FnMut(&Path) -> Result<Option<PathBuf>, ResolveError>,
    {
        for item in items {
            if let Some(found) = self.evaluate(item, load_file)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn evaluate_conditions<F>(
        &self,
        map: &Map<String, Value>,
        load_file: &mut F,
    ) -> Result<Option<PathBuf>, ResolveError>
    where
        F: FnMut(&Path) -> Result<Option<PathBuf>, ResolveError>,
    {
        if self.category.default_condition_only() {
            return match map.get("default") {
                Some(value) => self.evaluate(value, load_file),
                None => Ok(None),
            };
        }

        for condition in self.conditions {
            if let Some(value) = map.get(condition.as_str()) {
                if let Some(found) = self.evaluate(value, load_file)? {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }

    fn evaluate_subpaths<F>(
        &self,
        map: &Map<String, Value>,
        load_file: &mut F,
    ) -> Result<Option<PathBuf>, ResolveError>
    where
        F: FnMut(&Path) -> Result<Option<PathBuf>, ResolveError>,
    {
        for (key, value) in map {
            if !self.request.matches_key(key) {
                continue;
            }
            if upath::ends_with_separator(key) && !self.category.supports_dir_slash() {
                tracing::trace!(key = %key, category = %self.category, "directory subpath disabled");
                continue;
            }
            if let Some(found) = self.evaluate(value, load_file)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Leaf target as an absolute path inside the package.
    ///
    /// Absolute targets and targets escaping the package are rejected.
    fn target_path(&self, target: &str) -> Option<PathBuf> {
        let relative = Path::new(target);
        if target.starts_with('/') || relative.is_absolute() {
            return None;
        }

        let package_dir = upath::normalize(self.package_dir);
        let resolved = upath::resolve(&package_dir, relative);
        resolved.starts_with(&package_dir).then_some(resolved)
    }

    fn not_exported(&self, problems: Vec<ExportsProblem>) -> ResolveError {
        ResolveError::PackagePathNotExported {
            subpath: self.request.subpath(),
            manifest: self.manifest.to_path_buf(),
            problems,
        }
    }
}
