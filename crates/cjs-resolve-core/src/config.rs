use crate::category::{categories_for_range, Category};
use crate::error::ResolveError;
use crate::paths::ProcessDefaults;
use crate::resolver::{FileSystem, Hooks};
use cjs_resolve_util::path as upath;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extensions tried after the bare candidate path.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js"];

/// Conditions tried, in order, against conditional `exports` maps.
pub const DEFAULT_CONDITIONS: &[&str] = &["require", "node", "default"];

/// Module directory searched in every ancestor.
pub const DEFAULT_MODULE_DIRECTORY: &str = "node_modules";

/// Category used when no resolution is requested, or `true` is.
pub const DEFAULT_CATEGORY: Category = Category::PreExports;

/// Which `exports` rules a call should follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resolution {
    /// `true` selects the default category; `false` is rejected.
    Flag(bool),
    /// Node.js version range; every category it overlaps is tried.
    Range(String),
    Select(ResolutionSelect),
}

/// Explicit category or engines selection.
///
/// Members are loosely typed so that malformed input is reported by
/// normalization rather than by deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionSelect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engines: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Value>,
}

impl Resolution {
    /// A single category.
    #[must_use]
    pub fn category(category: Category) -> Self {
        Self::Select(ResolutionSelect {
            category: Some(Value::from(category.as_str())),
            ..ResolutionSelect::default()
        })
    }

    /// Every category; the first one that resolves wins.
    #[must_use]
    pub fn engines() -> Self {
        Self::Select(ResolutionSelect {
            engines: Some(Value::Bool(true)),
            ..ResolutionSelect::default()
        })
    }

    #[must_use]
    pub fn range(range: impl Into<String>) -> Self {
        Self::Range(range.into())
    }

    /// Replace the active conditions. No effect on `Flag` and `Range`.
    #[must_use]
    pub fn with_conditions<I, S>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Self::Select(select) = &mut self {
            select.conditions = Some(Value::Array(
                conditions
                    .into_iter()
                    .map(|c| Value::String(c.into()))
                    .collect(),
            ));
        }
        self
    }
}

/// Caller options for one resolution call.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Directory to resolve from. Defaults to the current directory.
    pub basedir: Option<PathBuf>,
    /// Requesting file, used in not-found messages.
    pub filename: Option<PathBuf>,
    pub extensions: Option<Vec<String>>,
    pub resolution: Option<Resolution>,
    /// Defaults to true.
    pub include_core_modules: Option<bool>,
    pub preserve_symlinks: bool,
    /// Global search directories tried after every ancestor.
    pub paths: Option<Vec<PathBuf>>,
    /// Module directory names. Defaults to `node_modules`.
    pub module_directory: Option<Vec<String>>,
    /// Filesystem backend. Defaults to the host filesystem.
    pub fs: Option<Arc<dyn FileSystem>>,
    pub hooks: Hooks,
}

impl ResolveOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_basedir(mut self, basedir: impl Into<PathBuf>) -> Self {
        self.basedir = Some(basedir.into());
        self
    }

    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    #[must_use]
    pub fn with_core_modules(mut self, include: bool) -> Self {
        self.include_core_modules = Some(include);
        self
    }

    #[must_use]
    pub fn with_preserve_symlinks(mut self, preserve: bool) -> Self {
        self.preserve_symlinks = preserve;
        self
    }

    #[must_use]
    pub fn with_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.paths = Some(paths);
        self
    }

    #[must_use]
    pub fn with_module_directory<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.module_directory = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }
}

/// Normalized, immutable configuration for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Categories to try, in order.
    pub categories: Vec<Category>,
    pub conditions: Vec<String>,
    pub extensions: Vec<String>,
    pub include_core_modules: bool,
    pub preserve_symlinks: bool,
    /// Absolute start directory, not yet symlink-resolved.
    pub basedir: PathBuf,
    /// Whether the caller supplied `basedir`.
    pub explicit_basedir: bool,
    /// Label for not-found messages.
    pub parent: PathBuf,
    pub paths: Vec<PathBuf>,
    pub module_directories: Vec<String>,
}

impl Config {
    /// Validate `options` and fill in defaults.
    pub fn normalize(
        options: &ResolveOptions,
        defaults: &ProcessDefaults,
    ) -> Result<Self, ResolveError> {
        options.hooks.validate()?;

        let overridden = defaults.category_override.as_ref().map(|category| {
            Resolution::Select(ResolutionSelect {
                category: Some(Value::from(category.as_str())),
                ..ResolutionSelect::default()
            })
        });
        let (categories, conditions) =
            select_categories(overridden.as_ref().or(options.resolution.as_ref()))?;

        let basedir = match options.basedir.as_deref() {
            Some(dir) if dir.is_absolute() => upath::normalize(dir),
            other => {
                let cwd = std::env::current_dir().map_err(|err| ResolveError::io(".", err))?;
                upath::resolve(&cwd, other.unwrap_or(Path::new(".")))
            }
        };
        let parent = options
            .filename
            .clone()
            .or_else(|| options.basedir.clone())
            .unwrap_or_else(|| basedir.clone());

        Ok(Self {
            categories,
            conditions,
            extensions: options
                .extensions
                .clone()
                .unwrap_or_else(|| to_strings(DEFAULT_EXTENSIONS)),
            include_core_modules: options.include_core_modules.unwrap_or(true),
            preserve_symlinks: options.preserve_symlinks,
            basedir,
            explicit_basedir: options.basedir.is_some(),
            parent,
            paths: options
                .paths
                .clone()
                .unwrap_or_else(|| defaults.global_paths.clone()),
            module_directories: options
                .module_directory
                .clone()
                .unwrap_or_else(|| vec![DEFAULT_MODULE_DIRECTORY.to_string()]),
        })
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn category_error() -> ResolveError {
    ResolveError::invalid_options(format!(
        "`resolution` must be `true`, a semver range string, `{{ category }}` with a known node “exports” category ({}), or `{{ engines: true }}`",
        Category::names()
    ))
}

fn select_categories(
    resolution: Option<&Resolution>,
) -> Result<(Vec<Category>, Vec<String>), ResolveError> {
    let conditions = to_strings(DEFAULT_CONDITIONS);

    match resolution {
        None | Some(Resolution::Flag(true)) => Ok((vec![DEFAULT_CATEGORY], conditions)),
        Some(Resolution::Flag(false)) => Err(category_error()),
        Some(Resolution::Range(range)) => {
            let categories = categories_for_range(range).map_err(|err| {
                ResolveError::invalid_options(format!("{err}: {}", category_error()))
            })?;
            if categories.is_empty() {
                return Err(category_error());
            }
            Ok((categories, conditions))
        }
        Some(Resolution::Select(select)) => select_explicit(select),
    }
}

fn select_explicit(
    select: &ResolutionSelect,
) -> Result<(Vec<Category>, Vec<String>), ResolveError> {
    if select.engines.is_some() && select.category.is_some() {
        return Err(category_error());
    }

    let category = match &select.category {
        None => None,
        Some(Value::String(name)) => Some(name.parse::<Category>().map_err(|_| category_error())?),
        Some(_) => return Err(category_error()),
    };

    let categories = match (&select.engines, category) {
        (Some(Value::Bool(true)), _) => Category::ALL.to_vec(),
        (Some(_), _) | (None, None) => return Err(category_error()),
        (None, Some(category)) => vec![category],
    };

    let conditions = match &select.conditions {
        None => to_strings(DEFAULT_CONDITIONS),
        Some(value) => {
            if category.is_some_and(|c| !c.accepts_conditions()) {
                return Err(ResolveError::invalid_options(
                    "`conditions` is not supported for the `pre-exports` or `broken` categories",
                ));
            }
            parse_conditions(value)?
        }
    };

    Ok((categories, conditions))
}

fn parse_conditions(value: &Value) -> Result<Vec<String>, ResolveError> {
    let invalid = || ResolveError::invalid_options("`conditions` must be an array of strings");
    let Value::Array(items) = value else {
        return Err(invalid());
    };
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(resolution: Resolution) -> Result<Config, ResolveError> {
        let options = ResolveOptions::new()
            .with_basedir("/tmp")
            .with_resolution(resolution);
        Config::normalize(&options, &ProcessDefaults::default())
    }

    fn message(result: Result<Config, ResolveError>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn test_defaults() {
        let config = Config::normalize(
            &ResolveOptions::new().with_basedir("/tmp"),
            &ProcessDefaults::default().with_global_paths(vec![PathBuf::from("/g")]),
        )
        .unwrap();

        assert_eq!(config.categories, vec![Category::PreExports]);
        assert_eq!(config.conditions, vec!["require", "node", "default"]);
        assert_eq!(config.extensions, vec![".js"]);
        assert!(config.include_core_modules);
        assert!(!config.preserve_symlinks);
        assert!(config.explicit_basedir);
        assert_eq!(config.paths, vec![PathBuf::from("/g")]);
        assert_eq!(config.module_directories, vec!["node_modules"]);
        assert_eq!(config.parent, PathBuf::from("/tmp"));
    }

    #[test]
    fn test_relative_basedir_is_absolutized() {
        let config = Config::normalize(
            &ResolveOptions::new().with_basedir("some/dir"),
            &ProcessDefaults::default(),
        )
        .unwrap();
        assert!(config.basedir.is_absolute());
        assert!(config.basedir.ends_with("some/dir"));
        assert_eq!(config.parent, PathBuf::from("some/dir"));
    }

    #[test]
    fn test_missing_basedir_uses_cwd() {
        let config = Config::normalize(&ResolveOptions::new(), &ProcessDefaults::default()).unwrap();
        assert_eq!(config.basedir, std::env::current_dir().unwrap());
        assert!(!config.explicit_basedir);
    }

    #[test]
    fn test_filename_is_parent() {
        let options = ResolveOptions::new()
            .with_basedir("/tmp")
            .with_filename("/tmp/main.js");
        let config = Config::normalize(&options, &ProcessDefaults::default()).unwrap();
        assert_eq!(config.parent, PathBuf::from("/tmp/main.js"));
    }

    #[test]
    fn test_true_and_false() {
        assert_eq!(
            normalize(Resolution::Flag(true)).unwrap().categories,
            vec![Category::PreExports]
        );
        assert!(message(normalize(Resolution::Flag(false))).contains("`resolution` must be"));
        assert!(normalize(Resolution::range("")).is_err());
    }

    #[test]
    fn test_range() {
        let config = normalize(Resolution::range(">= 17")).unwrap();
        assert_eq!(config.categories, vec![Category::PatternTrailersNoDirSlash]);
        assert!(normalize(Resolution::range("garbage")).is_err());
    }

    #[test]
    fn test_category_and_engines() {
        assert_eq!(
            normalize(Resolution::category(Category::Conditions))
                .unwrap()
                .categories,
            vec![Category::Conditions]
        );
        assert_eq!(
            normalize(Resolution::engines()).unwrap().categories,
            Category::ALL.to_vec()
        );
    }

    #[test]
    fn test_select_rejections() {
        let both = ResolutionSelect {
            engines: Some(json!(true)),
            category: Some(json!("conditions")),
            conditions: None,
        };
        assert!(normalize(Resolution::Select(both)).is_err());

        let unknown = ResolutionSelect {
            category: Some(json!("modern")),
            ..ResolutionSelect::default()
        };
        assert!(normalize(Resolution::Select(unknown)).is_err());

        let engines_false = ResolutionSelect {
            engines: Some(json!(false)),
            ..ResolutionSelect::default()
        };
        assert!(normalize(Resolution::Select(engines_false)).is_err());

        assert!(normalize(Resolution::Select(ResolutionSelect::default())).is_err());
    }

    #[test]
    fn test_conditions() {
        let config =
            normalize(Resolution::category(Category::Conditions).with_conditions(["browser"]))
                .unwrap();
        assert_eq!(config.conditions, vec!["browser"]);

        let err = message(normalize(
            Resolution::category(Category::Broken).with_conditions(["browser"]),
        ));
        assert!(err.contains("`pre-exports` or `broken`"));

        let bad = ResolutionSelect {
            category: Some(json!("conditions")),
            conditions: Some(json!(["ok", 1])),
            ..ResolutionSelect::default()
        };
        assert!(message(normalize(Resolution::Select(bad))).contains("array of strings"));

        let engines =
            normalize(Resolution::engines().with_conditions(["require"])).unwrap();
        assert_eq!(engines.conditions, vec!["require"]);
    }

    #[test]
    fn test_env_override_replaces_resolution() {
        let options = ResolveOptions::new()
            .with_basedir("/tmp")
            .with_resolution(Resolution::Flag(false));
        let defaults = ProcessDefaults::default().with_category_override("patterns");
        let config = Config::normalize(&options, &defaults).unwrap();
        assert_eq!(config.categories, vec![Category::Patterns]);
    }

    #[test]
    fn test_resolution_deserializes_untagged() {
        let parsed: Resolution = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(parsed, Resolution::Flag(true));

        let parsed: Resolution = serde_json::from_value(json!("^14")).unwrap();
        assert_eq!(parsed, Resolution::range("^14"));

        let parsed: Resolution =
            serde_json::from_value(json!({ "category": "conditions" })).unwrap();
        assert_eq!(parsed, Resolution::category(Category::Conditions));
    }
}
