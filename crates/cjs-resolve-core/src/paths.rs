use std::path::PathBuf;
use std::sync::OnceLock;

/// Environment variable forcing the active category for every call in this process.
///
/// Debugging and testing escape hatch; an empty value is ignored.
pub const CATEGORY_OVERRIDE_ENV: &str = "CJS_RESOLVE_CATEGORY";

/// Global module directories searched after every `node_modules` ancestor.
///
/// - `~/.node_modules`
/// - `~/.node_libraries`
///
/// Empty when the home directory cannot be determined.
#[must_use]
pub fn default_global_paths() -> Vec<PathBuf> {
    dirs_next::home_dir()
        .map(|home| vec![home.join(".node_modules"), home.join(".node_libraries")])
        .unwrap_or_default()
}

/// Defaults shared by every resolution call in a process.
///
/// Computed once and threaded into option normalization explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessDefaults {
    /// Extra search paths used when the caller supplies none.
    pub global_paths: Vec<PathBuf>,
    /// Category name forced by [`CATEGORY_OVERRIDE_ENV`].
    pub category_override: Option<String>,
}

impl ProcessDefaults {
    /// Read defaults from the home directory and environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            global_paths: default_global_paths(),
            category_override: std::env::var(CATEGORY_OVERRIDE_ENV)
                .ok()
                .filter(|value| !value.is_empty()),
        }
    }

    /// The process-wide instance, computed on first use.
    #[must_use]
    pub fn global() -> &'static Self {
        static DEFAULTS: OnceLock<ProcessDefaults> = OnceLock::new();
        DEFAULTS.get_or_init(Self::from_env)
    }

    /// Set the forced category.
    #[must_use]
    pub fn with_category_override(mut self, category: impl Into<String>) -> Self {
        self.category_override = Some(category.into());
        self
    }

    /// Set the default global search paths.
    #[must_use]
    pub fn with_global_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.global_paths = paths;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_global_paths_under_home() {
        let paths = default_global_paths();
        if let Some(home) = dirs_next::home_dir() {
            assert_eq!(
                paths,
                vec![home.join(".node_modules"), home.join(".node_libraries")]
            );
        } else {
            assert!(paths.is_empty());
        }
    }

    #[test]
    #[serial]
    fn test_from_env_reads_override() {
        std::env::set_var(CATEGORY_OVERRIDE_ENV, "conditions");
        let defaults = ProcessDefaults::from_env();
        std::env::remove_var(CATEGORY_OVERRIDE_ENV);

        assert_eq!(defaults.category_override.as_deref(), Some("conditions"));
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_empty_override() {
        std::env::set_var(CATEGORY_OVERRIDE_ENV, "");
        let defaults = ProcessDefaults::from_env();
        std::env::remove_var(CATEGORY_OVERRIDE_ENV);

        assert_eq!(defaults.category_override, None);
    }

    #[test]
    fn test_builders() {
        let defaults = ProcessDefaults::default()
            .with_category_override("broken")
            .with_global_paths(vec![PathBuf::from("/g")]);
        assert_eq!(defaults.category_override.as_deref(), Some("broken"));
        assert_eq!(defaults.global_paths, vec![PathBuf::from("/g")]);
    }
}
