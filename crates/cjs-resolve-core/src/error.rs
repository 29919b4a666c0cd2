use crate::resolver::ExportsProblem;
use std::path::PathBuf;
use thiserror::Error;

/// Stable error codes carried by resolution failures.
pub mod codes {
    pub const MODULE_NOT_FOUND: &str = "MODULE_NOT_FOUND";
    pub const INVALID_BASEDIR: &str = "INVALID_BASEDIR";
    pub const ERR_PACKAGE_PATH_NOT_EXPORTED: &str = "ERR_PACKAGE_PATH_NOT_EXPORTED";
    pub const INVALID_PACKAGE_MAIN: &str = "INVALID_PACKAGE_MAIN";
    pub const INCORRECT_PACKAGE_MAIN: &str = "INCORRECT_PACKAGE_MAIN";
}

/// Error type for a resolution call.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Caller misuse: bad options or an unusable configuration.
    #[error("{0}")]
    InvalidOptions(String),

    #[error("Cannot find module '{specifier}' from '{parent}'")]
    ModuleNotFound { specifier: String, parent: PathBuf },

    #[error("Provided basedir \"{}\" is not a directory{}", .basedir.display(), symlink_hint(.preserve_symlinks))]
    InvalidBasedir {
        basedir: PathBuf,
        preserve_symlinks: bool,
    },

    #[error("Package subpath '{subpath}' is not defined by \"exports\" in '{}'", .manifest.display())]
    PackagePathNotExported {
        subpath: String,
        manifest: PathBuf,
        problems: Vec<ExportsProblem>,
    },

    #[error("package “{name}” `main` must be a string")]
    InvalidPackageMain { name: String },

    #[error("Cannot find module '{}'. Please verify that the package.json has a valid \"main\" entry", .path.display())]
    IncorrectPackageMain { path: PathBuf },

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("resolution task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn symlink_hint(preserve_symlinks: &bool) -> &'static str {
    if *preserve_symlinks {
        ""
    } else {
        ", or a symlink to a directory"
    }
}

impl ResolveError {
    #[must_use]
    pub fn invalid_options(msg: impl Into<String>) -> Self {
        Self::InvalidOptions(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable code for user-visible failures. Configuration and I/O errors have none.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::ModuleNotFound { .. } => Some(codes::MODULE_NOT_FOUND),
            Self::InvalidBasedir { .. } => Some(codes::INVALID_BASEDIR),
            Self::PackagePathNotExported { .. } => Some(codes::ERR_PACKAGE_PATH_NOT_EXPORTED),
            Self::InvalidPackageMain { .. } => Some(codes::INVALID_PACKAGE_MAIN),
            Self::IncorrectPackageMain { .. } => Some(codes::INCORRECT_PACKAGE_MAIN),
            Self::InvalidOptions(_) | Self::Io { .. } | Self::Task(_) => None,
        }
    }

    /// Whether this error ends a resolution call regardless of remaining categories.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidOptions(_) | Self::InvalidBasedir { .. } | Self::Io { .. } | Self::Task(_)
        )
    }
}
