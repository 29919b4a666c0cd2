//! CommonJS module resolver.
//!
//! Resolves relative and absolute paths, core modules and packages found in
//! `node_modules` directories. Package entry points come from `exports`
//! (under the rules of the active [`crate::Category`]), then `main`, then
//! `index`.
//!
//! All storage access goes through a [`FileSystem`] backend and optional
//! per-call [`Hooks`].

mod candidates;
mod exports;
mod manifest;
mod nonblocking;
mod probe;
mod resolve;
mod specifier;

pub use candidates::{node_modules_paths, package_candidates};
pub use exports::{
    validate_exports_object, ExportsContext, ExportsNode, ExportsOutcome, ExportsProblem,
    ExportsRequest, ExportsStatus, ExportsValidation,
};
pub use manifest::{PackageManifest, MANIFEST_FILE};
pub use nonblocking::resolve_async;
pub use probe::{
    FileSystem, Hooks, PackageFilterHook, PackageIteratorHook, PathFilterHook,
    PathPredicateHook, ReadFileHook, ReadManifestError, ReadPackageHook, RealFs, RealpathHook,
};
pub use resolve::{nearest_manifest, resolve, resolve_with_defaults};
pub use specifier::{is_path_specifier, split_package_specifier, SpecifierKind};
