#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod category;
pub mod config;
pub mod core_modules;
pub mod error;
pub mod paths;
pub mod resolver;
pub mod version;

pub use category::{categories_for_range, category_for_version, Category};
pub use config::{Config, Resolution, ResolutionSelect, ResolveOptions};
pub use core_modules::is_core_module;
pub use error::{codes, ResolveError};
pub use paths::ProcessDefaults;
pub use resolver::{
    nearest_manifest, resolve, resolve_async, resolve_with_defaults, validate_exports_object,
    ExportsProblem, FileSystem, Hooks, PackageManifest, RealFs,
};
pub use version::VERSION;
