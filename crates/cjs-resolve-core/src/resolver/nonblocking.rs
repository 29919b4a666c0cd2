//! Asynchronous entry point.

use super::resolve::resolve_with_defaults;
use crate::config::ResolveOptions;
use crate::error::ResolveError;
use crate::paths::ProcessDefaults;
use std::path::PathBuf;

/// Resolve `specifier` without blocking the async runtime.
///
/// Runs the synchronous algorithm on tokio's blocking pool, so probe order
/// and results are identical to [`super::resolve`].
pub async fn resolve_async(
    specifier: impl Into<String>,
    options: ResolveOptions,
) -> Result<PathBuf, ResolveError> {
    let specifier = specifier.into();
    tokio::task::spawn_blocking(move || {
        resolve_with_defaults(&specifier, &options, ProcessDefaults::global())
    })
    .await?
}
