use cjs_resolve_core::version::OUTPUT_SCHEMA_VERSION;
use cjs_resolve_core::{
    resolve, resolve_async, Category, Resolution, ResolveError, ResolveOptions,
};
use miette::{IntoDiagnostic, MietteDiagnostic, Report, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(clap::Args, Debug)]
#[command(group(clap::ArgGroup::new("selection").args(["category", "engines"])))]
pub struct ResolveArgs {
    /// Module specifier (e.g. "./lib", "lodash/fp", "fs")
    pub specifier: String,

    /// Directory to resolve from [default: working directory]
    #[arg(long, value_name = "DIR")]
    pub basedir: Option<PathBuf>,

    /// Requesting file, named in not-found errors
    #[arg(long, value_name = "FILE")]
    pub filename: Option<PathBuf>,

    /// Extensions to try, in order [default: .js]
    #[arg(long, value_delimiter = ',', value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Exports category to emulate
    #[arg(long, conflicts_with_all = ["range", "engines"])]
    pub category: Option<Category>,

    /// Node.js version range; every overlapping category is tried
    #[arg(long, value_name = "RANGE", conflicts_with = "engines")]
    pub range: Option<String>,

    /// Try every category, first success wins
    #[arg(long)]
    pub engines: bool,

    /// Conditions for conditional exports, in order (needs --category or --engines)
    #[arg(long, value_delimiter = ',', conflicts_with = "range", requires = "selection")]
    pub conditions: Vec<String>,

    /// Resolve built-in module names like any other package
    #[arg(long)]
    pub no_core_modules: bool,

    /// Do not resolve symlinks in the result
    #[arg(long)]
    pub preserve_symlinks: bool,

    /// Global search directories [default: ~/.node_modules,~/.node_libraries]
    #[arg(long, value_delimiter = ',', value_name = "DIR")]
    pub paths: Vec<PathBuf>,

    /// Module directory names [default: node_modules]
    #[arg(long, value_delimiter = ',', value_name = "NAME")]
    pub module_directory: Vec<String>,

    /// Resolve on the async runtime
    #[arg(long = "async")]
    pub nonblocking: bool,
}

impl ResolveArgs {
    fn resolution(&self) -> Option<Resolution> {
        let selected = match (self.category, self.engines, &self.range) {
            (Some(category), _, _) => Some(Resolution::category(category)),
            (None, true, _) => Some(Resolution::engines()),
            (None, false, Some(range)) => Some(Resolution::range(range.clone())),
            (None, false, None) => None,
        };

        match selected {
            Some(selected) if !self.conditions.is_empty() => {
                Some(selected.with_conditions(self.conditions.iter().cloned()))
            }
            other => other,
        }
    }

    fn options(&self, cwd: &Path) -> ResolveOptions {
        let basedir = self
            .basedir
            .as_ref()
            .map_or_else(|| cwd.to_path_buf(), |dir| cwd.join(dir));

        ResolveOptions {
            basedir: Some(basedir),
            filename: self.filename.as_ref().map(|file| cwd.join(file)),
            extensions: non_empty(&self.extensions),
            resolution: self.resolution(),
            include_core_modules: Some(!self.no_core_modules),
            preserve_symlinks: self.preserve_symlinks,
            paths: non_empty(&self.paths),
            module_directory: non_empty(&self.module_directory),
            ..ResolveOptions::default()
        }
    }
}

fn non_empty<T: Clone>(items: &[T]) -> Option<Vec<T>> {
    (!items.is_empty()).then(|| items.to_vec())
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    ok: bool,
    schema_version: u32,
    specifier: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    problems: Vec<String>,
}

/// Run the resolve command.
pub fn run(cwd: &Path, args: ResolveArgs, json: bool) -> Result<()> {
    let options = args.options(cwd);
    tracing::debug!(specifier = %args.specifier, basedir = ?options.basedir, "resolve command");

    let result = if args.nonblocking {
        let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
        runtime.block_on(resolve_async(args.specifier.clone(), options))
    } else {
        resolve(&args.specifier, &options)
    };

    match result {
        Ok(resolved) => {
            if json {
                let output = ResolveOutput {
                    ok: true,
                    schema_version: OUTPUT_SCHEMA_VERSION,
                    specifier: &args.specifier,
                    resolved: Some(resolved),
                    code: None,
                    message: None,
                    problems: Vec::new(),
                };
                println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
            } else {
                println!("{}", resolved.display());
            }
            Ok(())
        }
        Err(err) if json => {
            let output = ResolveOutput {
                ok: false,
                schema_version: OUTPUT_SCHEMA_VERSION,
                specifier: &args.specifier,
                resolved: None,
                code: err.code(),
                message: Some(err.to_string()),
                problems: problems(&err),
            };
            println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
            std::process::exit(1);
        }
        Err(err) => Err(diagnostic(&err)),
    }
}

fn problems(err: &ResolveError) -> Vec<String> {
    match err {
        ResolveError::PackagePathNotExported { problems, .. } => {
            problems.iter().map(ToString::to_string).collect()
        }
        _ => Vec::new(),
    }
}

fn diagnostic(err: &ResolveError) -> Report {
    let mut diagnostic = MietteDiagnostic::new(err.to_string());
    if let Some(code) = err.code() {
        diagnostic = diagnostic.with_code(code);
    }
    let problems = problems(err);
    if !problems.is_empty() {
        diagnostic = diagnostic.with_help(problems.join("\n"));
    }
    Report::new(diagnostic)
}
