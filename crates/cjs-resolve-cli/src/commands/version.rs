use cjs_resolve_core::version::{version_string, OUTPUT_SCHEMA_VERSION};
use cjs_resolve_core::VERSION;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput<'a> {
    schema_version: u32,
    version: &'a str,
}

pub fn run(json: bool) -> Result<()> {
    if json {
        let output = VersionOutput {
            schema_version: OUTPUT_SCHEMA_VERSION,
            version: VERSION,
        };
        println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
    } else {
        println!("{}", version_string());
    }
    Ok(())
}
