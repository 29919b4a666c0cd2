use cjs_resolve_core::version::OUTPUT_SCHEMA_VERSION;
use cjs_resolve_core::{categories_for_range, Category};
use miette::{miette, IntoDiagnostic, Result};
use serde::Serialize;

#[derive(Serialize)]
struct CategoriesOutput<'a> {
    ok: bool,
    schema_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<&'a str>,
    categories: Vec<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// List categories, optionally restricted to those overlapping `range`.
pub fn run(range: Option<&str>, json: bool) -> Result<()> {
    let categories = match range {
        Some(range) => categories_for_range(range),
        None => Ok(Category::ALL.to_vec()),
    };

    match categories {
        Ok(categories) => {
            if json {
                let output = CategoriesOutput {
                    ok: true,
                    schema_version: OUTPUT_SCHEMA_VERSION,
                    range,
                    categories,
                    message: None,
                };
                println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
            } else {
                for category in categories {
                    println!("{category}");
                }
            }
            Ok(())
        }
        Err(err) if json => {
            let output = CategoriesOutput {
                ok: false,
                schema_version: OUTPUT_SCHEMA_VERSION,
                range,
                categories: Vec::new(),
                message: Some(err.to_string()),
            };
            println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
            std::process::exit(1);
        }
        Err(err) => Err(miette!("{err}")),
    }
}
