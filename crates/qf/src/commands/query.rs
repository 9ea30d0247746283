//! Query command implementation.
//!
//! Runs a compiled query over records loaded from a JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{build_compiler, build_query, CommandContext, CommandError, Result};
use crate::cli::QueryArgs;
use crate::output::{format_page_json, format_page_table};

/// Options for the query command.
#[derive(Debug)]
pub struct QueryOptions {
    /// Schema and request arguments.
    pub query: QueryArgs,
    /// JSON file holding the records.
    pub data: PathBuf,
    /// Columns to display.
    pub fields: Vec<String>,
}

/// Executes the query command.
///
/// # Errors
///
/// Returns an error if the schema, config or data file cannot be loaded,
/// or if the request fails validation.
pub fn execute(ctx: &CommandContext, opts: &QueryOptions) -> Result<()> {
    let compiler = build_compiler(&opts.query)?;
    let query = build_query(&compiler, &opts.query)?;
    let records = load_records(&opts.data)?;
    if ctx.verbose {
        eprintln!("Loaded {} records from {}", records.len(), opts.data.display());
    }

    let page = query.execute(&records);
    debug!(
        records = records.len(),
        matched = page.total,
        returned = page.items.len(),
        "executed query"
    );

    if ctx.json_output {
        println!("{}", format_page_json(&page)?);
    } else if !ctx.quiet {
        print!("{}", format_page_table(&page, &opts.fields, ctx.use_colors));
    }

    Ok(())
}

/// Reads a JSON array of records.
pub fn load_records(path: &Path) -> Result<Vec<serde_json::Value>> {
    let content = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;

    let serde_json::Value::Array(records) = value else {
        return Err(CommandError::Config(format!(
            "{} must hold a JSON array of records",
            path.display()
        )));
    };

    let objects = records.iter().filter(|r| r.is_object()).count();
    if objects < records.len() {
        warn!(
            skipped = records.len() - objects,
            "data file contains non-object entries; they never match"
        );
    }

    Ok(records)
}
