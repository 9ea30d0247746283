//! Parse command implementation.
//!
//! Splits a filter string into conditions without consulting a schema.

use query_filter_rs::FilterParser;
use tracing::debug;

use super::{CommandContext, Result};
use crate::output::{format_conditions_json, format_conditions_table};

/// Options for the parse command.
#[derive(Debug)]
pub struct ParseOptions {
    /// Raw filter string.
    pub filters: String,
    /// Optional sort token.
    pub sort: Option<String>,
}

/// Executes the parse command.
///
/// # Errors
///
/// Returns an error if the filter string or sort token is malformed.
pub fn execute(ctx: &CommandContext, opts: &ParseOptions) -> Result<()> {
    let conditions = FilterParser::parse(&opts.filters)?;
    let sort = opts
        .sort
        .as_deref()
        .map(FilterParser::parse_sort)
        .transpose()?;
    debug!(conditions = conditions.len(), "parsed filter string");

    if ctx.json_output {
        println!("{}", format_conditions_json(&conditions, sort.as_ref())?);
    } else if !ctx.quiet {
        print!(
            "{}",
            format_conditions_table(&conditions, sort.as_ref(), ctx.use_colors)
        );
    }

    Ok(())
}
