//! Compile command implementation.
//!
//! Validates a request against a schema and prints the resulting predicate,
//! or the equivalent SQL statement.

use tracing::debug;

use super::{build_compiler, build_query, CommandContext, Result};
use crate::cli::QueryArgs;
use crate::output::{format_query_json, format_query_text, format_sql_json, format_sql_text};

/// Options for the compile command.
#[derive(Debug)]
pub struct CompileOptions {
    /// Schema and request arguments.
    pub query: QueryArgs,
    /// Render SQL instead of the predicate.
    pub sql: bool,
    /// Table name for the SQL statement.
    pub table: Option<String>,
}

/// Executes the compile command.
///
/// # Errors
///
/// Returns an error if the schema or config cannot be loaded, or if the
/// request fails validation.
pub fn execute(ctx: &CommandContext, opts: &CompileOptions) -> Result<()> {
    let compiler = build_compiler(&opts.query)?;
    let query = build_query(&compiler, &opts.query)?;
    debug!(predicate = %query.predicate, "compiled query");

    if opts.sql {
        let table = opts
            .table
            .as_deref()
            .unwrap_or_else(|| compiler.catalogue().name());
        let sql = query.to_sql(table);

        if ctx.json_output {
            println!("{}", format_sql_json(&sql)?);
        } else if !ctx.quiet {
            print!("{}", format_sql_text(&sql, ctx.use_colors));
        }
    } else if ctx.json_output {
        println!("{}", format_query_json(&query)?);
    } else if !ctx.quiet {
        print!("{}", format_query_text(&query, ctx.use_colors));
    }

    Ok(())
}
