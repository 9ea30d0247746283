//! Command implementations for the qf CLI.
//!
//! This module contains the actual command handlers that are invoked by the CLI.

pub mod compile;
pub mod completions;
pub mod config;
pub mod parse;
pub mod query;

use std::fs;
use std::path::Path;

use query_filter_rs::catalogue::SchemaDef;
use query_filter_rs::{CompiledQuery, FilterError, FilterParam, Predicate, QueryCompiler, QueryParams};
use tracing::debug;

use crate::cli::{Cli, QueryArgs};

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Filter parsing or compilation error.
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CommandError {
    /// Moves library configuration errors into the `Config` variant.
    pub fn from_filter(e: FilterError) -> Self {
        match e {
            FilterError::Config { message } => CommandError::Config(message),
            other => CommandError::Filter(other),
        }
    }
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color,
            quiet: cli.quiet,
            verbose: cli.verbose,
        }
    }
}

/// Reads a TOML schema file.
pub fn load_schema(path: &Path) -> Result<SchemaDef> {
    let content = fs::read_to_string(path)?;
    let schema = SchemaDef::from_toml_str(&content).map_err(CommandError::from_filter)?;
    debug!(path = %path.display(), fields = schema.fields.len(), "loaded schema");
    Ok(schema)
}

/// Reads a filter tree file: one JSON object or an array of them.
pub fn load_tree(path: &Path) -> Result<Vec<FilterParam>> {
    let content = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    let params = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        other => vec![serde_json::from_value(other)?],
    };
    Ok(params)
}

/// Builds a compiler for the schema named in `args`, using the user's config.
pub fn build_compiler(args: &QueryArgs) -> Result<QueryCompiler> {
    let config = config::load_config()?;
    let mut catalogue = load_schema(&args.schema)?.into_catalogue();

    if !args.search_fields.is_empty() {
        let fields: Vec<&str> = args.search_fields.iter().map(String::as_str).collect();
        catalogue = catalogue.with_searchable(&fields)?;
    }

    Ok(QueryCompiler::with_config(catalogue, &config))
}

/// Compiles the filter string, tree, search, sort and page in `args`.
pub fn build_query(compiler: &QueryCompiler, args: &QueryArgs) -> Result<CompiledQuery> {
    let params = QueryParams {
        page: args.page,
        size: args.size,
        sort_by: args.sort.clone(),
        search: args.search.clone(),
        filters: args.filter.clone(),
    };
    let mut query = compiler.compile_params(&params)?;

    if let Some(path) = &args.tree {
        let tree = compiler.compile_filter_params(&load_tree(path)?)?.predicate;
        query.predicate = if query.predicate.is_always() {
            tree
        } else {
            Predicate::all(vec![query.predicate, tree])
        };
    }

    Ok(query)
}
