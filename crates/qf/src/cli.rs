//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the qf CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// qf - Parse, compile and run record filters
#[derive(Parser, Debug)]
#[command(name = "qf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug logs)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a filter string and print its conditions
    #[command(alias = "p")]
    Parse {
        /// Filter string (e.g., "age__gte=18,status__in=active,pending")
        filters: String,

        /// Also parse a sort token (e.g., "-age")
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<String>,
    },

    /// Compile a query against a schema and print the predicate
    #[command(alias = "c")]
    Compile {
        #[command(flatten)]
        query: QueryArgs,

        /// Render as SQL instead of a predicate
        #[arg(long)]
        sql: bool,

        /// Table name used in the SQL statement (default: schema name)
        #[arg(long, requires = "sql")]
        table: Option<String>,
    },

    /// Run a query against a JSON array of records
    #[command(alias = "q")]
    Query {
        #[command(flatten)]
        query: QueryArgs,

        /// JSON file holding an array of records
        #[arg(short, long)]
        data: PathBuf,

        /// Fields to show as table columns (comma-separated)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Schema and request arguments shared by `compile` and `query`.
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Schema file (TOML) describing the record fields
    #[arg(short = 'S', long)]
    pub schema: PathBuf,

    /// Filter string
    #[arg(short, long)]
    pub filter: Option<String>,

    /// JSON file holding a filter tree (object or array of objects)
    #[arg(long)]
    pub tree: Option<PathBuf>,

    /// Free-text search over the searchable fields
    #[arg(short, long)]
    pub search: Option<String>,

    /// Restrict search to these fields (comma-separated)
    #[arg(long, value_delimiter = ',', requires = "search")]
    pub search_fields: Vec<String>,

    /// Sort token: field or -field
    #[arg(long, allow_hyphen_values = true)]
    pub sort: Option<String>,

    /// Page number (starting at 1)
    #[arg(long)]
    pub page: Option<usize>,

    /// Page size
    #[arg(long)]
    pub size: Option<usize>,
}

/// Shell types for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Print config file path
    Path,
}
