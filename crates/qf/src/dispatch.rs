//! Command dispatch module for routing CLI commands to their handlers.

use crate::cli::{Cli, Commands, ConfigCommands, QueryArgs, Shell};
use crate::commands::{self, CommandContext, CommandError, Result};

/// Trait for executable commands.
pub trait Command {
    /// Execute the command.
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// A command selected on the command line.
pub enum Dispatch<'a> {
    Parse {
        filters: &'a str,
        sort: &'a Option<String>,
    },
    Compile {
        query: &'a QueryArgs,
        sql: bool,
        table: &'a Option<String>,
    },
    Query {
        query: &'a QueryArgs,
        data: &'a std::path::Path,
        fields: &'a [String],
    },
    Config(&'a Option<ConfigCommands>),
    Completions(&'a Shell),
    Help,
}

impl<'a> Dispatch<'a> {
    /// Creates a dispatch from the parsed CLI.
    pub fn from_cli(cli: &'a Cli) -> Self {
        match &cli.command {
            Some(Commands::Parse { filters, sort }) => Self::Parse { filters, sort },
            Some(Commands::Compile { query, sql, table }) => Self::Compile {
                query,
                sql: *sql,
                table,
            },
            Some(Commands::Query {
                query,
                data,
                fields,
            }) => Self::Query {
                query,
                data,
                fields,
            },
            Some(Commands::Config { command }) => Self::Config(command),
            Some(Commands::Completions { shell }) => Self::Completions(shell),
            None => Self::Help,
        }
    }
}

impl Command for Dispatch<'_> {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Self::Parse { filters, sort } => {
                let opts = commands::parse::ParseOptions {
                    filters: filters.to_string(),
                    sort: (*sort).clone(),
                };
                commands::parse::execute(ctx, &opts)
            }
            Self::Compile { query, sql, table } => {
                let opts = commands::compile::CompileOptions {
                    query: (*query).clone(),
                    sql: *sql,
                    table: (*table).clone(),
                };
                commands::compile::execute(ctx, &opts)
            }
            Self::Query {
                query,
                data,
                fields,
            } => {
                let opts = commands::query::QueryOptions {
                    query: (*query).clone(),
                    data: data.to_path_buf(),
                    fields: fields.to_vec(),
                };
                commands::query::execute(ctx, &opts)
            }
            Self::Config(command) => dispatch_config(ctx, command),
            Self::Completions(shell) => {
                commands::completions::execute(shell).map_err(CommandError::Io)
            }
            Self::Help => {
                if !ctx.quiet {
                    println!("qf - record filter toolkit");
                    println!("Use --help for usage information");
                }
                Ok(())
            }
        }
    }
}

/// Dispatch config subcommands.
fn dispatch_config(ctx: &CommandContext, command: &Option<ConfigCommands>) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx),
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_cli_routes_commands() {
        let cli = Cli::parse_from(["qf", "parse", "a__eq=1"]);
        assert!(matches!(Dispatch::from_cli(&cli), Dispatch::Parse { filters: "a__eq=1", .. }));

        let cli = Cli::parse_from(["qf", "compile", "-S", "s.toml", "--sql"]);
        assert!(matches!(
            Dispatch::from_cli(&cli),
            Dispatch::Compile { sql: true, .. }
        ));

        let cli = Cli::parse_from(["qf", "query", "-S", "s.toml", "-d", "d.json"]);
        assert!(matches!(Dispatch::from_cli(&cli), Dispatch::Query { .. }));

        let cli = Cli::parse_from(["qf", "config"]);
        assert!(matches!(Dispatch::from_cli(&cli), Dispatch::Config(None)));

        let cli = Cli::parse_from(["qf"]);
        assert!(matches!(Dispatch::from_cli(&cli), Dispatch::Help));
    }

    #[test]
    fn test_help_executes() {
        let ctx = CommandContext {
            json_output: false,
            use_colors: false,
            quiet: true,
            verbose: false,
        };
        assert!(Dispatch::Help.execute(&ctx).is_ok());
    }
}
