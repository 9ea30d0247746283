//! Config command implementation.
//!
//! View the compiler configuration.
//! Config file is located at ~/.config/qf/config.toml.

use std::env;
use std::path::PathBuf;

use directories::BaseDirs;
use owo_colors::OwoColorize;
use query_filter_rs::FilterConfig;

use super::{CommandContext, CommandError, Result};

/// Environment variable overriding the config file path.
pub const CONFIG_ENV: &str = "QF_CONFIG";

/// Gets the config directory path.
/// Uses XDG-style paths: ~/.config/qf/ on all platforms.
fn get_config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("qf"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("qf"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Gets the config file path.
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    Ok(get_config_dir()?.join("config.toml"))
}

/// Loads the configuration from disk; a missing file means defaults.
pub fn load_config() -> Result<FilterConfig> {
    let path = get_config_path()?;

    if !path.exists() {
        return Ok(FilterConfig::default());
    }

    FilterConfig::load(&path).map_err(CommandError::from_filter)
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config()?;
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{header}\n");
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        println!("Settings:");
        println!("  strict_casting: {}", config.strict_casting);
        println!("  default_page_size: {}", config.default_page_size);
        println!("  max_page_size: {}", config.max_page_size);

        let custom = config.operators.is_some();
        println!(
            "\n[operators]{}",
            if custom { "" } else { " (defaults)" }
        );
        let operators = config.operator_map();
        let mut entries: Vec<_> = operators.entries().collect();
        entries.sort_by_key(|(category, _)| **category);
        for (category, ops) in entries {
            let names: Vec<&str> = ops.iter().map(|op| op.as_str()).collect();
            println!("  {category}: {}", names.join(", "));
        }
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    /// Runs `f` with the given env vars set (or removed), restoring them afterwards.
    fn with_env<T>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
        let saved: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(k, _)| (k.to_string(), env::var(k).ok()))
            .collect();

        for (key, value) in vars {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }

        let result = f();

        for (key, value) in saved {
            match value {
                Some(v) => env::set_var(&key, v),
                None => env::remove_var(&key),
            }
        }
        result
    }

    #[test]
    #[serial]
    fn test_config_path_from_env_override() {
        let path = with_env(&[(CONFIG_ENV, Some("/tmp/qf-test/custom.toml"))], get_config_path);
        assert_eq!(path.unwrap(), PathBuf::from("/tmp/qf-test/custom.toml"));
    }

    #[test]
    #[serial]
    fn test_config_path_from_xdg() {
        let path = with_env(
            &[(CONFIG_ENV, None), ("XDG_CONFIG_HOME", Some("/tmp/xdg"))],
            get_config_path,
        );
        assert_eq!(path.unwrap(), PathBuf::from("/tmp/xdg/qf/config.toml"));
    }

    #[test]
    #[serial]
    fn test_config_path_default_home() {
        let path = with_env(&[(CONFIG_ENV, None), ("XDG_CONFIG_HOME", None)], get_config_path)
            .unwrap();
        assert!(path.ends_with(".config/qf/config.toml"));
    }

    #[test]
    #[serial]
    fn test_load_config_missing_file_uses_defaults() {
        let config = with_env(
            &[(CONFIG_ENV, Some("/tmp/qf-test-nonexistent/config.toml"))],
            load_config,
        )
        .unwrap();
        assert_eq!(config, FilterConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_config_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
strict_casting = true
default_page_size = 25

[operators]
numeric = ["eq", "gte"]
"#,
        )
        .unwrap();

        let config = with_env(&[(CONFIG_ENV, path.to_str())], load_config).unwrap();
        assert!(config.strict_casting);
        assert_eq!(config.default_page_size, 25);
        assert!(config.operators.is_some());
    }

    #[test]
    #[serial]
    fn test_load_config_invalid_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "default_page_size = \"ten\"").unwrap();

        let result = with_env(&[(CONFIG_ENV, path.to_str())], load_config);
        assert!(matches!(result, Err(CommandError::Config(_))));
    }
}
