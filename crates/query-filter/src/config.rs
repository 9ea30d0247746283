//! Compiler configuration loaded from TOML.
//!
//! ```toml
//! version = 1
//! strict_casting = false
//! default_page_size = 10
//! max_page_size = 100
//!
//! [operators]
//! string = ["eq", "ne", "like"]
//! numeric = ["eq", "gt", "lt"]
//! default = ["eq"]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cast::ValueCaster;
use crate::error::{FilterError, FilterResult};
use crate::operators::AllowedOperatorMap;
use crate::pagination::DEFAULT_PAGE_SIZE;

/// Current config schema version.
pub const CONFIG_VERSION: u32 = 1;

/// Largest page size accepted when the config does not name one.
pub const DEFAULT_MAX_PAGE_SIZE: usize = 100;

/// Settings for a [`QueryCompiler`](crate::QueryCompiler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Config schema version.
    pub version: u32,

    /// Reject malformed date, date-time and UUID text instead of passing it
    /// through.
    pub strict_casting: bool,

    /// Page size used when a request does not name one.
    pub default_page_size: usize,

    /// Largest page size a request may ask for.
    pub max_page_size: usize,

    /// Replaces the default operator map wholesale when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operators: Option<AllowedOperatorMap>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            strict_casting: false,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            operators: None,
        }
    }
}

impl FilterConfig {
    /// Parses a config document.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::Config` if the TOML is malformed, names an
    /// unknown category or operator, or has inconsistent page sizes.
    pub fn from_toml_str(input: &str) -> FilterResult<Self> {
        let config: FilterConfig = toml::from_str(input)
            .map_err(|e| FilterError::config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::Config` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> FilterResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FilterError::config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Serializes the config back to TOML.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::Config` if serialization fails.
    pub fn to_toml_string(&self) -> FilterResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| FilterError::config(format!("Failed to serialize config: {e}")))
    }

    /// Returns the operator map in effect.
    pub fn operator_map(&self) -> AllowedOperatorMap {
        self.operators.clone().unwrap_or_default()
    }

    /// Returns the caster this config selects.
    pub fn caster(&self) -> ValueCaster {
        if self.strict_casting {
            ValueCaster::strict()
        } else {
            ValueCaster::new()
        }
    }

    fn validate(&self) -> FilterResult<()> {
        if self.version > CONFIG_VERSION {
            return Err(FilterError::config(format!(
                "config version {} is newer than supported version {CONFIG_VERSION}",
                self.version
            )));
        }
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(FilterError::config("page sizes must be at least 1"));
        }
        if self.default_page_size > self.max_page_size {
            return Err(FilterError::config(format!(
                "default_page_size ({}) exceeds max_page_size ({})",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }
}
