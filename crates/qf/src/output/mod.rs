//! Output formatting utilities for the qf CLI.
//!
//! This module provides functions for formatting results as text or JSON.
//! It is organized into submodules by command:
//!
//! - [`conditions`] - Parsed filter conditions and sort tokens (parse)
//! - [`queries`] - Compiled predicates and SQL (compile)
//! - [`records`] - Pages of matching records (query)
//! - [`helpers`] - Common formatting utilities (truncation, cell rendering)

mod conditions;
pub mod helpers;
mod queries;
mod records;

pub use conditions::{format_conditions_json, format_conditions_table};
pub use queries::{format_query_json, format_query_text, format_sql_json, format_sql_text};
pub use records::{format_page_json, format_page_table};
