//! Filter-string parsing and filter trees.
//!
//! # Syntax
//!
//! A filter string is a comma-separated list of `field__operator=value`
//! segments:
//!
//! - `status__eq=active` - Equality
//! - `age__gte=18` - Ordering (`gt`, `ge`/`gte`, `lt`, `le`/`lte`)
//! - `username__like=%doe%` - Wildcard match (`%` any run, `_` one char)
//! - `bio__contains=rust` - Substring match
//! - `status__in=active,pending` - Set membership (`in`, `not_in`)
//! - `age__between=18,65` - Inclusive range, exactly two values
//! - `deleted_at__is_null=true` - Nullability (`is_null`, `is_not_null`)
//!
//! Values are typed by inference (`18` is an integer, `2024-01-01` a date,
//! `true` a boolean). Wrap a value in `"..."` or `'...'` to keep it a string
//! and to protect embedded commas.
//!
//! Each field may appear at most once per filter string. Nested AND/OR/NOT
//! groups are built programmatically ([`FilterNode`], [`FilterParam`]).
//!
//! # Example
//!
//! ```
//! use query_filter_rs::filter::{to_filter_string, FilterParser};
//!
//! let conditions = FilterParser::parse("name__eq=\"Doe, John\",age__between=18,65").unwrap();
//! assert_eq!(conditions.len(), 2);
//! assert_eq!(
//!     to_filter_string(&conditions),
//!     "name__eq=\"Doe, John\",age__between=18,65"
//! );
//! ```

mod ast;
mod lexer;
mod parser;
mod tree;

pub use ast::{Condition, FilterNode, FilterParam, ParamValue, SortSpec};
pub use lexer::{Lexer, Piece};
pub use parser::FilterParser;
pub use tree::TreeBuilder;

/// Serializes conditions back into canonical filter-string form.
///
/// Re-parsing the result yields the same conditions.
pub fn to_filter_string(conditions: &[Condition]) -> String {
    conditions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests;
