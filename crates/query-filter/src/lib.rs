//! Filter-string parsing and typed query compilation for record collections.
//!
//! This crate turns request-level filter input into validated, typed
//! predicates over one record type:
//!
//! - [`filter`] parses `field__operator=value` strings and JSON filter trees.
//! - [`catalogue`] describes a record type's fields and their categories.
//! - [`operators`] decides which operators each category permits.
//! - [`cast`] coerces raw values to a field's category.
//! - [`compiler`] validates everything and produces a [`Predicate`] that can
//!   be evaluated in memory or rendered to SQL.
//!
//! # Example
//!
//! ```
//! use query_filter_rs::catalogue::{ColumnDef, ColumnType, FieldCatalogue};
//! use query_filter_rs::{QueryCompiler, QueryParams};
//! use serde_json::json;
//!
//! let compiler = QueryCompiler::new(FieldCatalogue::from_columns(
//!     "users",
//!     vec![
//!         ColumnDef::new("username", ColumnType::String),
//!         ColumnDef::new("age", ColumnType::Integer),
//!     ],
//! ));
//!
//! let params = QueryParams::new()
//!     .with_filters("age__gte=18")
//!     .with_sort("-age");
//! let query = compiler.compile_params(&params).unwrap();
//!
//! let users = vec![
//!     json!({"username": "ann", "age": 17}),
//!     json!({"username": "ben", "age": 40}),
//!     json!({"username": "cat", "age": 21}),
//! ];
//! let page = query.execute(&users);
//! assert_eq!(page.total, 2);
//! assert_eq!(page.items[0]["username"], "ben");
//! ```

pub mod cast;
pub mod catalogue;
pub mod compiler;
pub mod config;
pub mod error;
pub mod filter;
pub mod operators;
pub mod pagination;
pub mod value;

pub use cast::ValueCaster;
pub use catalogue::{ColumnDef, ColumnType, FieldCatalogue, FieldDescriptor, RecordSchema, TypeCategory};
pub use compiler::{CompiledQuery, Predicate, PredicateEvaluator, QueryCompiler, QueryParams, Record};
pub use config::FilterConfig;
pub use error::{FilterError, FilterResult, SyntaxErrorKind};
pub use filter::{Condition, FilterNode, FilterParam, FilterParser, SortSpec};
pub use operators::{AllowedOperatorMap, Connective, OperatorKind, OperatorValidator};
pub use pagination::{Page, PageRequest};
pub use value::Value;
