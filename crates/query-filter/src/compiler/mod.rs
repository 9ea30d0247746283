//! Query Compiler: turns validated filter trees into backend predicates.
//!
//! The compiler owns an immutable [`FieldCatalogue`], [`AllowedOperatorMap`]
//! and [`ValueCaster`]. Every leaf is validated (field first, then
//! operator), cast to its field's category and translated into a
//! [`Predicate`]. Predicates can be evaluated in memory ([`Record`]) or
//! rendered to SQL ([`SqlBuilder`]).
//!
//! # Example
//!
//! ```
//! use query_filter_rs::catalogue::{ColumnDef, ColumnType, FieldCatalogue};
//! use query_filter_rs::QueryCompiler;
//! use serde_json::json;
//!
//! let catalogue = FieldCatalogue::from_columns(
//!     "users",
//!     vec![
//!         ColumnDef::new("name", ColumnType::String),
//!         ColumnDef::new("age", ColumnType::Integer),
//!     ],
//! );
//! let compiler = QueryCompiler::new(catalogue);
//!
//! let query = compiler.compile_str("age__between=18,65").unwrap();
//! let records = vec![json!({"age": 10}), json!({"age": 30}), json!({"age": 70})];
//! let matched = query.filter(&records);
//! assert_eq!(matched, vec![&records[1]]);
//! ```

mod evaluator;
mod sql;

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cast::ValueCaster;
use crate::catalogue::{FieldCatalogue, RecordSchema, TypeCategory};
use crate::config::FilterConfig;
use crate::error::{FilterError, FilterResult};
use crate::filter::{Condition, FilterNode, FilterParam, FilterParser, SortSpec, TreeBuilder};
use crate::operators::{AllowedOperatorMap, Connective, OperatorKind, OperatorValidator};
use crate::pagination::{Page, PageRequest};
use crate::value::Value;

pub use evaluator::{compare_records, like_match, PredicateEvaluator, Record};
pub use sql::{SqlBuilder, SqlQuery};

/// Binary comparison used by [`Predicate::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl ComparisonOp {
    /// Returns the comparison for an operator, or `None` for non-comparisons.
    pub fn from_operator(op: OperatorKind) -> Option<Self> {
        match op {
            OperatorKind::Eq => Some(ComparisonOp::Eq),
            OperatorKind::Ne => Some(ComparisonOp::Ne),
            OperatorKind::Gt => Some(ComparisonOp::Gt),
            OperatorKind::Ge => Some(ComparisonOp::Ge),
            OperatorKind::Lt => Some(ComparisonOp::Lt),
            OperatorKind::Le => Some(ComparisonOp::Le),
            _ => None,
        }
    }

    /// Returns the SQL spelling of this comparison.
    pub fn as_sql(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "<>",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
        }
    }

    /// Returns true if `ordering` (actual vs. expected) satisfies this comparison.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Eq => ordering == Ordering::Equal,
            ComparisonOp::Ne => ordering != Ordering::Equal,
            ComparisonOp::Gt => ordering == Ordering::Greater,
            ComparisonOp::Ge => ordering != Ordering::Less,
            ComparisonOp::Lt => ordering == Ordering::Less,
            ComparisonOp::Le => ordering != Ordering::Greater,
        }
    }
}

/// Backend-agnostic compiled condition.
///
/// `And(vec![])` matches everything and `Or(vec![])` matches nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Compare {
        field: String,
        op: ComparisonOp,
        value: Value,
    },
    Like {
        field: String,
        pattern: String,
    },
    Contains {
        field: String,
        needle: String,
        ignore_case: bool,
    },
    In {
        field: String,
        values: Vec<Value>,
        negated: bool,
    },
    Between {
        field: String,
        low: Value,
        high: Value,
    },
    IsNull {
        field: String,
        negated: bool,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// A predicate that matches every record.
    pub fn always() -> Self {
        Predicate::And(Vec::new())
    }

    /// A predicate that matches no record.
    pub fn never() -> Self {
        Predicate::Or(Vec::new())
    }

    /// ANDs predicates; a single predicate is returned as is.
    pub fn all(mut predicates: Vec<Predicate>) -> Self {
        if predicates.len() == 1 {
            return predicates.remove(0);
        }
        Predicate::And(predicates)
    }

    /// ORs predicates; a single predicate is returned as is.
    pub fn any(mut predicates: Vec<Predicate>) -> Self {
        if predicates.len() == 1 {
            return predicates.remove(0);
        }
        Predicate::Or(predicates)
    }

    /// Negates a predicate.
    pub fn negate(inner: Predicate) -> Self {
        Predicate::Not(Box::new(inner))
    }

    /// Returns true for the vacuous AND.
    pub fn is_always(&self) -> bool {
        matches!(self, Predicate::And(children) if children.is_empty())
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { field, op, value } => {
                write!(f, "{field} {} {}", op.as_sql(), value.to_filter_text())
            }
            Predicate::Like { field, pattern } => {
                write!(f, "{field} LIKE {}", Value::from(pattern.as_str()).to_filter_text())
            }
            Predicate::Contains {
                field,
                needle,
                ignore_case,
            } => {
                let keyword = if *ignore_case { "ICONTAINS" } else { "CONTAINS" };
                write!(f, "{field} {keyword} {}", Value::from(needle.as_str()).to_filter_text())
            }
            Predicate::In {
                field,
                values,
                negated,
            } => {
                let keyword = if *negated { "NOT IN" } else { "IN" };
                let items: Vec<String> = values.iter().map(Value::to_filter_text).collect();
                write!(f, "{field} {keyword} ({})", items.join(", "))
            }
            Predicate::Between { field, low, high } => write!(
                f,
                "{field} BETWEEN {} AND {}",
                low.to_filter_text(),
                high.to_filter_text()
            ),
            Predicate::IsNull { field, negated } => {
                let keyword = if *negated { "IS NOT NULL" } else { "IS NULL" };
                write!(f, "{field} {keyword}")
            }
            Predicate::And(children) => join(f, children, "AND", "TRUE"),
            Predicate::Or(children) => join(f, children, "OR", "FALSE"),
            Predicate::Not(inner) => write!(f, "NOT {inner}"),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, children: &[Predicate], keyword: &str, empty: &str) -> fmt::Result {
    match children {
        [] => f.write_str(empty),
        [only] => write!(f, "{only}"),
        _ => {
            let parts: Vec<String> = children.iter().map(ToString::to_string).collect();
            write!(f, "({})", parts.join(&format!(" {keyword} ")))
        }
    }
}

/// A compiled predicate plus optional sort and page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub predicate: Predicate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageRequest>,
}

impl CompiledQuery {
    /// Wraps a predicate with no sort or page.
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            sort: None,
            page: None,
        }
    }

    /// Sets the sort directive.
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sets the page request.
    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    /// Returns an evaluator for the predicate.
    pub fn evaluator(&self) -> PredicateEvaluator<'_> {
        PredicateEvaluator::new(&self.predicate)
    }

    /// Returns the matching records, sorted if a sort is set. Ignores the page.
    pub fn filter<'r, R: Record>(&self, records: &'r [R]) -> Vec<&'r R> {
        let mut matched = self.evaluator().filter_records(records);
        if let Some(sort) = &self.sort {
            matched.sort_by(|a, b| compare_records(*a, *b, sort));
        }
        matched
    }

    /// Filters, sorts and paginates `records`.
    ///
    /// Without a page request every match is returned as a single page.
    pub fn execute<'r, R: Record>(&self, records: &'r [R]) -> Page<&'r R> {
        let matched = self.filter(records);
        match self.page {
            Some(request) => Page::slice(matched, request),
            None => Page::unpaged(matched),
        }
    }

    /// Renders the query as SQL against `table`.
    pub fn to_sql(&self, table: &str) -> SqlQuery {
        let mut builder = SqlBuilder::new();
        builder.table_name(table);
        builder.query(self);
        builder.build()
    }
}

/// Page, sort, search and filter parameters of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    /// 1-based page number (default 1).
    pub page: Option<usize>,
    /// Page size (default from config).
    pub size: Option<usize>,
    /// Sort token: `field` or `-field`.
    pub sort_by: Option<String>,
    /// Free-text search term.
    pub search: Option<String>,
    /// Filter string.
    pub filters: Option<String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_sort(mut self, sort_by: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_filters(mut self, filters: impl Into<String>) -> Self {
        self.filters = Some(filters.into());
        self
    }
}

/// Compiles filters, searches and sorts against one record type.
///
/// Immutable after construction and safe to share between threads.
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    catalogue: FieldCatalogue,
    operators: AllowedOperatorMap,
    caster: ValueCaster,
    default_page_size: usize,
    max_page_size: usize,
}

impl QueryCompiler {
    /// Creates a compiler with the default operator map and lenient casting.
    pub fn new(catalogue: FieldCatalogue) -> Self {
        Self::with_config(catalogue, &FilterConfig::default())
    }

    /// Creates a compiler for a [`RecordSchema`] type.
    pub fn for_schema<S: RecordSchema>() -> Self {
        Self::new(FieldCatalogue::for_schema::<S>())
    }

    /// Creates a compiler configured by `config`.
    pub fn with_config(catalogue: FieldCatalogue, config: &FilterConfig) -> Self {
        Self {
            catalogue,
            operators: config.operator_map(),
            caster: config.caster(),
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }

    /// Replaces the operator map.
    pub fn with_operators(mut self, operators: AllowedOperatorMap) -> Self {
        self.operators = operators;
        self
    }

    /// Replaces the caster.
    pub fn with_caster(mut self, caster: ValueCaster) -> Self {
        self.caster = caster;
        self
    }

    pub fn catalogue(&self) -> &FieldCatalogue {
        &self.catalogue
    }

    pub fn operators(&self) -> &AllowedOperatorMap {
        &self.operators
    }

    pub fn caster(&self) -> &ValueCaster {
        &self.caster
    }

    /// Returns a validator over this compiler's catalogue and operator map.
    pub fn validator(&self) -> OperatorValidator<'_> {
        OperatorValidator::new(&self.catalogue, &self.operators)
    }

    /// Compiles a filter tree.
    ///
    /// # Errors
    ///
    /// Returns the first error found: `Structural` for malformed trees,
    /// `FieldNotFound`, `OperatorNotAllowed`, `Cast` or `Arity` for leaves.
    pub fn compile(&self, node: &FilterNode) -> FilterResult<CompiledQuery> {
        let predicate = self.predicate(node)?;
        debug!(record = self.catalogue.name(), %predicate, "compiled filter tree");
        Ok(CompiledQuery::new(predicate))
    }

    /// Compiles a filter tree into a bare predicate.
    ///
    /// # Errors
    ///
    /// See [`QueryCompiler::compile`].
    pub fn predicate(&self, node: &FilterNode) -> FilterResult<Predicate> {
        match node {
            FilterNode::Leaf(condition) => {
                if condition.field.trim().is_empty() {
                    return Err(FilterError::structural(format!(
                        "comparison '{}' requires a field",
                        condition.operator
                    )));
                }
                self.compile_condition(condition)
            }
            FilterNode::Group {
                operator: Connective::Not,
                children,
            } => match children.as_slice() {
                [child] => Ok(Predicate::negate(self.predicate(child)?)),
                _ => Err(FilterError::structural(format!(
                    "'not' requires exactly one child, got {}",
                    children.len()
                ))),
            },
            FilterNode::Group { operator, children } => {
                if children.is_empty() {
                    return Err(FilterError::structural(format!(
                        "'{operator}' requires at least one child"
                    )));
                }
                let compiled = children
                    .iter()
                    .map(|child| self.predicate(child))
                    .collect::<FilterResult<Vec<_>>>()?;
                Ok(match operator {
                    Connective::Or => Predicate::Or(compiled),
                    _ => Predicate::And(compiled),
                })
            }
        }
    }

    /// Validates, casts and translates one leaf.
    ///
    /// String fields and `like`/`contains` are cast from the value as
    /// written, as are identifier fields unless the value is `null`. Other
    /// categories use the inferred value.
    ///
    /// # Errors
    ///
    /// Returns `FieldNotFound` before `OperatorNotAllowed`, and both before
    /// any `Cast` or `Arity` error.
    pub fn compile_condition(&self, condition: &Condition) -> FilterResult<Predicate> {
        let operator = condition.operator;
        if operator.is_logical() {
            return Err(FilterError::structural(format!(
                "leaf on field '{}' cannot use logical operator '{operator}'",
                condition.field
            )));
        }

        let descriptor = self.validator().validate(&condition.field, operator)?;
        let as_written = match descriptor.category {
            TypeCategory::String => true,
            TypeCategory::Identifier => !condition.value.is_null(),
            _ => matches!(operator, OperatorKind::Like | OperatorKind::Contains),
        };
        let input = if as_written {
            condition.written_value()
        } else {
            &condition.value
        };
        let value = self.caster.cast(descriptor.category, operator, input)?;
        let field = descriptor.name.clone();

        let predicate = match operator {
            OperatorKind::Like | OperatorKind::Contains if value.is_null() => Predicate::Compare {
                field,
                op: ComparisonOp::Eq,
                value,
            },
            OperatorKind::Like => Predicate::Like {
                field,
                pattern: value.to_string(),
            },
            OperatorKind::Contains => Predicate::Contains {
                field,
                needle: value.to_string(),
                ignore_case: false,
            },
            OperatorKind::In | OperatorKind::NotIn => Predicate::In {
                field,
                values: into_list(value),
                negated: operator == OperatorKind::NotIn,
            },
            OperatorKind::Between => {
                let [low, high] = <[Value; 2]>::try_from(into_list(value)).map_err(|items| {
                    FilterError::Arity {
                        operator,
                        expected: 2,
                        found: items.len(),
                    }
                })?;
                Predicate::Between { field, low, high }
            }
            OperatorKind::IsNull | OperatorKind::IsNotNull => {
                let flag = matches!(value, Value::Bool(true));
                Predicate::IsNull {
                    field,
                    negated: (operator == OperatorKind::IsNotNull) == flag,
                }
            }
            other => {
                let op = ComparisonOp::from_operator(other).ok_or_else(|| {
                    FilterError::structural(format!("operator '{other}' is not a comparison"))
                })?;
                Predicate::Compare { field, op, value }
            }
        };

        Ok(predicate)
    }

    /// Compiles a flat list of conditions, implicitly ANDed.
    ///
    /// An empty list matches every record.
    ///
    /// # Errors
    ///
    /// Returns the first leaf error.
    pub fn compile_filters(&self, conditions: &[Condition]) -> FilterResult<CompiledQuery> {
        let predicate = Predicate::all(
            conditions
                .iter()
                .map(|c| self.compile_condition(c))
                .collect::<FilterResult<Vec<_>>>()?,
        );
        debug!(
            record = self.catalogue.name(),
            conditions = conditions.len(),
            %predicate,
            "compiled filters"
        );
        Ok(CompiledQuery::new(predicate))
    }

    /// Parses and compiles a filter string.
    ///
    /// # Errors
    ///
    /// Returns `Syntax` errors from parsing, then leaf errors.
    pub fn compile_str(&self, filters: &str) -> FilterResult<CompiledQuery> {
        self.compile_filters(&FilterParser::parse(filters)?)
    }

    /// Builds and compiles loose filter parameters, implicitly ANDed.
    ///
    /// # Errors
    ///
    /// Returns `Structural` errors from tree building, then leaf errors.
    pub fn compile_filter_params(&self, params: &[FilterParam]) -> FilterResult<CompiledQuery> {
        match TreeBuilder::build_all(params)? {
            Some(node) => self.compile(&node),
            None => Ok(CompiledQuery::new(Predicate::always())),
        }
    }

    /// Compiles the filters, search, sort and page of a request.
    ///
    /// Blank filters and search terms contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns the first error from parsing, compiling, sorting or page
    /// validation (`InvalidPage`).
    pub fn compile_params(&self, params: &QueryParams) -> FilterResult<CompiledQuery> {
        let mut parts = Vec::new();

        if let Some(filters) = non_blank(params.filters.as_deref()) {
            parts.push(self.compile_str(filters)?.predicate);
        }
        if let Some(term) = non_blank(params.search.as_deref()) {
            parts.push(self.search_default(term));
        }

        let mut query = CompiledQuery::new(Predicate::all(parts))
            .with_page(self.page_request(params.page, params.size)?);
        if let Some(token) = non_blank(params.sort_by.as_deref()) {
            query = query.with_sort(self.parse_sort(token)?);
        }

        Ok(query)
    }

    /// Builds an OR of case-insensitive `contains` over `fields`.
    ///
    /// Undeclared fields are skipped with a warning. With no usable fields
    /// the result matches nothing.
    pub fn search(&self, term: &str, fields: &[&str]) -> Predicate {
        let leaves: Vec<Predicate> = fields
            .iter()
            .filter_map(|field| match self.catalogue.get(field) {
                Some(descriptor) => Some(Predicate::Contains {
                    field: descriptor.name.clone(),
                    needle: term.to_string(),
                    ignore_case: true,
                }),
                None => {
                    warn!(record = self.catalogue.name(), field, "skipping unknown search field");
                    None
                }
            })
            .collect();

        debug!(term, fields = leaves.len(), "compiled search");
        Predicate::any(leaves)
    }

    /// Searches the catalogue's searchable fields.
    pub fn search_default(&self, term: &str) -> Predicate {
        let fields = self.catalogue.searchable_fields();
        self.search(term, &fields)
    }

    /// Validates a sort on `field`.
    ///
    /// # Errors
    ///
    /// Returns `FieldNotFound` for an undeclared field and `NotSortable` for
    /// a field declared non-sortable.
    pub fn sort(&self, field: &str, descending: bool) -> FilterResult<SortSpec> {
        let descriptor = self.catalogue.lookup(field)?;
        if !descriptor.sortable {
            return Err(FilterError::NotSortable {
                field: descriptor.name.clone(),
            });
        }
        debug!(field, descending, "compiled sort");
        Ok(SortSpec {
            field: descriptor.name.clone(),
            descending,
        })
    }

    /// Parses and validates a sort token (`field` or `-field`).
    ///
    /// # Errors
    ///
    /// Returns `Syntax` for an empty token, then the errors of
    /// [`QueryCompiler::sort`].
    pub fn parse_sort(&self, token: &str) -> FilterResult<SortSpec> {
        let spec = FilterParser::parse_sort(token)?;
        self.sort(&spec.field, spec.descending)
    }

    /// Validates a page request against the configured page sizes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPage` if the page is zero or the size is outside
    /// `1..=max_page_size`.
    pub fn page_request(&self, page: Option<usize>, size: Option<usize>) -> FilterResult<PageRequest> {
        let size = size.unwrap_or(self.default_page_size);
        if size > self.max_page_size {
            return Err(FilterError::invalid_page(format!(
                "size {size} exceeds the maximum of {}",
                self.max_page_size
            )));
        }
        PageRequest::new(page.unwrap_or(1), size)
    }
}

fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::List(items) => items,
        other => vec![other],
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|s| !s.is_empty())
}
