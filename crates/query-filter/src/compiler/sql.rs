//! SQL rendering for compiled queries.
//!
//! Produces a WHERE clause with `?` placeholders plus the ordered parameter
//! list, optionally wrapped in a `SELECT` with `ORDER BY` and
//! `LIMIT ? OFFSET ?`.

use serde::Serialize;

use super::{CompiledQuery, Predicate};
use crate::filter::SortSpec;
use crate::pagination::PageRequest;
use crate::value::Value;

/// Rendered SQL and its positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// SQL builder for compiled predicates.
pub struct SqlBuilder {
    sql: String,
    params: Vec<Value>,
    fields: Vec<String>,
    table_name: Option<String>,
}

impl Default for SqlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            fields: Vec::new(),
            table_name: None,
        }
    }

    /// Creates a builder that selects only `fields`.
    pub fn with_fields<T: Into<String>>(fields: Vec<T>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::new()
        }
    }

    pub fn table_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.table_name = Some(name.into());
        self
    }

    fn push_sql(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    fn push_param(&mut self, value: Value) {
        self.sql.push('?');
        self.params.push(value);
    }

    fn push_ident(&mut self, name: &str) {
        let quoted = quote_ident(name);
        self.push_sql(&quoted);
    }

    /// Finishes the statement.
    ///
    /// With a table name this is a full `SELECT`; otherwise only the
    /// rendered clause text.
    pub fn build(self) -> SqlQuery {
        let Some(table) = self.table_name else {
            return SqlQuery {
                sql: self.sql,
                params: self.params,
            };
        };

        let columns = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields
                .iter()
                .map(|f| quote_ident(f))
                .collect::<Vec<_>>()
                .join(", ")
        };

        SqlQuery {
            sql: format!("SELECT {columns} FROM {} WHERE {}", quote_ident(&table), self.sql),
            params: self.params,
        }
    }

    /// Returns the rendered clause text and parameters, ignoring the table.
    pub fn build_where_clause(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    /// Renders the predicate, sort and page of a compiled query.
    pub fn query(&mut self, query: &CompiledQuery) {
        self.predicate(&query.predicate);
        if let Some(sort) = &query.sort {
            self.order_by(sort);
        }
        if let Some(page) = query.page {
            self.limit_offset(page);
        }
    }

    pub fn predicate(&mut self, predicate: &Predicate) {
        match predicate {
            Predicate::Compare { field, op, value } => {
                self.push_ident(field);
                self.push_sql(" ");
                self.push_sql(op.as_sql());
                self.push_sql(" ");
                self.push_param(value.clone());
            }
            Predicate::Like { field, pattern } => {
                self.push_ident(field);
                self.push_sql(" LIKE ");
                self.push_param(Value::String(pattern.clone()));
            }
            Predicate::Contains {
                field,
                needle,
                ignore_case,
            } => {
                let escaped = escape_like(needle);
                if *ignore_case {
                    self.push_sql("LOWER(");
                    self.push_ident(field);
                    self.push_sql(") LIKE ");
                    self.push_param(Value::String(format!("%{}%", escaped.to_lowercase())));
                } else {
                    self.push_ident(field);
                    self.push_sql(" LIKE ");
                    self.push_param(Value::String(format!("%{escaped}%")));
                }
                self.push_sql(" ESCAPE '\\'");
            }
            Predicate::In {
                values, negated, ..
            } if values.is_empty() => {
                self.push_sql(if *negated { "1 = 1" } else { "1 = 0" });
            }
            Predicate::In {
                field,
                values,
                negated,
            } => {
                self.push_ident(field);
                self.push_sql(if *negated { " NOT IN (" } else { " IN (" });
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.push_sql(", ");
                    }
                    self.push_param(value.clone());
                }
                self.push_sql(")");
            }
            Predicate::Between { field, low, high } => {
                self.push_ident(field);
                self.push_sql(" BETWEEN ");
                self.push_param(low.clone());
                self.push_sql(" AND ");
                self.push_param(high.clone());
            }
            Predicate::IsNull { field, negated } => {
                self.push_ident(field);
                self.push_sql(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Predicate::And(children) => self.group(children, " AND ", "1 = 1"),
            Predicate::Or(children) => self.group(children, " OR ", "1 = 0"),
            Predicate::Not(inner) => {
                self.push_sql("NOT (");
                self.predicate(inner);
                self.push_sql(")");
            }
        }
    }

    /// Renders the children of a group; compound children are parenthesized.
    fn group(&mut self, children: &[Predicate], separator: &str, empty: &str) {
        if children.is_empty() {
            self.push_sql(empty);
            return;
        }

        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                self.push_sql(separator);
            }
            let wrap = matches!(child, Predicate::And(c) | Predicate::Or(c) if c.len() > 1);
            if wrap {
                self.push_sql("(");
            }
            self.predicate(child);
            if wrap {
                self.push_sql(")");
            }
        }
    }

    pub fn order_by(&mut self, sort: &SortSpec) {
        self.push_sql(" ORDER BY ");
        self.push_ident(&sort.field);
        self.push_sql(if sort.descending { " DESC" } else { " ASC" });
    }

    pub fn limit_offset(&mut self, page: PageRequest) {
        self.push_sql(" LIMIT ");
        self.push_param(Value::Int(to_i64(page.limit())));
        self.push_sql(" OFFSET ");
        self.push_param(Value::Int(to_i64(page.offset())));
    }
}

fn quote_ident(name: &str) -> String {
    format!(r#""{}""#, name.replace('"', "\"\""))
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
