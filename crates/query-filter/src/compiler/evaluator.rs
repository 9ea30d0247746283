//! In-memory evaluation of compiled predicates.
//!
//! Any type implementing [`Record`] can be filtered and sorted. Implementations
//! are provided for JSON objects and for maps of [`Value`]s.
//!
//! # Example
//!
//! ```
//! use query_filter_rs::compiler::{Predicate, PredicateEvaluator, ComparisonOp};
//! use query_filter_rs::Value;
//! use serde_json::json;
//!
//! let predicate = Predicate::Compare {
//!     field: "age".to_string(),
//!     op: ComparisonOp::Ge,
//!     value: Value::Int(18),
//! };
//! let evaluator = PredicateEvaluator::new(&predicate);
//!
//! assert!(evaluator.matches(&json!({"age": 30})));
//! assert!(!evaluator.matches(&json!({"age": null})));
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use super::Predicate;
use crate::filter::SortSpec;
use crate::value::Value;

/// A record whose fields can be read by name.
pub trait Record {
    /// Returns the value of `field`, or `None` if the record has no such field.
    fn value(&self, field: &str) -> Option<Value>;
}

impl Record for serde_json::Map<String, serde_json::Value> {
    fn value(&self, field: &str) -> Option<Value> {
        self.get(field)
            .and_then(|json| Value::try_from(json.clone()).ok())
    }
}

impl Record for serde_json::Value {
    /// Non-object JSON values have no fields.
    fn value(&self, field: &str) -> Option<Value> {
        self.as_object().and_then(|object| Record::value(object, field))
    }
}

impl<S: BuildHasher> Record for HashMap<String, Value, S> {
    fn value(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

impl Record for BTreeMap<String, Value> {
    fn value(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn value(&self, field: &str) -> Option<Value> {
        (**self).value(field)
    }
}

/// Evaluates a compiled predicate against records.
///
/// Comparisons against a missing or null field are false; only
/// `IsNull` observes nulls. `Not` negates its child's boolean result.
#[derive(Debug, Clone, Copy)]
pub struct PredicateEvaluator<'a> {
    predicate: &'a Predicate,
}

impl<'a> PredicateEvaluator<'a> {
    /// Creates a new evaluator.
    pub fn new(predicate: &'a Predicate) -> Self {
        Self { predicate }
    }

    /// Returns true if the record matches the predicate.
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        evaluate(self.predicate, record)
    }

    /// Filters a slice of records, returning only those that match.
    pub fn filter_records<'r, R: Record>(&self, records: &'r [R]) -> Vec<&'r R> {
        records.iter().filter(|record| self.matches(*record)).collect()
    }
}

fn evaluate<R: Record + ?Sized>(predicate: &Predicate, record: &R) -> bool {
    match predicate {
        Predicate::Compare { field, op, value } => present(record, field)
            .and_then(|actual| actual.compare(value))
            .is_some_and(|ordering| op.holds(ordering)),

        Predicate::Like { field, pattern } => {
            text(record, field).is_some_and(|t| like_match(&t, pattern))
        }

        Predicate::Contains {
            field,
            needle,
            ignore_case,
        } => text(record, field).is_some_and(|t| {
            if *ignore_case {
                t.to_lowercase().contains(&needle.to_lowercase())
            } else {
                t.contains(needle.as_str())
            }
        }),

        Predicate::In {
            field,
            values,
            negated,
        } => {
            if values.is_empty() {
                return *negated;
            }
            present(record, field)
                .is_some_and(|actual| values.iter().any(|v| actual.loosely_equals(v)) != *negated)
        }

        Predicate::Between { field, low, high } => present(record, field).is_some_and(|actual| {
            matches!(actual.compare(low), Some(Ordering::Greater | Ordering::Equal))
                && matches!(actual.compare(high), Some(Ordering::Less | Ordering::Equal))
        }),

        Predicate::IsNull { field, negated } => present(record, field).is_none() != *negated,

        Predicate::And(children) => children.iter().all(|child| evaluate(child, record)),
        Predicate::Or(children) => children.iter().any(|child| evaluate(child, record)),
        Predicate::Not(inner) => !evaluate(inner, record),
    }
}

/// Returns the field's value unless it is missing or null.
fn present<R: Record + ?Sized>(record: &R, field: &str) -> Option<Value> {
    record.value(field).filter(|v| !v.is_null())
}

/// Returns the field's scalar value as text.
fn text<R: Record + ?Sized>(record: &R, field: &str) -> Option<String> {
    match present(record, field)? {
        Value::List(_) => None,
        scalar => Some(scalar.to_string()),
    }
}

/// Matches `text` against a LIKE pattern: `%` is any run, `_` one character.
///
/// Matching is case-sensitive.
pub fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut ti, mut pi) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < text.len() {
        if pi < pattern.len() && pattern[pi] == '%' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if pi < pattern.len() && (pattern[pi] == '_' || pattern[pi] == text[ti]) {
            ti += 1;
            pi += 1;
        } else if let Some((star, mark)) = backtrack {
            pi = star + 1;
            ti = mark + 1;
            backtrack = Some((star, mark + 1));
        } else {
            return false;
        }
    }

    pattern[pi..].iter().all(|&c| c == '%')
}

/// Orders two records by the sort field; missing and null values sort first.
pub fn compare_records<R: Record + ?Sized>(a: &R, b: &R, sort: &SortSpec) -> Ordering {
    let ordering = match (present(a, &sort.field), present(b, &sort.field)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.compare(&y).unwrap_or(Ordering::Equal),
    };

    if sort.descending {
        ordering.reverse()
    } else {
        ordering
    }
}

#[cfg(test)]
#[path = "evaluator_tests.rs"]
mod tests;
