//! Filter trees: leaf conditions, logical groups and the loose caller form.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::operators::{Connective, OperatorKind};
use crate::value::Value;

/// A single `(field, operator, value)` comparison.
///
/// Conditions parsed from a filter string keep the value text as written
/// in `raw` (quotes removed; a list of strings for list operators), next
/// to the inferred `value`. String and text-key fields, and
/// `like`/`contains`, compile from the written text, so `zip__eq=01234`
/// stays `"01234"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: OperatorKind,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl Condition {
    /// Creates a condition from a typed value.
    pub fn new(field: impl Into<String>, operator: OperatorKind, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            raw: None,
        }
    }

    /// Sets the value text as written.
    pub fn with_raw(mut self, raw: impl Into<Value>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    /// Returns the value as written, falling back to the typed value.
    pub fn written_value(&self) -> &Value {
        self.raw.as_ref().unwrap_or(&self.value)
    }
}

impl fmt::Display for Condition {
    /// Canonical filter-string form, e.g. `age__between=18,65`.
    ///
    /// Non-string items are rendered as written (`01234` stays `01234`);
    /// strings are quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match &self.raw {
            Some(raw) => canonical_text(&self.value, raw),
            None => self.value.to_filter_text(),
        };
        write!(f, "{}__{}={}", self.field, self.operator, text)
    }
}

fn canonical_text(value: &Value, raw: &Value) -> String {
    match (value, raw) {
        (Value::List(values), Value::List(written)) if values.len() == written.len() => values
            .iter()
            .zip(written)
            .map(|(v, w)| canonical_text(v, w))
            .collect::<Vec<_>>()
            .join(","),
        (Value::String(_) | Value::List(_), _) | (_, Value::List(_)) => value.to_filter_text(),
        (_, written) => written.to_string(),
    }
}

/// A validated-shape filter tree.
///
/// A `Leaf` always names a field; a `Group` never does and holds at least
/// one child (`not` exactly one).
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    /// A single comparison.
    Leaf(Condition),

    /// A logical combination of child nodes.
    Group {
        operator: Connective,
        children: Vec<FilterNode>,
    },
}

impl FilterNode {
    /// Creates a leaf node.
    ///
    /// # Example
    ///
    /// ```
    /// use query_filter_rs::filter::FilterNode;
    /// use query_filter_rs::OperatorKind;
    ///
    /// let node = FilterNode::leaf("age", OperatorKind::Gt, 18);
    /// assert!(matches!(node, FilterNode::Leaf(_)));
    /// ```
    pub fn leaf(field: impl Into<String>, operator: OperatorKind, value: impl Into<Value>) -> Self {
        FilterNode::Leaf(Condition::new(field, operator, value))
    }

    /// Creates an AND group.
    pub fn and(children: Vec<FilterNode>) -> Self {
        FilterNode::Group {
            operator: Connective::And,
            children,
        }
    }

    /// Creates an OR group.
    ///
    /// # Example
    ///
    /// ```
    /// use query_filter_rs::filter::FilterNode;
    /// use query_filter_rs::OperatorKind;
    ///
    /// let node = FilterNode::or(vec![
    ///     FilterNode::leaf("age", OperatorKind::Eq, 25),
    ///     FilterNode::leaf("age", OperatorKind::Eq, 35),
    /// ]);
    /// assert!(matches!(node, FilterNode::Group { .. }));
    /// ```
    pub fn or(children: Vec<FilterNode>) -> Self {
        FilterNode::Group {
            operator: Connective::Or,
            children,
        }
    }

    /// Creates a NOT group around a single child.
    pub fn negate(child: FilterNode) -> Self {
        FilterNode::Group {
            operator: Connective::Not,
            children: vec![child],
        }
    }

    /// ANDs a flat list of conditions, as produced by the parser.
    pub fn all_of(conditions: impl IntoIterator<Item = Condition>) -> Self {
        FilterNode::and(conditions.into_iter().map(FilterNode::Leaf).collect())
    }

    /// Returns the number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            FilterNode::Leaf(_) => 1,
            FilterNode::Group { children, .. } => children.iter().map(Self::leaf_count).sum(),
        }
    }
}

impl From<Condition> for FilterNode {
    fn from(condition: Condition) -> Self {
        FilterNode::Leaf(condition)
    }
}

/// Value of a [`FilterParam`]: either nested parameters or a plain value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Nested(Vec<FilterParam>),
    Value(Value),
}

impl Default for ParamValue {
    fn default() -> Self {
        ParamValue::Value(Value::Null)
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        ParamValue::Value(value)
    }
}

impl From<Vec<FilterParam>> for ParamValue {
    fn from(children: Vec<FilterParam>) -> Self {
        ParamValue::Nested(children)
    }
}

/// Loose, caller-supplied filter description.
///
/// This is the shape filters take in JSON request bodies:
///
/// ```json
/// {"operator": "or", "value": [
///     {"field": "age", "operator": "eq", "value": 25},
///     {"field": "age", "operator": "eq", "value": 35}
/// ]}
/// ```
///
/// It is not validated on construction; [`TreeBuilder`](super::TreeBuilder)
/// turns it into a [`FilterNode`] and reports structural problems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterParam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    #[serde(alias = "op")]
    pub operator: OperatorKind,

    #[serde(default)]
    pub value: ParamValue,
}

impl FilterParam {
    /// Creates a comparison parameter.
    pub fn leaf(field: impl Into<String>, operator: OperatorKind, value: impl Into<Value>) -> Self {
        Self {
            field: Some(field.into()),
            operator,
            value: ParamValue::Value(value.into()),
        }
    }

    /// Creates a logical parameter over nested parameters.
    pub fn group(operator: OperatorKind, children: Vec<FilterParam>) -> Self {
        Self {
            field: None,
            operator,
            value: ParamValue::Nested(children),
        }
    }
}

impl From<Condition> for FilterParam {
    /// The loose form carries typed values only; written text is dropped.
    fn from(condition: Condition) -> Self {
        Self {
            field: Some(condition.field),
            operator: condition.operator,
            value: ParamValue::Value(condition.value),
        }
    }
}

/// A single-key sort directive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub descending: bool,
}

impl SortSpec {
    /// Creates an ascending sort on `field`.
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    /// Creates a descending sort on `field`.
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

impl fmt::Display for SortSpec {
    /// Sort token form: `field` or `-field`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field)
        } else {
            f.write_str(&self.field)
        }
    }
}
