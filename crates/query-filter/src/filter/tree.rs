//! Logical tree builder: turns loose [`FilterParam`]s into a [`FilterNode`].

use super::ast::{Condition, FilterNode, FilterParam, ParamValue};
use crate::error::{FilterError, FilterResult};
use crate::operators::{Connective, OperatorKind};
use crate::value::Value;

/// Assembles leaves and explicit AND/OR/NOT groups into one tree.
///
/// Enforces that groups carry no field and at least one child (`not`
/// exactly one), and that leaves always carry a non-empty field.
pub struct TreeBuilder;

impl TreeBuilder {
    /// Builds the tree for one parameter.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::Structural` if the parameter, or any nested
    /// parameter, violates the tree invariants.
    pub fn build(param: &FilterParam) -> FilterResult<FilterNode> {
        match Connective::from_operator(param.operator) {
            Some(connective) => Self::build_group(connective, param),
            None => Self::build_leaf(param),
        }
    }

    /// Builds a list of top-level parameters, implicitly ANDed.
    ///
    /// Returns `None` for an empty list and the single node itself for a
    /// one-element list.
    pub fn build_all(params: &[FilterParam]) -> FilterResult<Option<FilterNode>> {
        let mut nodes = params
            .iter()
            .map(Self::build)
            .collect::<FilterResult<Vec<_>>>()?;

        Ok(match nodes.len() {
            0 => None,
            1 => nodes.pop(),
            _ => Some(FilterNode::and(nodes)),
        })
    }

    /// Checks the invariants of an already constructed tree.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::Structural` for an empty group, a `not` with
    /// other than one child, or a leaf with an empty field.
    pub fn validate(node: &FilterNode) -> FilterResult<()> {
        match node {
            FilterNode::Leaf(condition) => {
                if condition.field.trim().is_empty() {
                    return Err(FilterError::structural(format!(
                        "comparison '{}' requires a field",
                        condition.operator
                    )));
                }
                if condition.operator.is_logical() {
                    return Err(FilterError::structural(format!(
                        "leaf on field '{}' cannot use logical operator '{}'",
                        condition.field, condition.operator
                    )));
                }
                Ok(())
            }
            FilterNode::Group { operator, children } => {
                check_arity(*operator, children.len())?;
                children.iter().try_for_each(Self::validate)
            }
        }
    }

    fn build_group(connective: Connective, param: &FilterParam) -> FilterResult<FilterNode> {
        if let Some(field) = &param.field {
            return Err(FilterError::structural(format!(
                "logical operator '{connective}' must not have a field (got '{field}')"
            )));
        }

        let children = match &param.value {
            ParamValue::Nested(children) => children,
            ParamValue::Value(_) => {
                return Err(FilterError::structural(format!(
                    "logical operator '{connective}' requires a list of nested filters"
                )))
            }
        };
        check_arity(connective, children.len())?;

        let children = children
            .iter()
            .map(Self::build)
            .collect::<FilterResult<Vec<_>>>()?;

        Ok(FilterNode::Group {
            operator: connective,
            children,
        })
    }

    fn build_leaf(param: &FilterParam) -> FilterResult<FilterNode> {
        let field = match param.field.as_deref().map(str::trim) {
            Some(field) if !field.is_empty() => field,
            _ => {
                return Err(FilterError::structural(format!(
                    "comparison '{}' requires a field",
                    param.operator
                )))
            }
        };

        let value = match &param.value {
            ParamValue::Value(value) => value.clone(),
            ParamValue::Nested(children) if children.is_empty() => Value::List(Vec::new()),
            ParamValue::Nested(_) => {
                return Err(FilterError::structural(format!(
                    "comparison on field '{field}' cannot contain nested filters"
                )))
            }
        };

        Ok(FilterNode::Leaf(Condition::new(field, param.operator, value)))
    }
}

fn check_arity(connective: Connective, children: usize) -> FilterResult<()> {
    match connective {
        Connective::Not if children != 1 => Err(FilterError::structural(format!(
            "'not' requires exactly one child, got {children}"
        ))),
        Connective::And | Connective::Or if children == 0 => Err(FilterError::structural(
            format!("'{connective}' requires at least one child"),
        )),
        _ => Ok(()),
    }
}

impl TryFrom<&FilterParam> for FilterNode {
    type Error = FilterError;

    fn try_from(param: &FilterParam) -> Result<Self, Self::Error> {
        TreeBuilder::build(param)
    }
}

impl From<&FilterNode> for FilterParam {
    fn from(node: &FilterNode) -> Self {
        match node {
            FilterNode::Leaf(condition) => FilterParam::from(condition.clone()),
            FilterNode::Group { operator, children } => FilterParam::group(
                OperatorKind::from(*operator),
                children.iter().map(FilterParam::from).collect(),
            ),
        }
    }
}
