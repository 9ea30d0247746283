//! Operators and per-category operator allowlists.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalogue::{FieldCatalogue, FieldDescriptor, TypeCategory};
use crate::error::{FilterError, FilterResult, SyntaxErrorKind};

/// Every operator a filter can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    Eq,
    Ne,
    Gt,
    #[serde(alias = "gte")]
    Ge,
    Lt,
    #[serde(alias = "lte")]
    Le,
    Like,
    Contains,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
    And,
    Or,
    Not,
}

impl OperatorKind {
    /// All comparison operators, in declaration order.
    pub const COMPARISONS: [OperatorKind; 13] = [
        OperatorKind::Eq,
        OperatorKind::Ne,
        OperatorKind::Gt,
        OperatorKind::Ge,
        OperatorKind::Lt,
        OperatorKind::Le,
        OperatorKind::Like,
        OperatorKind::Contains,
        OperatorKind::In,
        OperatorKind::NotIn,
        OperatorKind::Between,
        OperatorKind::IsNull,
        OperatorKind::IsNotNull,
    ];

    /// Returns the canonical token for this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            OperatorKind::Eq => "eq",
            OperatorKind::Ne => "ne",
            OperatorKind::Gt => "gt",
            OperatorKind::Ge => "ge",
            OperatorKind::Lt => "lt",
            OperatorKind::Le => "le",
            OperatorKind::Like => "like",
            OperatorKind::Contains => "contains",
            OperatorKind::In => "in",
            OperatorKind::NotIn => "not_in",
            OperatorKind::Between => "between",
            OperatorKind::IsNull => "is_null",
            OperatorKind::IsNotNull => "is_not_null",
            OperatorKind::And => "and",
            OperatorKind::Or => "or",
            OperatorKind::Not => "not",
        }
    }

    /// Returns true for `and`, `or` and `not`.
    pub fn is_logical(self) -> bool {
        matches!(self, OperatorKind::And | OperatorKind::Or | OperatorKind::Not)
    }

    /// Returns true for operators whose value is a list.
    pub fn takes_list(self) -> bool {
        matches!(
            self,
            OperatorKind::In | OperatorKind::NotIn | OperatorKind::Between
        )
    }

    /// Returns true for `is_null` and `is_not_null`.
    pub fn is_null_check(self) -> bool {
        matches!(self, OperatorKind::IsNull | OperatorKind::IsNotNull)
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatorKind {
    type Err = FilterError;

    /// Parses an operator token, normalizing aliases (`gte`, `lte`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.to_lowercase().as_str() {
            "eq" => OperatorKind::Eq,
            "ne" | "neq" => OperatorKind::Ne,
            "gt" => OperatorKind::Gt,
            "ge" | "gte" => OperatorKind::Ge,
            "lt" => OperatorKind::Lt,
            "le" | "lte" => OperatorKind::Le,
            "like" => OperatorKind::Like,
            "contains" => OperatorKind::Contains,
            "in" => OperatorKind::In,
            "not_in" | "nin" => OperatorKind::NotIn,
            "between" => OperatorKind::Between,
            "is_null" => OperatorKind::IsNull,
            "is_not_null" => OperatorKind::IsNotNull,
            "and" => OperatorKind::And,
            "or" => OperatorKind::Or,
            "not" => OperatorKind::Not,
            _ => {
                return Err(FilterError::syntax(
                    SyntaxErrorKind::UnknownOperator(s.to_string()),
                    s,
                ))
            }
        };
        Ok(op)
    }
}

/// The logical connective of a group node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connective {
    And,
    Or,
    Not,
}

impl Connective {
    /// Returns the connective for a logical operator, or `None` for comparisons.
    pub fn from_operator(op: OperatorKind) -> Option<Self> {
        match op {
            OperatorKind::And => Some(Connective::And),
            OperatorKind::Or => Some(Connective::Or),
            OperatorKind::Not => Some(Connective::Not),
            _ => None,
        }
    }
}

impl From<Connective> for OperatorKind {
    fn from(c: Connective) -> Self {
        match c {
            Connective::And => OperatorKind::And,
            Connective::Or => OperatorKind::Or,
            Connective::Not => OperatorKind::Not,
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        OperatorKind::from(*self).fmt(f)
    }
}

/// Maps each type category to the operators permitted on it.
///
/// Categories without an entry fall back to the `default` entry. The map is
/// immutable once handed to a compiler; build a new one to change behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowedOperatorMap {
    entries: HashMap<TypeCategory, BTreeSet<OperatorKind>>,
}

impl Default for AllowedOperatorMap {
    fn default() -> Self {
        use OperatorKind::*;

        let string = [Eq, Ne, Like, Contains, In, NotIn, IsNull, IsNotNull];
        let ordered = [Eq, Ne, Gt, Ge, Lt, Le, In, NotIn, Between, IsNull, IsNotNull];
        let boolean = [Eq, Ne, IsNull, IsNotNull];
        let identifier = [Eq, Ne, In, NotIn, IsNull, IsNotNull];

        Self::empty()
            .with(TypeCategory::String, string)
            .with(TypeCategory::Numeric, ordered)
            .with(TypeCategory::Boolean, boolean)
            .with(TypeCategory::Datetime, ordered)
            .with(TypeCategory::Date, ordered)
            .with(TypeCategory::Identifier, identifier)
            .with(TypeCategory::Default, boolean)
    }
}

impl AllowedOperatorMap {
    /// Creates a map with no entries; every comparison is rejected.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the map with the entry for `category` replaced.
    pub fn with(
        mut self,
        category: TypeCategory,
        operators: impl IntoIterator<Item = OperatorKind>,
    ) -> Self {
        self.entries
            .insert(category, operators.into_iter().collect());
        self
    }

    /// Returns the operator set for a category, falling back to `default`.
    pub fn resolve(&self, category: TypeCategory) -> Option<&BTreeSet<OperatorKind>> {
        self.entries
            .get(&category)
            .or_else(|| self.entries.get(&TypeCategory::Default))
    }

    /// Returns true if `operator` is permitted for `category`.
    ///
    /// Logical connectives are always permitted.
    pub fn permits(&self, category: TypeCategory, operator: OperatorKind) -> bool {
        operator.is_logical()
            || self
                .resolve(category)
                .is_some_and(|ops| ops.contains(&operator))
    }

    /// Iterates over the explicit entries.
    pub fn entries(&self) -> impl Iterator<Item = (&TypeCategory, &BTreeSet<OperatorKind>)> {
        self.entries.iter()
    }
}

/// Validates fields and operators against a catalogue and an allowlist.
#[derive(Debug, Clone, Copy)]
pub struct OperatorValidator<'a> {
    catalogue: &'a FieldCatalogue,
    allowed: &'a AllowedOperatorMap,
}

impl<'a> OperatorValidator<'a> {
    /// Creates a validator over the given catalogue and allowlist.
    pub fn new(catalogue: &'a FieldCatalogue, allowed: &'a AllowedOperatorMap) -> Self {
        Self { catalogue, allowed }
    }

    /// Resolves `field` and checks that `operator` is allowed on it.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::FieldNotFound` if the field is unknown; this check
    /// runs first. Returns `FilterError::OperatorNotAllowed` if the operator is
    /// not in the allowed set for the field's category.
    pub fn validate(&self, field: &str, operator: OperatorKind) -> FilterResult<&'a FieldDescriptor> {
        let descriptor = self.catalogue.categorize(field)?;
        self.check(descriptor, operator)?;
        Ok(descriptor)
    }

    /// Checks `operator` against an already resolved field.
    pub fn check(&self, descriptor: &FieldDescriptor, operator: OperatorKind) -> FilterResult<()> {
        if self.allowed.permits(descriptor.category, operator) {
            Ok(())
        } else {
            Err(FilterError::OperatorNotAllowed {
                field: descriptor.name.clone(),
                operator,
                category: descriptor.category,
            })
        }
    }
}
