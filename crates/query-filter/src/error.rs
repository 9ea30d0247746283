//! Error types for parsing, validating and compiling filters.

use std::fmt;

use thiserror::Error;

use crate::catalogue::TypeCategory;
use crate::operators::OperatorKind;

/// A specialized Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// The specific reason a filter string failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// The segment has no `=` separating the value.
    MissingEquals,
    /// The segment has no `__` operator marker before the `=`.
    MissingOperator,
    /// The segment has an empty field name (`__eq=value`).
    EmptyField,
    /// The operator token is not a known operator.
    UnknownOperator(String),
    /// A logical connective was used where a comparison was expected.
    LogicalOperator(String),
    /// The same field appears twice in one filter string.
    DuplicateField(String),
    /// `between` received the given number of values instead of two.
    BetweenArity(usize),
    /// `is_null`/`is_not_null` received something other than a boolean.
    InvalidBoolean(String),
    /// A quoted value opened at the given byte offset is never closed.
    UnterminatedQuote(usize),
    /// A sort token is empty.
    EmptySort,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxErrorKind::MissingEquals => write!(f, "missing '='"),
            SyntaxErrorKind::MissingOperator => write!(f, "missing '__' operator marker"),
            SyntaxErrorKind::EmptyField => write!(f, "empty field name"),
            SyntaxErrorKind::UnknownOperator(op) => write!(f, "unknown operator '{op}'"),
            SyntaxErrorKind::LogicalOperator(op) => {
                write!(f, "logical operator '{op}' cannot be used in a filter string")
            }
            SyntaxErrorKind::DuplicateField(field) => {
                write!(f, "field '{field}' appears more than once")
            }
            SyntaxErrorKind::BetweenArity(found) => {
                write!(f, "'between' requires exactly 2 values, got {found}")
            }
            SyntaxErrorKind::InvalidBoolean(value) => {
                write!(f, "expected 'true' or 'false', got '{value}'")
            }
            SyntaxErrorKind::UnterminatedQuote(position) => {
                write!(f, "unterminated quote starting at position {position}")
            }
            SyntaxErrorKind::EmptySort => write!(f, "empty sort field"),
        }
    }
}

/// Errors that can occur while parsing, validating or compiling a filter.
///
/// Every variant is deterministic in its input, so callers should map them
/// to a client error rather than retry.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FilterError {
    /// A filter string or sort token is malformed.
    #[error("syntax error in '{segment}': {kind}")]
    Syntax {
        /// What went wrong.
        kind: SyntaxErrorKind,
        /// The offending segment (or whole input when no segment applies).
        segment: String,
    },

    /// The field is not part of the record's catalogue.
    #[error("Field '{field}' not found{}", suggestion_suffix(.suggestion))]
    FieldNotFound {
        /// The unknown field name.
        field: String,
        /// The closest known field name, if any is close enough.
        suggestion: Option<String>,
    },

    /// The operator is not allowed for the field's type category.
    #[error("Operator '{operator}' is not allowed for field '{field}' ({category})")]
    OperatorNotAllowed {
        /// The field the operator was applied to.
        field: String,
        /// The rejected operator.
        operator: OperatorKind,
        /// The category whose allowed set was consulted.
        category: TypeCategory,
    },

    /// A value could not be coerced to the field's category.
    #[error("cannot cast '{value}' to {category}: {reason}")]
    Cast {
        /// The value as it was received.
        value: String,
        /// The target category.
        category: TypeCategory,
        /// Why the cast failed.
        reason: String,
    },

    /// A list-valued operator received the wrong number of values.
    #[error("operator '{operator}' expects {expected} values, got {found}")]
    Arity {
        /// The list-valued operator.
        operator: OperatorKind,
        /// Number of values required.
        expected: usize,
        /// Number of values received.
        found: usize,
    },

    /// A logical tree is malformed.
    #[error("malformed filter tree: {message}")]
    Structural {
        /// Description of the structural violation.
        message: String,
    },

    /// Sorting was requested on a field that is not sortable.
    #[error("Field '{field}' is not sortable")]
    NotSortable {
        /// The field name.
        field: String,
    },

    /// Page or page size is out of range.
    #[error("invalid page request: {message}")]
    InvalidPage {
        /// Description of the invalid input.
        message: String,
    },

    /// A configuration or schema document could not be loaded.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(". Did you mean '{s}'?"),
        None => String::new(),
    }
}

impl FilterError {
    /// Creates a syntax error for the given segment.
    pub fn syntax(kind: SyntaxErrorKind, segment: impl Into<String>) -> Self {
        FilterError::Syntax {
            kind,
            segment: segment.into(),
        }
    }

    /// Creates a field-not-found error without a suggestion.
    pub fn field_not_found(field: impl Into<String>) -> Self {
        FilterError::FieldNotFound {
            field: field.into(),
            suggestion: None,
        }
    }

    /// Creates a cast error.
    pub fn cast(value: impl Into<String>, category: TypeCategory, reason: impl Into<String>) -> Self {
        FilterError::Cast {
            value: value.into(),
            category,
            reason: reason.into(),
        }
    }

    /// Creates a structural error.
    pub fn structural(message: impl Into<String>) -> Self {
        FilterError::Structural {
            message: message.into(),
        }
    }

    /// Creates a pagination error.
    pub fn invalid_page(message: impl Into<String>) -> Self {
        FilterError::InvalidPage {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        FilterError::Config {
            message: message.into(),
        }
    }

    /// Returns a stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            FilterError::Syntax { .. } => "SYNTAX_ERROR",
            FilterError::FieldNotFound { .. } => "FIELD_NOT_FOUND",
            FilterError::OperatorNotAllowed { .. } => "OPERATOR_NOT_ALLOWED",
            FilterError::Cast { .. } => "CAST_ERROR",
            FilterError::Arity { .. } => "ARITY_ERROR",
            FilterError::Structural { .. } => "STRUCTURAL_ERROR",
            FilterError::NotSortable { .. } => "NOT_SORTABLE",
            FilterError::InvalidPage { .. } => "INVALID_PAGE",
            FilterError::Config { .. } => "CONFIG_ERROR",
        }
    }

    /// Returns true when the error was caused by the caller's input.
    ///
    /// Only configuration errors originate outside the request.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, FilterError::Config { .. })
    }
}
