//! Parser for `field__operator=value` filter strings.

use std::collections::HashSet;

use tracing::trace;

use super::ast::{Condition, SortSpec};
use super::lexer::{unquote, Lexer, Piece};
use crate::error::{FilterError, FilterResult, SyntaxErrorKind};
use crate::operators::OperatorKind;
use crate::value::{parse_bool, Value};

/// Parser for flat filter strings.
///
/// # Grammar
///
/// ```text
/// filter_string := segment ("," segment)*
/// segment       := field "__" operator "=" value
/// value         := scalar | quoted_string | list
/// list          := value ("," value)*      // list operators only
/// ```
///
/// A comma-separated piece starts a new segment if it is unquoted and has
/// `__` before its first `=`. Any other piece continues the value list of
/// the previous segment, which must use `in`, `not_in` or `between`.
///
/// # Example
///
/// ```
/// use query_filter_rs::filter::FilterParser;
/// use query_filter_rs::{OperatorKind, Value};
///
/// let conditions = FilterParser::parse("status__in=active,pending,age__gte=18").unwrap();
/// assert_eq!(conditions.len(), 2);
/// assert_eq!(conditions[1].operator, OperatorKind::Ge);
/// assert_eq!(conditions[1].value, Value::Int(18));
/// ```
pub struct FilterParser;

/// A segment being accumulated from one or more pieces.
struct RawSegment<'a> {
    field: &'a str,
    operator: OperatorKind,
    values: Vec<&'a str>,
    text: String,
}

impl FilterParser {
    /// Parses a filter string into an ordered list of conditions.
    ///
    /// Blank input yields no conditions.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::Syntax` for a missing `=` or `__` marker, an
    /// empty field name, an unknown or logical operator, a duplicated field,
    /// a `between` with other than two values, a non-boolean null check or
    /// an unterminated quote.
    pub fn parse(input: &str) -> FilterResult<Vec<Condition>> {
        let pieces = Lexer::new(input).split()?;
        let mut segments: Vec<RawSegment<'_>> = Vec::new();

        for piece in pieces {
            let text = piece.text.trim();
            if text.is_empty() {
                continue;
            }

            if starts_segment(&piece) {
                segments.push(Self::open_segment(text)?);
                continue;
            }

            match segments.last_mut() {
                Some(segment) if segment.operator.takes_list() => {
                    segment.values.push(text);
                    segment.text.push(',');
                    segment.text.push_str(text);
                }
                _ => {
                    let kind = if text.contains('=') {
                        SyntaxErrorKind::MissingOperator
                    } else {
                        SyntaxErrorKind::MissingEquals
                    };
                    return Err(FilterError::syntax(kind, text));
                }
            }
        }

        let mut seen = HashSet::new();
        let mut conditions = Vec::with_capacity(segments.len());

        for segment in segments {
            if !seen.insert(segment.field) {
                return Err(FilterError::syntax(
                    SyntaxErrorKind::DuplicateField(segment.field.to_string()),
                    segment.text,
                ));
            }

            let condition = Self::finish_segment(&segment)?;
            trace!(
                field = %condition.field,
                operator = %condition.operator,
                value = ?condition.value,
                "parsed filter segment"
            );
            conditions.push(condition);
        }

        Ok(conditions)
    }

    /// Parses a sort token: `field` for ascending, `-field` for descending.
    ///
    /// # Errors
    ///
    /// Returns `SyntaxErrorKind::EmptySort` if no field name remains.
    pub fn parse_sort(token: &str) -> FilterResult<SortSpec> {
        let token = token.trim();
        let (field, descending) = match token.strip_prefix('-') {
            Some(rest) => (rest.trim(), true),
            None => (token.strip_prefix('+').unwrap_or(token).trim(), false),
        };

        if field.is_empty() {
            return Err(FilterError::syntax(SyntaxErrorKind::EmptySort, token));
        }

        Ok(SortSpec {
            field: field.to_string(),
            descending,
        })
    }

    /// Splits `field__op=value` into its parts.
    fn open_segment(text: &str) -> FilterResult<RawSegment<'_>> {
        let (lhs, rhs) = text
            .split_once('=')
            .ok_or_else(|| FilterError::syntax(SyntaxErrorKind::MissingEquals, text))?;
        let (field, op) = lhs
            .rsplit_once("__")
            .ok_or_else(|| FilterError::syntax(SyntaxErrorKind::MissingOperator, text))?;

        let field = field.trim();
        if field.is_empty() {
            return Err(FilterError::syntax(SyntaxErrorKind::EmptyField, text));
        }

        let op = op.trim();
        let operator: OperatorKind = op
            .parse()
            .map_err(|_| FilterError::syntax(SyntaxErrorKind::UnknownOperator(op.to_string()), text))?;
        if operator.is_logical() {
            return Err(FilterError::syntax(
                SyntaxErrorKind::LogicalOperator(op.to_string()),
                text,
            ));
        }

        Ok(RawSegment {
            field,
            operator,
            values: vec![rhs.trim()],
            text: text.to_string(),
        })
    }

    /// Turns the accumulated raw values into a typed condition.
    fn finish_segment(segment: &RawSegment<'_>) -> FilterResult<Condition> {
        let operator = segment.operator;

        let (value, raw) = if operator.takes_list() {
            let tokens: Vec<&str> = segment
                .values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .collect();

            if operator == OperatorKind::Between && tokens.len() != 2 {
                return Err(FilterError::syntax(
                    SyntaxErrorKind::BetweenArity(tokens.len()),
                    segment.text.as_str(),
                ));
            }

            let items = tokens.iter().map(|t| token_value(t)).collect();
            let written = tokens.iter().map(|t| Value::from(written_text(t))).collect();
            (Value::List(items), Some(Value::List(written)))
        } else {
            let token = segment.values.first().copied().unwrap_or_default();
            if operator.is_null_check() {
                let flag = written_text(token).trim();
                let value = if flag.is_empty() {
                    Value::Bool(true)
                } else {
                    parse_bool(flag).map(Value::Bool).ok_or_else(|| {
                        FilterError::syntax(
                            SyntaxErrorKind::InvalidBoolean(flag.to_string()),
                            segment.text.as_str(),
                        )
                    })?
                };
                (value, None)
            } else {
                (token_value(token), Some(Value::from(written_text(token))))
            }
        };

        Ok(Condition {
            field: segment.field.to_string(),
            operator,
            value,
            raw,
        })
    }
}

/// Returns true if the piece opens a new `field__op=value` segment.
fn starts_segment(piece: &Piece<'_>) -> bool {
    if piece.starts_quoted() {
        return false;
    }
    match piece.text.find('=') {
        Some(eq) => piece.text[..eq].contains("__"),
        None => false,
    }
}

/// Types a single value token; quoted tokens are always strings.
fn token_value(token: &str) -> Value {
    match unquote(token) {
        Some(inner) => Value::String(inner.to_string()),
        None => Value::infer(token),
    }
}

/// The token as written, without its outer quotes.
fn written_text(token: &str) -> &str {
    unquote(token).unwrap_or(token)
}
