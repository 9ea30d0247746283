//! Value Caster: coerces raw filter values to a field's category.

use tracing::warn;
use uuid::Uuid;

use crate::catalogue::TypeCategory;
use crate::error::{FilterError, FilterResult};
use crate::operators::OperatorKind;
use crate::value::{midnight, parse_bool, parse_date, parse_datetime, Value};

/// Coerces values to the native representation of a type category.
///
/// Numeric and boolean failures are always errors. Malformed temporal and
/// identifier text is passed through unchanged in lenient mode (the
/// default) and rejected in strict mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueCaster {
    strict: bool,
}

impl ValueCaster {
    /// Creates a lenient caster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a caster that rejects malformed temporal and identifier text.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Returns true if this caster rejects malformed temporal/identifier text.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Casts `value` for use with `operator` on a field of `category`.
    ///
    /// - `is_null`/`is_not_null` always yield a boolean flag.
    /// - `like` and `contains` yield the stringified raw value.
    /// - `in`, `not_in` and `between` yield a list, casting each element;
    ///   a scalar is wrapped in a one-element list first.
    /// - Other operators yield a scalar; a one-element list is unwrapped.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::Arity` if `between` does not receive exactly two
    /// values, or a scalar operator receives several. Returns
    /// `FilterError::Cast` if an element cannot be coerced.
    pub fn cast(
        &self,
        category: TypeCategory,
        operator: OperatorKind,
        value: &Value,
    ) -> FilterResult<Value> {
        if operator.is_null_check() {
            return null_flag(value);
        }

        if matches!(operator, OperatorKind::Like | OperatorKind::Contains) {
            return match value {
                Value::Null => Ok(Value::Null),
                Value::String(_) => Ok(value.clone()),
                other => Ok(Value::String(single(operator, other)?.to_string())),
            };
        }

        if operator.takes_list() {
            let items: &[Value] = match value {
                Value::List(items) => items,
                scalar => std::slice::from_ref(scalar),
            };
            let cast = items
                .iter()
                .map(|item| self.cast_scalar(category, item))
                .collect::<FilterResult<Vec<_>>>()?;

            if operator == OperatorKind::Between && cast.len() != 2 {
                return Err(FilterError::Arity {
                    operator,
                    expected: 2,
                    found: cast.len(),
                });
            }
            return Ok(Value::List(cast));
        }

        self.cast_scalar(category, single(operator, value)?)
    }

    /// Casts one scalar to `category`.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::Cast` for non-numeric text on numeric fields,
    /// non-boolean input on boolean fields, nested lists, and (in strict
    /// mode) malformed temporal or identifier text.
    pub fn cast_scalar(&self, category: TypeCategory, value: &Value) -> FilterResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        if let Value::List(_) = value {
            return Err(FilterError::cast(
                value.to_string(),
                category,
                "nested lists are not supported",
            ));
        }

        match category {
            TypeCategory::String => match value {
                Value::String(_) => Ok(value.clone()),
                other => Ok(Value::String(other.to_string())),
            },
            TypeCategory::Numeric => cast_numeric(value),
            TypeCategory::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::String(s) => parse_bool(s.trim())
                    .map(Value::Bool)
                    .ok_or_else(|| FilterError::cast(s, category, "expected 'true' or 'false'")),
                other => Err(FilterError::cast(
                    other.to_string(),
                    category,
                    format!("cannot convert {} to boolean", other.kind()),
                )),
            },
            TypeCategory::Datetime => match value {
                Value::DateTime(_) => Ok(value.clone()),
                Value::Date(d) => Ok(Value::DateTime(midnight(*d))),
                Value::String(s) => {
                    let text = s.trim();
                    match parse_datetime(text).or_else(|| parse_date(text).map(midnight)) {
                        Some(dt) => Ok(Value::DateTime(dt)),
                        None => self.malformed(value, category, "not an ISO-8601 date-time"),
                    }
                }
                other => self.malformed(other, category, "not an ISO-8601 date-time"),
            },
            TypeCategory::Date => match value {
                Value::Date(_) => Ok(value.clone()),
                Value::DateTime(dt) => Ok(Value::Date(dt.date())),
                Value::String(s) => {
                    let text = s.trim();
                    match parse_date(text).or_else(|| parse_datetime(text).map(|dt| dt.date())) {
                        Some(d) => Ok(Value::Date(d)),
                        None => self.malformed(value, category, "not an ISO-8601 date"),
                    }
                }
                other => self.malformed(other, category, "not an ISO-8601 date"),
            },
            TypeCategory::Identifier => match value {
                Value::Uuid(_) => Ok(value.clone()),
                Value::String(s) => match Uuid::parse_str(s.trim()) {
                    Ok(u) => Ok(Value::Uuid(u)),
                    Err(_) => self.malformed(value, category, "not a valid UUID"),
                },
                other => self.malformed(other, category, "not a valid UUID"),
            },
            TypeCategory::Default => Ok(value.clone()),
        }
    }

    /// Passes a malformed value through (lenient) or rejects it (strict).
    fn malformed(&self, value: &Value, category: TypeCategory, reason: &str) -> FilterResult<Value> {
        if self.strict {
            return Err(FilterError::cast(value.to_string(), category, reason));
        }
        warn!(value = %value, %category, reason, "passing malformed value through uncast");
        Ok(value.clone())
    }
}

/// Unwraps the single value a scalar operator expects.
fn single(operator: OperatorKind, value: &Value) -> FilterResult<&Value> {
    match value {
        Value::List(items) if items.len() == 1 => Ok(&items[0]),
        Value::List(items) => Err(FilterError::Arity {
            operator,
            expected: 1,
            found: items.len(),
        }),
        scalar => Ok(scalar),
    }
}

fn null_flag(value: &Value) -> FilterResult<Value> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::Null => Ok(Value::Bool(true)),
        Value::String(s) if s.trim().is_empty() => Ok(Value::Bool(true)),
        Value::String(s) => parse_bool(s.trim()).map(Value::Bool).ok_or_else(|| {
            FilterError::cast(s, TypeCategory::Boolean, "expected 'true' or 'false'")
        }),
        Value::List(items) if items.len() == 1 => null_flag(&items[0]),
        other => Err(FilterError::cast(
            other.to_string(),
            TypeCategory::Boolean,
            "expected 'true' or 'false'",
        )),
    }
}

fn cast_numeric(value: &Value) -> FilterResult<Value> {
    match value {
        Value::Int(_) | Value::Float(_) => Ok(value.clone()),
        Value::String(s) => {
            let text = s.trim();
            if let Ok(i) = text.parse::<i64>() {
                return Ok(Value::Int(i));
            }
            if text.contains(&['.', 'e', 'E'][..]) {
                if let Ok(f) = text.parse::<f64>() {
                    if f.is_finite() {
                        return Ok(Value::Float(f));
                    }
                }
            }
            Err(FilterError::cast(s, TypeCategory::Numeric, "not a number"))
        }
        other => Err(FilterError::cast(
            other.to_string(),
            TypeCategory::Numeric,
            format!("cannot convert {} to a number", other.kind()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::catalogue::TypeCategory as C;
    use crate::operators::OperatorKind::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_string_category_stringifies() {
        let caster = ValueCaster::new();
        assert_eq!(caster.cast(C::String, Eq, &Value::Int(123)).unwrap(), Value::from("123"));
        assert_eq!(caster.cast(C::String, Eq, &Value::Bool(true)).unwrap(), Value::from("true"));
        assert_eq!(
            caster.cast(C::String, In, &Value::from(vec![1, 2])).unwrap(),
            Value::from(vec!["1", "2"])
        );
    }

    #[test]
    fn test_numeric_category() {
        let caster = ValueCaster::new();
        assert_eq!(caster.cast(C::Numeric, Eq, &Value::from("123")).unwrap(), Value::Int(123));
        assert_eq!(caster.cast(C::Numeric, Eq, &Value::from("123.45")).unwrap(), Value::Float(123.45));
        assert_eq!(caster.cast(C::Numeric, Gt, &Value::from(" 7 ")).unwrap(), Value::Int(7));

        let err = caster.cast(C::Numeric, Eq, &Value::from("invalid")).unwrap_err();
        assert!(matches!(err, FilterError::Cast { category: C::Numeric, .. }));
        assert!(caster.cast(C::Numeric, Eq, &Value::Bool(true)).is_err());
        assert!(caster.cast(C::Numeric, Eq, &Value::from("inf")).is_err());
    }

    #[test]
    fn test_boolean_category() {
        let caster = ValueCaster::new();
        assert_eq!(caster.cast(C::Boolean, Eq, &Value::from("TRUE")).unwrap(), Value::Bool(true));
        assert_eq!(caster.cast(C::Boolean, Eq, &Value::from("false")).unwrap(), Value::Bool(false));
        assert!(caster.cast(C::Boolean, Eq, &Value::from("invalid")).is_err());
        assert!(caster.cast(C::Boolean, Eq, &Value::Int(1)).is_err());
    }

    #[test]
    fn test_temporal_categories() {
        let caster = ValueCaster::new();
        assert_eq!(
            caster.cast(C::Datetime, Ge, &Value::from("2024-01-01T10:30:00")).unwrap(),
            Value::DateTime(date(2024, 1, 1).and_hms_opt(10, 30, 0).unwrap())
        );
        assert_eq!(
            caster.cast(C::Datetime, Ge, &Value::from("2024-01-01")).unwrap(),
            Value::DateTime(date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap())
        );
        assert_eq!(
            caster.cast(C::Date, Eq, &Value::from("2024-01-01")).unwrap(),
            Value::Date(date(2024, 1, 1))
        );
        assert_eq!(
            caster
                .cast(C::Date, Eq, &Value::DateTime(date(2024, 3, 2).and_hms_opt(9, 0, 0).unwrap()))
                .unwrap(),
            Value::Date(date(2024, 3, 2))
        );
    }

    #[test]
    fn test_malformed_temporal_passes_through_when_lenient() {
        let caster = ValueCaster::new();
        assert_eq!(
            caster.cast(C::Datetime, Eq, &Value::from("invalid-date")).unwrap(),
            Value::from("invalid-date")
        );
        assert_eq!(
            caster.cast(C::Identifier, Eq, &Value::from("invalid-uuid")).unwrap(),
            Value::from("invalid-uuid")
        );
    }

    #[test]
    fn test_malformed_temporal_rejected_when_strict() {
        let caster = ValueCaster::strict();
        assert!(caster.is_strict());
        let err = caster.cast(C::Date, Eq, &Value::from("invalid-date")).unwrap_err();
        assert!(matches!(err, FilterError::Cast { category: C::Date, .. }));
        assert!(caster.cast(C::Identifier, Eq, &Value::from("nope")).is_err());
    }

    #[test]
    fn test_identifier_category() {
        let caster = ValueCaster::new();
        let id = Uuid::new_v4();
        assert_eq!(
            caster.cast(C::Identifier, Eq, &Value::from(id.to_string())).unwrap(),
            Value::Uuid(id)
        );
    }

    #[test]
    fn test_between_requires_two_values() {
        let caster = ValueCaster::new();
        assert_eq!(
            caster.cast(C::Numeric, Between, &Value::from(vec!["18", "65"])).unwrap(),
            Value::from(vec![18, 65])
        );

        for values in [vec![18], vec![18, 25, 30], vec![]] {
            let err = caster.cast(C::Numeric, Between, &Value::from(values)).unwrap_err();
            assert!(matches!(err, FilterError::Arity { operator: Between, expected: 2, .. }));
        }
    }

    #[test]
    fn test_in_accepts_scalar_and_empty_list() {
        let caster = ValueCaster::new();
        assert_eq!(
            caster.cast(C::Numeric, In, &Value::from("5")).unwrap(),
            Value::from(vec![5])
        );
        assert_eq!(
            caster.cast(C::String, NotIn, &Value::List(vec![])).unwrap(),
            Value::List(vec![])
        );
    }

    #[test]
    fn test_scalar_operator_unwraps_single_item_list() {
        let caster = ValueCaster::new();
        assert_eq!(caster.cast(C::Numeric, Eq, &Value::from(vec!["3"])).unwrap(), Value::Int(3));
        let err = caster.cast(C::Numeric, Eq, &Value::from(vec![1, 2])).unwrap_err();
        assert!(matches!(err, FilterError::Arity { expected: 1, found: 2, .. }));
    }

    #[test]
    fn test_like_keeps_raw_text() {
        let caster = ValueCaster::new();
        assert_eq!(caster.cast(C::Numeric, Like, &Value::Int(12)).unwrap(), Value::from("12"));
        assert_eq!(caster.cast(C::String, Like, &Value::from("%doe%")).unwrap(), Value::from("%doe%"));
    }

    #[test]
    fn test_null_check_flags() {
        let caster = ValueCaster::new();
        assert_eq!(caster.cast(C::String, IsNull, &Value::from("false")).unwrap(), Value::Bool(false));
        assert_eq!(caster.cast(C::Numeric, IsNotNull, &Value::from("")).unwrap(), Value::Bool(true));
        assert!(caster.cast(C::String, IsNull, &Value::from("maybe")).is_err());
    }

    #[test]
    fn test_native_values_are_unchanged() {
        let caster = ValueCaster::strict();
        let cases = [
            (C::String, Eq, Value::from("x")),
            (C::Numeric, Eq, Value::Int(4)),
            (C::Numeric, Lt, Value::Float(2.5)),
            (C::Boolean, Eq, Value::Bool(true)),
            (C::Date, Eq, Value::Date(date(2024, 1, 1))),
            (C::Datetime, Gt, Value::DateTime(date(2024, 1, 1).and_hms_opt(1, 2, 3).unwrap())),
            (C::Identifier, Eq, Value::Uuid(Uuid::new_v4())),
            (C::Numeric, Between, Value::from(vec![1, 9])),
            (C::String, In, Value::from(vec!["a", "b"])),
            (C::Default, Eq, Value::from("anything")),
            (C::Numeric, Eq, Value::Null),
        ];

        for (category, operator, value) in cases {
            assert_eq!(caster.cast(category, operator, &value).unwrap(), value);
        }
    }
}
