//! Tests for the filter-string parser.

use super::*;
use crate::error::{FilterError, SyntaxErrorKind};
use crate::operators::OperatorKind;
use crate::value::Value;
use chrono::NaiveDate;
use uuid::Uuid;

fn syntax_kind(input: &str) -> SyntaxErrorKind {
    match FilterParser::parse(input) {
        Err(FilterError::Syntax { kind, .. }) => kind,
        other => panic!("expected syntax error for {input:?}, got {other:?}"),
    }
}

// ==================== Basic Segments ====================

#[test]
fn test_parse_simple_filter() {
    let conditions = FilterParser::parse("name__eq=John").unwrap();
    assert_eq!(
        conditions,
        vec![Condition::new("name", OperatorKind::Eq, "John").with_raw("John")]
    );
}

#[test]
fn test_parse_multiple_filters() {
    let conditions = FilterParser::parse("name__eq=John,age__gt=18").unwrap();
    assert_eq!(conditions.len(), 2);
    assert_eq!(
        conditions[0],
        Condition::new("name", OperatorKind::Eq, "John").with_raw("John")
    );
    assert_eq!(
        conditions[1],
        Condition::new("age", OperatorKind::Gt, 18).with_raw("18")
    );
}

#[test]
fn test_parse_blank_input() {
    assert!(FilterParser::parse("").unwrap().is_empty());
    assert!(FilterParser::parse("   ").unwrap().is_empty());
}

#[test]
fn test_parse_trims_whitespace() {
    let conditions = FilterParser::parse("  name__eq = John  ,  age__gt=18 ").unwrap();
    assert_eq!(
        conditions[0],
        Condition::new("name", OperatorKind::Eq, "John").with_raw("John")
    );
    assert_eq!(
        conditions[1],
        Condition::new("age", OperatorKind::Gt, 18).with_raw("18")
    );
}

#[test]
fn test_parse_skips_trailing_comma() {
    let conditions = FilterParser::parse("name__eq=John,").unwrap();
    assert_eq!(conditions.len(), 1);
}

#[test]
fn test_parse_field_with_double_underscore_uses_last_marker() {
    let conditions = FilterParser::parse("author__name__eq=Ann").unwrap();
    assert_eq!(conditions[0].field, "author__name");
    assert_eq!(conditions[0].operator, OperatorKind::Eq);
}

// ==================== Operators ====================

#[test]
fn test_parse_operator_aliases() {
    let conditions = FilterParser::parse("age__gte=18,score__lte=5").unwrap();
    assert_eq!(conditions[0].operator, OperatorKind::Ge);
    assert_eq!(conditions[1].operator, OperatorKind::Le);
}

#[test]
fn test_parse_operator_case_insensitive() {
    let conditions = FilterParser::parse("age__GT=18").unwrap();
    assert_eq!(conditions[0].operator, OperatorKind::Gt);
}

#[test]
fn test_parse_unknown_operator() {
    assert_eq!(
        syntax_kind("name__invalid_op=value"),
        SyntaxErrorKind::UnknownOperator("invalid_op".to_string())
    );
}

#[test]
fn test_parse_logical_operator_rejected() {
    assert_eq!(
        syntax_kind("age__or=1"),
        SyntaxErrorKind::LogicalOperator("or".to_string())
    );
}

// ==================== Value Inference ====================

#[test]
fn test_parse_numeric_values() {
    let conditions = FilterParser::parse("age__eq=25,score__gt=100.5,balance__lt=-50.5").unwrap();
    assert_eq!(conditions[0].value, Value::Int(25));
    assert_eq!(conditions[1].value, Value::Float(100.5));
    assert_eq!(conditions[2].value, Value::Float(-50.5));
}

#[test]
fn test_parse_boolean_and_null_values() {
    let conditions = FilterParser::parse("is_active__eq=true,is_admin__eq=False,bio__eq=null").unwrap();
    assert_eq!(conditions[0].value, Value::Bool(true));
    assert_eq!(conditions[1].value, Value::Bool(false));
    assert_eq!(conditions[2].value, Value::Null);
}

#[test]
fn test_parse_temporal_values() {
    let conditions =
        FilterParser::parse("created_at__gte=2024-01-01,updated_at__lt=2024-01-01T10:30:00").unwrap();
    let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    assert_eq!(conditions[0].value, Value::Date(day));
    assert_eq!(
        conditions[1].value,
        Value::DateTime(day.and_hms_opt(10, 30, 0).unwrap())
    );
}

#[test]
fn test_parse_uuid_value() {
    let id = Uuid::new_v4();
    let conditions = FilterParser::parse(&format!("id__eq={id}")).unwrap();
    assert_eq!(conditions[0].value, Value::Uuid(id));
}

#[test]
fn test_parse_invalid_uuid_and_date_stay_strings() {
    let conditions = FilterParser::parse("id__eq=invalid-uuid,created_at__eq=invalid-date").unwrap();
    assert_eq!(conditions[0].value, Value::from("invalid-uuid"));
    assert_eq!(conditions[1].value, Value::from("invalid-date"));
}

// ==================== Quoting ====================

#[test]
fn test_parse_quoted_value_is_string() {
    let conditions = FilterParser::parse(r#"name__eq="John Doe",code__eq='42'"#).unwrap();
    assert_eq!(conditions[0].value, Value::from("John Doe"));
    assert_eq!(conditions[1].value, Value::from("42"));
}

#[test]
fn test_parse_quoted_value_with_comma() {
    let conditions = FilterParser::parse(r#"name__eq="Doe, John",age__gt=1"#).unwrap();
    assert_eq!(conditions.len(), 2);
    assert_eq!(conditions[0].value, Value::from("Doe, John"));
}

#[test]
fn test_parse_escaped_quotes_kept_verbatim() {
    let conditions = FilterParser::parse(r#"name__eq="John \"Doe\"""#).unwrap();
    assert_eq!(conditions[0].value, Value::from(r#"John \"Doe\""#));
}

#[test]
fn test_parse_apostrophe_in_unquoted_value() {
    let conditions = FilterParser::parse("name__eq=O'Brien").unwrap();
    assert_eq!(conditions[0].value, Value::from("O'Brien"));
}

#[test]
fn test_parse_unterminated_quote() {
    assert!(matches!(
        syntax_kind(r#"name__eq="John"#),
        SyntaxErrorKind::UnterminatedQuote(9)
    ));
}

// ==================== Lists ====================

#[test]
fn test_parse_list_values() {
    let conditions = FilterParser::parse("status__in=active,pending,created_at__gte=2024-01-01").unwrap();
    assert_eq!(conditions.len(), 2);
    assert_eq!(conditions[0].operator, OperatorKind::In);
    assert_eq!(conditions[0].value, Value::from(vec!["active", "pending"]));
    assert_eq!(conditions[1].field, "created_at");
}

#[test]
fn test_parse_not_in_with_quoted_items() {
    let conditions = FilterParser::parse(r#"name__not_in="a,b",'c',d"#).unwrap();
    assert_eq!(conditions[0].value, Value::from(vec!["a,b", "c", "d"]));
}

#[test]
fn test_parse_empty_list() {
    let conditions = FilterParser::parse("tags__in=").unwrap();
    assert_eq!(conditions[0].value, Value::List(vec![]));
}

#[test]
fn test_parse_between() {
    let conditions = FilterParser::parse("age__between=18,65").unwrap();
    assert_eq!(conditions[0].value, Value::from(vec![18, 65]));
}

#[test]
fn test_parse_between_wrong_arity() {
    assert_eq!(syntax_kind("age__between=18"), SyntaxErrorKind::BetweenArity(1));
    assert_eq!(
        syntax_kind("age__between=18,25,30"),
        SyntaxErrorKind::BetweenArity(3)
    );
}

#[test]
fn test_parse_comma_after_scalar_operator_is_error() {
    assert_eq!(syntax_kind("name__eq=John,Doe"), SyntaxErrorKind::MissingEquals);
}

#[test]
fn test_parse_keeps_written_text() {
    let conditions =
        FilterParser::parse("zip__eq=01234,version__eq=1.10,status__eq=TRUE,sku__eq=null").unwrap();
    assert_eq!(conditions[0].value, Value::Int(1234));
    assert_eq!(conditions[0].written_value(), &Value::from("01234"));
    assert_eq!(conditions[1].written_value(), &Value::from("1.10"));
    assert_eq!(conditions[2].written_value(), &Value::from("TRUE"));
    assert_eq!(conditions[3].value, Value::Null);
    assert_eq!(conditions[3].written_value(), &Value::from("null"));
}

#[test]
fn test_parse_keeps_written_list_items() {
    let conditions = FilterParser::parse(r#"sku__in=007, "x" ,TRUE"#).unwrap();
    assert_eq!(
        conditions[0].value,
        Value::List(vec![Value::Int(7), Value::from("x"), Value::Bool(true)])
    );
    assert_eq!(conditions[0].raw, Some(Value::from(vec!["007", "x", "TRUE"])));
}

#[test]
fn test_parse_null_check_has_no_written_text() {
    let conditions = FilterParser::parse("deleted_at__is_null=TRUE").unwrap();
    assert_eq!(conditions[0].raw, None);
    assert_eq!(conditions[0].written_value(), &Value::Bool(true));
}

// ==================== Null Checks ====================

#[test]
fn test_parse_null_checks() {
    let conditions = FilterParser::parse("deleted_at__is_null=TRUE,email__is_not_null=false").unwrap();
    assert_eq!(conditions[0].value, Value::Bool(true));
    assert_eq!(conditions[1].value, Value::Bool(false));
}

#[test]
fn test_parse_null_check_empty_value_means_true() {
    let conditions = FilterParser::parse("deleted_at__is_null=").unwrap();
    assert_eq!(conditions[0].value, Value::Bool(true));
}

#[test]
fn test_parse_null_check_invalid_flag() {
    assert_eq!(
        syntax_kind("deleted_at__is_null=maybe"),
        SyntaxErrorKind::InvalidBoolean("maybe".to_string())
    );
}

// ==================== Malformed Segments ====================

#[test]
fn test_parse_missing_equals() {
    assert_eq!(syntax_kind("name__eq"), SyntaxErrorKind::MissingEquals);
    assert_eq!(syntax_kind("invalid_filter"), SyntaxErrorKind::MissingEquals);
}

#[test]
fn test_parse_missing_operator() {
    assert_eq!(syntax_kind("name=value"), SyntaxErrorKind::MissingOperator);
}

#[test]
fn test_parse_empty_field() {
    assert_eq!(syntax_kind("__eq=value"), SyntaxErrorKind::EmptyField);
}

#[test]
fn test_parse_duplicate_field() {
    assert_eq!(
        syntax_kind("status__eq=active,status__eq=pending"),
        SyntaxErrorKind::DuplicateField("status".to_string())
    );
    assert_eq!(
        syntax_kind("age__gt=1,age__lt=5"),
        SyntaxErrorKind::DuplicateField("age".to_string())
    );
}

#[test]
fn test_syntax_error_reports_segment() {
    let err = FilterParser::parse("a__eq=1,age__between=1").unwrap_err();
    assert_eq!(
        err,
        FilterError::syntax(SyntaxErrorKind::BetweenArity(1), "age__between=1")
    );
}

// ==================== Canonical Form ====================

#[test]
fn test_reparse_canonical_form_is_stable() {
    let inputs = [
        "name__eq=John,age__gt=18",
        r#"name__eq="Doe, John",code__eq='007'"#,
        r#"name__eq="John \"Doe\"""#,
        "status__in=active,pending,created_at__gte=2024-01-01",
        "score__between=1.5,2,updated_at__lt=2024-01-01T10:30:00.250",
        "tags__in=,bio__is_null=true",
        "deleted__eq=null,flag__ne=false,name__like=%oe%",
        "id__in=123e4567-e89b-12d3-a456-426614174000",
        r"path__eq=C:\dir\,name__eq=x",
        r"path__eq=C:\dir\",
        "zip__eq=01234,version__eq=1.10,status__eq=TRUE",
        "sku__in=007,TRUE,null,1.50",
    ];

    for input in inputs {
        let first = FilterParser::parse(input).unwrap();
        let canonical = to_filter_string(&first);
        let second = FilterParser::parse(&canonical).unwrap();
        assert_eq!(first, second, "canonical form {canonical:?} of {input:?}");
    }
}

#[test]
fn test_canonical_form_keeps_written_text() {
    let conditions = FilterParser::parse("zip__eq=01234,sku__in=007,TRUE").unwrap();
    assert_eq!(to_filter_string(&conditions), "zip__eq=01234,sku__in=007,TRUE");

    let conditions = FilterParser::parse(r"path__eq=C:\dir\").unwrap();
    assert_eq!(conditions[0].value, Value::from(r"C:\dir\"));
    assert_eq!(to_filter_string(&conditions), r"path__eq=C:\dir\");
}

#[test]
fn test_canonical_form_quotes_strings() {
    let conditions = FilterParser::parse("name__eq=John,score__eq=3.0").unwrap();
    assert_eq!(to_filter_string(&conditions), r#"name__eq="John",score__eq=3.0"#);
}

// ==================== Sort Tokens ====================

#[test]
fn test_parse_sort() {
    assert_eq!(FilterParser::parse_sort("age").unwrap(), SortSpec::ascending("age"));
    assert_eq!(FilterParser::parse_sort("-age").unwrap(), SortSpec::descending("age"));
    assert_eq!(FilterParser::parse_sort(" +name ").unwrap(), SortSpec::ascending("name"));
}

#[test]
fn test_parse_sort_empty() {
    for token in ["", "-", "  "] {
        assert!(matches!(
            FilterParser::parse_sort(token),
            Err(FilterError::Syntax {
                kind: SyntaxErrorKind::EmptySort,
                ..
            })
        ));
    }
}

#[test]
fn test_sort_display() {
    assert_eq!(SortSpec::descending("age").to_string(), "-age");
    assert_eq!(SortSpec::ascending("age").to_string(), "age");
}
