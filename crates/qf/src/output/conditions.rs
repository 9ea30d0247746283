//! Parsed condition output formatting.

use owo_colors::OwoColorize;
use query_filter_rs::filter::to_filter_string;
use query_filter_rs::{Condition, SortSpec, Value};
use serde::Serialize;

use super::helpers::{format_header, truncate_str};

/// JSON output structure for the parse command.
#[derive(Serialize)]
pub struct ParseOutput<'a> {
    pub conditions: &'a [Condition],
    pub canonical: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<&'a SortSpec>,
}

/// Formats parsed conditions as JSON.
pub fn format_conditions_json(
    conditions: &[Condition],
    sort: Option<&SortSpec>,
) -> Result<String, serde_json::Error> {
    let output = ParseOutput {
        conditions,
        canonical: to_filter_string(conditions),
        sort,
    };
    serde_json::to_string_pretty(&output)
}

/// Formats parsed conditions as a table, followed by the canonical form.
pub fn format_conditions_table(
    conditions: &[Condition],
    sort: Option<&SortSpec>,
    use_colors: bool,
) -> String {
    let mut output = String::new();

    if conditions.is_empty() {
        output.push_str("No conditions.\n");
    } else {
        let header = format!("{:<20} {:<12} {:<16} {}", "Field", "Operator", "Kind", "Value");
        output.push_str(&format_header(&header, use_colors));

        for condition in conditions {
            let field = truncate_str(&condition.field, 20);
            let operator = condition.operator.as_str();
            let kind = value_kind(&condition.value);
            let value = condition.value.to_filter_text();

            if use_colors {
                output.push_str(&format!(
                    "{:<20} {:<12} {:<16} {}\n",
                    field.cyan(),
                    operator.yellow(),
                    kind.dimmed(),
                    value
                ));
            } else {
                output.push_str(&format!("{field:<20} {operator:<12} {kind:<16} {value}\n"));
            }
        }

        output.push_str(&format!("\nCanonical: {}\n", to_filter_string(conditions)));
    }

    if let Some(sort) = sort {
        let direction = if sort.descending { "descending" } else { "ascending" };
        output.push_str(&format!("Sort: {} ({direction})\n", sort.field));
    }

    output
}

/// Names a value's kind, including the element kind of lists.
fn value_kind(value: &Value) -> String {
    match value {
        Value::List(items) => match items.first() {
            Some(first) => format!("list<{}>", first.kind()),
            None => "list".to_string(),
        },
        other => other.kind().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_filter_rs::FilterParser;

    #[test]
    fn test_format_conditions_table() {
        let conditions = FilterParser::parse("age__between=18,65,name__eq=\"Doe, J\"").unwrap();
        let output = format_conditions_table(&conditions, None, false);

        assert!(output.contains("Field"));
        assert!(output.contains("between"));
        assert!(output.contains("list<integer>"));
        assert!(output.contains("\"Doe, J\""));
        assert!(output.contains("Canonical: age__between=18,65,name__eq=\"Doe, J\""));
    }

    #[test]
    fn test_format_conditions_table_empty_with_sort() {
        let sort = SortSpec::descending("age");
        let output = format_conditions_table(&[], Some(&sort), false);
        assert!(output.contains("No conditions."));
        assert!(output.contains("Sort: age (descending)"));
    }

    #[test]
    fn test_format_conditions_json() {
        let conditions = FilterParser::parse("is_active__eq=true").unwrap();
        let json = format_conditions_json(&conditions, None).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["conditions"][0]["field"], "is_active");
        assert_eq!(parsed["conditions"][0]["operator"], "eq");
        assert_eq!(parsed["conditions"][0]["value"], true);
        assert_eq!(parsed["canonical"], "is_active__eq=true");
        assert!(parsed.get("sort").is_none());
    }
}
