//! Compiled query output formatting.

use owo_colors::OwoColorize;
use query_filter_rs::compiler::SqlQuery;
use query_filter_rs::CompiledQuery;

/// Formats a compiled query as JSON.
pub fn format_query_json(query: &CompiledQuery) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(query)
}

/// Formats a compiled query as readable text.
pub fn format_query_text(query: &CompiledQuery, use_colors: bool) -> String {
    let mut output = String::new();

    let label = |name: &str| {
        if use_colors {
            name.bold().to_string()
        } else {
            name.to_string()
        }
    };

    output.push_str(&format!("{} {}\n", label("Where:"), query.predicate));
    if let Some(sort) = &query.sort {
        output.push_str(&format!("{} {sort}\n", label("Sort:")));
    }
    if let Some(page) = &query.page {
        output.push_str(&format!(
            "{} {} (size {}, offset {})\n",
            label("Page:"),
            page.page,
            page.size,
            page.offset()
        ));
    }

    output
}

/// Formats rendered SQL as JSON.
pub fn format_sql_json(sql: &SqlQuery) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(sql)
}

/// Formats rendered SQL followed by its numbered parameters.
pub fn format_sql_text(sql: &SqlQuery, use_colors: bool) -> String {
    let mut output = format!("{}\n", sql.sql);

    for (i, param) in sql.params.iter().enumerate() {
        let index = format!("${}", i + 1);
        let value = param.to_filter_text();
        if use_colors {
            output.push_str(&format!("  {} = {value}\n", index.dimmed()));
        } else {
            output.push_str(&format!("  {index} = {value}\n"));
        }
    }

    output
}
