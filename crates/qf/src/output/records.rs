//! Record page output formatting.

use owo_colors::OwoColorize;
use query_filter_rs::Page;
use serde::Serialize;

use super::helpers::{format_cell, format_header, truncate_str};

/// Widest a table column may grow.
const MAX_COLUMN_WIDTH: usize = 32;

/// JSON output structure for the query command.
#[derive(Serialize)]
pub struct PageOutput<'a> {
    pub items: &'a [&'a serde_json::Value],
    pub total: usize,
    pub page: usize,
    pub size: usize,
    pub pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Formats a page of records as JSON.
pub fn format_page_json(page: &Page<&serde_json::Value>) -> Result<String, serde_json::Error> {
    let output = PageOutput {
        items: &page.items,
        total: page.total,
        page: page.page,
        size: page.size,
        pages: page.pages,
        has_next: page.has_next(),
        has_prev: page.has_prev(),
    };
    serde_json::to_string_pretty(&output)
}

/// Formats a page of records as a table.
///
/// Without `fields`, each record prints as one line of compact JSON.
pub fn format_page_table(
    page: &Page<&serde_json::Value>,
    fields: &[String],
    use_colors: bool,
) -> String {
    if page.items.is_empty() {
        return "No matching records.\n".to_string();
    }

    let mut output = String::new();

    if fields.is_empty() {
        for record in &page.items {
            output.push_str(&format!("{record}\n"));
        }
    } else {
        let rows: Vec<Vec<String>> = page
            .items
            .iter()
            .map(|record| {
                fields
                    .iter()
                    .map(|f| truncate_str(&format_cell(record.get(f)), MAX_COLUMN_WIDTH))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = fields
            .iter()
            .enumerate()
            .map(|(i, f)| {
                rows.iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(f.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header = join_row(fields, &widths);
        output.push_str(&format_header(&header, use_colors));
        for row in &rows {
            output.push_str(&join_row(row, &widths));
            output.push('\n');
        }
    }

    let footer = format!(
        "Page {} of {} ({} matching, {} per page)",
        page.page,
        page.pages.max(1),
        page.total,
        page.size
    );
    if use_colors {
        output.push_str(&format!("\n{}\n", footer.dimmed()));
    } else {
        output.push_str(&format!("\n{footer}\n"));
    }

    output
}

fn join_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
