//! Result Display
//!
//! Renders a [`QueryResult`] as a terminal table. Column headers come from
//! the query's column schema, so every listing shows the same labels no
//! matter how the server names its columns.

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::engine::QueryResult;

/// Text shown in place of a table when a query returns nothing
pub const NO_ROWS: &str = "(no rows)";

/// Text for one cell
///
/// `NULL` is spelled out; strings are shown without quotes.
#[must_use]
pub fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build a table for `result`
#[must_use]
pub fn render_table(result: &QueryResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(result.columns.iter());

    for row in &result.rows {
        table.add_row(row.iter().map(format_value));
    }

    table
}

/// Render `result` for the terminal
#[must_use]
pub fn render(result: &QueryResult) -> String {
    if result.is_empty() {
        return NO_ROWS.to_string();
    }
    render_table(result).to_string()
}
