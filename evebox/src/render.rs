//! Plain-text and JSON rendering of report results.

use crate::error::Result;
use crate::report::session::ReportView;
use crate::report::types::{AggregationResult, ReportRow};
use std::fmt::Write;

/// Renders a title line followed by a two-column table: count, then key.
pub fn render(title: &str, headers: [&str; 2], rows: &[ReportRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out);

    if rows.is_empty() {
        let _ = writeln!(out, "No results.");
        return out;
    }

    let counts: Vec<String> = rows.iter().map(|r| r.count.to_string()).collect();
    let count_width = counts
        .iter()
        .map(|c| c.chars().count())
        .chain(std::iter::once(headers[0].chars().count()))
        .max()
        .unwrap_or(1);
    let key_width = rows
        .iter()
        .map(|r| r.key.chars().count())
        .chain(std::iter::once(headers[1].chars().count()))
        .max()
        .unwrap_or(1);

    let _ = writeln!(out, "{:>cw$} | {}", headers[0], headers[1], cw = count_width);
    let _ = writeln!(out, "{}-+-{}", "-".repeat(count_width), "-".repeat(key_width));
    for (count, row) in counts.iter().zip(rows) {
        let _ = writeln!(out, "{:>cw$} | {}", count, row.key, cw = count_width);
    }
    out
}

pub fn render_result(result: &AggregationResult) -> String {
    render(&result.title, result.headers(), &result.rows)
}

pub fn render_json(result: &AggregationResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Text for whatever the view currently holds.
pub fn render_view(view: &ReportView) -> String {
    match view {
        ReportView::Empty => String::new(),
        ReportView::Loading { request, .. } => format!("Loading {}...\n", request.field),
        ReportView::Ready { result, .. } => render_result(result),
        ReportView::Failed { message, .. } => format!("Error: {}\n", message),
    }
}
