//! Text and JSON rendering of results and history for the shell.

use serde::Serialize;

use crate::history::HistoryEntry;
use crate::query::QueryResult;

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned text tables.
    #[default]
    Text,
    /// One JSON document per result.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Renders one query result.
pub fn render_result(result: &QueryResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => render_result_text(result),
        OutputFormat::Json => to_json(result),
    }
}

/// Renders a list of history entries.
pub fn render_history(entries: &[HistoryEntry], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(&entries),
        OutputFormat::Text if entries.is_empty() => "No history.".to_string(),
        OutputFormat::Text => entries
            .iter()
            .map(|e| format!("#{} {}", e.history_id, e))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Renders every field of a single history entry.
pub fn render_entry(entry: &HistoryEntry, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(entry),
        OutputFormat::Text => {
            let mut out = format!(
                "id:         {}\nconnection: {}\nrun at:     {}\nduration:   {}ms\n",
                entry.history_id,
                entry.conn_id,
                entry.run_at.format("%Y-%m-%d %H:%M:%S"),
                entry.duration_ms
            );
            if entry.success {
                out.push_str(&format!("status:     ok ({} rows)\n", entry.row_count));
            } else {
                out.push_str(&format!("status:     failed: {}\n", entry.error_message));
            }
            out.push_str(&entry.sql);
            out
        }
    }
}

fn render_result_text(result: &QueryResult) -> String {
    match result {
        QueryResult::Success(success) => {
            let rows: Vec<Vec<String>> = success
                .rows()
                .iter()
                .map(|row| row.iter().map(|v| v.to_display_string()).collect())
                .collect();
            let table = format_table(success.columns(), &rows);
            let plural = if result.row_count() == 1 { "" } else { "s" };
            format!(
                "{}\n({} row{}, {}ms)",
                table,
                result.row_count(),
                plural,
                result.elapsed_ms()
            )
        }
        QueryResult::Failure(failure) => {
            format!("ERROR: {} ({}ms)", failure.message(), result.elapsed_ms())
        }
    }
}

/// Formats a table as aligned text.
pub fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut output = String::new();

    output.push_str(&format_line(headers, &widths));
    output.push('\n');

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&separator.join("-+-"));
    output.push('\n');

    for row in rows {
        output.push_str(&format_line(row, &widths));
        output.push('\n');
    }

    output.trim_end().to_string()
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let width = widths.get(i).copied().unwrap_or(0);
            format!("{:width$}", cell, width = width)
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {}\"}}", e))
}
