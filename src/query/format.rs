//! Textual rendering of query results.

use crate::db::{QueryResult, Value};

/// Answer given when a query returns no rows.
pub const NO_RESULTS: &str = "No se encontraron resultados para la consulta.";

/// Renders the first column of every row as a short answer.
///
/// Other columns are ignored.
pub fn format_simple(result: &QueryResult) -> String {
    let values: Vec<String> = result
        .first_column()
        .map(Value::to_display_string)
        .collect();

    match values.as_slice() {
        [] => NO_RESULTS.to_string(),
        [single] => format!("Resultado: {}", single),
        many => format!("Resultados: {}", many.join(", ")),
    }
}

/// Renders the whole result as a plain-text table.
///
/// A header line, a separator and one line per row. Numbers are
/// right-aligned, everything else left-aligned. Nothing is truncated.
/// Line breaks and tabs inside headers or cells are written as `\n`, `\r`
/// and `\t` so every row stays on one line.
pub fn format_table(result: &QueryResult) -> String {
    let headers: Vec<String> = result
        .columns
        .iter()
        .map(|c| escape_control(&c.name))
        .collect();
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|value| escape_control(&value.to_display_string()))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(cells.len() + 2);

    lines.push(join_cells(
        headers
            .iter()
            .zip(&widths)
            .map(|(header, &width)| pad_left_aligned(header, width)),
    ));

    lines.push(
        widths
            .iter()
            .map(|&width| "-".repeat(width))
            .collect::<Vec<_>>()
            .join("-+-"),
    );

    for (row, values) in cells.iter().zip(&result.rows) {
        lines.push(join_cells(row.iter().zip(values).zip(&widths).map(
            |((cell, value), &width)| {
                if value.is_numeric() {
                    format!("{:>width$}", cell, width = width)
                } else {
                    pad_left_aligned(cell, width)
                }
            },
        )));
    }

    lines.join("\n")
}

fn escape_control(text: &str) -> String {
    if !text.contains(['\n', '\r', '\t']) {
        return text.to_string();
    }

    let mut escaped = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        match c {
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn pad_left_aligned(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}

fn join_cells(cells: impl Iterator<Item = String>) -> String {
    cells
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}
