//! Plain-text table rendering for the terminal summaries.

use std::{borrow::Cow, fmt::Write as _};

/// Cells wider than this are cut and end with `…`.
pub const DEFAULT_MAX_CELL_WIDTH: usize = 40;

#[derive(Debug, Clone)]
pub struct TableStyle {
    pub max_cell_width: usize,
    pub separator: &'static str,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            max_cell_width: DEFAULT_MAX_CELL_WIDTH,
            separator: "  ",
        }
    }
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    render_table_with(headers, rows, &TableStyle::default())
}

pub fn render_table_with(headers: &[String], rows: &[Vec<String>], style: &TableStyle) -> String {
    let prepare = |value: &str| fit_cell(&sanitize_cell(value), style.max_cell_width);
    let header_cells: Vec<String> = headers.iter().map(|h| prepare(h.as_str())).collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            (0..headers.len())
                .map(|idx| prepare(row.get(idx).map(String::as_str).unwrap_or("")))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = header_cells
        .iter()
        .map(|cell| char_width(cell).max(3))
        .collect();
    for row in &body {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(char_width(cell));
        }
    }

    let mut output = String::new();
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    for line in std::iter::once(&header_cells)
        .chain(std::iter::once(&rule))
        .chain(body.iter())
    {
        let _ = writeln!(output, "{}", format_line(line, &widths, style.separator));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_line(cells: &[String], widths: &[usize], separator: &str) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let padding = width.saturating_sub(char_width(cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect();
    padded.join(separator).trim_end().to_string()
}

fn char_width(value: &str) -> usize {
    value.chars().count()
}

fn fit_cell(value: &str, max_width: usize) -> String {
    if max_width == 0 || char_width(value) <= max_width {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(max_width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
