//! In-memory tabular model shared by the source list and the partner catalog.
//!
//! A [`Dataset`] is an ordered header list plus rows of [`Cell`] values. Rows are
//! always padded to the header width so positional access never goes out of range.

use std::{borrow::Cow, collections::HashSet, fmt, path::Path};

use anyhow::Result;
use serde::Serialize;

use crate::{io_utils, workbook};

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Spreadsheet error code such as `#N/A` or `#DIV/0!`.
    Error(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Builds a cell from raw delimited text; an empty field is a null cell.
    pub fn from_field(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Textual representation used for barcode comparison and CSV output.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Cell::Empty => Cow::Borrowed(""),
            Cell::Text(value) | Cell::Error(value) => Cow::Borrowed(value.as_str()),
            Cell::Integer(value) => Cow::Owned(value.to_string()),
            Cell::Float(value) => Cow::Owned(format_float(*value)),
            Cell::Bool(value) => Cow::Owned(value.to_string()),
        }
    }

    /// Upper-cases the cell, coercing numbers and booleans to text first.
    ///
    /// Empty cells stay empty. Error cells have no textual value and are returned
    /// as `Err` carrying the error code.
    pub fn to_uppercase(&self) -> Result<Cell, String> {
        match self {
            Cell::Empty => Ok(Cell::Empty),
            Cell::Error(code) => Err(code.clone()),
            other => Ok(Cell::Text(other.as_text().to_uppercase())),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(EMPTY)
    }

    /// Projects the dataset onto the given row indices, keeping their order.
    pub fn select_rows(&self, indices: impl IntoIterator<Item = usize>) -> Dataset {
        let rows = indices
            .into_iter()
            .filter_map(|idx| self.rows.get(idx).cloned())
            .collect();
        Dataset {
            headers: self.headers.clone(),
            rows,
        }
    }

    pub fn display_rows(&self, limit: Option<usize>) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|row| row.iter().map(|cell| cell.as_text().into_owned()).collect())
            .collect()
    }
}

/// Makes header names unique and non-empty.
///
/// Blank headers become `Unnamed: <position>`; repeated names get a `.1`, `.2`, ...
/// suffix in order of appearance.
pub fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut headers = Vec::with_capacity(raw.len());
    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut counter = 1usize;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{counter}");
            counter += 1;
        }
        seen.insert(candidate.clone());
        headers.push(candidate);
    }
    headers
}

/// Options for loading a dataset from disk.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions<'a> {
    pub sheet: Option<&'a str>,
    pub delimiter: Option<u8>,
    pub encoding: Option<&'a str>,
}

pub fn load(path: &Path, options: &ReadOptions<'_>) -> Result<Dataset> {
    match io_utils::detect_format(path) {
        io_utils::TableFormat::Workbook => workbook::read_workbook(path, options.sheet),
        io_utils::TableFormat::Delimited => {
            let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
            let encoding = io_utils::resolve_encoding(options.encoding)?;
            io_utils::read_delimited(path, delimiter, encoding)
        }
    }
}

pub fn save(dataset: &Dataset, path: &Path, delimiter: Option<u8>) -> Result<()> {
    if io_utils::is_dash(path) {
        return io_utils::write_delimited(dataset, None, delimiter.unwrap_or(b','));
    }
    match io_utils::detect_format(path) {
        io_utils::TableFormat::Workbook => workbook::write_workbook(dataset, path),
        io_utils::TableFormat::Delimited => {
            let delimiter = io_utils::resolve_output_delimiter(Some(path), delimiter, b',');
            io_utils::write_delimited(dataset, Some(path), delimiter)
        }
    }
}
