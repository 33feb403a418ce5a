//! Spreadsheet reading (calamine) and writing (rust_xlsxwriter).

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto};
use log::debug;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::dataset::{Cell, Dataset, normalize_headers};

pub const OUTPUT_SHEET_NAME: &str = "Sheet1";

/// Reads one worksheet into a [`Dataset`]. The first row is the header row.
///
/// Uses the first sheet unless `sheet` names another one. Rows whose cells are all
/// empty are skipped.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Dataset> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Opening workbook {path:?}"))?;
    let sheet_names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|candidate| candidate.as_str() == name)
            .cloned()
            .ok_or_else(|| {
                anyhow!(
                    "Sheet '{name}' not found in {path:?} (available: {})",
                    sheet_names.join(", ")
                )
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("Workbook {path:?} has no sheets"))?,
    };
    debug!("Reading sheet '{sheet_name}' from {path:?}");

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Reading sheet '{sheet_name}' from {path:?}"))?;
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Dataset::default());
    };
    let headers = normalize_headers(header_row.iter().map(header_text).collect());
    let width = headers.len();

    let data = rows
        .map(|row| row.iter().take(width).map(cell_from_data).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();
    Ok(Dataset::new(headers, data))
}

fn header_text(data: &Data) -> String {
    match cell_from_data(data) {
        Cell::Empty => String::new(),
        other => other.as_text().into_owned(),
    }
}

pub fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Integer(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Text(dt.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(err) => Cell::Error(err.to_string()),
    }
}

/// Serializes the dataset into an in-memory `.xlsx` file.
pub fn workbook_bytes(dataset: &Dataset) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(dataset)?;
    workbook
        .save_to_buffer()
        .context("Serializing workbook")
}

pub fn write_workbook(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut workbook = build_workbook(dataset)?;
    workbook
        .save(path)
        .with_context(|| format!("Saving workbook {path:?}"))
}

fn build_workbook(dataset: &Dataset) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(OUTPUT_SHEET_NAME)?;

    let header_format = Format::new().set_bold();
    for (col, name) in dataset.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, column_number(col)?, name, &header_format)?;
    }
    for (row_idx, row) in dataset.rows.iter().enumerate() {
        let row_number = u32::try_from(row_idx + 1)
            .map_err(|_| anyhow!("Too many rows for a worksheet ({})", row_idx + 1))?;
        for (col, cell) in row.iter().enumerate() {
            write_cell(worksheet, row_number, column_number(col)?, cell)?;
        }
    }
    worksheet.autofit();
    Ok(workbook)
}

fn column_number(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| anyhow!("Too many columns for a worksheet ({})", col + 1))
}

fn write_cell(ws: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    match cell {
        Cell::Empty => {}
        Cell::Text(s) | Cell::Error(s) => {
            ws.write_string(row, col, s)?;
        }
        Cell::Integer(i) => {
            ws.write_number(row, col, *i as f64)?;
        }
        Cell::Float(f) => {
            ws.write_number(row, col, *f)?;
        }
        Cell::Bool(b) => {
            ws.write_boolean(row, col, *b)?;
        }
    }
    Ok(())
}
