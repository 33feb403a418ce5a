//! Delimited-text I/O and format detection.
//!
//! Spreadsheet files go through [`crate::workbook`]; everything else is treated as
//! delimited text here:
//!
//! - **Format detection**: `.xlsx`/`.xlsm`/`.xls`/`.ods` are workbooks, anything
//!   else is delimited text.
//! - **Delimiter resolution**: `.tsv` → tab, otherwise comma, with manual override.
//! - **Encoding**: input is decoded through `encoding_rs` (UTF-8 by default).
//! - **stdout**: an output path of `-` writes CSV to standard output.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

use crate::dataset::{Cell, Dataset, normalize_headers};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Workbook,
    Delimited,
}

pub fn detect_format(path: &Path) -> TableFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext)
            if WORKBOOK_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known)) =>
        {
            TableFormat::Workbook
        }
        _ => TableFormat::Delimited,
    }
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn resolve_output_delimiter(path: Option<&Path>, provided: Option<u8>, fallback: u8) -> u8 {
    if let Some(delim) = provided {
        return delim;
    }
    match path
        .and_then(|p| p.extension())
        .and_then(|ext| ext.to_str())
    {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        Some(ext) if ext.eq_ignore_ascii_case("csv") => DEFAULT_CSV_DELIMITER,
        _ => fallback,
    }
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Reads a whole delimited file into memory.
///
/// Rows may be shorter or longer than the header; short rows are padded with
/// empty cells and extra trailing fields are dropped.
pub fn read_delimited(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    read_delimited_from(BufReader::new(file), delimiter, encoding)
        .with_context(|| format!("Reading {path:?}"))
}

pub fn read_delimited_from<R: Read>(
    reader: R,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(reader);
    let headers = decode_record(reader.byte_headers()?, encoding)?;
    let headers = normalize_headers(headers);
    let width = headers.len();

    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        if decoded.iter().all(|field| field.is_empty()) {
            continue;
        }
        let row = decoded
            .iter()
            .take(width)
            .map(|field| Cell::from_field(field))
            .collect();
        rows.push(row);
    }
    Ok(Dataset::new(headers, rows))
}

/// Writes the dataset as delimited text to `path`, or stdout when `path` is `None`.
pub fn write_delimited(dataset: &Dataset, path: Option<&Path>, delimiter: u8) -> Result<()> {
    let sink: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .double_quote(true)
        .from_writer(sink);
    writer
        .write_record(&dataset.headers)
        .context("Writing output headers")?;
    for (idx, row) in dataset.rows.iter().enumerate() {
        writer
            .write_record(row.iter().map(|cell| cell.as_text().into_owned()))
            .with_context(|| format!("Writing output row {}", idx + 2))?;
    }
    writer.flush().context("Flushing output writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    #[test]
    fn detect_format_recognizes_workbook_extensions() {
        assert_eq!(detect_format(Path::new("list.XLSX")), TableFormat::Workbook);
        assert_eq!(detect_format(Path::new("list.ods")), TableFormat::Workbook);
        assert_eq!(detect_format(Path::new("list.csv")), TableFormat::Delimited);
        assert_eq!(detect_format(Path::new("list")), TableFormat::Delimited);
    }

    #[test]
    fn read_delimited_keeps_leading_zeros_and_skips_blank_rows() {
        let input = "UPC,Name\n000123,Soda\n,\n42,\n";
        let dataset = read_delimited_from(input.as_bytes(), b',', UTF_8).unwrap();
        assert_eq!(dataset.headers, vec!["UPC", "Name"]);
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.rows[0][0], Cell::text("000123"));
        assert!(dataset.rows[1][1].is_empty());
    }

    #[test]
    fn read_delimited_decodes_legacy_encodings() {
        let (encoded, _, _) = WINDOWS_1252.encode("UPC,Name\n1,Caf\u{e9}\n");
        let dataset = read_delimited_from(&encoded[..], b',', WINDOWS_1252).unwrap();
        assert_eq!(dataset.rows[0][1], Cell::text("Caf\u{e9}"));
    }

    #[test]
    fn resolve_encoding_rejects_unknown_labels() {
        assert!(resolve_encoding(Some("not-an-encoding")).is_err());
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
    }
}
