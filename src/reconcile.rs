//! Barcode reconciliation between the cleaned UPC list and the partner catalog.
//!
//! Both sides are normalized to [`BarcodeKey`]s; every source row is classified as
//! [`RowStatus::Existing`] when its key is already in the catalog, otherwise
//! [`RowStatus::New`]. Classification keeps source row order.

use std::{collections::HashSet, fmt};

use log::{debug, warn};
use serde::Serialize;

use crate::{
    barcode::BarcodeKey,
    dataset::{Cell, Dataset},
    error::MergeError,
    mapping::{FieldMapping, Role},
    record::catalog,
};

/// Column added to the annotated source copy.
pub const STATUS_COLUMN: &str = "STATUS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowStatus {
    Existing,
    New,
}

impl RowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RowStatus::Existing => "Existing",
            RowStatus::New => "New",
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRow {
    /// Zero-based position in the source dataset.
    pub index: usize,
    pub barcode: BarcodeKey,
    pub status: RowStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub rows: Vec<ClassifiedRow>,
}

impl Reconciliation {
    pub fn existing(&self) -> impl Iterator<Item = &ClassifiedRow> + '_ {
        self.with_status(RowStatus::Existing)
    }

    pub fn new_rows(&self) -> impl Iterator<Item = &ClassifiedRow> + '_ {
        self.with_status(RowStatus::New)
    }

    pub fn existing_count(&self) -> usize {
        self.existing().count()
    }

    pub fn new_count(&self) -> usize {
        self.new_rows().count()
    }

    fn with_status(&self, status: RowStatus) -> impl Iterator<Item = &ClassifiedRow> + '_ {
        self.rows.iter().filter(move |row| row.status == status)
    }

    /// Copy of the source with the UPC column in canonical form and a `STATUS`
    /// column holding each row's classification.
    ///
    /// An existing `STATUS` column is overwritten in place; otherwise one is
    /// appended.
    pub fn annotate(&self, source: &Dataset, upc_column: usize) -> Dataset {
        let mut headers = source.headers.clone();
        let status_idx = match source.column_index(STATUS_COLUMN) {
            Some(idx) => idx,
            None => {
                headers.push(STATUS_COLUMN.to_string());
                headers.len() - 1
            }
        };
        let rows = self
            .rows
            .iter()
            .map(|classified| {
                let mut row = source.rows[classified.index].clone();
                row.resize(headers.len(), Cell::Empty);
                row[upc_column] = classified.barcode.clone().into_cell();
                row[status_idx] = Cell::text(classified.status.as_str());
                row
            })
            .collect();
        Dataset::new(headers, rows)
    }
}

fn catalog_barcode_index(target: &Dataset) -> Result<usize, MergeError> {
    target
        .column_index(catalog::BARCODE)
        .ok_or_else(|| MergeError::SchemaMismatch {
            missing: vec![catalog::BARCODE.to_string()],
        })
}

/// Canonical barcodes present in the catalog. Duplicates collapse.
pub fn catalog_barcodes(target: &Dataset) -> Result<HashSet<BarcodeKey>, MergeError> {
    let idx = catalog_barcode_index(target)?;
    Ok(target
        .rows
        .iter()
        .map(|row| BarcodeKey::from_cell(&row[idx]))
        .collect())
}

/// Copy of the catalog with its `barcode` column in canonical form.
pub fn normalize_catalog(target: &Dataset) -> Result<Dataset, MergeError> {
    let idx = catalog_barcode_index(target)?;
    let rows = target
        .rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            row[idx] = BarcodeKey::from_cell(&row[idx]).into_cell();
            row
        })
        .collect();
    Ok(Dataset::new(target.headers.clone(), rows))
}

pub fn reconcile(
    source: &Dataset,
    target: &Dataset,
    mapping: &FieldMapping,
) -> Result<Reconciliation, MergeError> {
    let upc_idx = source
        .column_index(mapping.upc())
        .ok_or_else(|| MergeError::UnknownColumn {
            role: Role::Upc,
            column: mapping.upc().to_string(),
        })?;
    let known = catalog_barcodes(target)?;
    debug!("Catalog holds {} distinct barcode(s)", known.len());

    let mut blank = 0usize;
    let rows = source
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let cell = &row[upc_idx];
            if cell.is_empty() {
                blank += 1;
            }
            let barcode = BarcodeKey::from_cell(cell);
            let status = if known.contains(&barcode) {
                RowStatus::Existing
            } else {
                RowStatus::New
            };
            ClassifiedRow {
                index,
                barcode,
                status,
            }
        })
        .collect();
    if blank > 0 {
        warn!("{blank} source row(s) have an empty UPC; they compare as {}", BarcodeKey::normalize(""));
    }
    Ok(Reconciliation { rows })
}
