//! Projection of new source rows into the partner catalog schema.

use std::collections::HashMap;

use log::warn;
use serde::Serialize;

use crate::{
    dataset::{Cell, Dataset},
    error::MergeError,
    mapping::{FieldMapping, Role},
    reconcile::ClassifiedRow,
};

/// Value written for optional roles that have no source column.
pub const NOT_AVAILABLE: &str = "N/A";

/// Fixed columns of the partner product record.
pub mod catalog {
    pub const BARCODE: &str = "barcode";
    pub const BRAND: &str = "bh2Brand";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const DEPARTMENT: &str = "ch1Department";
    pub const CATEGORY: &str = "ch2Category";
    pub const SEGMENT: &str = "ch3Segment";
    pub const PARTNER_PRODUCT: &str = "partnerProduct";
    pub const AWARD_POINTS: &str = "awardPoints";

    pub const FIXED_COLUMNS: [&str; 9] = [
        BARCODE,
        BRAND,
        NAME,
        DESCRIPTION,
        DEPARTMENT,
        CATEGORY,
        SEGMENT,
        PARTNER_PRODUCT,
        AWARD_POINTS,
    ];
}

/// Fails with [`MergeError::SchemaMismatch`] unless every fixed column is present.
pub fn ensure_catalog_schema(headers: &[String]) -> Result<(), MergeError> {
    let missing: Vec<String> = catalog::FIXED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|header| header == *column))
        .map(|column| column.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(MergeError::SchemaMismatch { missing })
    }
}

/// A new row left out of the merge because one of its cells could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// One-based data row number in the source file.
    pub row: usize,
    pub barcode: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltRecords {
    pub rows: Vec<Vec<Cell>>,
    pub skipped: Vec<SkippedRow>,
}

/// Source column positions for each mapped role, resolved once per run.
pub struct RecordBuilder<'a> {
    source: &'a Dataset,
    target_headers: &'a [String],
    columns: HashMap<Role, (usize, &'a str)>,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(
        source: &'a Dataset,
        mapping: &'a FieldMapping,
        target_headers: &'a [String],
    ) -> Result<Self, MergeError> {
        let mut columns = HashMap::new();
        for (role, column) in mapping.entries() {
            let Some(name) = column else { continue };
            let idx = source
                .column_index(name)
                .ok_or_else(|| MergeError::UnknownColumn {
                    role,
                    column: name.to_string(),
                })?;
            columns.insert(role, (idx, name));
        }
        Ok(Self {
            source,
            target_headers,
            columns,
        })
    }

    fn raw(&self, row: &ClassifiedRow, role: Role) -> Option<(&'a Cell, &'a str)> {
        self.columns
            .get(&role)
            .map(|(idx, name)| (self.source.cell(row.index, *idx), *name))
    }

    fn upper_or_sentinel(&self, row: &ClassifiedRow, role: Role) -> Result<Cell, MergeError> {
        match self.raw(row, role) {
            None => Ok(Cell::text(NOT_AVAILABLE)),
            Some((cell, column)) => {
                cell.to_uppercase()
                    .map_err(|value| MergeError::MalformedCell {
                        row: row.index + 1,
                        column: column.to_string(),
                        value,
                    })
            }
        }
    }

    /// Builds one catalog record, ordered like the catalog's columns.
    pub fn build(&self, row: &ClassifiedRow) -> Result<Vec<Cell>, MergeError> {
        let description = self
            .raw(row, Role::Description)
            .map(|(cell, _)| cell.clone())
            .unwrap_or_default();

        let mut fields: HashMap<&str, Cell> = HashMap::from([
            (catalog::BARCODE, row.barcode.clone().into_cell()),
            (catalog::BRAND, self.upper_or_sentinel(row, Role::Brand)?),
            (catalog::NAME, description.clone()),
            (catalog::DESCRIPTION, description),
            (
                catalog::DEPARTMENT,
                self.upper_or_sentinel(row, Role::Department)?,
            ),
            (
                catalog::CATEGORY,
                self.upper_or_sentinel(row, Role::Category)?,
            ),
            (catalog::SEGMENT, self.upper_or_sentinel(row, Role::Segment)?),
            (catalog::PARTNER_PRODUCT, Cell::text("Y")),
            (catalog::AWARD_POINTS, Cell::text("N")),
        ]);

        Ok(self
            .target_headers
            .iter()
            .map(|header| fields.remove(header.as_str()).unwrap_or(Cell::Empty))
            .collect())
    }

    /// Builds records for the given rows, setting aside rows with malformed cells.
    pub fn build_all<'r>(&self, rows: impl IntoIterator<Item = &'r ClassifiedRow>) -> BuiltRecords {
        let mut built = BuiltRecords::default();
        for row in rows {
            match self.build(row) {
                Ok(record) => built.rows.push(record),
                Err(err) => {
                    warn!("Skipping source row {}: {err}", row.index + 1);
                    built.skipped.push(SkippedRow {
                        row: row.index + 1,
                        barcode: row.barcode.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        built
    }
}

/// Catalog rows first, then `records`, under the catalog's headers.
pub fn append_records(target: &Dataset, records: Vec<Vec<Cell>>) -> Dataset {
    let mut rows = Vec::with_capacity(target.row_count() + records.len());
    rows.extend(target.rows.iter().cloned());
    rows.extend(records);
    Dataset::new(target.headers.clone(), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        barcode::BarcodeKey,
        mapping::{AliasTable, ColumnResolver, ResolutionStrategy},
        reconcile::RowStatus,
    };

    fn catalog_headers(extra: &[&str]) -> Vec<String> {
        let mut headers: Vec<String> = extra.iter().map(|h| h.to_string()).collect();
        headers.extend(catalog::FIXED_COLUMNS.iter().rev().map(|h| h.to_string()));
        headers
    }

    fn new_row(index: usize, code: &str) -> ClassifiedRow {
        ClassifiedRow {
            index,
            barcode: BarcodeKey::normalize(code),
            status: RowStatus::New,
        }
    }

    fn resolve(source: &Dataset) -> FieldMapping {
        ColumnResolver::new(ResolutionStrategy::AliasSearch(AliasTable::default()))
            .resolve(&source.headers)
            .unwrap()
    }

    fn value<'a>(headers: &[String], record: &'a [Cell], column: &str) -> &'a Cell {
        let idx = headers.iter().position(|h| h == column).unwrap();
        &record[idx]
    }

    #[test]
    fn unmapped_optional_roles_get_sentinel() {
        let source = Dataset::new(
            vec!["UPC".to_string(), "Product Name".to_string()],
            vec![vec![Cell::text("99999999"), Cell::text("Sparkling Water")]],
        );
        let mapping = resolve(&source);
        let headers = catalog_headers(&["sku"]);
        let builder = RecordBuilder::new(&source, &mapping, &headers).unwrap();
        let record = builder.build(&new_row(0, "99999999")).unwrap();

        assert_eq!(record.len(), headers.len());
        assert_eq!(value(&headers, &record, "barcode"), &Cell::text("000099999999"));
        for column in ["bh2Brand", "ch1Department", "ch2Category", "ch3Segment"] {
            assert_eq!(value(&headers, &record, column), &Cell::text("N/A"));
        }
        assert_eq!(value(&headers, &record, "partnerProduct"), &Cell::text("Y"));
        assert_eq!(value(&headers, &record, "awardPoints"), &Cell::text("N"));
        assert_eq!(
            value(&headers, &record, "name"),
            &Cell::text("Sparkling Water")
        );
        assert_eq!(
            value(&headers, &record, "description"),
            &Cell::text("Sparkling Water")
        );
        assert!(value(&headers, &record, "sku").is_empty());
    }

    #[test]
    fn mapped_fields_are_upper_cased_but_description_is_not() {
        let source = Dataset::new(
            ["UPC", "name", "Brand", "Department", "Category", "Segment"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            vec![vec![
                Cell::text("1"),
                Cell::text("Oat Milk"),
                Cell::text("Oatly"),
                Cell::text("Dairy"),
                Cell::text("Milk Alternatives"),
                Cell::Integer(12),
            ]],
        );
        let mapping = resolve(&source);
        let headers = catalog_headers(&[]);
        let builder = RecordBuilder::new(&source, &mapping, &headers).unwrap();
        let record = builder.build(&new_row(0, "1")).unwrap();

        assert_eq!(value(&headers, &record, "bh2Brand"), &Cell::text("OATLY"));
        assert_eq!(value(&headers, &record, "ch1Department"), &Cell::text("DAIRY"));
        assert_eq!(
            value(&headers, &record, "ch2Category"),
            &Cell::text("MILK ALTERNATIVES")
        );
        assert_eq!(value(&headers, &record, "ch3Segment"), &Cell::text("12"));
        assert_eq!(value(&headers, &record, "name"), &Cell::text("Oat Milk"));
    }

    #[test]
    fn error_cells_skip_only_their_row() {
        let source = Dataset::new(
            vec!["UPC".to_string(), "name".to_string(), "Brand".to_string()],
            vec![
                vec![Cell::text("1"), Cell::text("A"), Cell::Error("#N/A".to_string())],
                vec![Cell::text("2"), Cell::text("B"), Cell::text("acme")],
            ],
        );
        let mapping = resolve(&source);
        let headers = catalog_headers(&[]);
        let builder = RecordBuilder::new(&source, &mapping, &headers).unwrap();
        let rows = [new_row(0, "1"), new_row(1, "2")];
        let built = builder.build_all(rows.iter());

        assert_eq!(built.rows.len(), 1);
        assert_eq!(value(&headers, &built.rows[0], "bh2Brand"), &Cell::text("ACME"));
        assert_eq!(built.skipped.len(), 1);
        assert_eq!(built.skipped[0].row, 1);
        assert_eq!(built.skipped[0].barcode, "000000000001");
        assert!(built.skipped[0].reason.contains("#N/A"));
    }

    #[test]
    fn ensure_catalog_schema_lists_missing_columns() {
        let headers = vec!["barcode".to_string(), "name".to_string()];
        let err = ensure_catalog_schema(&headers).unwrap_err();
        match err {
            MergeError::SchemaMismatch { missing } => {
                assert_eq!(missing.len(), 7);
                assert_eq!(missing[0], "bh2Brand");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(ensure_catalog_schema(&catalog_headers(&["extra"])).is_ok());
    }

    #[test]
    fn append_records_keeps_catalog_rows_first() {
        let target = Dataset::new(
            vec!["barcode".to_string()],
            vec![vec![Cell::text("000000000001")]],
        );
        let merged = append_records(&target, vec![vec![Cell::text("000000000002")]]);
        assert_eq!(
            merged.display_rows(None),
            vec![vec!["000000000001"], vec!["000000000002"]]
        );
    }
}
