//! The merge pipeline: resolve columns, reconcile barcodes, build and append
//! records. Pure over in-memory datasets; file I/O lives in [`crate::merge`].

use log::{debug, info};

use crate::{
    dataset::Dataset,
    error::MergeError,
    mapping::{ColumnResolver, FieldMapping, MergeMode, Role},
    reconcile::{self, Reconciliation, RowStatus, STATUS_COLUMN},
    record::{self, RecordBuilder, SkippedRow},
};

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub mode: MergeMode,
    pub mapping: FieldMapping,
    pub reconciliation: Reconciliation,
    /// Source rows with the canonical UPC and a `STATUS` column.
    pub annotated_source: Dataset,
    pub merged: Dataset,
    pub skipped: Vec<SkippedRow>,
    pub catalog_rows: usize,
}

impl MergeOutcome {
    pub fn source_rows(&self) -> usize {
        self.reconciliation.rows.len()
    }

    pub fn appended_rows(&self) -> usize {
        self.merged.row_count() - self.catalog_rows
    }

    /// Annotated source rows classified as new, in source order.
    pub fn new_rows(&self) -> Dataset {
        let Some(status_idx) = self.annotated_source.column_index(STATUS_COLUMN) else {
            return Dataset::new(self.annotated_source.headers.clone(), Vec::new());
        };
        let indices = self
            .annotated_source
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row[status_idx].as_text() == RowStatus::New.as_str())
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        self.annotated_source.select_rows(indices)
    }
}

pub fn merge_datasets(
    source: &Dataset,
    target: &Dataset,
    resolver: &ColumnResolver,
) -> Result<MergeOutcome, MergeError> {
    let mapping = resolver.resolve(&source.headers)?;
    debug!("Resolved mapping: {mapping:?}");
    record::ensure_catalog_schema(&target.headers)?;

    let reconciliation = reconcile::reconcile(source, target, &mapping)?;
    info!(
        "Classified {} source row(s): {} existing, {} new",
        reconciliation.rows.len(),
        reconciliation.existing_count(),
        reconciliation.new_count()
    );

    let upc_idx = source
        .column_index(mapping.upc())
        .ok_or_else(|| MergeError::UnknownColumn {
            role: Role::Upc,
            column: mapping.upc().to_string(),
        })?;
    let annotated_source = reconciliation.annotate(source, upc_idx);

    let catalog = reconcile::normalize_catalog(target)?;
    let builder = RecordBuilder::new(source, &mapping, &catalog.headers)?;
    let built = builder.build_all(reconciliation.new_rows());
    let merged = record::append_records(&catalog, built.rows);

    Ok(MergeOutcome {
        mode: resolver.mode(),
        mapping,
        reconciliation,
        annotated_source,
        merged,
        skipped: built.skipped,
        catalog_rows: catalog.row_count(),
    })
}
