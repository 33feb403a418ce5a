//! Human-readable and JSON summaries of a merge run.

use std::{collections::BTreeMap, fmt::Write as _, fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    mapping::{MergeMode, Role, RoleAssignments},
    pipeline::MergeOutcome,
    record::SkippedRow,
    table,
};

const NOT_FOUND: &str = "not found";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowCounts {
    pub source: usize,
    pub existing: usize,
    pub new: usize,
    pub catalog: usize,
    pub appended: usize,
    pub merged: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub mode: MergeMode,
    pub mapping: BTreeMap<Role, Option<String>>,
    pub counts: RowCounts,
    pub skipped: Vec<SkippedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl MergeReport {
    pub fn from_outcome(outcome: &MergeOutcome, output: Option<&Path>) -> Self {
        let mapping = outcome
            .mapping
            .entries()
            .map(|(role, column)| (role, column.map(str::to_string)))
            .collect();
        Self {
            mode: outcome.mode,
            mapping,
            counts: RowCounts {
                source: outcome.source_rows(),
                existing: outcome.reconciliation.existing_count(),
                new: outcome.reconciliation.new_count(),
                catalog: outcome.catalog_rows,
                appended: outcome.appended_rows(),
                merged: outcome.merged.row_count(),
                skipped: outcome.skipped.len(),
            },
            skipped: outcome.skipped.clone(),
            output: output.map(|p| p.display().to_string()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating report file {path:?}"))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self).context("Writing merge report JSON")
    }
}

fn mapping_rows<'a>(column: impl Fn(Role) -> Option<&'a str>) -> Vec<Vec<String>> {
    Role::ALL
        .into_iter()
        .map(|role| {
            let requirement = if role.is_required() { "required" } else { "optional" };
            vec![
                role.label().to_string(),
                column(role).unwrap_or(NOT_FOUND).to_string(),
                requirement.to_string(),
            ]
        })
        .collect()
}

fn mapping_headers() -> Vec<String> {
    vec!["role".to_string(), "column".to_string(), "".to_string()]
}

/// Role → column table for assignments that may still be incomplete.
pub fn render_assignments(assigned: &RoleAssignments) -> String {
    table::render_table(&mapping_headers(), &mapping_rows(|role| assigned.get(role)))
}

/// Full run summary: mapping, counts, new-row preview, skipped rows.
///
/// `preview_rows` of `None` lists every new row.
pub fn render_summary(outcome: &MergeOutcome, preview_rows: Option<usize>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Column mapping ({} mode):", outcome.mode);
    out.push_str(&table::render_table(
        &mapping_headers(),
        &mapping_rows(|role| outcome.mapping.column(role)),
    ));

    let new_count = outcome.reconciliation.new_count();
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Source rows: {}  (existing {}, new {})",
        outcome.source_rows(),
        outcome.reconciliation.existing_count(),
        new_count
    );
    let _ = writeln!(
        out,
        "Catalog rows: {} -> {} after merge",
        outcome.catalog_rows,
        outcome.merged.row_count()
    );
    let _ = writeln!(out, "Found {new_count} new UPC(s).");

    if new_count > 0 {
        let preview = outcome.new_rows();
        let shown = preview_rows.map_or(new_count, |limit| limit.min(new_count));
        let _ = writeln!(out);
        let _ = writeln!(out, "New products ({shown} of {new_count} shown):");
        out.push_str(&table::render_table(
            &preview.headers,
            &preview.display_rows(Some(shown)),
        ));
    }

    if !outcome.skipped.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Skipped {} row(s) with malformed cells:", outcome.skipped.len());
        let rows: Vec<Vec<String>> = outcome
            .skipped
            .iter()
            .map(|skipped| {
                vec![
                    skipped.row.to_string(),
                    skipped.barcode.clone(),
                    skipped.reason.clone(),
                ]
            })
            .collect();
        let headers = vec!["row".to_string(), "barcode".to_string(), "reason".to_string()];
        out.push_str(&table::render_table_with(
            &headers,
            &rows,
            &table::TableStyle {
                max_cell_width: 0,
                ..table::TableStyle::default()
            },
        ));
    }
    out
}
