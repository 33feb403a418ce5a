#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};
use upc_merge::dataset::{Cell, Dataset};
use upc_merge::workbook;

/// Fixed catalog header, in the order the partner dashboard exports it.
pub const CATALOG_HEADER: &str =
    "barcode,bh2Brand,name,description,ch1Department,ch2Category,ch3Segment,partnerProduct,awardPoints";

/// Partner catalog holding `000123456789` (Acme cola) and `000000000042`.
pub fn catalog_csv() -> String {
    format!(
        "{CATALOG_HEADER}\n\
         000123456789,ACME,Cola,Cola,DRINKS,SODA,CANS,Y,N\n\
         42,ZETA,Chips,Chips,SNACKS,SALTY,BAGS,Y,N\n"
    )
}

/// Builds an in-memory dataset from string literals; empty strings are empty cells.
pub fn dataset(headers: &[&str], rows: &[&[&str]]) -> Dataset {
    Dataset::new(
        headers.iter().map(|h| h.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|value| Cell::from_field(value)).collect())
            .collect(),
    )
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes `dataset` as an `.xlsx` workbook and returns the path.
    pub fn write_xlsx(&self, name: &str, dataset: &Dataset) -> PathBuf {
        let path = self.join(name);
        let bytes = workbook::workbook_bytes(dataset).expect("serialize workbook");
        fs::write(&path, bytes).expect("write workbook");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.join(name)).expect("read output file")
    }
}
