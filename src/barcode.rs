use std::fmt;

use serde::Serialize;

use crate::dataset::Cell;

/// Width of a canonical UPC-A barcode.
pub const BARCODE_WIDTH: usize = 12;

/// Canonical barcode: the textual value left-padded with `'0'` to
/// [`BARCODE_WIDTH`] characters. Longer values are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BarcodeKey(String);

impl BarcodeKey {
    pub fn normalize(raw: &str) -> Self {
        let len = raw.chars().count();
        if len >= BARCODE_WIDTH {
            return BarcodeKey(raw.to_string());
        }
        let mut padded = String::with_capacity(BARCODE_WIDTH);
        padded.extend(std::iter::repeat_n('0', BARCODE_WIDTH - len));
        padded.push_str(raw);
        BarcodeKey(padded)
    }

    pub fn from_cell(cell: &Cell) -> Self {
        Self::normalize(&cell.as_text())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_cell(self) -> Cell {
        Cell::Text(self.0)
    }
}

impl AsRef<str> for BarcodeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BarcodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_codes_are_left_padded() {
        assert_eq!(BarcodeKey::normalize("123456789").as_str(), "000123456789");
        assert_eq!(BarcodeKey::normalize("99999999").as_str(), "000099999999");
        assert_eq!(BarcodeKey::normalize("").as_str(), "000000000000");
    }

    #[test]
    fn long_codes_are_not_truncated() {
        assert_eq!(
            BarcodeKey::normalize("0012345678905").as_str(),
            "0012345678905"
        );
        assert_eq!(BarcodeKey::normalize("012345678905").as_str(), "012345678905");
    }

    #[test]
    fn numeric_cells_normalize_like_text() {
        assert_eq!(
            BarcodeKey::from_cell(&Cell::Float(123456789.0)),
            BarcodeKey::normalize("123456789")
        );
        assert_eq!(
            BarcodeKey::from_cell(&Cell::Integer(42)).as_str(),
            "000000000042"
        );
    }
}
