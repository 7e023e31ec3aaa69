//! Metadata sheet loading and case-file-id join (§4.1, §6 "Filesystem input").
//!
//! The companion CSV carries columns including case file id, title, court, district,
//! county, date, publication status, and opinion type. Rows are indexed by normalized
//! case-file id so a directory walk of PDFs can look each one up in O(1).

use crate::errors::{IngestError, Result};
use crate::models::MetadataRow;
use crate::normalize::normalize_case_file_id;
use std::collections::HashMap;
use std::path::Path;

/// The parsed metadata sheet, keyed by normalized case-file id and also kept in file order
/// so single-file mode's `--row N` can select a row directly instead of joining by filename.
pub struct MetadataSheet {
    rows_by_normalized_id: HashMap<String, MetadataRow>,
    rows_in_order: Vec<MetadataRow>,
}

impl MetadataSheet {
    /// Load and index a CSV metadata sheet.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| IngestError::UnreadableInput {
                path: path.to_string_lossy().to_string(),
                reason: e.to_string(),
            })?;

        let mut rows_by_normalized_id = HashMap::new();
        let mut rows_in_order = Vec::new();
        for result in reader.deserialize() {
            let row: MetadataRow = result?;
            let normalized = normalize_case_file_id(&row.case_file_id);
            rows_by_normalized_id.insert(normalized, row.clone());
            rows_in_order.push(row);
        }

        Ok(Self {
            rows_by_normalized_id,
            rows_in_order,
        })
    }

    /// Look up the row matching a PDF's normalized case-file id.
    pub fn find(&self, normalized_case_file_id: &str) -> Option<&MetadataRow> {
        self.rows_by_normalized_id.get(normalized_case_file_id)
    }

    /// Look up the `N`th data row in file order, used by single-file mode's `--row N`
    /// (§6 "CLI surface") to pick a row directly rather than via the filename join.
    pub fn row_at(&self, index: usize) -> Option<&MetadataRow> {
        self.rows_in_order.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows_by_normalized_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows_by_normalized_id.is_empty()
    }
}

/// Derive the normalized case-file id encoded in a PDF filename (§4.1 "Join").
pub fn case_file_id_from_filename(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    normalize_case_file_id(&stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("metadata.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_and_indexes_by_normalized_id() {
        let dir = tempfile::tempdir().unwrap();
        let csv = "case_file_id,title,court,district,county,decision_year,decision_month,publication_status,opinion_type\n\
                   69423-5,Pub. Util. Dist. No. 1 v. State,Supreme Court,,,2020,3,published,majority\n";
        let path = write_csv(&dir, csv);
        let sheet = MetadataSheet::load(&path).unwrap();

        assert_eq!(sheet.len(), 1);
        let row = sheet.find("694235").expect("row should be indexed by normalized id");
        assert_eq!(row.title, "Pub. Util. Dist. No. 1 v. State");
    }

    #[test]
    fn filename_normalization_matches_sheet_normalization() {
        let path = Path::new("/data/pdfs/69423-5.pdf");
        assert_eq!(case_file_id_from_filename(path), "694235");
    }
}
