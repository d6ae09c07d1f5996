use crate::error::{ProcessingError, Result};
use crate::models::{CorrectionKind, CorrectionTable};
use crate::readers::text::read_spreadsheet_text;
use crate::utils::constants::COLUMN_ACTUAL;
use std::path::Path;

/// Reads the two-column correction spreadsheets (`Listed`/`System name` → `Actual`)
pub struct CorrectionReader {
    kind: CorrectionKind,
}

impl CorrectionReader {
    pub fn new(kind: CorrectionKind) -> Self {
        Self { kind }
    }

    pub fn read_table(&self, path: &Path) -> Result<CorrectionTable> {
        let text = read_spreadsheet_text(path)?;
        let table = self.parse_table(&text)?;
        tracing::info!(
            path = %path.display(),
            kind = %self.kind,
            entries = table.len(),
            "loaded correction table"
        );
        Ok(table)
    }

    pub fn parse_table(&self, text: &str) -> Result<CorrectionTable> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let key_column = self.kind.key_column();
        let key_index = column_index(&headers, key_column)?;
        let actual_index = column_index(&headers, COLUMN_ACTUAL)?;

        let mut table = CorrectionTable::new(self.kind);
        for result in reader.records() {
            let row = result?;
            let key = row.get(key_index).unwrap_or("");
            let actual = row.get(actual_index).unwrap_or("");

            if key.is_empty() {
                continue;
            }
            if actual.is_empty() {
                tracing::warn!(kind = %self.kind, key, "correction has no target, ignoring");
                continue;
            }

            if let Some(previous) = table.insert(key, actual) {
                tracing::warn!(
                    kind = %self.kind,
                    key,
                    previous = %previous,
                    "duplicate correction key, last entry wins"
                );
            }
        }

        Ok(table)
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == name)
        .ok_or_else(|| {
            ProcessingError::MissingData(format!(
                "column '{}' not found in correction table (found: {})",
                name,
                headers.iter().collect::<Vec<_>>().join(", ")
            ))
        })
}
