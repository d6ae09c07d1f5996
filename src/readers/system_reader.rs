use crate::error::{ProcessingError, Result};
use crate::models::SystemRecord;
use crate::readers::text::read_spreadsheet_text;
use crate::utils::constants::{
    COLUMN_COMMISSIONED, COLUMN_SYSTEM_SIZE, COLUMN_TILT, NOT_SPECIFIED, UNKNOWN_LABEL,
};
use crate::utils::dates::parse_commissioned;
use serde::Deserialize;
use std::path::Path;

/// Row as exported from the system database spreadsheet
#[derive(Debug, Default, Deserialize)]
struct RawSystemRow {
    #[serde(rename = "System name", default)]
    name: Option<String>,
    #[serde(rename = "System type", default)]
    system_type: Option<String>,
    #[serde(rename = "System integrator", default)]
    integrator: Option<String>,
    #[serde(rename = "Technology", default)]
    technology: Option<String>,
    #[serde(rename = "Commissioned", default)]
    commissioned: Option<String>,
    #[serde(rename = "System size", default)]
    system_size: Option<String>,
    #[serde(rename = "Location", default)]
    location: Option<String>,
    #[serde(rename = "Tilt", default)]
    tilt: Option<String>,
}

impl RawSystemRow {
    fn is_blank(&self) -> bool {
        [
            &self.name,
            &self.system_type,
            &self.integrator,
            &self.technology,
            &self.commissioned,
            &self.system_size,
            &self.location,
            &self.tilt,
        ]
        .iter()
        .all(|f| non_empty(f).is_none())
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub struct SystemReader {
    skip_blank_rows: bool,
}

impl SystemReader {
    pub fn new() -> Self {
        Self {
            skip_blank_rows: true,
        }
    }

    pub fn with_skip_blank_rows(skip_blank_rows: bool) -> Self {
        Self { skip_blank_rows }
    }

    /// Read and clean the system database.
    ///
    /// Row numbers in errors are spreadsheet line numbers (the header is line 1).
    pub fn read_systems(&self, path: &Path) -> Result<Vec<SystemRecord>> {
        let text = read_spreadsheet_text(path)?;
        let records = self.parse_systems(&text)?;
        tracing::info!(
            path = %path.display(),
            systems = records.len(),
            "loaded system database"
        );
        Ok(records)
    }

    pub fn parse_systems(&self, text: &str) -> Result<Vec<SystemRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut records = Vec::new();
        for (index, row) in reader.deserialize::<RawSystemRow>().enumerate() {
            let row_number = index + 2;
            let raw = row?;

            if raw.is_blank() {
                if self.skip_blank_rows {
                    continue;
                }
                return Err(ProcessingError::InvalidRecord {
                    row: row_number,
                    message: "blank row".to_string(),
                });
            }

            records.push(self.clean_row(raw, row_number)?);
        }

        Ok(records)
    }

    fn clean_row(&self, raw: RawSystemRow, row: usize) -> Result<SystemRecord> {
        let name = non_empty(&raw.name)
            .ok_or_else(|| ProcessingError::InvalidRecord {
                row,
                message: "missing system name".to_string(),
            })?
            .to_string();

        let commissioned_text =
            non_empty(&raw.commissioned).ok_or_else(|| ProcessingError::InvalidRecord {
                row,
                message: format!("missing {}", COLUMN_COMMISSIONED),
            })?;
        let commissioned =
            parse_commissioned(commissioned_text).map_err(|e| ProcessingError::InvalidRecord {
                row,
                message: e.to_string(),
            })?;

        let capacity_kwp = non_empty(&raw.system_size)
            .ok_or_else(|| ProcessingError::InvalidRecord {
                row,
                message: format!("missing {}", COLUMN_SYSTEM_SIZE),
            })
            .and_then(|s| {
                parse_capacity(s).ok_or_else(|| ProcessingError::InvalidRecord {
                    row,
                    message: format!("invalid {} '{}'", COLUMN_SYSTEM_SIZE, s),
                })
            })?;

        let tilt_deg = match non_empty(&raw.tilt) {
            None => None,
            Some(s) => Some(parse_tilt(s).ok_or_else(|| ProcessingError::InvalidRecord {
                row,
                message: format!("invalid {} '{}'", COLUMN_TILT, s),
            })?),
        };

        let location = non_empty(&raw.location)
            .unwrap_or(NOT_SPECIFIED)
            .to_uppercase();

        Ok(SystemRecord::new(
            name,
            non_empty(&raw.system_type).unwrap_or(UNKNOWN_LABEL).to_string(),
            non_empty(&raw.integrator).unwrap_or(UNKNOWN_LABEL).to_string(),
            non_empty(&raw.technology).unwrap_or_default().to_string(),
            commissioned,
            capacity_kwp,
            location,
            tilt_deg,
        ))
    }
}

impl Default for SystemReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Capacity in kWp; thousands separators are tolerated
fn parse_capacity(value: &str) -> Option<f64> {
    let cleaned: String = value.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Tilt in degrees with the degree sign stripped
fn parse_tilt(value: &str) -> Option<f64> {
    value
        .replace('\u{00b0}', "")
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "System name,System type,System integrator,Technology,Commissioned,System size,Location,Tilt";

    #[test]
    fn test_parse_and_clean_rows() -> Result<()> {
        let text = format!(
            "{}\n\
             Bedok Mall,Commercial,Sunseap,Monocrystalline silicon,Jan 15,\"1,204.6\",bedok ,10\u{00b0}\n\
             Rooftop 2,,,CIGS,Feb 16,3.2,,\n",
            HEADER
        );

        let records = SystemReader::new().parse_systems(&text)?;
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.name, "Bedok Mall");
        assert_eq!(first.commissioned, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        assert_eq!(first.capacity_kwp, 1204.6);
        assert_eq!(first.location, "BEDOK");
        assert_eq!(first.tilt_deg, Some(10.0));
        assert!(!first.is_area_specified());

        let second = &records[1];
        assert_eq!(second.location, NOT_SPECIFIED);
        assert_eq!(second.system_type, UNKNOWN_LABEL);
        assert_eq!(second.integrator, UNKNOWN_LABEL);
        assert_eq!(second.tilt_deg, None);
        Ok(())
    }

    #[test]
    fn test_blank_rows_skipped() -> Result<()> {
        let text = format!("{}\n,,,,,,,\nA,B,C,CIGS,Mar 17,1,X,\n", HEADER);
        let records = SystemReader::new().parse_systems(&text)?;
        assert_eq!(records.len(), 1);

        let strict = SystemReader::with_skip_blank_rows(false).parse_systems(&text);
        assert!(matches!(
            strict,
            Err(ProcessingError::InvalidRecord { row: 2, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_invalid_values_report_row() {
        let text = format!("{}\nA,B,C,CIGS,Mar 17,1,X,\nB,B,C,CIGS,Mar 17,lots,X,\n", HEADER);
        match SystemReader::new().parse_systems(&text) {
            Err(ProcessingError::InvalidRecord { row, message }) => {
                assert_eq!(row, 3);
                assert!(message.contains("System size"));
            }
            other => panic!("expected invalid record, got {:?}", other),
        }

        let text = format!("{}\nA,B,C,CIGS,someday,1,X,\n", HEADER);
        assert!(matches!(
            SystemReader::new().parse_systems(&text),
            Err(ProcessingError::InvalidRecord { row: 2, .. })
        ));
    }

    #[test]
    fn test_read_windows_1252_file() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(HEADER.as_bytes())?;
        temp_file.write_all(b"\nPanel,Residential,Acme,CIGS,Apr 18,4.5,Bishan,15\xB0\n")?;

        let records = SystemReader::new().read_systems(temp_file.path())?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tilt_deg, Some(15.0));
        assert_eq!(records[0].location, "BISHAN");
        Ok(())
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_capacity(" 12,000 "), Some(12000.0));
        assert_eq!(parse_capacity("NaN"), None);
        assert_eq!(parse_tilt("5.5\u{00b0}"), Some(5.5));
        assert_eq!(parse_tilt("flat"), None);
    }
}
