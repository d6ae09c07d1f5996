use crate::error::{ProcessingError, Result};
use crate::models::{AreaSummary, CumulativeSeries, SystemRecord};
use crate::processors::SolarAnalysis;
use crate::utils::constants::{
    AREA_SERIES_PARQUET, COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY,
    COMPRESSION_ZSTD, DEFAULT_ROW_GROUP_SIZE, PLANNING_AREAS_PARQUET, SYSTEMS_PARQUET,
    TECHNOLOGY_SERIES_PARQUET,
};
use arrow::array::*;
use arrow::datatypes::{DataType, Date32Type, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which exported table a Parquet file holds, judged by its columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Systems,
    PlanningAreas,
    CumulativeSeries,
    Unknown,
}

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(parquet::basic::ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Write the four report tables into `output_dir` and return their paths
    pub fn write_analysis(&self, analysis: &SolarAnalysis, output_dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(output_dir)?;

        let systems = output_dir.join(SYSTEMS_PARQUET);
        self.write_systems(&analysis.records, &systems)?;

        let areas = output_dir.join(PLANNING_AREAS_PARQUET);
        self.write_area_summaries(&analysis.area_summaries, &areas)?;

        let area_series = output_dir.join(AREA_SERIES_PARQUET);
        self.write_series(&analysis.area_series, &area_series)?;

        let technology_series = output_dir.join(TECHNOLOGY_SERIES_PARQUET);
        self.write_series(&analysis.technology_series, &technology_series)?;

        let paths = vec![systems, areas, area_series, technology_series];
        tracing::info!(
            dir = %output_dir.display(),
            files = paths.len(),
            "exported parquet tables"
        );
        Ok(paths)
    }

    /// Write reconciled system records
    pub fn write_systems(&self, records: &[SystemRecord], path: &Path) -> Result<()> {
        let schema = Self::systems_schema();

        let commissioned: Vec<i32> = records
            .iter()
            .map(|r| Date32Type::from_naive_date(r.commissioned))
            .collect();

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.name.as_str()))),
                Arc::new(StringArray::from_iter_values(
                    records.iter().map(|r| r.system_type.as_str()),
                )),
                Arc::new(StringArray::from_iter_values(
                    records.iter().map(|r| r.integrator.as_str()),
                )),
                Arc::new(StringArray::from_iter_values(
                    records.iter().map(|r| r.technology.as_str()),
                )),
                Arc::new(Date32Array::from(commissioned)),
                Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.capacity_kwp))),
                Arc::new(StringArray::from_iter_values(
                    records.iter().map(|r| r.location.as_str()),
                )),
                Arc::new(Float64Array::from(
                    records.iter().map(|r| r.tilt_deg).collect::<Vec<_>>(),
                )),
                Arc::new(StringArray::from_iter_values(
                    records.iter().map(|r| r.planning_area.as_str()),
                )),
                Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.region.as_str()))),
                Arc::new(Float64Array::from_iter_values(
                    records.iter().map(|r| r.cumulative_kwp),
                )),
            ],
        )?;

        self.write_batch(schema, batch, path)
    }

    /// Write per-area aggregates; areas without systems keep null aggregates
    pub fn write_area_summaries(&self, summaries: &[AreaSummary], path: &Path) -> Result<()> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("planning_area", DataType::Utf8, false),
            Field::new("region", DataType::Utf8, false),
            Field::new("total_capacity_kwp", DataType::Float64, true),
            Field::new("mean_system_kwp", DataType::Float64, true),
            Field::new("system_count", DataType::UInt64, false),
        ]));

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from_iter_values(summaries.iter().map(|s| s.name.as_str()))),
                Arc::new(StringArray::from_iter_values(
                    summaries.iter().map(|s| s.region.as_str()),
                )),
                Arc::new(Float64Array::from(
                    summaries.iter().map(|s| s.total_capacity_kwp).collect::<Vec<_>>(),
                )),
                Arc::new(Float64Array::from(
                    summaries.iter().map(|s| s.mean_system_kwp).collect::<Vec<_>>(),
                )),
                Arc::new(UInt64Array::from_iter_values(
                    summaries.iter().map(|s| s.system_count as u64),
                )),
            ],
        )?;

        self.write_batch(schema, batch, path)
    }

    /// Write a month × group cumulative grid in long form
    pub fn write_series(&self, series: &CumulativeSeries, path: &Path) -> Result<()> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("month", DataType::Date32, false),
            Field::new("group", DataType::Utf8, false),
            Field::new("region", DataType::Utf8, true),
            Field::new("added_kwp", DataType::Float64, false),
            Field::new("cumulative_kwp", DataType::Float64, false),
        ]));

        let points = &series.points;
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Date32Array::from(
                    points.iter().map(|p| Date32Type::from_naive_date(p.month)).collect::<Vec<_>>(),
                )),
                Arc::new(StringArray::from_iter_values(points.iter().map(|p| p.group.as_str()))),
                Arc::new(StringArray::from(
                    points.iter().map(|p| p.region.as_deref()).collect::<Vec<_>>(),
                )),
                Arc::new(Float64Array::from_iter_values(points.iter().map(|p| p.added_kwp))),
                Arc::new(Float64Array::from_iter_values(
                    points.iter().map(|p| p.cumulative_kwp),
                )),
            ],
        )?;

        self.write_batch(schema, batch, path)
    }

    fn systems_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("system_name", DataType::Utf8, false),
            Field::new("system_type", DataType::Utf8, false),
            Field::new("integrator", DataType::Utf8, false),
            Field::new("technology", DataType::Utf8, false),
            Field::new("commissioned", DataType::Date32, false),
            Field::new("capacity_kwp", DataType::Float64, false),
            Field::new("location", DataType::Utf8, false),
            Field::new("tilt_deg", DataType::Float64, true),
            Field::new("planning_area", DataType::Utf8, false),
            Field::new("region", DataType::Utf8, false),
            Field::new("cumulative_kwp", DataType::Float64, false),
        ]))
    }

    fn write_batch(&self, schema: Arc<Schema>, batch: RecordBatch, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        tracing::debug!(path = %path.display(), rows = batch.num_rows(), "wrote parquet file");
        Ok(())
    }

    /// Read the first `limit` rows of a systems table back into records
    pub fn read_sample_systems(&self, path: &Path, limit: usize) -> Result<Vec<SystemRecord>> {
        let file = File::open(path)?;
        let parquet_reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(limit.clamp(1, 8192))
            .build()?;

        let mut records = Vec::new();

        for batch_result in parquet_reader {
            let batch = batch_result?;

            let names = string_column(&batch, "system_name")?;
            let types = string_column(&batch, "system_type")?;
            let integrators = string_column(&batch, "integrator")?;
            let technologies = string_column(&batch, "technology")?;
            let commissioned = typed_column::<Date32Array>(&batch, "commissioned")?;
            let capacities = typed_column::<Float64Array>(&batch, "capacity_kwp")?;
            let locations = string_column(&batch, "location")?;
            let tilts = typed_column::<Float64Array>(&batch, "tilt_deg")?;
            let areas = string_column(&batch, "planning_area")?;
            let regions = string_column(&batch, "region")?;
            let cumulative = typed_column::<Float64Array>(&batch, "cumulative_kwp")?;

            for i in 0..batch.num_rows() {
                if records.len() >= limit {
                    return Ok(records);
                }

                let date = commissioned.value_as_date(i).ok_or_else(|| {
                    ProcessingError::InvalidFormat("Invalid date in Parquet file".to_string())
                })?;

                let mut record = SystemRecord::new(
                    names.value(i).to_string(),
                    types.value(i).to_string(),
                    integrators.value(i).to_string(),
                    technologies.value(i).to_string(),
                    date,
                    capacities.value(i),
                    locations.value(i).to_string(),
                    (!tilts.is_null(i)).then(|| tilts.value(i)),
                );
                record.planning_area = areas.value(i).to_string();
                record.region = regions.value(i).to_string();
                record.cumulative_kwp = cumulative.value(i);
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Identify an exported table from its column names
    pub fn detect_table_kind(&self, path: &Path) -> Result<TableKind> {
        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let schema = builder.schema();
        let has = |name: &str| schema.field_with_name(name).is_ok();

        Ok(if has("system_name") && has("commissioned") {
            TableKind::Systems
        } else if has("planning_area") && has("system_count") {
            TableKind::PlanningAreas
        } else if has("month") && has("cumulative_kwp") {
            TableKind::CumulativeSeries
        } else {
            TableKind::Unknown
        })
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        let columns = file_metadata
            .schema_descr()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        // Report the codec actually stored rather than the writer setting
        let compression = (row_groups > 0 && metadata.row_group(0).num_columns() > 0)
            .then(|| metadata.row_group(0).column(0).compression())
            .unwrap_or(self.compression);

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression,
            columns,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn typed_column<'b, A: Array + 'static>(batch: &'b RecordBatch, name: &str) -> Result<&'b A> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<A>())
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid or missing {} column", name)))
}

fn string_column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b StringArray> {
    typed_column::<StringArray>(batch, name)
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
    pub columns: Vec<String>,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} KB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}\n\
            - Columns: {}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1024.0,
            self.compression,
            avg_rows,
            self.columns.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CumulativePoint;
    use crate::test_support::{record, ymd};
    use pretty_assertions::assert_eq;
    use tempfile::{NamedTempFile, TempDir};

    fn placed_record() -> SystemRecord {
        let mut r = record("Bedok Mall", "BEDOK", "CIGS", ymd(2015, 3), 100.0);
        r.planning_area = "BEDOK".to_string();
        r.region = "EAST REGION".to_string();
        r.cumulative_kwp = 100.0;
        r
    }

    #[test]
    fn test_write_empty_records() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;

        writer.write_systems(&[], temp_file.path())?;
        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 0);
        Ok(())
    }

    #[test]
    fn test_systems_read_back() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;

        let mut untilted = record("Tampines Hub", "TAMPINES", "Poly", ymd(2015, 1), 51.0);
        untilted.tilt_deg = None;
        let records = vec![placed_record(), untilted];

        writer.write_systems(&records, temp_file.path())?;
        let read_back = writer.read_sample_systems(temp_file.path(), 10)?;
        assert_eq!(read_back, records);

        let limited = writer.read_sample_systems(temp_file.path(), 1)?;
        assert_eq!(limited.len(), 1);
        assert_eq!(writer.detect_table_kind(temp_file.path())?, TableKind::Systems);
        Ok(())
    }

    #[test]
    fn test_area_summaries_keep_nulls() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;
        let summaries = vec![
            AreaSummary {
                name: "BEDOK".to_string(),
                region: "EAST REGION".to_string(),
                total_capacity_kwp: Some(130.0),
                mean_system_kwp: Some(65.0),
                system_count: 2,
            },
            AreaSummary::empty("TAMPINES", "EAST REGION"),
        ];

        writer.write_area_summaries(&summaries, temp_file.path())?;

        let file = File::open(temp_file.path())?;
        let mut reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        let batch = reader.next().expect("one batch")?;
        let totals = typed_column::<Float64Array>(&batch, "total_capacity_kwp")?;
        assert_eq!(totals.value(0), 130.0);
        assert!(totals.is_null(1));
        assert_eq!(
            writer.detect_table_kind(temp_file.path())?,
            TableKind::PlanningAreas
        );
        Ok(())
    }

    #[test]
    fn test_series_dates_use_unix_epoch() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;
        let series = CumulativeSeries {
            months: vec![ymd(2015, 1)],
            groups: vec!["BEDOK".to_string()],
            points: vec![CumulativePoint {
                month: ymd(2015, 1),
                group: "BEDOK".to_string(),
                region: Some("EAST REGION".to_string()),
                added_kwp: 10.0,
                cumulative_kwp: 10.0,
            }],
        };

        writer.write_series(&series, temp_file.path())?;

        let file = File::open(temp_file.path())?;
        let mut reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        let batch = reader.next().expect("one batch")?;
        let months = typed_column::<Date32Array>(&batch, "month")?;
        assert_eq!(months.value(0), 16_436);
        assert_eq!(months.value_as_date(0), Some(ymd(2015, 1)));
        assert_eq!(
            writer.detect_table_kind(temp_file.path())?,
            TableKind::CumulativeSeries
        );
        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        let compressions = ["snappy", "gzip", "lz4", "zstd", "none"];
        let dir = TempDir::new()?;

        for compression in &compressions {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let path = dir.path().join(format!("{}.parquet", compression));

            let result = writer.write_systems(&[placed_record()], &path);
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli-9000").is_err());
        Ok(())
    }

    #[test]
    fn test_file_info_summary() -> Result<()> {
        let writer = ParquetWriter::new().with_compression("none")?;
        let temp_file = NamedTempFile::new()?;
        writer.write_systems(&[placed_record()], temp_file.path())?;

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 1);
        assert_eq!(info.compression, Compression::UNCOMPRESSED);
        assert!(info.columns.contains(&"planning_area".to_string()));
        assert!(info.summary().contains("Total rows: 1"));
        Ok(())
    }
}
