//! Local Parquet persistence for transformed opportunities.

use std::fs::File;
use std::path::Path;

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use setaside_core::{Opportunity, to_record_batch};
use tracing::info;

use crate::StoreError;

/// Write opportunities to a SNAPPY-compressed Parquet file, replacing any
/// existing file. Missing parent directories are created.
///
/// Returns the size of the written file in bytes.
pub fn write_opportunities(opportunities: &[Opportunity], path: &Path) -> Result<u64, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let batch = to_record_batch(opportunities)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    let bytes = std::fs::metadata(path)?.len();
    info!(
        rows = opportunities.len(),
        bytes,
        path = %path.display(),
        "wrote parquet file"
    );
    Ok(bytes)
}

/// Read a Parquet file into Arrow RecordBatches.
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    if !path.exists() {
        return Err(StoreError::ParquetNotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::AsArray;
    use arrow::datatypes::{DataType, Int32Type, TimeUnit, TimestampMillisecondType};
    use chrono::{TimeZone, Utc};
    use setaside_core::schema::columns;
    use tempfile::TempDir;

    fn opportunity(id: &str, day: u32, score: u8) -> Opportunity {
        Opportunity {
            id: id.into(),
            title: format!("Title {id}"),
            solicitation_number: format!("SOL-{id}"),
            agency: "VETERANS AFFAIRS, DEPARTMENT OF".into(),
            posted_date: Utc.with_ymd_and_hms(2026, 10, day, 0, 0, 0).unwrap(),
            set_aside: "Veteran-Owned Small Business".into(),
            naics_code: "541511".into(),
            naics_description: "Custom Computer Programming".into(),
            city: "Denver".into(),
            state: "CO".into(),
            link: format!("https://sam.gov/opp/{id}/view"),
            days_since_posted: 19 - i64::from(day),
            is_recent: day >= 12,
            has_naics: true,
            recency_score: score,
        }
    }

    #[test]
    fn round_trip_preserves_rows_order_and_types() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("veteran_contracts.parquet");
        let opps = vec![opportunity("a", 18, 5), opportunity("b", 1, 1)];

        let bytes = write_opportunities(&opps, &path).unwrap();
        assert!(bytes > 0);
        assert_eq!(bytes, std::fs::metadata(&path).unwrap().len());

        let batches = read_parquet(&path).unwrap();
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 2);

        let batch = &batches[0];
        let schema = batch.schema();
        assert_eq!(
            schema.field_with_name(columns::POSTED_DATE).unwrap().data_type(),
            &DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into()))
        );
        assert_eq!(
            schema.field_with_name(columns::IS_RECENT).unwrap().data_type(),
            &DataType::Boolean
        );

        let ids = batch.column_by_name(columns::ID).unwrap().as_string::<i32>();
        assert_eq!(ids.value(0), "a");
        assert_eq!(ids.value(1), "b");

        let scores = batch
            .column_by_name(columns::RECENCY_SCORE)
            .unwrap()
            .as_primitive::<Int32Type>();
        assert_eq!(scores.value(0), 5);

        let posted = batch
            .column_by_name(columns::POSTED_DATE)
            .unwrap()
            .as_primitive::<TimestampMillisecondType>();
        assert_eq!(posted.value(0), opps[0].posted_date.timestamp_millis());
    }

    #[test]
    fn empty_set_writes_valid_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.parquet");

        write_opportunities(&[], &path).unwrap();
        let batches = read_parquet(&path).unwrap();
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 0);
    }

    #[test]
    fn creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out").join("nested").join("contracts.parquet");

        write_opportunities(&[opportunity("a", 18, 5)], &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn rewrite_replaces_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("contracts.parquet");

        write_opportunities(&[opportunity("a", 18, 5), opportunity("b", 17, 5)], &path).unwrap();
        write_opportunities(&[opportunity("c", 18, 5)], &path).unwrap();

        let batches = read_parquet(&path).unwrap();
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn missing_parquet_errors() {
        let result = read_parquet(Path::new("/nonexistent/file.parquet"));
        assert!(matches!(result, Err(StoreError::ParquetNotFound(_))));
    }
}
