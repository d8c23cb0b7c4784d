//! Column-preserving view of the corpus file
//!
//! Merges rewrite the corpus through this view so columns the models never
//! read (country, city, category labels) survive a read-modify-write.

use super::dedup_keep_last;
use super::store::write_csv_atomic;
use crate::error::{AqiError, Result};
use crate::models::{coordinate_key, TrainingRecord, FEATURE_COLUMNS, LABEL_COLUMN};
use csv::StringRecord;
use std::path::Path;

const BOOKKEEPING_COLUMNS: [&str; 2] = ["timestamp", "source"];

/// Columns written for a [`TrainingRecord`], in serialization order
fn record_columns() -> impl Iterator<Item = &'static str> {
    std::iter::once(LABEL_COLUMN)
        .chain(FEATURE_COLUMNS)
        .chain(BOOKKEEPING_COLUMNS)
}

fn record_values(record: &TrainingRecord) -> Vec<(&'static str, String)> {
    let numeric = [
        record.aqi,
        record.co,
        record.ozone,
        record.no2,
        record.pm25,
        record.lat,
        record.lng,
    ];
    let text = [
        record.timestamp.clone().unwrap_or_default(),
        record.source.clone().unwrap_or_default(),
    ];

    record_columns()
        .zip(numeric.iter().map(f64::to_string).chain(text))
        .collect()
}

struct Row {
    key: (u64, u64),
    fields: StringRecord,
}

/// Header plus raw rows, each tagged with its coordinate key
pub(super) struct RawCorpus {
    headers: StringRecord,
    rows: Vec<Row>,
}

impl RawCorpus {
    /// Read `path`, validating every row as a record. A missing file is empty.
    pub(super) fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                headers: record_columns().collect(),
                rows: Vec::new(),
            });
        }

        let mut reader = csv::Reader::from_path(path).map_err(|e| AqiError::storage(path, e))?;
        let headers = reader
            .headers()
            .map_err(|e| AqiError::storage(path, e))?
            .clone();

        let mut rows = Vec::new();
        for result in reader.records() {
            let fields = result.map_err(|e| AqiError::storage(path, e))?;
            let record: TrainingRecord = fields
                .deserialize(Some(&headers))
                .map_err(|e| AqiError::storage(path, e))?;
            rows.push(Row {
                key: record.location_key(),
                fields,
            });
        }

        Ok(Self { headers, rows })
    }

    pub(super) fn len(&self) -> usize {
        self.rows.len()
    }

    /// Append `records` on the union of columns, then keep the last row per
    /// coordinate pair. Columns a record has no value for stay empty.
    pub(super) fn merge(&mut self, records: &[TrainingRecord]) {
        let missing: Vec<&str> = record_columns()
            .filter(|c| !self.headers.iter().any(|h| h == *c))
            .collect();
        if !missing.is_empty() {
            for column in &missing {
                self.headers.push_field(column);
            }
            for row in &mut self.rows {
                for _ in &missing {
                    row.fields.push_field("");
                }
            }
        }

        for record in records {
            let values = record_values(record);
            let fields: StringRecord = self
                .headers
                .iter()
                .map(|column| {
                    values
                        .iter()
                        .find(|(name, _)| *name == column)
                        .map(|(_, value)| value.as_str())
                        .unwrap_or("")
                })
                .collect();
            self.rows.push(Row {
                key: coordinate_key(record.lat, record.lng),
                fields,
            });
        }

        self.rows = dedup_keep_last(std::mem::take(&mut self.rows), |row| row.key);
    }

    pub(super) fn write(&self, path: &Path) -> Result<()> {
        write_csv_atomic(path, |writer| {
            writer.write_record(&self.headers)?;
            for row in &self.rows {
                writer.write_record(&row.fields)?;
            }
            Ok(())
        })
    }
}
