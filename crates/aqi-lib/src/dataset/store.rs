//! On-disk CSV corpus with locked, atomically replaced rewrites

use super::raw::RawCorpus;
use super::Dataset;
use crate::error::{AqiError, Result};
use crate::models::TrainingRecord;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Corpus file name used when none is configured
pub const DEFAULT_DATASET_FILE: &str = "AQI-and-Lat-Long-of-Countries.csv";

/// Point-in-time capture of freshly collected readings
pub const DEFAULT_SNAPSHOT_FILE: &str = "real_time_air_quality.csv";

/// Owner of the persisted training corpus
#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the corpus. A missing file is an empty dataset.
    pub fn load(&self) -> Result<Dataset> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No corpus file yet, starting empty");
            return Ok(Dataset::default());
        }
        read_records(&self.path).map(Dataset::new)
    }

    /// Merge `new_records` into the corpus and write it back.
    ///
    /// Holds an exclusive lock on `<corpus>.lock` for the whole
    /// read-modify-write so concurrent collectors cannot interleave.
    /// Returns the number of records after the merge.
    pub fn merge_and_persist(&self, new_records: &[TrainingRecord]) -> Result<usize> {
        let lock = self.acquire_lock()?;

        let mut corpus = RawCorpus::read(&self.path)?;
        let before = corpus.len();
        corpus.merge(new_records);
        corpus.write(&self.path)?;

        drop(lock);

        info!(
            path = %self.path.display(),
            existing = before,
            incoming = new_records.len(),
            total = corpus.len(),
            "Merged records into corpus"
        );
        Ok(corpus.len())
    }

    /// Merge a previously saved snapshot file into the corpus
    pub fn merge_snapshot(&self, snapshot: &Path) -> Result<usize> {
        let records = read_records(snapshot)?;
        self.merge_and_persist(&records)
    }

    /// Write `records` to a standalone file. The corpus is not touched.
    pub fn save_snapshot(&self, records: &[TrainingRecord], destination: &Path) -> Result<()> {
        write_csv_atomic(destination, |writer| {
            for record in records {
                writer.serialize(record)?;
            }
            Ok(())
        })?;
        info!(
            path = %destination.display(),
            records = records.len(),
            "Saved snapshot"
        );
        Ok(())
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn acquire_lock(&self) -> Result<File> {
        ensure_parent(&self.path)?;
        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| AqiError::storage(&lock_path, e))?;
        file.lock_exclusive()
            .map_err(|e| AqiError::storage(&lock_path, e))?;
        Ok(file)
    }
}

fn read_records(path: &Path) -> Result<Vec<TrainingRecord>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| AqiError::storage(path, e))?;
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<TrainingRecord>, _>>()
        .map_err(|e| AqiError::storage(path, e))
}

/// Write to a sibling temp file, sync, then rename over `path`
pub(super) fn write_csv_atomic<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut csv::Writer<File>) -> csv::Result<()>,
{
    ensure_parent(path)?;
    let temp_path = temp_path_for(path);

    let result = (|| -> std::result::Result<(), Box<dyn std::error::Error>> {
        let file = File::create(&temp_path)?;
        let mut writer = csv::Writer::from_writer(file);
        fill(&mut writer)?;
        let mut file = writer.into_inner().map_err(|e| e.into_error())?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(AqiError::storage(path, e));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        AqiError::storage(path, e)
    })
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| AqiError::storage(parent, e))
        }
        _ => Ok(()),
    }
}
