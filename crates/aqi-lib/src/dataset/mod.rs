//! Training corpus management
//!
//! This module provides:
//! - The in-memory [`Dataset`] and its coordinate deduplication
//! - [`DatasetStore`] for loading, merging and snapshotting the CSV corpus

mod raw;
mod store;


pub use store::{DatasetStore, DEFAULT_DATASET_FILE, DEFAULT_SNAPSHOT_FILE};

use crate::models::{FeatureVector, TrainingRecord};
use std::collections::HashMap;

/// Ordered collection of training records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<TrainingRecord>,
}

impl Dataset {
    pub fn new(records: Vec<TrainingRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[TrainingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Feature rows and labels in record order
    pub fn training_pairs(&self) -> (Vec<FeatureVector>, Vec<f64>) {
        self.records
            .iter()
            .map(|r| (r.features(), r.aqi))
            .unzip()
    }

    /// Append `new_records` and collapse rows sharing a `(lat, lng)` pair.
    ///
    /// The last occurrence of each key wins and keeps its position, so an
    /// updated coordinate moves to where the newer row was appended.
    pub fn merge(&mut self, new_records: impl IntoIterator<Item = TrainingRecord>) {
        self.records.extend(new_records);
        self.records = dedup_keep_last(std::mem::take(&mut self.records), TrainingRecord::location_key);
    }
}

/// Keep only the last item per key, in the order those last items appear
pub(crate) fn dedup_keep_last<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> (u64, u64),
{
    let mut last_index: HashMap<(u64, u64), usize> = HashMap::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        last_index.insert(key(item), idx);
    }

    items
        .into_iter()
        .enumerate()
        .filter(|(idx, item)| last_index.get(&key(item)) == Some(idx))
        .map(|(_, item)| item)
        .collect()
}
