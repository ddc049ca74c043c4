/// Snapshot store: the latest measurement record per polled series.
///
/// ## Concurrency
///
/// **Writers:** one poller per key. Each write replaces the whole
/// `MeasurementRecord` under the write lock, so a record is never seen
/// half-updated.
///
/// **Readers:** the scrape path takes the read lock just long enough to
/// clone the map. Records are small `Copy` values; a scrape never holds
/// the lock while rendering.
///
/// The store holds plain values only, so a lock poisoned by a panicking
/// writer still guards consistent data and is recovered rather than
/// propagated.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::model::{MeasurementRecord, SeriesKey};

/// Concurrency-safe map of series key → latest record.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    records: RwLock<HashMap<SeriesKey, MeasurementRecord>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SeriesKey, MeasurementRecord>> {
        self.records.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SeriesKey, MeasurementRecord>> {
        self.records.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seeds a pending (invalid, unobserved) record. Existing records are
    /// left untouched.
    pub fn register(&self, key: SeriesKey) {
        self.write().entry(key).or_insert_with(MeasurementRecord::pending);
    }

    /// Replaces the record for `key`.
    pub fn set(&self, key: SeriesKey, record: MeasurementRecord) {
        self.write().insert(key, record);
    }

    /// Marks the record for `key` invalid, keeping its last value and
    /// timestamp. Creates a pending record if the key was never seen.
    pub fn invalidate(&self, key: &SeriesKey) {
        let mut records = self.write();
        match records.get_mut(key) {
            Some(record) => record.valid = false,
            None => {
                records.insert(key.clone(), MeasurementRecord::pending());
            }
        }
    }

    pub fn get(&self, key: &SeriesKey) -> Option<MeasurementRecord> {
        self.read().get(key).copied()
    }

    /// Point-in-time copy of every record.
    pub fn snapshot(&self) -> HashMap<SeriesKey, MeasurementRecord> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Number of records currently flagged valid.
    pub fn valid_count(&self) -> usize {
        self.read().values().filter(|r| r.valid).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
