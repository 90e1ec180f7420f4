//! The authoritative mapping of update ids to update metadata.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::types::{Platform, UpdateRecord};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("update not found: {0}")]
    NotFound(String),
}

/// Shared update catalog.
///
/// Readers (checks, downloads, listings) run concurrently; writers
/// (upload, deactivate) take the lock exclusively, so a reader observes
/// either the fully-old or fully-new record for a key, never a partial one.
#[derive(Debug, Default)]
pub struct UpdateCatalog {
    records: RwLock<HashMap<String, UpdateRecord>>,
}

impl UpdateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the record keyed by its `update_id`.
    pub fn put(&self, record: UpdateRecord) {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        records.insert(record.update_id.clone(), record);
    }

    pub fn get(&self, update_id: &str) -> Result<UpdateRecord, CatalogError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .get(update_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(update_id.to_string()))
    }

    /// Returns the active record on `platform` with the greatest build
    /// number strictly above `min_build_number`, if any.
    ///
    /// Equal build numbers should not occur (ids are unique per triple);
    /// if they do, the tie breaks by `update_id` so the selection stays
    /// deterministic for a given catalog state.
    pub fn latest_for_platform(
        &self,
        platform: Platform,
        min_build_number: u64,
    ) -> Option<UpdateRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .values()
            .filter(|r| r.is_active && r.platform == platform && r.build_number > min_build_number)
            .max_by(|a, b| {
                a.build_number
                    .cmp(&b.build_number)
                    .then_with(|| a.update_id.cmp(&b.update_id))
            })
            .cloned()
    }

    /// Snapshot of every record, active or not, sorted by update id.
    pub fn list(&self) -> Vec<UpdateRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<UpdateRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| a.update_id.cmp(&b.update_id));
        all
    }

    /// Retires a record. Deactivated records stay listable but are
    /// excluded from eligibility checks and downloads.
    pub fn deactivate(&self, update_id: &str) -> Result<(), CatalogError> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match records.get_mut(update_id) {
            Some(record) => {
                record.is_active = false;
                Ok(())
            }
            None => Err(CatalogError::NotFound(update_id.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(version: &str, platform: Platform, build: u64) -> UpdateRecord {
        UpdateRecord {
            update_id: UpdateRecord::derive_id(version, platform, build),
            version: version.to_string(),
            build_number: build,
            platform,
            file_size: 100,
            checksum: "00".repeat(32),
            changelog: String::new(),
            is_mandatory: false,
            min_required_version: None,
            release_date: Utc::now(),
            is_active: true,
        }
    }

    #[test]
    fn test_put_then_get() {
        let catalog = UpdateCatalog::new();
        catalog.put(record("1.0.0", Platform::Android, 1));
        let got = catalog.get("tauos-1.0.0-android-1").unwrap();
        assert_eq!(got.build_number, 1);
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let catalog = UpdateCatalog::new();
        let err = catalog.get("tauos-9.9.9-ios-99").unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[test]
    fn test_put_replaces_existing_record() {
        let catalog = UpdateCatalog::new();
        catalog.put(record("1.0.0", Platform::Android, 1));
        let mut replacement = record("1.0.0", Platform::Android, 1);
        replacement.checksum = "ff".repeat(32);
        replacement.file_size = 777;
        catalog.put(replacement);

        assert_eq!(catalog.len(), 1);
        let got = catalog.get("tauos-1.0.0-android-1").unwrap();
        assert_eq!(got.file_size, 777);
        assert_eq!(got.checksum, "ff".repeat(32));
    }

    #[test]
    fn test_latest_picks_greatest_build_number() {
        let catalog = UpdateCatalog::new();
        catalog.put(record("1.0.0", Platform::Android, 10));
        catalog.put(record("1.1.0", Platform::Android, 20));
        catalog.put(record("1.2.0", Platform::Android, 15));

        let latest = catalog.latest_for_platform(Platform::Android, 0).unwrap();
        assert_eq!(latest.build_number, 20);
    }

    #[test]
    fn test_latest_requires_strictly_greater_build() {
        let catalog = UpdateCatalog::new();
        catalog.put(record("1.1.0", Platform::Android, 20));

        assert!(catalog.latest_for_platform(Platform::Android, 20).is_none());
        assert!(catalog.latest_for_platform(Platform::Android, 19).is_some());
    }

    #[test]
    fn test_latest_is_platform_scoped() {
        let catalog = UpdateCatalog::new();
        catalog.put(record("3.0.0", Platform::Ios, 300));
        catalog.put(record("1.0.0", Platform::Android, 5));

        let latest = catalog.latest_for_platform(Platform::Android, 0).unwrap();
        assert_eq!(latest.build_number, 5);
    }

    #[test]
    fn test_latest_skips_inactive_records() {
        let catalog = UpdateCatalog::new();
        catalog.put(record("1.0.0", Platform::Android, 10));
        catalog.put(record("1.1.0", Platform::Android, 20));
        catalog.deactivate("tauos-1.1.0-android-20").unwrap();

        let latest = catalog.latest_for_platform(Platform::Android, 0).unwrap();
        assert_eq!(latest.build_number, 10);
    }

    #[test]
    fn test_deactivate_keeps_record_listable() {
        let catalog = UpdateCatalog::new();
        catalog.put(record("1.0.0", Platform::Ios, 1));
        catalog.deactivate("tauos-1.0.0-ios-1").unwrap();

        let all = catalog.list();
        assert_eq!(all.len(), 1);
        assert!(!all[0].is_active);
    }

    #[test]
    fn test_deactivate_unknown_is_not_found() {
        let catalog = UpdateCatalog::new();
        assert!(catalog.deactivate("tauos-0.0.0-ios-0").is_err());
    }

    #[test]
    fn test_list_is_sorted_by_update_id() {
        let catalog = UpdateCatalog::new();
        catalog.put(record("2.0.0", Platform::Android, 2));
        catalog.put(record("1.0.0", Platform::Android, 1));

        let all = catalog.list();
        let ids: Vec<&str> = all.iter().map(|r| r.update_id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        use std::sync::Arc;
        use std::thread;

        let catalog = Arc::new(UpdateCatalog::new());
        let mut handles = Vec::new();

        for build in 1..=8u64 {
            let catalog = catalog.clone();
            handles.push(thread::spawn(move || {
                catalog.put(record(&format!("1.0.{}", build), Platform::Android, build));
            }));
        }
        for _ in 0..8 {
            let catalog = catalog.clone();
            handles.push(thread::spawn(move || {
                // Any observed latest must be a fully-formed record.
                if let Some(latest) = catalog.latest_for_platform(Platform::Android, 0) {
                    assert_eq!(
                        latest.update_id,
                        UpdateRecord::derive_id(&latest.version, latest.platform, latest.build_number)
                    );
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(catalog.len(), 8);
    }
}
