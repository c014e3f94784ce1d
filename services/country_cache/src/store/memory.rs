//! In-memory store with optional JSON snapshot persistence
//!
//! Rows live in a `DashMap` keyed by the lower-cased country name. When a
//! snapshot path is configured, every mutation rewrites the snapshot file
//! and the file is reloaded on startup.

use async_trait::async_trait;
use country_types::{name_key, CountryQuery, CountryRecord, StatusRecord};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::CountryStore;
use crate::error::StoreError;

/// On-disk layout of the snapshot file
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    countries: Vec<CountryRecord>,
    status: Option<StatusRecord>,
}

/// Thread-safe country store
pub struct MemoryStore {
    /// Rows keyed by [`name_key`]
    countries: DashMap<String, CountryRecord>,

    /// Status singleton
    status: RwLock<Option<StatusRecord>>,

    /// Snapshot file, when persistence is enabled
    snapshot_path: Option<PathBuf>,

    /// Serializes snapshot writes
    snapshot_lock: tokio::sync::Mutex<()>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a store without persistence
    pub fn new() -> Self {
        Self {
            countries: DashMap::new(),
            status: RwLock::new(None),
            snapshot_path: None,
            snapshot_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Create a store persisted to `snapshot_path`, loading any existing snapshot
    pub fn open(snapshot_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let snapshot_path = snapshot_path.into();

        if let Some(parent) = snapshot_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::Write(format!("failed to create store directory {parent:?}: {e}"))
            })?;
        }

        let store = Self {
            snapshot_path: Some(snapshot_path),
            ..Self::new()
        };
        store.load_from_disk()?;
        Ok(store)
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    fn load_from_disk(&self) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        if !path.exists() {
            info!("No existing store snapshot at {:?}", path);
            return Ok(());
        }

        let data = fs::read_to_string(path)
            .map_err(|e| StoreError::Read(format!("failed to read snapshot {path:?}: {e}")))?;

        let snapshot: Snapshot = serde_json::from_str(&data)
            .map_err(|e| StoreError::Read(format!("failed to parse snapshot {path:?}: {e}")))?;

        for record in snapshot.countries {
            self.countries.insert(record.key(), record);
        }
        *self.status.write() = snapshot.status;

        info!("Loaded {} countries from store snapshot", self.countries.len());
        Ok(())
    }

    async fn save_to_disk(&self) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let _guard = self.snapshot_lock.lock().await;

        let mut countries: Vec<CountryRecord> = self
            .countries
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        countries.sort_by_key(|record| record.key());

        let snapshot = Snapshot {
            countries,
            status: self.status.read().clone(),
        };

        let data = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| StoreError::Write(format!("failed to serialize snapshot: {e}")))?;

        // Write-then-rename so a crash never leaves a truncated snapshot
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &data)
            .await
            .map_err(|e| StoreError::Write(format!("failed to write snapshot {tmp:?}: {e}")))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StoreError::Write(format!("failed to replace snapshot {path:?}: {e}")))?;

        debug!("Saved {} countries to store snapshot", snapshot.countries.len());
        Ok(())
    }
}

#[async_trait]
impl CountryStore for MemoryStore {
    async fn upsert_all(&self, records: &[CountryRecord]) -> Result<(), StoreError> {
        for record in records {
            self.countries.insert(record.key(), record.clone());
        }
        self.save_to_disk().await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.countries.len() as u64)
    }

    async fn find_all(&self, query: &CountryQuery) -> Result<Vec<CountryRecord>, StoreError> {
        let rows = self.countries.iter().map(|entry| entry.value().clone());
        Ok(query.apply(rows))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<CountryRecord>, StoreError> {
        Ok(self
            .countries
            .get(&name_key(name))
            .map(|entry| entry.value().clone()))
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool, StoreError> {
        let removed = self.countries.remove(&name_key(name)).is_some();
        if removed {
            self.save_to_disk().await?;
        }
        Ok(removed)
    }

    async fn save_status(&self, status: &StatusRecord) -> Result<(), StoreError> {
        *self.status.write() = Some(status.clone());
        self.save_to_disk().await
    }

    async fn load_status(&self) -> Result<Option<StatusRecord>, StoreError> {
        Ok(self.status.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use country_types::CountrySort;
    use tempfile::tempdir;

    fn record(name: &str, population: u64, gdp: Option<f64>) -> CountryRecord {
        CountryRecord {
            name: name.to_string(),
            capital: None,
            region: Some("Europe".to_string()),
            population,
            currency_code: Some("EUR".to_string()),
            exchange_rate: Some(0.92),
            estimated_gdp: gdp,
            flag_url: None,
            last_refreshed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_key_and_keeps_others() {
        let store = MemoryStore::new();
        store
            .upsert_all(&[record("France", 1, Some(10.0)), record("Spain", 2, Some(20.0))])
            .await
            .unwrap();

        store
            .upsert_all(&[record("FRANCE", 3, Some(30.0)), record("Italy", 4, None)])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 3);

        let france = store.find_by_name("france").await.unwrap().unwrap();
        assert_eq!(france.population, 3);
        assert_eq!(france.name, "FRANCE");

        // Absent from the second batch, still present
        assert!(store.find_by_name("Spain").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_find_by_name_is_case_insensitive() {
        let store = MemoryStore::new();
        store.upsert_all(&[record("France", 1, None)]).await.unwrap();

        let upper = store.find_by_name("FRANCE").await.unwrap();
        let lower = store.find_by_name("france").await.unwrap();
        assert_eq!(upper, lower);
        assert!(upper.is_some());
        assert!(store.find_by_name("Franc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_noop_when_missing() {
        let store = MemoryStore::new();
        store.upsert_all(&[record("France", 1, None)]).await.unwrap();

        assert!(!store.delete_by_name("Atlantis").await.unwrap());
        assert!(store.delete_by_name("FRANCE").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_all_gdp_sort_drops_missing() {
        let store = MemoryStore::new();
        store
            .upsert_all(&[
                record("France", 1, Some(10.0)),
                record("Spain", 2, None),
                record("Italy", 3, Some(30.0)),
            ])
            .await
            .unwrap();

        let query = CountryQuery {
            sort: Some(CountrySort::gdp_desc()),
            ..Default::default()
        };
        let rows = store.find_all(&query).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Italy", "France"]);

        // Default order is by name and keeps every row
        let all = store.find_all(&CountryQuery::default()).await.unwrap();
        let names: Vec<_> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["France", "Italy", "Spain"]);
    }

    #[tokio::test]
    async fn test_status_singleton_overwrites() {
        let store = MemoryStore::new();
        assert!(store.load_status().await.unwrap().is_none());

        store.save_status(&StatusRecord::new(3, Utc::now())).await.unwrap();
        store.save_status(&StatusRecord::new(5, Utc::now())).await.unwrap();

        assert_eq!(store.load_status().await.unwrap().unwrap().total_countries, 5);
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("country_cache.json");

        {
            let store = MemoryStore::open(&path).unwrap();
            store
                .upsert_all(&[record("France", 1, Some(10.0)), record("Spain", 2, None)])
                .await
                .unwrap();
            store.save_status(&StatusRecord::new(2, Utc::now())).await.unwrap();
            store.delete_by_name("spain").await.unwrap();
        }

        let reopened = MemoryStore::open(&path).unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        assert!(reopened.find_by_name("FRANCE").await.unwrap().is_some());
        assert_eq!(reopened.load_status().await.unwrap().unwrap().total_countries, 2);
        assert_eq!(reopened.snapshot_path(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_read_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("country_cache.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(MemoryStore::open(&path), Err(StoreError::Read(_))));
    }
}
