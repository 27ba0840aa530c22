//! In-memory device store.
//!
//! # Purpose
//! Holds a fixed list of devices for local development and tests, so the
//! service can run without Postgres. The list never changes after startup.
use super::{DeviceStore, PoolStats, StoreError, StoreResult};
use anyhow::Context;
use async_trait::async_trait;
use mua_catalog::DeviceRecord;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

pub struct InMemoryStore {
    devices: Vec<DeviceRecord>,
    rng: Mutex<StdRng>,
}

impl InMemoryStore {
    pub fn new(devices: Vec<DeviceRecord>) -> Self {
        Self {
            devices,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Load a JSON array of device records.
    pub fn from_json_file(path: &Path) -> StoreResult<Self> {
        let contents = std::fs::read(path)
            .with_context(|| format!("read devices file {}", path.display()))?;
        let devices: Vec<DeviceRecord> = serde_json::from_slice(&contents)
            .with_context(|| format!("parse devices file {}", path.display()))?;
        tracing::info!(path = %path.display(), devices = devices.len(), "devices loaded");
        Ok(Self::new(devices))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[async_trait]
impl DeviceStore for InMemoryStore {
    async fn random_device(&self) -> StoreResult<DeviceRecord> {
        if self.devices.is_empty() {
            return Err(StoreError::NotFound);
        }
        let index = self.rng.lock().gen_range(0..self.devices.len());
        Ok(self.devices[index].clone())
    }

    fn pool_stats(&self) -> PoolStats {
        PoolStats::default()
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn empty_store_reports_not_found() {
        let store = InMemoryStore::new(Vec::new());
        let err = store.random_device().await.expect_err("empty");
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn random_device_covers_all_rows() {
        let store = InMemoryStore::new(vec![
            DeviceRecord::with_build(1, "A1"),
            DeviceRecord::with_build(2, "B2"),
            DeviceRecord::with_build(3, "C3"),
        ]);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.insert(store.random_device().await.expect("device").id);
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(store.pool_stats(), PoolStats::default());
        assert_eq!(store.backend_name(), "memory");
    }

    #[test]
    fn from_json_file_reads_partial_records() {
        let file = tempfile::NamedTempFile::new().expect("temp");
        std::fs::write(
            file.path(),
            r#"[{"id": 7, "manufacturer": "Google", "model": "Pixel 3", "build": "PQ3A.190801.002"}]"#,
        )
        .expect("write");
        let store = InMemoryStore::from_json_file(file.path()).expect("store");
        assert_eq!(store.len(), 1);
        assert_eq!(store.devices[0].build, "PQ3A.190801.002");
        assert_eq!(store.devices[0].dpi, 0);
    }

    #[test]
    fn from_json_file_rejects_garbage() {
        let file = tempfile::NamedTempFile::new().expect("temp");
        std::fs::write(file.path(), "not json").expect("write");
        let err = InMemoryStore::from_json_file(file.path())
            .err()
            .expect("garbage");
        assert!(err.to_string().contains("parse devices file"));
    }
}
