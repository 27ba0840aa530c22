//! Device storage.
//!
//! # Purpose
//! Supplies one random device record per agent request and reports
//! connection-pool statistics for the heartbeat and metrics endpoints.
use async_trait::async_trait;
use mua_catalog::DeviceRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub mod memory;
pub mod postgres;

/// Connection-pool counters. Backends without a pool report zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PoolStats {
    pub max_connections: u32,
    pub total_connections: u32,
    pub idle_connections: u32,
}

impl PoolStats {
    /// Mirror the counters into the Prometheus gauges.
    pub fn publish(&self) {
        metrics::gauge!(crate::observability::DB_MAX_CONNECTIONS)
            .set(f64::from(self.max_connections));
        metrics::gauge!(crate::observability::DB_TOTAL_CONNECTIONS)
            .set(f64::from(self.total_connections));
        metrics::gauge!(crate::observability::DB_IDLE_CONNECTIONS)
            .set(f64::from(self.idle_connections));
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no devices available")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// One device chosen uniformly at random from the whole table.
    async fn random_device(&self) -> StoreResult<DeviceRecord>;
    fn pool_stats(&self) -> PoolStats;
    fn backend_name(&self) -> &'static str;
}
