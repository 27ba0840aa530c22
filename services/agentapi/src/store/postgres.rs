//! Postgres-backed device store.
//!
//! # What this module is
//! Implements [`DeviceStore`] over the `devices` table using a `sqlx` pool.
//! Each agent request reads exactly one random row; nothing is written.
//!
//! # Concurrency model
//! - The store is shared across async handlers; `sqlx::PgPool` manages concurrency.
//! - Pool sizing (`min_connections`/`max_connections`) bounds database load.
//! - Connections are recycled after 3 minutes and closed after 1 minute idle.
//!
//! # Operational notes
//! - Migrations run at startup via `sqlx::migrate!("./migrations")` so the
//!   `devices` table exists before the first request.
//! - Database URLs may contain credentials; never log them.
use super::{DeviceStore, PoolStats, StoreError, StoreResult};
use crate::config::PostgresConfig;
use anyhow::anyhow;
use async_trait::async_trait;
use mua_catalog::DeviceRecord;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;

const MAX_CONN_LIFETIME: Duration = Duration::from_secs(3 * 60);
const MAX_CONN_IDLE: Duration = Duration::from_secs(60);

// Tables created outside the migrations may hold NULLs; read them as defaults.
const RANDOM_DEVICE_SQL: &str = "SELECT id, \
     COALESCE(manufacturer, '') AS manufacturer, \
     COALESCE(model, '') AS model, \
     COALESCE(os, '') AS os, \
     COALESCE(build, '') AS build, \
     COALESCE(cpu_description, '') AS cpu_description, \
     COALESCE(display_x, 0) AS display_x, \
     COALESCE(display_y, 0) AS display_y, \
     COALESCE(base_android_version, '') AS base_android_version, \
     COALESCE(dpi, 0) AS dpi, \
     COALESCE(build_os_device, '') AS build_os_device \
     FROM devices ORDER BY random() LIMIT 1";

/// Device store backed by Postgres.
///
/// # Errors
/// - Connection and query failures surface as [`StoreError::Database`].
/// - An empty `devices` table surfaces as [`StoreError::NotFound`].
pub struct PostgresStore {
    pool: PgPool,
}

/// Row shape for the `devices` table.
#[derive(Debug, Clone, FromRow)]
struct DbDevice {
    id: i64,
    manufacturer: String,
    model: String,
    os: String,
    build: String,
    cpu_description: String,
    display_x: i32,
    display_y: i32,
    base_android_version: String,
    dpi: i32,
    build_os_device: String,
}

impl PostgresStore {
    /// Connect to Postgres and apply embedded migrations.
    ///
    /// # Errors
    /// - Invalid URL, connection, or migration failures.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        let store = Self::connect_without_migrations(pg).await?;
        // Handlers assume the schema exists; fail startup otherwise.
        sqlx::migrate!("./migrations").run(&store.pool).await?;
        Ok(store)
    }

    /// Connect without touching the schema.
    pub async fn connect_without_migrations(pg: &PostgresConfig) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = PgPoolOptions::new()
            .min_connections(pg.min_connections.min(pg.max_connections))
            .max_connections(pg.max_connections)
            .max_lifetime(MAX_CONN_LIFETIME)
            .idle_timeout(MAX_CONN_IDLE)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options)
            .await?;
        let store = Self { pool };
        store.pool_stats().publish();
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DeviceStore for PostgresStore {
    async fn random_device(&self) -> StoreResult<DeviceRecord> {
        let row: Option<DbDevice> = sqlx::query_as(RANDOM_DEVICE_SQL)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => device_from_db(row),
            None => Err(StoreError::NotFound),
        }
    }

    fn pool_stats(&self) -> PoolStats {
        PoolStats {
            max_connections: self.pool.options().get_max_connections(),
            total_connections: self.pool.size(),
            idle_connections: u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX),
        }
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn device_from_db(row: DbDevice) -> StoreResult<DeviceRecord> {
    Ok(DeviceRecord {
        id: non_negative(row.id, "id")?,
        manufacturer: row.manufacturer,
        model: row.model,
        os: row.os,
        build: row.build,
        cpu_description: row.cpu_description,
        display_x: non_negative(row.display_x.into(), "display_x")?,
        display_y: non_negative(row.display_y.into(), "display_y")?,
        android_version: row.base_android_version,
        dpi: non_negative(row.dpi.into(), "dpi")?,
        build_os_device: row.build_os_device,
    })
}

fn non_negative<T: TryFrom<i64>>(value: i64, column: &str) -> StoreResult<T> {
    T::try_from(value).map_err(|_| StoreError::Unexpected(anyhow!("invalid {column} {value}")))
}
