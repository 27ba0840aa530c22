//! Version catalogs and mobile user-agent assembly shared by the agent service.
//!
//! Catalogs are loaded once at startup and never mutated afterwards; the
//! `AgentBuilder` holds them together with a single seeded generator.
use std::path::PathBuf;

pub mod agent;
pub mod catalog;
pub mod device;
pub mod select;

pub use agent::{AgentBuilder, MIN_BROWSER_MAJOR, MIN_PLATFORM_API, Thresholds};
pub use catalog::{BrowserVersion, Catalog, Catalogs, PlatformVersion, VersionKey};
pub use device::DeviceRecord;
pub use select::{find_minimum_index, pick_uniform};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog {path} has no entries")]
    Empty { path: PathBuf },
}
