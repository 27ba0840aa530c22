//! Device records drawn from storage. Only `build` feeds the agent string.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceRecord {
    pub id: u64,
    pub manufacturer: String,
    pub model: String,
    // Platform name as stored, e.g. "Android".
    pub os: String,
    // Build identifier embedded verbatim in the agent string.
    pub build: String,
    pub cpu_description: String,
    pub display_x: u32,
    pub display_y: u32,
    pub android_version: String,
    pub dpi: u32,
    pub build_os_device: String,
}

impl DeviceRecord {
    pub fn with_build(id: u64, build: impl Into<String>) -> Self {
        Self {
            id,
            build: build.into(),
            ..Self::default()
        }
    }
}
