//! Browser and platform version catalogs.
//!
//! A catalog is an ordered, non-empty list of version records read from a JSON
//! document at startup. Order is asserted by the data source (ascending release
//! order) and is not re-checked here.
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::Deref;
use std::path::Path;

/// One browser release: the full version text and its render-engine revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "chrome_rev")]
    pub major_version: String,
    #[serde(rename = "webkit_rev")]
    pub engine_revision: String,
}

impl BrowserVersion {
    pub fn new(major_version: impl Into<String>, engine_revision: impl Into<String>) -> Self {
        Self {
            major_version: major_version.into(),
            engine_revision: engine_revision.into(),
        }
    }
}

/// One platform release keyed by API level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformVersion {
    #[serde(rename = "api")]
    pub api_level: u32,
    pub id: u32,
    #[serde(rename = "version")]
    pub version_label: String,
}

impl PlatformVersion {
    pub fn new(api_level: u32, id: u32, version_label: impl Into<String>) -> Self {
        Self {
            api_level,
            id,
            version_label: version_label.into(),
        }
    }
}

/// Comparable numeric version used by the minimum-version filter.
///
/// `None` means the entry carries no usable version and is skipped.
pub trait VersionKey {
    fn version_key(&self) -> Option<u32>;
}

impl VersionKey for BrowserVersion {
    fn version_key(&self) -> Option<u32> {
        leading_integer(&self.major_version)
    }
}

impl VersionKey for PlatformVersion {
    fn version_key(&self) -> Option<u32> {
        Some(self.api_level)
    }
}

// "70.0.3538.110" -> 70; text without leading digits has no key.
fn leading_integer(text: &str) -> Option<u32> {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

/// Ordered, non-empty, read-only list of catalog entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog<T> {
    entries: Vec<T>,
}

impl<T> Catalog<T> {
    /// Wrap `entries`, refusing an empty list.
    pub fn new(entries: Vec<T>) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        Some(Self { entries })
    }

    /// Newest entry. Never fails: catalogs are non-empty by construction.
    pub fn newest(&self) -> &T {
        &self.entries[self.entries.len() - 1]
    }
}

impl<T> Deref for Catalog<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.entries
    }
}

#[derive(Debug, Deserialize)]
struct BrowserDocument {
    chrome: Vec<BrowserVersion>,
}

#[derive(Debug, Deserialize)]
struct PlatformDocument {
    android: Vec<PlatformVersion>,
}

/// The browser and platform catalogs used to assemble agents.
#[derive(Debug, Clone)]
pub struct Catalogs {
    pub browsers: Catalog<BrowserVersion>,
    pub platforms: Catalog<PlatformVersion>,
}

impl Catalogs {
    pub fn new(browsers: Catalog<BrowserVersion>, platforms: Catalog<PlatformVersion>) -> Self {
        Self {
            browsers,
            platforms,
        }
    }

    /// Read both catalog documents from disk.
    ///
    /// # Errors
    /// - [`Error::Read`] if a file cannot be read.
    /// - [`Error::Parse`] if a document is not valid catalog JSON.
    /// - [`Error::Empty`] if a document lists no entries.
    pub fn load(browser_path: impl AsRef<Path>, platform_path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            browsers: load_browsers(browser_path.as_ref())?,
            platforms: load_platforms(platform_path.as_ref())?,
        })
    }
}

pub fn load_browsers(path: &Path) -> Result<Catalog<BrowserVersion>> {
    let document: BrowserDocument = read_document(path)?;
    for entry in &document.chrome {
        if entry.version_key().is_none() {
            tracing::warn!(
                path = %path.display(),
                version = %entry.major_version,
                "browser version has no numeric major; it will never be selected"
            );
        }
    }
    into_catalog(path, document.chrome)
}

pub fn load_platforms(path: &Path) -> Result<Catalog<PlatformVersion>> {
    let document: PlatformDocument = read_document(path)?;
    into_catalog(path, document.android)
}

fn read_document<D: DeserializeOwned>(path: &Path) -> Result<D> {
    let bytes = fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn into_catalog<T>(path: &Path, entries: Vec<T>) -> Result<Catalog<T>> {
    let count = entries.len();
    let catalog = Catalog::new(entries).ok_or_else(|| Error::Empty {
        path: path.to_path_buf(),
    })?;
    tracing::info!(path = %path.display(), entries = count, "catalog loaded");
    Ok(catalog)
}
