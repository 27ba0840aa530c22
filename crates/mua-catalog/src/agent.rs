//! Mobile user-agent assembly.
//!
//! # Concurrency
//! The builder is shared across request handlers behind an `Arc`. Catalogs are
//! read-only; the one generator is seeded once and guarded by a mutex held only
//! for the two index draws.
use crate::catalog::{BrowserVersion, Catalogs, PlatformVersion};
use crate::device::DeviceRecord;
use crate::select::{find_minimum_index, pick_uniform};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Oldest browser major version worth advertising.
pub const MIN_BROWSER_MAJOR: u32 = 64;
/// Oldest platform API level worth advertising.
pub const MIN_PLATFORM_API: u32 = 27;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub browser_major: u32,
    pub platform_api: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            browser_major: MIN_BROWSER_MAJOR,
            platform_api: MIN_PLATFORM_API,
        }
    }
}

/// Builds randomized agent strings from the loaded catalogs.
///
/// ```
/// use mua_catalog::{
///     AgentBuilder, BrowserVersion, Catalog, Catalogs, DeviceRecord, PlatformVersion,
/// };
///
/// let catalogs = Catalogs::new(
///     Catalog::new(vec![BrowserVersion::new("70.0.3538.110", "537.36")]).unwrap(),
///     Catalog::new(vec![PlatformVersion::new(28, 10, "9")]).unwrap(),
/// );
/// let builder = AgentBuilder::new(catalogs);
/// let agent = builder.build(&DeviceRecord::with_build(1, "PPR1.180610.011"));
/// assert!(agent.contains("Android 9; PPR1.180610.011"));
/// ```
#[derive(Debug)]
pub struct AgentBuilder {
    catalogs: Catalogs,
    // Lower bounds are fixed once catalogs and thresholds are known.
    browser_floor: Option<usize>,
    platform_floor: Option<usize>,
    rng: Mutex<StdRng>,
}

impl AgentBuilder {
    /// Builder with the default thresholds and an entropy-seeded generator.
    pub fn new(catalogs: Catalogs) -> Self {
        Self::with_rng(catalogs, Thresholds::default(), StdRng::from_entropy())
    }

    /// Builder with a deterministic generator, mainly for tests.
    pub fn with_seed(catalogs: Catalogs, thresholds: Thresholds, seed: u64) -> Self {
        Self::with_rng(catalogs, thresholds, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(catalogs: Catalogs, thresholds: Thresholds, rng: StdRng) -> Self {
        let browser_floor = find_minimum_index(&catalogs.browsers, thresholds.browser_major);
        let platform_floor = find_minimum_index(&catalogs.platforms, thresholds.platform_api);
        if browser_floor.is_none() {
            tracing::warn!(
                threshold = thresholds.browser_major,
                newest = %catalogs.browsers.newest().major_version,
                "no browser version meets the threshold; only the newest will be used"
            );
        }
        if platform_floor.is_none() {
            tracing::warn!(
                threshold = thresholds.platform_api,
                newest = catalogs.platforms.newest().api_level,
                "no platform version meets the threshold; only the newest will be used"
            );
        }
        Self {
            catalogs,
            browser_floor,
            platform_floor,
            rng: Mutex::new(rng),
        }
    }

    /// Draw one browser and one platform version.
    pub fn pick(&self) -> (&BrowserVersion, &PlatformVersion) {
        let mut rng = self.rng.lock();
        let browser = pick_uniform(&self.catalogs.browsers, self.browser_floor, &mut *rng);
        let platform = pick_uniform(&self.catalogs.platforms, self.platform_floor, &mut *rng);
        (browser, platform)
    }

    /// Assemble a mobile Chrome user-agent string for `device`.
    ///
    /// Fields are embedded as-is; an empty build identifier leaves an empty
    /// field in the output.
    pub fn build(&self, device: &DeviceRecord) -> String {
        let (browser, platform) = self.pick();
        format_agent(browser, platform, device)
    }
}

pub fn format_agent(
    browser: &BrowserVersion,
    platform: &PlatformVersion,
    device: &DeviceRecord,
) -> String {
    format!(
        "Mozilla/5.0 (Linux; Android {}; {}) AppleWebKit/{} (KHTML, like Gecko) Chrome/{} Mobile Safari/{}",
        platform.version_label,
        device.build,
        browser.engine_revision,
        browser.major_version,
        browser.engine_revision
    )
}
