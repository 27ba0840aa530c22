use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_HTTP_ADDRESS: &str = ":8080";
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost:5432/postgres";
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 64;
pub const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_PLATFORM_CATALOG: &str = "docs/android.json";
const DEFAULT_BROWSER_CATALOG: &str = "docs/chrome.json";
const DEFAULT_VERSION_PATH: &str = ".version";
const DEFAULT_REVISION_PATH: &str = ".revision";

// Agent service configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct AgentApiConfig {
    // HTTP listener bind address.
    pub bind_addr: SocketAddr,
    // Emit JSON logs instead of human-readable text.
    pub production: bool,
    pub browser_catalog_path: PathBuf,
    pub platform_catalog_path: PathBuf,
    // Files holding the deployed version and revision, reported by /version.
    pub version_path: PathBuf,
    pub revision_path: PathBuf,
    pub storage: StorageBackend,
    // Seed file for the in-memory backend.
    pub devices_path: Option<PathBuf>,
    pub postgres: PostgresConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "pg" => Ok(Self::Postgres),
            other => bail!("unknown storage backend {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

#[derive(Debug, Default, Deserialize)]
struct AgentApiConfigOverride {
    bind_addr: Option<String>,
    production: Option<bool>,
    browser_catalog_path: Option<PathBuf>,
    platform_catalog_path: Option<PathBuf>,
    version_path: Option<PathBuf>,
    revision_path: Option<PathBuf>,
    storage: Option<String>,
    devices_path: Option<PathBuf>,
    database_url: Option<String>,
    min_connections: Option<u32>,
    max_connections: Option<u32>,
    acquire_timeout_ms: Option<u64>,
}

/// Parse a listen address, accepting the `:port` shorthand for all interfaces.
pub fn parse_bind_addr(value: &str) -> Result<SocketAddr> {
    let value = value.trim();
    let full = match value.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => value.to_string(),
    };
    full.parse()
        .with_context(|| format!("invalid bind address {value}"))
}

fn env_flag(key: &str) -> Result<Option<bool>> {
    let Ok(value) = std::env::var(key) else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(Some(true)),
        "0" | "false" | "no" | "" => Ok(Some(false)),
        other => bail!("parse {key}: expected a boolean, got {other:?}"),
    }
}

// Unset falls back to the default; a set but unparsable value is an error.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("parse {key}")),
        Err(_) => Ok(default),
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

impl AgentApiConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = parse_bind_addr(
            &std::env::var("HTTP_ADDRESS").unwrap_or_else(|_| DEFAULT_HTTP_ADDRESS.to_string()),
        )
        .with_context(|| "parse HTTP_ADDRESS")?;
        let production = env_flag("CORE_PRODUCTION")?.unwrap_or(false);
        let storage = match std::env::var("AGENTAPI_STORAGE_BACKEND") {
            Ok(value) => value
                .parse()
                .with_context(|| "parse AGENTAPI_STORAGE_BACKEND")?,
            Err(_) => StorageBackend::Postgres,
        };
        let min_connections =
            env_parse("DATABASE_POOL_MIN_CONNECTIONS", DEFAULT_MIN_CONNECTIONS)?;
        let max_connections =
            env_parse("DATABASE_POOL_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            bail!("DATABASE_POOL_MAX_CONNECTIONS must be greater than zero");
        }
        let acquire_timeout_ms =
            env_parse("DATABASE_ACQUIRE_TIMEOUT_MS", DEFAULT_ACQUIRE_TIMEOUT_MS)?;
        if acquire_timeout_ms == 0 {
            bail!("DATABASE_ACQUIRE_TIMEOUT_MS must be greater than zero");
        }
        Ok(Self {
            bind_addr,
            production,
            browser_catalog_path: env_path("CONFIG_DEVICES_CHROME_PATH", DEFAULT_BROWSER_CATALOG),
            platform_catalog_path: env_path(
                "CONFIG_DEVICES_ANDROID_PATH",
                DEFAULT_PLATFORM_CATALOG,
            ),
            version_path: env_path("REV_VERSION_PATH", DEFAULT_VERSION_PATH),
            revision_path: env_path("REV_REVISION_PATH", DEFAULT_REVISION_PATH),
            storage,
            devices_path: std::env::var("AGENTAPI_DEVICES_PATH").ok().map(PathBuf::from),
            postgres: PostgresConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                min_connections,
                max_connections,
                acquire_timeout_ms,
            },
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("AGENTAPI_CONFIG") {
            // YAML overrides allow ops-friendly config files.
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read AGENTAPI_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        Ok(config)
    }

    fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: AgentApiConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse agentapi config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = parse_bind_addr(&value).with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.production {
            self.production = value;
        }
        if let Some(value) = override_cfg.browser_catalog_path {
            self.browser_catalog_path = value;
        }
        if let Some(value) = override_cfg.platform_catalog_path {
            self.platform_catalog_path = value;
        }
        if let Some(value) = override_cfg.version_path {
            self.version_path = value;
        }
        if let Some(value) = override_cfg.revision_path {
            self.revision_path = value;
        }
        if let Some(value) = override_cfg.storage {
            self.storage = value.parse().with_context(|| "parse storage")?;
        }
        if let Some(value) = override_cfg.devices_path {
            self.devices_path = Some(value);
        }
        if let Some(value) = override_cfg.database_url {
            self.postgres.url = value;
        }
        if let Some(value) = override_cfg.min_connections {
            self.postgres.min_connections = value;
        }
        if let Some(value) = override_cfg.max_connections {
            if value == 0 {
                bail!("max_connections must be greater than zero");
            }
            self.postgres.max_connections = value;
        }
        if let Some(value) = override_cfg.acquire_timeout_ms {
            if value == 0 {
                bail!("acquire_timeout_ms must be greater than zero");
            }
            self.postgres.acquire_timeout_ms = value;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::set_var(key, value);
            }
            Self { key, prev }
        }

        fn unset(key: &'static str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::remove_var(key);
            }
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.prev {
                Some(value) => unsafe {
                    std::env::set_var(self.key, value);
                },
                None => unsafe {
                    std::env::remove_var(self.key);
                },
            }
        }
    }

    #[test]
    fn bind_addr_accepts_port_shorthand() {
        let addr = parse_bind_addr(":8080").expect("addr");
        assert_eq!(addr.to_string(), "0.0.0.0:8080");
        let addr = parse_bind_addr("127.0.0.1:9000").expect("addr");
        assert_eq!(addr.port(), 9000);
        assert!(parse_bind_addr("localhost").is_err());
    }

    #[test]
    fn storage_backend_parses_known_names() {
        assert_eq!(
            "memory".parse::<StorageBackend>().expect("memory"),
            StorageBackend::Memory
        );
        assert_eq!(
            "Postgres".parse::<StorageBackend>().expect("postgres"),
            StorageBackend::Postgres
        );
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    #[serial]
    fn from_env_uses_defaults() {
        let _g1 = EnvGuard::unset("HTTP_ADDRESS");
        let _g2 = EnvGuard::unset("CORE_PRODUCTION");
        let _g3 = EnvGuard::unset("AGENTAPI_STORAGE_BACKEND");
        let _g4 = EnvGuard::unset("DATABASE_URL");
        let _g5 = EnvGuard::unset("DATABASE_POOL_MIN_CONNECTIONS");
        let _g6 = EnvGuard::unset("DATABASE_POOL_MAX_CONNECTIONS");
        let _g7 = EnvGuard::unset("CONFIG_DEVICES_CHROME_PATH");
        let _g8 = EnvGuard::unset("AGENTAPI_DEVICES_PATH");
        let _g9 = EnvGuard::unset("DATABASE_ACQUIRE_TIMEOUT_MS");

        let config = AgentApiConfig::from_env().expect("config");
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(!config.production);
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(config.postgres.url, DEFAULT_DATABASE_URL);
        assert_eq!(config.postgres.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.postgres.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.postgres.acquire_timeout_ms, DEFAULT_ACQUIRE_TIMEOUT_MS);
        assert_eq!(config.browser_catalog_path, PathBuf::from("docs/chrome.json"));
        assert!(config.devices_path.is_none());
    }

    #[test]
    #[serial]
    fn from_env_reads_overrides() {
        let _g1 = EnvGuard::set("HTTP_ADDRESS", "127.0.0.1:9100");
        let _g2 = EnvGuard::set("CORE_PRODUCTION", "true");
        let _g3 = EnvGuard::set("AGENTAPI_STORAGE_BACKEND", "memory");
        let _g4 = EnvGuard::set("DATABASE_POOL_MAX_CONNECTIONS", "12");
        let _g5 = EnvGuard::set("DATABASE_POOL_MIN_CONNECTIONS", "4");
        let _g6 = EnvGuard::set("AGENTAPI_DEVICES_PATH", "devices.json");
        let _g7 = EnvGuard::set("DATABASE_ACQUIRE_TIMEOUT_MS", " 750 ");

        let config = AgentApiConfig::from_env().expect("config");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9100");
        assert!(config.production);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.postgres.max_connections, 12);
        assert_eq!(config.postgres.min_connections, 4);
        assert_eq!(config.postgres.acquire_timeout_ms, 750);
        assert_eq!(config.devices_path, Some(PathBuf::from("devices.json")));
    }

    #[test]
    #[serial]
    fn from_env_rejects_bad_bind() {
        let _g = EnvGuard::set("HTTP_ADDRESS", "not-an-address");
        let err = AgentApiConfig::from_env().expect_err("bad bind");
        assert!(err.to_string().contains("HTTP_ADDRESS"));
    }

    fn clear_pool_env() -> Vec<EnvGuard> {
        vec![
            EnvGuard::unset("HTTP_ADDRESS"),
            EnvGuard::unset("CORE_PRODUCTION"),
            EnvGuard::unset("AGENTAPI_STORAGE_BACKEND"),
            EnvGuard::unset("DATABASE_POOL_MIN_CONNECTIONS"),
            EnvGuard::unset("DATABASE_POOL_MAX_CONNECTIONS"),
            EnvGuard::unset("DATABASE_ACQUIRE_TIMEOUT_MS"),
        ]
    }

    #[test]
    #[serial]
    fn from_env_rejects_garbage_numbers() {
        let _clean = clear_pool_env();
        for (key, value) in [
            ("DATABASE_POOL_MAX_CONNECTIONS", "sixty-four"),
            ("DATABASE_POOL_MIN_CONNECTIONS", "-3"),
            ("DATABASE_ACQUIRE_TIMEOUT_MS", "3s"),
        ] {
            let _g = EnvGuard::set(key, value);
            let err = AgentApiConfig::from_env().expect_err(key);
            assert!(err.to_string().contains(key), "{err}");
        }
    }

    #[test]
    #[serial]
    fn from_env_rejects_zero_pool_size() {
        let _clean = clear_pool_env();
        let _g = EnvGuard::set("DATABASE_POOL_MAX_CONNECTIONS", "0");
        let err = AgentApiConfig::from_env().expect_err("zero pool");
        assert!(err.to_string().contains("DATABASE_POOL_MAX_CONNECTIONS"));
    }

    #[test]
    #[serial]
    fn from_env_rejects_unknown_bool() {
        let _clean = clear_pool_env();
        let _g = EnvGuard::set("CORE_PRODUCTION", "ture");
        let err = AgentApiConfig::from_env().expect_err("bad bool");
        assert!(err.to_string().contains("CORE_PRODUCTION"));

        let _g = EnvGuard::set("CORE_PRODUCTION", "No");
        assert!(!AgentApiConfig::from_env().expect("config").production);
    }

    #[test]
    #[serial]
    fn yaml_rejects_zero_pool_size() {
        let _clean = clear_pool_env();
        let mut config = AgentApiConfig::from_env().expect("config");
        let err = config.apply_yaml("max_connections: 0\n").expect_err("zero");
        assert!(err.to_string().contains("max_connections"));
    }

    #[test]
    #[serial]
    fn yaml_overrides_env_values() {
        let _g1 = EnvGuard::unset("HTTP_ADDRESS");
        let _g2 = EnvGuard::unset("AGENTAPI_STORAGE_BACKEND");
        let mut config = AgentApiConfig::from_env().expect("config");
        config
            .apply_yaml(
                "bind_addr: \":9200\"\nstorage: memory\nmax_connections: 8\ndatabase_url: postgres://db/agents\n",
            )
            .expect("yaml");
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:9200");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.postgres.max_connections, 8);
        assert_eq!(config.postgres.url, "postgres://db/agents");
    }

    #[test]
    #[serial]
    fn from_env_or_yaml_reads_config_file() {
        let file = tempfile::NamedTempFile::new().expect("temp");
        std::fs::write(file.path(), "production: true\nrevision_path: /srv/REVISION\n")
            .expect("write");
        let _g1 = EnvGuard::set("AGENTAPI_CONFIG", &file.path().to_string_lossy());
        let _g2 = EnvGuard::unset("HTTP_ADDRESS");
        let _g3 = EnvGuard::unset("AGENTAPI_STORAGE_BACKEND");
        let config = AgentApiConfig::from_env_or_yaml().expect("config");
        assert!(config.production);
        assert_eq!(config.revision_path, PathBuf::from("/srv/REVISION"));
    }

    #[test]
    #[serial]
    fn from_env_or_yaml_reports_missing_file() {
        let _g1 = EnvGuard::set("AGENTAPI_CONFIG", "/nonexistent/agentapi.yaml");
        let _g2 = EnvGuard::unset("HTTP_ADDRESS");
        let _g3 = EnvGuard::unset("AGENTAPI_STORAGE_BACKEND");
        let err = AgentApiConfig::from_env_or_yaml().expect_err("missing");
        assert!(err.to_string().contains("AGENTAPI_CONFIG"));
    }
}
