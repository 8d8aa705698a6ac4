//! Global vcal configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{VcalError, VcalResult};
use crate::store::{EventStore, LocalStore, ReconnectPolicy, RemoteStore, RemoteStoreOptions};

static DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8001/ws";
const DEFAULT_PORT: u16 = 8001;

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Read and write the data file directly.
    #[default]
    Local,
    /// Talk to a sync server.
    Remote,
}

/// Global configuration at ~/.config/vcal/config.toml
///
/// Every key can be overridden from the environment, e.g. `VCAL_STORE=remote`
/// or `VCAL_SERVER__PORT=9000` for nested keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcalConfig {
    #[serde(default)]
    pub store: StoreKind,

    /// Event file used by the local store and the sync server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,

    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Default tracing filter, used when `RUST_LOG` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served over HTTP next to the WebSocket endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: DEFAULT_PORT,
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_request_timeout", with = "duration_str")]
    pub request_timeout: Duration,

    #[serde(default = "default_reconnect_initial", with = "duration_str")]
    pub reconnect_initial: Duration,

    #[serde(default = "default_reconnect_max", with = "duration_str")]
    pub reconnect_max: Duration,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_reconnect_initial() -> Duration {
    Duration::from_secs(1)
}

fn default_reconnect_max() -> Duration {
    Duration::from_secs(30)
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            request_timeout: default_request_timeout(),
            reconnect_initial: default_reconnect_initial(),
            reconnect_max: default_reconnect_max(),
        }
    }
}

impl SyncConfig {
    pub fn remote_options(&self) -> RemoteStoreOptions {
        RemoteStoreOptions {
            request_timeout: self.request_timeout,
            reconnect: ReconnectPolicy::new(self.reconnect_initial, self.reconnect_max),
        }
    }
}

/// Durations as humantime strings ("10s", "1m 30s").
mod duration_str {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim())
            .map_err(|e| serde::de::Error::custom(format!("invalid duration '{}': {}", raw, e)))
    }
}

impl Default for VcalConfig {
    fn default() -> Self {
        VcalConfig {
            store: StoreKind::default(),
            data_file: None,
            server_url: default_server_url(),
            log_level: None,
            server: ServerConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl VcalConfig {
    pub fn config_path() -> VcalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| VcalError::Config("Could not determine config directory".into()))?
            .join("vcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load ~/.config/vcal/config.toml, creating it with commented defaults
    /// on first run.
    pub fn load() -> VcalResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load a specific file (which may be missing), then apply `VCAL_*`
    /// environment overrides.
    pub fn load_from(path: &Path) -> VcalResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("VCAL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| VcalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| VcalError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> VcalResult<()> {
        let contents = format!(
            "\
# vcal configuration

# Where events are kept: \"local\" (data_file) or \"remote\" (server_url)
# store = \"local\"

# Event file for the local store and for vcal-server:
# data_file = \"~/.local/share/vcal/events.json\"

# Sync server to use when store = \"remote\":
# server_url = \"{}\"

# Default log filter when RUST_LOG is unset:
# log_level = \"warn\"

# [server]
# port = {}
# static_dir = \"~/vcal/public\"

# [sync]
# request_timeout = \"10s\"
# reconnect_initial = \"1s\"
# reconnect_max = \"30s\"
",
            DEFAULT_SERVER_URL, DEFAULT_PORT
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                VcalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| VcalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// The effective configuration as TOML.
    pub fn to_toml(&self) -> VcalResult<String> {
        toml::to_string_pretty(self).map_err(|e| VcalError::Config(e.to_string()))
    }

    /// The event file, with `~` expanded.
    pub fn data_path(&self) -> VcalResult<PathBuf> {
        match &self.data_file {
            Some(path) => Ok(expand(path)),
            None => Ok(dirs::data_dir()
                .ok_or_else(|| VcalError::Config("Could not determine data directory".into()))?
                .join("vcal")
                .join("events.json")),
        }
    }

    pub fn static_dir(&self) -> Option<PathBuf> {
        self.server.static_dir.as_deref().map(expand)
    }

    /// Open the configured event store.
    ///
    /// The remote store connects in the background, so this must be called
    /// from within a tokio runtime.
    pub async fn open_store(&self) -> VcalResult<Arc<dyn EventStore>> {
        match self.store {
            StoreKind::Local => {
                let store = LocalStore::open(self.data_path()?).await?;
                Ok(Arc::new(store))
            }
            StoreKind::Remote => {
                let store = RemoteStore::connect(&self.server_url, self.sync.remote_options());
                Ok(Arc::new(store))
            }
        }
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = VcalConfig::load_from(&dir.path().join("missing.toml")).unwrap();

        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.server.port, 8001);
        assert_eq!(config.sync.request_timeout, Duration::from_secs(10));
        assert_eq!(config.sync.reconnect_max, Duration::from_secs(30));
    }

    #[test]
    fn commented_default_file_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vcal/config.toml");
        VcalConfig::create_default_config(&path).unwrap();

        let config = VcalConfig::load_from(&path).unwrap();
        assert_eq!(config.store, StoreKind::Local);
        assert!(config.data_file.is_none());
    }

    #[test]
    fn reads_values_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
store = "remote"
data_file = "~/cal/events.json"
server_url = "ws://example.test:9000/ws"

[server]
port = 9000

[sync]
request_timeout = "2s 500ms"
reconnect_max = "1m"
"#,
        )
        .unwrap();

        let config = VcalConfig::load_from(&path).unwrap();
        assert_eq!(config.store, StoreKind::Remote);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.sync.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.sync.reconnect_max, Duration::from_secs(60));
        assert_eq!(config.sync.reconnect_initial, Duration::from_secs(1));

        let data_path = config.data_path().unwrap();
        assert!(data_path.ends_with("cal/events.json"));
        assert!(!data_path.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn bad_duration_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sync]\nrequest_timeout = \"soon\"\n").unwrap();

        let err = VcalConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, VcalError::Config(_)));
    }

    #[test]
    fn effective_config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = VcalConfig {
            store: StoreKind::Remote,
            log_level: Some("debug".into()),
            ..Default::default()
        };

        std::fs::write(&path, config.to_toml().unwrap()).unwrap();
        let loaded = VcalConfig::load_from(&path).unwrap();

        assert_eq!(loaded.store, StoreKind::Remote);
        assert_eq!(loaded.log_level.as_deref(), Some("debug"));
        assert_eq!(loaded.sync.request_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn opens_local_store_at_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = VcalConfig {
            data_file: Some(dir.path().join("events.json")),
            ..Default::default()
        };

        let store = config.open_store().await.unwrap();
        assert!(store.list_events().await.unwrap().is_empty());
    }
}
