//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/bmlt/config.toml` by default:
//!
//! ```toml
//! [server]
//! root_uri = "bmlt.example.org/main_server"
//! timeout = 30
//!
//! [admin]
//! login = "jdoe"
//! password = "pass::bmlt/jdoe"
//! ```
//!
//! The admin password supports secret references (see [`crate::secret`]).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use bmlt_core::MIN_SERVER_VERSION;
use bmlt_session::SessionConfig;
use bmlt_transport::TransportConfig;

/// Configuration for the bmlt client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root server settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Administrator credentials.
    #[serde(default)]
    pub admin: AdminSettings,
}

/// Root server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Root server URI; the scheme is optional and always forced to https.
    pub root_uri: Option<String>,

    /// Name sent as `callingApp` with every request.
    pub calling_app: String,

    /// Request timeout in seconds.
    pub timeout: u64,

    /// Oldest accepted server version, packed as `major * 1_000_000 + feature * 1_000 + fix`.
    pub min_version: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            root_uri: None,
            calling_app: TransportConfig::DEFAULT_CALLING_APP.to_string(),
            timeout: TransportConfig::DEFAULT_TIMEOUT_SECS,
            min_version: MIN_SERVER_VERSION,
        }
    }
}

/// Administrator login settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    pub login: Option<String>,

    /// Password (supports `pass::` and `env::` prefixes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bmlt")
    }

    /// Builds the session configuration, preferring `server` over the
    /// configured root URI and `timeout` over the configured timeout.
    pub fn session_config(
        &self,
        server: Option<&str>,
        timeout: Option<u64>,
    ) -> Result<SessionConfig, String> {
        let root = server
            .or(self.server.root_uri.as_deref())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                format!(
                    "no root server configured. Pass --server, set BMLT_ROOT_SERVER, or add to {}:\n  \
                     [server]\n  \
                     root_uri = \"bmlt.example.org/main_server\"",
                    Self::default_path().display()
                )
            })?;
        let timeout = Duration::from_secs(timeout.unwrap_or(self.server.timeout));
        let transport = TransportConfig::new()
            .with_timeout(timeout)
            .with_calling_app(&self.server.calling_app);
        Ok(SessionConfig::new(root)
            .with_calling_app(&self.server.calling_app)
            .with_min_version(self.server.min_version)
            .with_transport(transport))
    }

    /// A copy safe to print: a configured password is masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.admin.password.is_some() {
            config.admin.password = Some("***".to_string());
        }
        config
    }

    /// Resolves the admin password, expanding secret references.
    pub(crate) fn admin_password(&self) -> Result<Option<String>, String> {
        self.admin
            .password
            .as_deref()
            .map(|raw| {
                crate::secret::resolve(raw).map_err(|e| format!("failed to resolve password: {}", e))
            })
            .transpose()
    }
}
