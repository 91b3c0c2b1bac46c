//! Configuration management for the TRIGGERcmd gateway
//!
//! Two layers live here:
//! - [`Config`]: process settings loaded from an optional TOML file with
//!   environment overrides
//! - [`ConfigRegistry`]: the stored TRIGGERcmd credentials, keyed by
//!   configuration identity and read through [`RelayCredentials`]

pub mod file;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

pub use file::{ConfigFile, RelayFileConfig, ServerFileConfig};

use crate::{Error, Result};

/// Production API root used when a configuration does not set one
pub const DEFAULT_BASE_URL: &str = "https://www.triggercmd.com";

/// Default admin API port
pub const DEFAULT_API_PORT: u16 = 18790;

/// Configuration identity registered from `TRIGGERCMD_TOKEN`
pub const ENV_RELAY_ID: &str = "default";

/// Capability handed out by the host for one set of credentials
///
/// The core never constructs credentials itself; it only reads the API root
/// and the request headers through this trait.
pub trait RelayCredentials: Send + Sync + fmt::Debug {
    /// API root, e.g. `https://www.triggercmd.com`
    fn base_url(&self) -> String;

    /// Headers attached to every remote call
    fn headers(&self) -> HashMap<String, String>;
}

/// Stored TRIGGERcmd credentials
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Configuration identity
    pub id: String,

    /// Display name
    pub name: Option<String>,

    /// API root override
    pub base_url: Option<String>,

    token: Option<SecretString>,
}

impl RelayConfig {
    /// Create a relay configuration
    #[must_use]
    pub fn new(id: impl Into<String>, base_url: Option<String>, token: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            base_url: base_url.filter(|u| !u.is_empty()),
            token: token.map(SecretString::from),
        }
    }

    /// Set the display name
    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Whether a bearer token is stored
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token
            .as_ref()
            .is_some_and(|t| !t.expose_secret().is_empty())
    }

    /// Reject base URLs that do not parse
    fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            url::Url::parse(base_url).map_err(|e| {
                Error::Config(format!("invalid base_url for relay '{}': {e}", self.id))
            })?;
        }
        Ok(())
    }
}

impl RelayCredentials for RelayConfig {
    fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    fn headers(&self) -> HashMap<String, String> {
        let token = self
            .token
            .as_ref()
            .map(|t| t.expose_secret().to_string())
            .unwrap_or_default();

        HashMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Authorization".to_string(), format!("Bearer {token}")),
        ])
    }
}

/// Registry of credentials keyed by configuration identity
#[derive(Debug, Clone, Default)]
pub struct ConfigRegistry {
    configs: HashMap<String, Arc<dyn RelayCredentials>>,
}

impl ConfigRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from stored relay configurations
    #[must_use]
    pub fn from_relays(relays: &[RelayConfig]) -> Self {
        let mut registry = Self::new();
        for relay in relays {
            registry.insert(relay.id.clone(), Arc::new(relay.clone()));
        }
        registry
    }

    /// Register credentials under an identity, replacing any previous entry
    pub fn insert(&mut self, id: impl Into<String>, credentials: Arc<dyn RelayCredentials>) {
        self.configs.insert(id.into(), credentials);
    }

    /// Look up credentials by identity
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn RelayCredentials>> {
        self.configs.get(id).cloned()
    }

    /// Registered identities, sorted
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.configs.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of registered identities
    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to listen on
    pub port: u16,

    /// API key for admin endpoints (from `TRIGGERCMD_API_KEY` env)
    pub api_key: Option<String>,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_API_PORT,
            api_key: None,
        }
    }
}

/// Values read from the environment on top of the file
#[derive(Debug, Default)]
pub struct EnvOverrides {
    pub port: Option<u16>,
    pub api_key: Option<String>,
    pub token: Option<String>,
    pub base_url: Option<String>,
}

impl EnvOverrides {
    /// Read overrides from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("TRIGGERCMD_API_PORT")
                .or_else(|_| std::env::var("PORT"))
                .ok()
                .and_then(|s| s.parse().ok()),
            api_key: std::env::var("TRIGGERCMD_API_KEY").ok(),
            token: std::env::var("TRIGGERCMD_TOKEN").ok(),
            base_url: std::env::var("TRIGGERCMD_BASE_URL").ok(),
        }
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// HTTP API server configuration
    pub api_server: ApiServerConfig,

    /// Stored TRIGGERcmd credentials
    pub relays: Vec<RelayConfig>,

    /// File the configuration was read from, if any
    pub config_path: Option<PathBuf>,
}

/// Default location of the configuration file
///
/// Uses `~/.config/triggercmd/config.toml` on Linux
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "triggercmd", "triggercmd")
        .map(|d| d.config_dir().join("config.toml"))
}

impl Config {
    /// Load configuration from a file (if present) and the environment
    ///
    /// An explicit `path` must exist; the default locations are optional.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or a relay has an
    /// invalid base URL
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file, config_path) = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                (ConfigFile::parse(&content)?, Some(p.to_path_buf()))
            }
            None => Self::load_default_file()?,
        };

        let mut config = Self::from_file(file)?;
        config.config_path = config_path;
        config.apply_overrides(EnvOverrides::from_env())?;

        tracing::debug!(
            path = ?config.config_path,
            relays = config.relays.len(),
            port = config.api_server.port,
            "loaded configuration"
        );

        Ok(config)
    }

    /// Read the file named by `TRIGGERCMD_CONFIG` or the default location
    fn load_default_file() -> Result<(ConfigFile, Option<PathBuf>)> {
        let candidate = std::env::var("TRIGGERCMD_CONFIG")
            .ok()
            .map(PathBuf::from)
            .or_else(default_config_path);

        let Some(path) = candidate.filter(|p| p.exists()) else {
            return Ok((ConfigFile::default(), None));
        };

        let content = std::fs::read_to_string(&path)?;
        let file = ConfigFile::parse(&content).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "failed to parse config file");
            e
        })?;
        tracing::info!(path = %path.display(), "loaded config file");
        Ok((file, Some(path)))
    }

    /// Build configuration from a parsed file
    ///
    /// # Errors
    ///
    /// Returns error if a relay has an invalid base URL
    pub fn from_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self {
            api_server: ApiServerConfig {
                port: file.server.port.unwrap_or(DEFAULT_API_PORT),
                api_key: file.server.api_key,
            },
            relays: Vec::new(),
            config_path: None,
        };

        for entry in file.relay {
            let relay = RelayConfig::new(entry.id, entry.base_url, entry.token)
                .with_name(entry.name);
            config.upsert_relay(relay)?;
        }

        Ok(config)
    }

    /// Apply environment overrides
    ///
    /// # Errors
    ///
    /// Returns error if `TRIGGERCMD_BASE_URL` is not a valid URL
    pub fn apply_overrides(&mut self, env: EnvOverrides) -> Result<()> {
        if let Some(port) = env.port {
            self.api_server.port = port;
        }
        if env.api_key.is_some() {
            self.api_server.api_key = env.api_key;
        }
        if env.token.is_some() {
            let relay = RelayConfig::new(ENV_RELAY_ID, env.base_url, env.token)
                .with_name(Some("environment".to_string()));
            self.upsert_relay(relay)?;
        }
        Ok(())
    }

    /// Insert a relay, replacing an existing one with the same identity
    fn upsert_relay(&mut self, relay: RelayConfig) -> Result<()> {
        relay.validate()?;
        if !relay.has_token() {
            tracing::warn!(id = %relay.id, "relay configured without a token");
        }
        if let Some(existing) = self.relays.iter_mut().find(|r| r.id == relay.id) {
            tracing::warn!(id = %relay.id, "duplicate relay id, last definition wins");
            *existing = relay;
        } else {
            self.relays.push(relay);
        }
        Ok(())
    }

    /// Credentials registry for the configured relays
    #[must_use]
    pub fn registry(&self) -> ConfigRegistry {
        ConfigRegistry::from_relays(&self.relays)
    }
}
