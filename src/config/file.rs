//! TOML configuration file loading
//!
//! Supports `~/.config/triggercmd/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Admin server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// TRIGGERcmd credentials, one entry per configuration identity
    #[serde(default)]
    pub relay: Vec<RelayFileConfig>,
}

/// Admin server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Bearer key required on admin routes
    pub api_key: Option<String>,
}

/// One stored set of TRIGGERcmd credentials
#[derive(Debug, Deserialize)]
pub struct RelayFileConfig {
    /// Configuration identity
    pub id: String,

    /// Display name
    pub name: Option<String>,

    /// API root, defaults to the production API
    pub base_url: Option<String>,

    /// Bearer token
    pub token: Option<String>,
}

impl ConfigFile {
    /// Parse a configuration file from TOML text
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid TOML for this schema
    pub fn parse(content: &str) -> crate::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
