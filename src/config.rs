//! Configuration management for the boringproxy client.
//!
//! Handles loading and saving configuration from `<config dir>/boringproxy/config.toml`.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::protocol::Credential;
use crate::transport::{Scheme, TransportConfig};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token: Option<String>,
    pub server: Option<String>,
    /// Username the token belongs to, for user-scoped commands
    pub user: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default)]
    pub scheme: Scheme,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "boringproxy")
            .context("Could not determine config directory")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Transport settings for `server`, authenticated with `token`
    pub fn transport_config(&self, server: &str, token: &str) -> TransportConfig {
        let mut config = TransportConfig::new(server, Credential::new(token));
        config.scheme = self.http.scheme;
        config.timeout = Duration::from_secs(self.http.timeout_secs);
        config
    }

    /// Web UI login page of `server`, using the configured scheme
    pub fn login_url(&self, server: &str) -> Result<Url> {
        let base = self.transport_config(server, "").base_url()?;
        base.join("/login").context("Failed to build login URL")
    }
}
