//! Configuration for pagewright.
//!
//! Values come from an optional JSON file, then environment variables, then
//! command-line flags (applied by the binary).

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment variable selecting the upstream generation backend.
pub const ENV_BACKEND_URL: &str = "PAGEWRIGHT_BACKEND_URL";
/// Environment variable selecting the relay listen address.
pub const ENV_BIND: &str = "PAGEWRIGHT_BIND";
/// Environment variable selecting the relay address clients connect to.
pub const ENV_RELAY_URL: &str = "PAGEWRIGHT_RELAY_URL";
/// Environment variable selecting the preview file.
pub const ENV_PREVIEW_PATH: &str = "PAGEWRIGHT_PREVIEW_PATH";

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base address of the generation backend the relay forwards to.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Address the relay listens on.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Base address of the relay, as seen by clients.
    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    /// File the preview document is written to.
    #[serde(default = "default_preview_path")]
    pub preview_path: PathBuf,
}

fn default_backend_url() -> String {
    "http://localhost:8000".into()
}

fn default_bind() -> String {
    "127.0.0.1:3000".into()
}

fn default_relay_url() -> String {
    "http://localhost:3000".into()
}

fn default_preview_path() -> PathBuf {
    PathBuf::from("pagewright-preview.html")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            bind: default_bind(),
            relay_url: default_relay_url(),
            preview_path: default_preview_path(),
        }
    }
}

impl Config {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Apply overrides from a variable lookup (the environment, usually).
    /// Empty values are ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_BACKEND_URL) {
            self.backend_url = url;
        }
        if let Some(bind) = get(ENV_BIND) {
            self.bind = bind;
        }
        if let Some(url) = get(ENV_RELAY_URL) {
            self.relay_url = url;
        }
        if let Some(path) = get(ENV_PREVIEW_PATH) {
            self.preview_path = PathBuf::from(path);
        }
        self
    }

    /// Parsed relay listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.bind.clone()))
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Listen address is not `host:port`.
    #[error("Invalid bind address: {0}")]
    InvalidBind(String),
}
