//! Client configuration.
//!
//! Configuration can be built in code with [`Config::new`] or read from a
//! TOML file with [`load_config`]:
//!
//! ```toml
//! api_key = "YOUR_KEY"
//! domain = "www.factual.com"   # default
//! scheme = "http"              # or "https"
//! version = 2                  # API version in request paths
//! debug = false                # log every request URL
//! timeout_secs = 30
//! ```
//!
//! When `api_key` is absent or empty in the file, the `FACTUAL_API_KEY`
//! environment variable is used instead.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const API_KEY_ENV: &str = "FACTUAL_API_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_domain() -> String {
    "www.factual.com".to_string()
}
fn default_scheme() -> String {
    "http".to_string()
}
fn default_version() -> u32 {
    2
}
fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Configuration with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            domain: default_domain(),
            scheme: default_scheme(),
            version: default_version(),
            debug: false,
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Check the settings a request cannot be built without.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            bail!("api_key must be set (or export {})", API_KEY_ENV);
        }
        if self.domain.trim().is_empty() {
            bail!("domain must not be empty");
        }
        if self.version == 0 {
            bail!("version must be >= 1");
        }
        match self.scheme.as_str() {
            "http" | "https" => {}
            other => bail!("Unknown scheme: '{}'. Must be http or https.", other),
        }
        Ok(())
    }

    /// `{scheme}://{domain}`
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.domain)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.api_key.trim().is_empty() {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.api_key = key;
        }
    }

    config.validate()?;
    Ok(config)
}
