//! Console settings: built-in defaults, then an optional YAML file, then
//! `ESTATE_ADMIN_*` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_ASSET_BASE_URL: &str = "http://127.0.0.1:8000/storage";
pub const DEFAULT_CONFIG_FILE: &str = "estate-admin.yaml";
pub const ENV_PREFIX: &str = "ESTATE_ADMIN";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    pub asset_base_url: String,
    pub session_file: PathBuf,
    pub log_level: String,
}

/// Where the session token is kept when nothing else is configured.
pub fn default_session_file() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("estate-admin")
        .join("session.json")
}

impl Settings {
    /// Load settings. A missing config file is fine unless the path was
    /// given explicitly.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let session_file = default_session_file();
        let mut builder = Config::builder()
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("asset_base_url", DEFAULT_ASSET_BASE_URL)?
            .set_default("session_file", session_file.to_string_lossy().into_owned())?
            .set_default("log_level", "warn")?;

        builder = match config_file {
            Some(path) => builder.add_source(File::from(path).format(FileFormat::Yaml)),
            None => builder.add_source(
                File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false),
            ),
        };

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }

    /// Apply command-line overrides on top of loaded settings.
    pub fn with_overrides(mut self, api_base_url: Option<String>, asset_base_url: Option<String>) -> Self {
        if let Some(url) = api_base_url {
            self.api_base_url = url;
        }
        if let Some(url) = asset_base_url {
            self.asset_base_url = url;
        }
        self
    }
}
