//! # ls-config
//!
//! Layered client configuration.
//!
//! # Loading Order
//! 1. Built-in defaults
//! 2. `linkspace.toml` in the working directory, or an explicit file
//! 3. Environment variables (highest priority), e.g.
//!    `LINKSPACE__BACKEND__URL=https://project.example.co`
//!
//! A `.env` file is read first when present.

use std::path::{Path, PathBuf};

use config::builder::{ConfigBuilder, DefaultState};
use config::{Environment, File, FileFormat};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const DEFAULT_FILE: &str = "linkspace";
const ENV_PREFIX: &str = "LINKSPACE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite records, filesystem objects, in-process accounts
    Local,
    /// Hosted backend-as-a-service over HTTP
    Rest,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub log_level: String,
    pub backend: BackendSettings,
    pub database: DatabaseSettings,
    pub media: MediaSettings,
}

#[derive(Debug, Deserialize)]
pub struct BackendSettings {
    pub kind: BackendKind,
    pub url: Option<String>,
    /// Public (anon) API key sent with every hosted-backend request
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    /// Filesystem root for the local object store
    pub root: PathBuf,
    /// Prefix for public URLs issued by the local object store
    pub url_prefix: String,
    pub bucket: String,
    pub max_image_bytes: usize,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!(path = %env_file.display(), "loaded .env");
        }

        let builder = match path {
            Some(path) => defaults()?.add_source(File::from(path)),
            None => defaults()?.add_source(File::with_name(DEFAULT_FILE).required(false)),
        };
        let builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        finish(builder)
    }

    /// Defaults overlaid with an in-memory TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        finish(defaults()?.add_source(File::from_str(toml, FileFormat::Toml)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.kind == BackendKind::Rest {
            if self.backend.url.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::Invalid(
                    "backend.url is required for the rest backend".to_string(),
                ));
            }
            if self.backend.api_key.is_none() {
                return Err(ConfigError::Invalid(
                    "backend.api_key is required for the rest backend".to_string(),
                ));
            }
        }
        if self.media.max_image_bytes == 0 {
            return Err(ConfigError::Invalid(
                "media.max_image_bytes must be greater than 0".to_string(),
            ));
        }
        if self.media.bucket.is_empty() {
            return Err(ConfigError::Invalid("media.bucket must not be empty".to_string()));
        }
        Ok(())
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("log_level", "info")?
        .set_default("backend.kind", "local")?
        .set_default("backend.timeout_secs", 30_i64)?
        .set_default("database.url", "sqlite://linkspace.db?mode=rwc")?
        .set_default("media.root", "./data/uploads")?
        .set_default("media.url_prefix", "file://./data/uploads")?
        .set_default("media.bucket", "post-images")?
        .set_default("media.max_image_bytes", 5_i64 * 1024 * 1024)
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Settings, ConfigError> {
    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}
