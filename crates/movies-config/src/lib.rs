use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "invalid log format '{other}', expected one of: human, json"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MoviesConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Which database file inside the data directory serves requests.
/// `None` selects the default database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Human,
            filter: default_log_filter(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("failed to serialize config TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub fn config_path(data_dir: impl AsRef<Path>) -> PathBuf {
    data_dir.as_ref().join(CONFIG_FILE_NAME)
}

pub fn load_config(data_dir: impl AsRef<Path>) -> Result<MoviesConfig, ConfigError> {
    let path = config_path(data_dir);
    if !path.exists() {
        return Ok(MoviesConfig::default());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: MoviesConfig = toml::from_str(&raw)?;
    Ok(normalize_config(parsed))
}

pub fn ensure_config(data_dir: impl AsRef<Path>) -> Result<MoviesConfig, ConfigError> {
    let data_dir = data_dir.as_ref();
    fs::create_dir_all(data_dir)?;

    let path = config_path(data_dir);
    if path.exists() {
        return load_config(data_dir);
    }

    let config = MoviesConfig::default();
    let content = toml::to_string_pretty(&config)?;
    fs::write(path, content)?;

    Ok(config)
}

fn default_bind() -> String {
    DEFAULT_BIND_ADDR.to_owned()
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

fn normalize_optional(input: Option<String>) -> Option<String> {
    input
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn normalize_config(mut config: MoviesConfig) -> MoviesConfig {
    config.database.name = normalize_optional(config.database.name.take());

    let bind = config.server.bind.trim();
    if bind.is_empty() {
        config.server.bind = default_bind();
    } else {
        config.server.bind = bind.to_owned();
    }

    let filter = config.logging.filter.trim();
    if filter.is_empty() {
        config.logging.filter = default_log_filter();
    } else {
        config.logging.filter = filter.to_owned();
    }

    config
}
