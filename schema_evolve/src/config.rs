//! Configuration handling for schema_evolve

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{Error, Result};

/// Load configuration from a TOML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;

    Ok(config)
}

/// Represents the complete schema_evolve configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub rebuild: RebuildConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    /// Configuration with defaults for everything but the database URL
    pub fn for_url(url: &str) -> Self {
        Self {
            database: DatabaseConfig {
                url: url.to_string(),
                create_if_missing: true,
                timeout_seconds: None,
            },
            rebuild: RebuildConfig::default(),
            metadata: MetadataConfig::default(),
            logging: None,
        }
    }
}

/// Database session configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_true")]
    pub create_if_missing: bool,
    pub timeout_seconds: Option<u64>,
}

/// Column-removal rebuild behavior
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RebuildConfig {
    /// Recreate survivors with their full definitions instead of bare names
    #[serde(default = "default_true")]
    pub preserve_definitions: bool,
    #[serde(default = "default_max_name_attempts")]
    pub max_name_attempts: usize,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            preserve_definitions: true,
            max_name_attempts: default_max_name_attempts(),
        }
    }
}

/// Metadata parsing behavior
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct MetadataConfig {
    /// Reject unreadable boolean metadata instead of reading it as false
    #[serde(default)]
    pub strict_flags: bool,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_name_attempts() -> usize {
    64
}
