//! Configuration file loading and parsing.

use crate::errors::Error;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration loaded from TOML file. Missing keys keep their defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub semantic_weight: Option<f64>,

    #[serde(default)]
    pub lexical_weight: Option<f64>,

    #[serde(default)]
    pub min_similarity: Option<f64>,

    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub openai_base_url: Option<String>,

    #[serde(default)]
    pub gemini_base_url: Option<String>,

    #[serde(default)]
    pub voyage_base_url: Option<String>,
}

/// Default config file location: `$CONFIG_DIR/mnemos/config.toml`.
pub fn default_config_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let config_dir = dirs::config_dir().unwrap_or_else(|| home.join(".config"));
    config_dir.join("mnemos").join("config.toml")
}

/// Load configuration from a TOML file, or `None` if it does not exist.
pub fn load_from_path(config_path: &Path) -> Result<Option<ConfigFile>, Error> {
    if !config_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(config_path).map_err(|e| {
        Error::Configuration(format!(
            "Failed to read config file {}: {e}",
            config_path.display()
        ))
    })?;

    let config: ConfigFile = toml::from_str(&content).map_err(|e| {
        Error::Configuration(format!(
            "Failed to parse config file {}: {e}",
            config_path.display()
        ))
    })?;

    Ok(Some(config))
}
