//! Process-level configuration for mnemos.
//!
//! Runtime choices that can change while the store is live (provider and
//! model) belong in the settings namespace instead; see
//! [`SettingsStore`](crate::settings::SettingsStore).

mod env_parser;
mod loader;
mod overrides;
mod paths;
mod validation;

#[cfg(test)]
mod tests_utils;

use crate::errors::Error;
use crate::memory::BlendWeights;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use env_parser::{
    DATABASE_PATH_VAR, LEXICAL_WEIGHT_VAR, MIN_SIMILARITY_VAR, REQUEST_TIMEOUT_VAR,
    SEMANTIC_WEIGHT_VAR,
};
pub use loader::{ConfigFile, default_config_path};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_VOYAGE_BASE_URL: &str = "https://api.voyageai.com";

/// Configuration values with priority: defaults < config file < env vars.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database.
    pub database_path: PathBuf,

    /// Weight of cosine similarity in hybrid ranking.
    pub semantic_weight: f64,

    /// Weight of normalized BM25 strength in hybrid ranking.
    pub lexical_weight: f64,

    /// Cosine similarity floor used by `MemoryAgent::recall`.
    pub min_similarity: f64,

    /// Timeout for each embedding provider request.
    pub request_timeout_secs: u64,

    pub openai_base_url: String,
    pub gemini_base_url: String,
    pub voyage_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        // Use home directory with sensible fallback for systems without HOME
        let home = dirs::home_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
        });

        Self {
            database_path: home.join(".mnemos").join("memories.db"),
            semantic_weight: 0.7,
            lexical_weight: 0.3,
            min_similarity: 0.3,
            request_timeout_secs: 30,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            voyage_base_url: DEFAULT_VOYAGE_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default file location plus env overrides.
    pub fn load() -> Result<Self, Error> {
        Self::load_from(&default_config_path())
    }

    /// Load configuration with defaults, values from `config_path` (if the
    /// file exists), and environment overrides, then validate.
    pub fn load_from(config_path: &Path) -> Result<Self, Error> {
        let mut config = Config::default();

        if let Some(file) = loader::load_from_path(config_path)? {
            config.merge_from_file(file);
        }

        overrides::apply_env_overrides(&mut config)?;

        config.validate()?;

        Ok(config)
    }

    /// Merge configuration from a file into this config.
    fn merge_from_file(&mut self, file: ConfigFile) {
        if let Some(mut path) = file.database_path {
            paths::expand_tilde(&mut path);
            self.database_path = path;
        }
        if let Some(weight) = file.semantic_weight {
            self.semantic_weight = weight;
        }
        if let Some(weight) = file.lexical_weight {
            self.lexical_weight = weight;
        }
        if let Some(min_similarity) = file.min_similarity {
            self.min_similarity = min_similarity;
        }
        if let Some(timeout) = file.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
        if let Some(url) = file.openai_base_url {
            self.openai_base_url = url;
        }
        if let Some(url) = file.gemini_base_url {
            self.gemini_base_url = url;
        }
        if let Some(url) = file.voyage_base_url {
            self.voyage_base_url = url;
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), Error> {
        validation::ConfigValidator::new(self).validate()
    }

    /// Blend weights for hybrid search.
    pub fn blend(&self) -> Result<BlendWeights, Error> {
        BlendWeights::new(self.semantic_weight, self.lexical_weight)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Ensure the parent directory of the database path exists.
    pub fn ensure_directories(&self) -> Result<(), Error> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Configuration(format!(
                        "Failed to create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        Ok(())
    }
}
