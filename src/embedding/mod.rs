//! Embedding providers for text-to-vector conversion.
//!
//! A provider is chosen from the `embedding_provider` / `embedding_model`
//! settings, resolved once into an [`EmbeddingConfig`], and built into a
//! concrete handle by a [`ProviderFactory`]. All calls are blocking.

mod gemini;
mod http;
mod openai;
mod voyage;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::errors::Error;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use voyage::VoyageProvider;

/// Settings key selecting the provider.
pub const SETTING_PROVIDER: &str = "embedding_provider";
/// Settings key selecting the model.
pub const SETTING_MODEL: &str = "embedding_model";
/// Canonical model name; providers without it substitute their own default.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Supported embedding backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Voyage,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Voyage => "voyage",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_env(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Voyage => "VOYAGE_API_KEY",
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        [ProviderKind::OpenAi, ProviderKind::Gemini, ProviderKind::Voyage].into_iter()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::all()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::Configuration(format!("Unknown embedding provider: {s}")))
    }
}

/// Provider and model resolved from settings for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingConfig {
    pub provider: ProviderKind,
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl EmbeddingConfig {
    /// Resolve from a settings snapshot, falling back to the defaults for
    /// missing keys.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if either key holds a non-string, an
    /// empty model, or an unknown provider name.
    pub fn from_settings(settings: &BTreeMap<String, Value>) -> Result<Self, Error> {
        let mut config = Self::default();

        if let Some(value) = settings.get(SETTING_PROVIDER) {
            config.provider = string_setting(SETTING_PROVIDER, value)?.parse()?;
        }

        if let Some(value) = settings.get(SETTING_MODEL) {
            let model = string_setting(SETTING_MODEL, value)?;
            if model.trim().is_empty() {
                return Err(Error::Configuration(format!(
                    "{SETTING_MODEL} cannot be empty"
                )));
            }
            config.model = model.to_string();
        }

        Ok(config)
    }
}

fn string_setting<'v>(key: &str, value: &'v Value) -> Result<&'v str, Error> {
    value
        .as_str()
        .ok_or_else(|| Error::Configuration(format!("{key} must be a string, got {value}")))
}

/// Text-to-vector capability.
pub trait EmbeddingProvider {
    fn kind(&self) -> ProviderKind;

    /// Model identifier as sent to the backend (after any remapping).
    fn model(&self) -> &str;

    fn embed(&self, text: &str) -> Result<Vec<f32>, Error>;

    /// Embed many texts; output[i] belongs to texts[i].
    ///
    /// The default issues one request per text, in order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Builds a provider handle from a resolved configuration.
pub trait ProviderFactory {
    fn build(&self, config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>, Error>;
}

/// Production factory talking to the providers' HTTP APIs.
pub struct HttpProviderFactory {
    agent: ureq::Agent,
    openai_base_url: String,
    gemini_base_url: String,
    voyage_base_url: String,
    api_keys: BTreeMap<ProviderKind, SecretString>,
}

impl HttpProviderFactory {
    /// Factory with base URLs and timeout from `config` and no API keys.
    pub fn new(config: &Config) -> Self {
        Self {
            agent: http::build_agent(config.request_timeout()),
            openai_base_url: config.openai_base_url.clone(),
            gemini_base_url: config.gemini_base_url.clone(),
            voyage_base_url: config.voyage_base_url.clone(),
            api_keys: BTreeMap::new(),
        }
    }

    /// Factory with API keys read once from the process environment.
    pub fn from_env(config: &Config) -> Self {
        let mut factory = Self::new(config);
        for kind in ProviderKind::all() {
            if let Ok(key) = std::env::var(kind.api_key_env()) {
                if !key.trim().is_empty() {
                    factory = factory.with_api_key(kind, key);
                }
            }
        }
        factory
    }

    pub fn with_api_key(mut self, kind: ProviderKind, key: impl Into<String>) -> Self {
        self.api_keys.insert(kind, SecretString::new(key.into()));
        self
    }

    fn api_key(&self, kind: ProviderKind) -> Result<SecretString, Error> {
        self.api_keys
            .get(&kind)
            .map(|key| SecretString::new(key.expose_secret().clone()))
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "{} is not set for embedding provider '{kind}'",
                    kind.api_key_env()
                ))
            })
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn build(&self, config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>, Error> {
        let api_key = self.api_key(config.provider)?;
        let agent = self.agent.clone();

        let provider: Box<dyn EmbeddingProvider> = match config.provider {
            ProviderKind::OpenAi => Box::new(OpenAiProvider::new(
                agent,
                api_key,
                &self.openai_base_url,
                &config.model,
            )),
            ProviderKind::Gemini => Box::new(GeminiProvider::new(
                agent,
                api_key,
                &self.gemini_base_url,
                &config.model,
            )),
            ProviderKind::Voyage => Box::new(VoyageProvider::new(
                agent,
                api_key,
                &self.voyage_base_url,
                &config.model,
            )),
        };

        debug!(provider = %provider.kind(), model = provider.model(), "Built embedding provider");
        Ok(provider)
    }
}
