//! Orchestrator tying settings, embedding providers and the memory store to
//! one backend connection.
//!
//! Control flow for every call: read settings, resolve the provider, embed,
//! then store or search. Provider selection is recomputed from the settings
//! snapshot on each call, so changing `embedding_provider` takes effect
//! immediately without restarting.

use tracing::{debug, warn};

use crate::backend::{Backend, SqliteBackend};
use crate::config::Config;
use crate::embedding::{EmbeddingConfig, EmbeddingProvider, HttpProviderFactory, ProviderFactory};
use crate::errors::Error;
use crate::memory::{BlendWeights, DEFAULT_MIN_SIMILARITY, MemoryDraft, MemoryStore};
use crate::memory_types::Memory;
use crate::settings::SettingsStore;
use crate::vector::EMBEDDING_DIMS;

/// Owns a backend connection and a provider factory.
pub struct MemoryAgent<B: Backend = SqliteBackend, F: ProviderFactory = HttpProviderFactory> {
    backend: B,
    factory: F,
    blend: BlendWeights,
    min_similarity: f64,
}

impl MemoryAgent<SqliteBackend, HttpProviderFactory> {
    /// Open the SQLite database named by `config` and wire the HTTP
    /// providers, reading API keys from the environment once.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid, the database directory
    /// cannot be created, or the database cannot be opened.
    pub fn open(config: &Config) -> Result<Self, Error> {
        config.validate()?;
        config.ensure_directories()?;

        let backend = SqliteBackend::open(&config.database_path)?;
        let factory = HttpProviderFactory::from_env(config);

        Ok(Self::new(backend, factory)
            .with_blend(config.blend()?)
            .with_min_similarity(config.min_similarity))
    }
}

impl<B: Backend, F: ProviderFactory> MemoryAgent<B, F> {
    pub fn new(backend: B, factory: F) -> Self {
        Self {
            backend,
            factory,
            blend: BlendWeights::default(),
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }

    pub fn with_blend(mut self, blend: BlendWeights) -> Self {
        self.blend = blend;
        self
    }

    /// Similarity floor used by [`recall`](Self::recall).
    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> SettingsStore<'_, B> {
        SettingsStore::new(&self.backend)
    }

    pub fn memories(&self) -> MemoryStore<'_, B> {
        MemoryStore::new(&self.backend).with_blend(self.blend)
    }

    /// Resolve provider and model from the current settings.
    pub fn embedding_config(&self) -> Result<EmbeddingConfig, Error> {
        EmbeddingConfig::from_settings(&self.settings().get_all()?)
    }

    /// Build the provider the settings currently select.
    ///
    /// Unknown provider names fail before the factory is consulted.
    pub fn provider(&self) -> Result<Box<dyn EmbeddingProvider>, Error> {
        let config = self.embedding_config()?;
        self.factory.build(&config)
    }

    /// Embed and store a memory.
    ///
    /// A draft that already carries an embedding is stored as-is. When the
    /// provider call fails the memory is stored without an embedding, so it
    /// stays reachable through lexical search.
    ///
    /// # Errors
    ///
    /// Configuration errors (unknown provider, missing API key) and store
    /// errors propagate.
    pub fn remember(&self, draft: MemoryDraft) -> Result<Option<String>, Error> {
        MemoryStore::<B>::validate_input_length(draft.content())?;

        let draft = if draft.embedding().is_some() {
            draft
        } else {
            let provider = self.provider()?;
            match embed_checked(provider.as_ref(), draft.content()) {
                Ok(embedding) => draft.with_embedding(embedding),
                Err(e) if e.is_provider_error() => {
                    warn!(error = %e, "Embedding failed, storing memory without embedding");
                    draft
                }
                Err(e) => return Err(e),
            }
        };

        self.memories().store(&draft)
    }

    /// Embed `query` and run hybrid search with the configured floor,
    /// falling back to full-text search when the provider call fails.
    pub fn recall(&self, query: &str, limit: usize) -> Result<Vec<Memory>, Error> {
        MemoryStore::<B>::validate_input_length(query)?;

        let provider = self.provider()?;
        match embed_checked(provider.as_ref(), query.trim()) {
            Ok(embedding) => {
                self.memories()
                    .search(query, &embedding, limit, self.min_similarity)
            }
            Err(e) if e.is_provider_error() => {
                warn!(error = %e, "Embedding failed, falling back to full-text search");
                self.memories().search_fts(query, limit)
            }
            Err(e) => Err(e),
        }
    }

    /// Store `text` only if the backend's capture heuristic accepts it.
    pub fn capture(&self, text: &str, source: &str) -> Result<Option<String>, Error> {
        if !self.memories().should_capture(text)? {
            debug!("Capture heuristic rejected text");
            return Ok(None);
        }
        self.remember(MemoryDraft::new(text.trim()).with_source(source))
    }
}

/// Embed `text`, reporting a vector of the wrong size as a failure of the
/// provider that produced it.
fn embed_checked(provider: &dyn EmbeddingProvider, text: &str) -> Result<Vec<f32>, Error> {
    let embedding = provider.embed(text)?;
    if embedding.len() != EMBEDDING_DIMS {
        return Err(Error::provider(
            provider.kind(),
            format!(
                "expected {EMBEDDING_DIMS} dimensions, got {}",
                embedding.len()
            ),
        ));
    }
    Ok(embedding)
}
