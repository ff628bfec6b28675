//! mnemos - A semantic memory layer for autonomous agents.
//!
//! Short text memories are stored with an optional embedding and retrieved by
//! hybrid search: cosine similarity blended with full-text (BM25) matching.
//! A separate settings namespace selects the embedding provider (OpenAI,
//! Gemini or Voyage) at runtime. All operations are synchronous (no
//! async/await required).
//!
//! # Example
//!
//! ```no_run
//! use mnemos::{Config, MemoryAgent, MemoryDraft};
//!
//! let config = Config::load().expect("invalid configuration");
//! let agent = MemoryAgent::open(&config).expect("failed to open store");
//!
//! // Pick the embedding backend for subsequent calls
//! agent.settings().set("embedding_provider", "voyage").unwrap();
//!
//! let draft = MemoryDraft::new("Alice works at Microsoft")
//!     .with_source("chat")
//!     .with_importance(0.9);
//! let id = agent.remember(draft).unwrap();
//! println!("stored {id:?}");
//!
//! for memory in agent.recall("where does alice work", 5).unwrap() {
//!     println!("{:.2}: {}", memory.score, memory.content);
//! }
//! ```
//!
//! Lower-level pieces ([`SettingsStore`], [`MemoryStore`], the
//! [`Backend`](backend::Backend) trait) can be used directly when embeddings
//! are produced elsewhere.

pub mod agent;
pub mod backend;
pub mod config;
pub mod embedding;
pub mod errors;
pub mod memory;
pub mod memory_types;
pub mod settings;
pub mod vector;

// Re-export public API
pub use agent::MemoryAgent;
pub use backend::{Backend, SqliteBackend};
pub use config::Config;
pub use embedding::{
    EmbeddingConfig, EmbeddingProvider, HttpProviderFactory, ProviderFactory, ProviderKind,
};
pub use errors::Error;
pub use memory::{
    BlendWeights, DEFAULT_MIN_SIMILARITY, DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_LIMIT,
    MAX_INPUT_LENGTH, MAX_SEARCH_LIMIT, MemoryDraft, MemoryStore,
};
pub use memory_types::{Memory, MemorySummary, Stats};
pub use settings::SettingsStore;
pub use vector::EMBEDDING_DIMS;
