//! Store procedural interface.
//!
//! This module provides:
//! - `Backend`: the calls a storage engine must expose (settings, memory
//!   persistence, ranking, capture policy, stats)
//! - `StoredSetting`: a settings value with its explicit encoding tag
//! - `sqlite`: the bundled SQLite + FTS5 implementation

pub mod sqlite;

use crate::memory_types::{Memory, MemorySummary, Stats};
use crate::vector::VectorError;

pub use self::sqlite::SqliteBackend;

/// Error types for store operations.
#[derive(Debug)]
pub enum Error {
    /// The store could not be reached or opened.
    Unavailable(String),
    Sqlite(String),
    InvalidVector(VectorError),
    InvalidLimit(String),
    /// Stored data that the store itself cannot interpret.
    Corrupt(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            Error::Sqlite(msg) => write!(f, "Database error: {}", msg),
            Error::InvalidVector(err) => write!(f, "Invalid vector: {}", err),
            Error::InvalidLimit(msg) => write!(f, "Invalid limit: {}", msg),
            Error::Corrupt(msg) => write!(f, "Corrupt record: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Sqlite(err.to_string())
    }
}

impl From<VectorError> for Error {
    fn from(err: VectorError) -> Self {
        Error::InvalidVector(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// How a setting's raw text is to be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingEncoding {
    /// Raw text is the value itself, a plain string.
    Text,
    /// Raw text is serialized JSON.
    Json,
}

impl SettingEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            SettingEncoding::Text => "text",
            SettingEncoding::Json => "json",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "text" => Some(SettingEncoding::Text),
            "json" => Some(SettingEncoding::Json),
            _ => None,
        }
    }
}

/// A setting as persisted: raw text plus its encoding tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSetting {
    pub encoding: SettingEncoding,
    pub raw: String,
}

impl StoredSetting {
    pub fn text(raw: impl Into<String>) -> Self {
        Self {
            encoding: SettingEncoding::Text,
            raw: raw.into(),
        }
    }

    pub fn json(raw: impl Into<String>) -> Self {
        Self {
            encoding: SettingEncoding::Json,
            raw: raw.into(),
        }
    }
}

/// Arguments of a `store_memory` call, already normalized for the wire.
#[derive(Debug, Clone)]
pub struct NewMemory<'a> {
    pub content: &'a str,
    /// Vector literal (`[a,b,...]`), absent for lexical-only memories.
    pub embedding: Option<&'a str>,
    pub source: &'a str,
    pub importance: f64,
    /// Serialized JSON object.
    pub metadata: &'a str,
}

/// Arguments of a `hybrid_search` call.
#[derive(Debug, Clone)]
pub struct HybridQuery<'a> {
    pub query: &'a str,
    /// Vector literal of the query embedding.
    pub embedding: &'a str,
    pub limit: usize,
    /// Hard floor on cosine similarity.
    pub min_similarity: f64,
    pub semantic_weight: f64,
    pub lexical_weight: f64,
}

/// Procedural interface a storage engine exposes to the memory layer.
///
/// Every call is one atomic request; implementations serialize concurrent
/// writes themselves.
pub trait Backend {
    /// Fetch a setting, `None` if the key does not exist.
    fn get_setting(&self, key: &str) -> Result<Option<StoredSetting>>;

    /// Insert or replace a setting.
    fn set_setting(&self, key: &str, setting: &StoredSetting) -> Result<()>;

    /// Fetch the whole settings namespace in one call.
    fn get_all_settings(&self) -> Result<Vec<(String, StoredSetting)>>;

    /// Persist a memory, returning the assigned identifier (`None` if no row was written).
    fn store_memory(&self, memory: &NewMemory<'_>) -> Result<Option<String>>;

    /// Blend vector similarity and lexical ranking, most relevant first.
    fn hybrid_search(&self, query: &HybridQuery<'_>) -> Result<Vec<Memory>>;

    /// Lexical-only ranking, most relevant first.
    fn fts_search(&self, query: &str, limit: usize) -> Result<Vec<Memory>>;

    /// Store-owned policy: is this text worth remembering?
    fn should_capture(&self, text: &str) -> Result<bool>;

    fn stats(&self) -> Result<Stats>;

    /// Memories ordered by creation time, newest first.
    fn list_memories(&self, limit: usize, offset: usize) -> Result<Vec<MemorySummary>>;

    /// Returns true if a row was removed.
    fn delete_memory(&self, memory_id: &str) -> Result<bool>;
}
