//! Error types for mnemos.

use thiserror::Error;

use crate::backend;
use crate::embedding::ProviderKind;
use crate::vector::VectorError;

/// Main error type for mnemos operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown embedding provider, missing API key, or invalid config value.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A stored setting could not be decoded as JSON.
    #[error("Failed to decode setting '{key}': {source}")]
    ConfigDecode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Embedding backend call failed (auth, network, quota, bad response).
    #[error("Embedding provider '{provider}' failed: {message}")]
    Provider {
        provider: ProviderKind,
        message: String,
    },

    /// Connection-level failure to the store.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Store-side failure other than connectivity.
    #[error("Store error: {0}")]
    Store(backend::Error),

    /// Embedding vector rejected before it reached the store.
    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(#[from] VectorError),

    /// Empty or whitespace-only input.
    #[error("Input cannot be empty")]
    EmptyInput,

    /// Input exceeds the maximum allowed length.
    #[error("Input too long: {actual_length} bytes (max {max_length})")]
    InputTooLong {
        max_length: usize,
        actual_length: usize,
    },

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<backend::Error> for Error {
    fn from(err: backend::Error) -> Self {
        match err {
            backend::Error::Unavailable(msg) => Error::StoreUnavailable(msg),
            backend::Error::InvalidLimit(msg) => Error::InvalidInput(msg),
            other => Error::Store(other),
        }
    }
}

impl Error {
    pub(crate) fn provider(provider: ProviderKind, message: impl Into<String>) -> Self {
        Error::Provider {
            provider,
            message: message.into(),
        }
    }

    /// True for failures of the embedding backend, which callers may degrade around.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Error::Provider { .. })
    }
}
