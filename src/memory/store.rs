//! Memory store struct over a borrowed backend connection.

use crate::backend::Backend;
use crate::errors::Error;

/// Maximum allowed input length in bytes (content and queries).
pub const MAX_INPUT_LENGTH: usize = 100_000;
/// Maximum allowed limit for search and list operations.
pub const MAX_SEARCH_LIMIT: usize = 10_000;
/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;
/// Default cosine similarity floor for hybrid search.
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.3;
/// Default page size for `get_memories`.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Split between the semantic and lexical signals in hybrid ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    semantic: f64,
    lexical: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            semantic: 0.7,
            lexical: 0.3,
        }
    }
}

impl BlendWeights {
    /// # Errors
    ///
    /// Returns `Error::Configuration` if either weight is negative or not
    /// finite, or if both are zero.
    pub fn new(semantic: f64, lexical: f64) -> Result<Self, Error> {
        for (name, weight) in [("semantic", semantic), ("lexical", lexical)] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::Configuration(format!(
                    "{name} weight must be a finite non-negative number, got {weight}"
                )));
            }
        }
        if semantic == 0.0 && lexical == 0.0 {
            return Err(Error::Configuration(
                "semantic and lexical weights cannot both be zero".to_string(),
            ));
        }
        Ok(Self { semantic, lexical })
    }

    pub fn semantic(&self) -> f64 {
        self.semantic
    }

    pub fn lexical(&self) -> f64 {
        self.lexical
    }
}

/// Stores, searches, pages through and deletes memories.
///
/// Stateless between calls: every operation is one request to the backend.
/// Embeddings are supplied by the caller; see `MemoryAgent` for the path
/// that generates them.
pub struct MemoryStore<'a, B: Backend + ?Sized> {
    pub(crate) backend: &'a B,
    pub(crate) blend: BlendWeights,
}

impl<'a, B: Backend + ?Sized> MemoryStore<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            blend: BlendWeights::default(),
        }
    }

    /// Use a different semantic/lexical split for `search`.
    pub fn with_blend(mut self, blend: BlendWeights) -> Self {
        self.blend = blend;
        self
    }

    pub fn blend(&self) -> BlendWeights {
        self.blend
    }

    /// Validate input length (rejects empty and whitespace-only inputs).
    pub(crate) fn validate_input_length(text: &str) -> Result<(), Error> {
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        if text.len() > MAX_INPUT_LENGTH {
            return Err(Error::InputTooLong {
                max_length: MAX_INPUT_LENGTH,
                actual_length: text.len(),
            });
        }
        Ok(())
    }
}

/// Validate search limit is within acceptable bounds.
pub(crate) fn validate_limit(limit: usize) -> Result<(), Error> {
    if limit == 0 {
        return Err(Error::InvalidInput(
            "Limit must be greater than 0".to_string(),
        ));
    }
    if limit > MAX_SEARCH_LIMIT {
        return Err(Error::InvalidInput(format!(
            "Limit {} exceeds maximum allowed ({})",
            limit, MAX_SEARCH_LIMIT
        )));
    }
    Ok(())
}
