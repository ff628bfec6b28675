//! Search operations for the memory store (hybrid and full-text).

use tracing::debug;

use crate::backend::{Backend, HybridQuery};
use crate::errors::Error;
use crate::memory_types::Memory;
use crate::vector;

use super::store::{MemoryStore, validate_limit};

fn validate_min_similarity(min_similarity: f64) -> Result<(), Error> {
    if !min_similarity.is_finite() || !(-1.0..=1.0).contains(&min_similarity) {
        return Err(Error::InvalidInput(format!(
            "min_similarity must be within [-1, 1], got {min_similarity}"
        )));
    }
    Ok(())
}

impl<B: Backend + ?Sized> MemoryStore<'_, B> {
    #[must_use = "handle the error or results may be lost"]
    /// Search memories by blending vector similarity with lexical matching.
    ///
    /// Both the query text and its embedding go to the backend's hybrid
    /// ranker together with this store's [`BlendWeights`]. `min_similarity`
    /// is a hard floor applied by the ranker; nothing is post-filtered here.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Query is empty or exceeds 100,000 bytes
    /// - Limit is 0 or exceeds `MAX_SEARCH_LIMIT`
    /// - `min_similarity` is outside [-1, 1]
    /// - The embedding is not 1536 finite values
    /// - The backend call fails
    ///
    /// [`BlendWeights`]: super::BlendWeights
    pub fn search(
        &self,
        query: &str,
        embedding: &[f32],
        limit: usize,
        min_similarity: f64,
    ) -> Result<Vec<Memory>, Error> {
        validate_limit(limit)?;

        let query = query.trim();
        Self::validate_input_length(query)?;
        validate_min_similarity(min_similarity)?;
        let literal = vector::to_literal(embedding)?;

        let results = self.backend.hybrid_search(&HybridQuery {
            query,
            embedding: &literal,
            limit,
            min_similarity,
            semantic_weight: self.blend.semantic(),
            lexical_weight: self.blend.lexical(),
        })?;

        debug!(results = results.len(), limit, min_similarity, "Hybrid search");
        Ok(results)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Lexical-only search, for when no query embedding is available.
    pub fn search_fts(&self, query: &str, limit: usize) -> Result<Vec<Memory>, Error> {
        validate_limit(limit)?;

        let query = query.trim();
        Self::validate_input_length(query)?;

        let results = self.backend.fts_search(query, limit)?;
        debug!(results = results.len(), limit, "Full-text search");
        Ok(results)
    }

    /// Ask the backend whether `text` is worth persisting.
    pub fn should_capture(&self, text: &str) -> Result<bool, Error> {
        Ok(self.backend.should_capture(text)?)
    }
}
