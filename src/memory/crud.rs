//! Storage, listing, stats and deletion for the memory store.

use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::{Backend, NewMemory};
use crate::errors::Error;
use crate::memory_types::{MemorySummary, Stats};
use crate::vector;

use super::store::{MemoryStore, validate_limit};

/// Arguments for [`MemoryStore::store`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryDraft {
    pub(crate) content: String,
    pub(crate) embedding: Option<Vec<f32>>,
    pub(crate) source: String,
    pub(crate) importance: f64,
    pub(crate) metadata: Value,
}

impl MemoryDraft {
    /// Draft with `source = "user"`, `importance = 0.7`, empty metadata and
    /// no embedding.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            embedding: None,
            source: "user".to_string(),
            importance: 0.7,
            metadata: Value::Object(Map::new()),
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = importance;
        self
    }

    /// Attach metadata; must be a JSON object.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn importance(&self) -> f64 {
        self.importance
    }

    pub fn metadata(&self) -> &Value {
        &self.metadata
    }
}

impl<B: Backend + ?Sized> MemoryStore<'_, B> {
    #[must_use = "handle the error or results may be lost"]
    /// Persist a memory.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(memory_id))` with the identifier assigned by the backend
    /// * `Ok(None)` if the backend produced no row (nothing was stored)
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Content is empty or exceeds 100,000 bytes
    /// - Source is empty, importance is not finite, or metadata is not an object
    /// - The embedding is not 1536 finite values
    /// - The backend call fails
    pub fn store(&self, draft: &MemoryDraft) -> Result<Option<String>, Error> {
        Self::validate_input_length(&draft.content)?;

        if draft.source.trim().is_empty() {
            return Err(Error::InvalidInput("Source cannot be empty".to_string()));
        }
        if !draft.importance.is_finite() {
            return Err(Error::InvalidInput(format!(
                "Importance must be finite, got {}",
                draft.importance
            )));
        }
        if !draft.metadata.is_object() {
            return Err(Error::InvalidInput(
                "Metadata must be a JSON object".to_string(),
            ));
        }

        let literal = draft.embedding.as_deref().map(vector::to_literal).transpose()?;
        let metadata = serde_json::to_string(&draft.metadata)?;

        let memory_id = self.backend.store_memory(&NewMemory {
            content: &draft.content,
            embedding: literal.as_deref(),
            source: &draft.source,
            importance: draft.importance,
            metadata: &metadata,
        })?;

        match &memory_id {
            Some(id) => info!(
                memory_id = %id,
                source = %draft.source,
                embedded = literal.is_some(),
                "Stored memory"
            ),
            None => debug!(source = %draft.source, "Backend stored no row"),
        }
        Ok(memory_id)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Page through memories, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if limit is 0 or exceeds `MAX_SEARCH_LIMIT`.
    pub fn get_memories(&self, limit: usize, offset: usize) -> Result<Vec<MemorySummary>, Error> {
        validate_limit(limit)?;
        Ok(self.backend.list_memories(limit, offset)?)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Aggregate counters computed by the backend.
    pub fn get_stats(&self) -> Result<Stats, Error> {
        Ok(self.backend.stats()?)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Delete a memory.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if memory was deleted
    /// - `Ok(false)` if memory didn't exist
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `memory_id` is not a UUID.
    pub fn delete_memory(&self, memory_id: &str) -> Result<bool, Error> {
        Uuid::parse_str(memory_id).map_err(|e| {
            Error::InvalidInput(format!("Invalid memory id '{memory_id}': {e}"))
        })?;

        let deleted = self.backend.delete_memory(memory_id)?;
        if deleted {
            info!(memory_id = %memory_id, "Deleted memory");
        }
        Ok(deleted)
    }
}
