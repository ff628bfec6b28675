//! Memory record types returned by the store.

use std::collections::BTreeMap;

use serde::Serialize;

/// A ranked memory returned by hybrid or full-text search.
#[derive(Debug, Clone, Serialize)]
pub struct Memory {
    /// UUID assigned by the store.
    pub memory_id: String,
    pub content: String,
    pub source: String,
    pub importance: f64,
    pub metadata: serde_json::Value,
    /// Tag derived by the store at insert time.
    pub category: Option<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// Ranking score:
    /// - Hybrid search: blended semantic + lexical score (higher = better)
    /// - Full-text search: normalized BM25 strength in (0, 1] (higher = better)
    pub score: f64,

    /// Cosine similarity to the query vector, when the memory has an embedding
    /// and the search was semantic.
    pub similarity: Option<f64>,
}

/// Listing row for paginated reads.
#[derive(Debug, Clone, Serialize)]
pub struct MemorySummary {
    pub memory_id: String,
    pub content: String,
    pub category: Option<String>,
    pub source: String,
    pub importance: f64,
    pub created_at: String,
}

/// Aggregate counters computed by the store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    pub total_memories: u64,
    pub with_embedding: u64,
    pub lexical_only: u64,
    pub average_importance: Option<f64>,
    pub oldest: Option<String>,
    pub newest: Option<String>,
    pub by_source: BTreeMap<String, u64>,
    pub by_category: BTreeMap<String, u64>,
}

impl Stats {
    /// Flatten into a single-level record.
    ///
    /// Distribution entries become `source.<name>` and `category.<name>` keys.
    pub fn to_record(&self) -> BTreeMap<String, serde_json::Value> {
        use serde_json::json;

        let mut record = BTreeMap::new();
        record.insert("total_memories".to_string(), json!(self.total_memories));
        record.insert("with_embedding".to_string(), json!(self.with_embedding));
        record.insert("lexical_only".to_string(), json!(self.lexical_only));
        record.insert(
            "average_importance".to_string(),
            json!(self.average_importance),
        );
        record.insert("oldest".to_string(), json!(self.oldest));
        record.insert("newest".to_string(), json!(self.newest));
        for (source, count) in &self.by_source {
            record.insert(format!("source.{source}"), json!(count));
        }
        for (category, count) in &self.by_category {
            record.insert(format!("category.{category}"), json!(count));
        }
        record
    }
}
