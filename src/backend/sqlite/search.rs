//! Hybrid ranking: cosine similarity blended with BM25 strength.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use super::fts::normalize_bm25;
use super::{MEMORY_COLUMNS, MemoryRow, SqliteBackend};
use crate::backend::{Error, HybridQuery, Result};
use crate::memory::MAX_SEARCH_LIMIT;
use crate::memory_types::Memory;
use crate::vector::{blob_to_vec, cosine_similarity, parse_literal};

/// Validate search limit is within acceptable bounds.
pub(crate) fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(Error::InvalidLimit(
            "Limit must be greater than 0".to_string(),
        ));
    }
    if limit > MAX_SEARCH_LIMIT {
        return Err(Error::InvalidLimit(format!(
            "Limit {} exceeds maximum allowed ({})",
            limit, MAX_SEARCH_LIMIT
        )));
    }
    Ok(())
}

impl SqliteBackend {
    /// Rank memories by `semantic_weight * similarity + lexical_weight * lexical`.
    ///
    /// Memories with an embedding are candidates only when their cosine
    /// similarity reaches `min_similarity`. Memories without one are
    /// candidates only through a lexical match.
    pub(crate) fn search_hybrid(&self, q: &HybridQuery<'_>) -> Result<Vec<Memory>> {
        validate_limit(q.limit)?;
        let query_embedding = parse_literal(q.embedding)?;

        let (lexical_rows, scores): (Vec<MemoryRow>, Vec<f64>) =
            self.bm25_matches(q.query, MAX_SEARCH_LIMIT)?.into_iter().unzip();
        let lexical: HashMap<String, f64> = lexical_rows
            .into_iter()
            .map(|row| row.memory_id)
            .zip(normalize_bm25(&scores))
            .collect();

        let sql = format!("SELECT {MEMORY_COLUMNS}, m.embedding FROM memories m");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((MemoryRow::from_row(row)?, row.get::<_, Option<Vec<u8>>>(7)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut ranked = Vec::new();
        for (row, blob) in rows {
            let lexical_strength = lexical.get(&row.memory_id).copied();

            let (score, similarity) = match blob {
                Some(blob) => {
                    let stored = blob_to_vec(&blob)?;
                    let similarity = cosine_similarity(&query_embedding, &stored)?;
                    if similarity < q.min_similarity {
                        continue;
                    }
                    let score = q.semantic_weight * similarity
                        + q.lexical_weight * lexical_strength.unwrap_or(0.0);
                    (score, Some(similarity))
                }
                None => match lexical_strength {
                    Some(strength) => (q.lexical_weight * strength, None),
                    None => continue,
                },
            };

            ranked.push(row.into_memory(score, similarity)?);
        }

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        ranked.truncate(q.limit);

        debug!(
            results = ranked.len(),
            lexical_matches = lexical.len(),
            "Hybrid search complete"
        );
        Ok(ranked)
    }
}
