//! FTS5 full-text search and BM25 ranking.

use rusqlite::params;

use super::{MEMORY_COLUMNS, MemoryRow, SqliteBackend, validate_limit};
use crate::backend::Result;
use crate::memory_types::Memory;

/// Turn raw BM25 scores (lower = better, negative) into strengths in (0, 1],
/// relative to the best match.
pub(crate) fn normalize_bm25(scores: &[f64]) -> Vec<f64> {
    let best = scores.iter().copied().fold(f64::INFINITY, f64::min);
    scores
        .iter()
        .map(|&s| {
            if best < 0.0 {
                (s / best).clamp(f64::MIN_POSITIVE, 1.0)
            } else {
                1.0
            }
        })
        .collect()
}

impl SqliteBackend {
    /// Rows matching the query with their raw BM25 score, best first.
    pub(crate) fn bm25_matches(&self, query: &str, limit: usize) -> Result<Vec<(MemoryRow, f64)>> {
        let escaped_query = Self::escape_fts_query(query);

        // Empty query returns no results (avoid FTS5 syntax error)
        if escaped_query.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT {MEMORY_COLUMNS}, bm25(memories_fts) AS bm25_score
            FROM memories_fts
            JOIN memories m ON m.rowid = memories_fts.rowid
            WHERE memories_fts MATCH ?1
            ORDER BY bm25(memories_fts), m.created_at DESC
            LIMIT ?2
            "#
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let matches = stmt
            .query_map(params![escaped_query, limit as i64], |row| {
                Ok((MemoryRow::from_row(row)?, row.get::<_, f64>(7)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(matches)
    }

    /// Search memories using FTS5 BM25 ranking.
    ///
    /// `score` on each result is the normalized BM25 strength.
    ///
    /// # Errors
    ///
    /// Returns error if the limit is invalid or the FTS5 search fails.
    pub(crate) fn search_bm25(&self, query: &str, limit: usize) -> Result<Vec<Memory>> {
        validate_limit(limit)?;

        let (rows, scores): (Vec<MemoryRow>, Vec<f64>) =
            self.bm25_matches(query, limit)?.into_iter().unzip();
        let strengths = normalize_bm25(&scores);

        rows.into_iter()
            .zip(strengths)
            .map(|(row, strength)| row.into_memory(strength, None))
            .collect()
    }

    /// Quote each term and OR-join them, so any term can match and BM25
    /// rewards rows matching more of them.
    fn escape_fts_query(query: &str) -> String {
        query
            .split_whitespace()
            .map(|word| {
                let escaped = word.replace('"', "\"\"");
                format!("\"{}\"", escaped)
            })
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, NewMemory};

    fn create_test_db() -> SqliteBackend {
        SqliteBackend::open_in_memory().unwrap()
    }

    fn insert(db: &SqliteBackend, content: &str) -> String {
        db.store_memory(&NewMemory {
            content,
            embedding: None,
            source: "user",
            importance: 0.7,
            metadata: "{}",
        })
        .unwrap()
        .unwrap()
    }

    #[test]
    fn test_fts5_search() {
        let db = create_test_db();
        insert(&db, "rust programming");
        insert(&db, "python data");

        let results = db.search_bm25("rust", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].content.contains("rust"));
        assert_eq!(results[0].score, 1.0);
        assert_eq!(results[0].similarity, None);
    }

    #[test]
    fn test_fts5_more_terms_rank_higher() {
        let db = create_test_db();
        insert(&db, "rust error handling");
        let both = insert(&db, "rust programming language");
        insert(&db, "python scripting");

        let results = db.search_bm25("rust programming", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].memory_id, both);
        assert!(results[0].score >= results[1].score);
        assert!(results[1].score > 0.0);
    }

    #[test]
    fn test_fts5_delete_trigger() {
        let db = create_test_db();
        let id = insert(&db, "original text");
        assert_eq!(db.search_bm25("original", 10).unwrap().len(), 1);

        db.delete_memory(&id).unwrap();
        assert_eq!(db.search_bm25("original", 10).unwrap().len(), 0);
    }

    #[test]
    fn test_fts5_stemming() {
        let db = create_test_db();
        insert(&db, "Alice works at Microsoft");

        let results = db.search_bm25("where does alice work", 10).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_fts5_limit_validation() {
        let db = create_test_db();
        assert!(db.search_bm25("test", 0).is_err());
        assert!(db.search_bm25("test", 100_000).is_err());
    }

    #[test]
    fn test_fts5_special_characters() {
        let db = create_test_db();
        insert(&db, "test with \"quotes\"");
        insert(&db, "test with 'apos'");

        assert_eq!(db.search_bm25("\"quotes\"", 10).unwrap().len(), 1);
        assert_eq!(db.search_bm25("AND OR NOT", 10).unwrap().len(), 0);
    }

    #[test]
    fn test_fts5_empty_query() {
        let db = create_test_db();
        insert(&db, "test content");

        assert!(db.search_bm25("", 10).unwrap().is_empty());
        assert!(db.search_bm25("   ", 10).unwrap().is_empty());
    }

    #[test]
    fn test_fts5_unicode_text() {
        let db = create_test_db();
        insert(&db, "café résumé 日本語");

        let results = db.search_bm25("café", 10).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_normalize_bm25() {
        assert_eq!(normalize_bm25(&[-4.0, -2.0, -1.0]), vec![1.0, 0.5, 0.25]);
        assert_eq!(normalize_bm25(&[0.0, 0.0]), vec![1.0, 1.0]);
        assert!(normalize_bm25(&[]).is_empty());
    }
}
