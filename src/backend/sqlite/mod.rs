//! SQLite implementation of the store procedural interface.
//!
//! This module provides:
//! - `SqliteBackend`: connection, schema, settings and memory persistence
//! - `search`: hybrid (vector + BM25) ranking
//! - `fts`: FTS5 full-text search
//! - `capture`: the store-owned capture policy and category classifier

mod capture;
mod fts;
mod search;

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    Backend, Error, HybridQuery, NewMemory, Result, SettingEncoding, StoredSetting,
};
use crate::memory_types::{Memory, MemorySummary, Stats};
use crate::vector::{parse_literal, vec_to_blob};

pub(crate) use self::search::validate_limit;

/// SQLite store backed by a single connection.
pub struct SqliteBackend {
    conn: Connection,
}

/// Initialize database schema and create necessary tables and triggers.
fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            encoding TEXT NOT NULL CHECK (encoding IN ('text', 'json')),
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS memories (
            memory_id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            embedding BLOB,
            source TEXT NOT NULL DEFAULT 'user',
            importance REAL NOT NULL DEFAULT 0.7,
            metadata TEXT NOT NULL DEFAULT '{}',
            category TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_memories_created ON memories(created_at);

        CREATE VIRTUAL TABLE IF NOT EXISTS memories_fts USING fts5(
            content,
            tokenize='porter unicode61',
            content_rowid='rowid',
            content='memories'
        );

        CREATE TRIGGER IF NOT EXISTS memories_fts_insert AFTER INSERT ON memories BEGIN
            INSERT INTO memories_fts(rowid, content) VALUES (new.rowid, new.content);
        END;

        CREATE TRIGGER IF NOT EXISTS memories_fts_delete AFTER DELETE ON memories BEGIN
            INSERT INTO memories_fts(memories_fts, rowid, content)
            VALUES('delete', old.rowid, old.content);
        END;
        "#,
    )?;
    Ok(())
}

/// Fixed-width UTC timestamp so text ordering matches time ordering.
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Raw `memories` columns, decoded into a [`Memory`] outside the row closure.
pub(crate) struct MemoryRow {
    pub memory_id: String,
    pub content: String,
    pub source: String,
    pub importance: f64,
    pub metadata: String,
    pub category: Option<String>,
    pub created_at: String,
}

/// Column list matching [`MemoryRow::from_row`], prefixed with a table alias.
pub(crate) const MEMORY_COLUMNS: &str =
    "m.memory_id, m.content, m.source, m.importance, m.metadata, m.category, m.created_at";

impl MemoryRow {
    /// Read the first seven columns in [`MEMORY_COLUMNS`] order.
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            memory_id: row.get(0)?,
            content: row.get(1)?,
            source: row.get(2)?,
            importance: row.get(3)?,
            metadata: row.get(4)?,
            category: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    pub(crate) fn into_memory(self, score: f64, similarity: Option<f64>) -> Result<Memory> {
        let metadata = serde_json::from_str(&self.metadata).map_err(|e| {
            Error::Corrupt(format!("metadata of memory {}: {e}", self.memory_id))
        })?;
        Ok(Memory {
            memory_id: self.memory_id,
            content: self.content,
            source: self.source,
            importance: self.importance,
            metadata,
            category: self.category,
            created_at: self.created_at,
            score,
            similarity,
        })
    }
}

impl SqliteBackend {
    /// Open or create a SQLite database at the given path.
    ///
    /// Initializes the schema if the database is new.
    ///
    /// # Errors
    ///
    /// Returns `Error::Unavailable` if the database cannot be opened, or a
    /// database error if schema initialization fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::Unavailable(format!("{}: {e}", path.display())))?;
        create_schema(&conn)?;
        info!(path = %path.display(), "Opened memory database");
        Ok(Self { conn })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Unavailable(e.to_string()))?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Insert a memory with an explicit creation timestamp (for testing).
    #[cfg(test)]
    pub(crate) fn insert_with_time(
        &self,
        content: &str,
        embedding: Option<&[f32]>,
        created_at: &str,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let blob = embedding.map(vec_to_blob).transpose()?;
        self.conn.execute(
            r#"
            INSERT INTO memories (memory_id, content, embedding, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![&id, content, blob, created_at],
        )?;
        Ok(id)
    }

    /// Get internal connection (for tests).
    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    fn decode_setting(key: &str, tag: &str, raw: String) -> Result<StoredSetting> {
        let encoding = SettingEncoding::parse(tag)
            .ok_or_else(|| Error::Corrupt(format!("setting '{key}' has unknown encoding '{tag}'")))?;
        Ok(StoredSetting { encoding, raw })
    }
}

impl Backend for SqliteBackend {
    fn get_setting(&self, key: &str) -> Result<Option<StoredSetting>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT encoding, value FROM settings WHERE key = ?1",
                [key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(tag, raw)| Self::decode_setting(key, &tag, raw))
            .transpose()
    }

    fn set_setting(&self, key: &str, setting: &StoredSetting) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO settings (key, encoding, value, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                encoding = excluded.encoding,
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, setting.encoding.as_str(), &setting.raw, now_timestamp()],
        )?;
        debug!(key, encoding = setting.encoding.as_str(), "Setting written");
        Ok(())
    }

    fn get_all_settings(&self) -> Result<Vec<(String, StoredSetting)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, encoding, value FROM settings ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(key, tag, raw)| {
                let setting = Self::decode_setting(&key, &tag, raw)?;
                Ok((key, setting))
            })
            .collect()
    }

    fn store_memory(&self, memory: &NewMemory<'_>) -> Result<Option<String>> {
        let blob = match memory.embedding {
            Some(literal) => Some(vec_to_blob(&parse_literal(literal)?)?),
            None => None,
        };
        let id = Uuid::new_v4().to_string();
        let category = capture::classify(memory.content);

        let rows = self.conn.execute(
            r#"
            INSERT INTO memories
                (memory_id, content, embedding, source, importance, metadata, category, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                &id,
                memory.content,
                blob,
                memory.source,
                memory.importance,
                memory.metadata,
                category,
                now_timestamp(),
            ],
        )?;

        Ok((rows > 0).then_some(id))
    }

    fn hybrid_search(&self, query: &HybridQuery<'_>) -> Result<Vec<Memory>> {
        self.search_hybrid(query)
    }

    fn fts_search(&self, query: &str, limit: usize) -> Result<Vec<Memory>> {
        self.search_bm25(query, limit)
    }

    fn should_capture(&self, text: &str) -> Result<bool> {
        Ok(capture::should_capture(text))
    }

    fn stats(&self) -> Result<Stats> {
        let (total, embedded, average_importance, oldest, newest) = self.conn.query_row(
            r#"
            SELECT COUNT(*), COUNT(embedding), AVG(importance), MIN(created_at), MAX(created_at)
            FROM memories
            "#,
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            },
        )?;

        let by_source = self.count_by("source")?;
        let by_category = self.count_by("COALESCE(category, 'uncategorized')")?;

        Ok(Stats {
            total_memories: total as u64,
            with_embedding: embedded as u64,
            lexical_only: (total - embedded) as u64,
            average_importance,
            oldest,
            newest,
            by_source,
            by_category,
        })
    }

    fn list_memories(&self, limit: usize, offset: usize) -> Result<Vec<MemorySummary>> {
        validate_limit(limit)?;
        // Offsets past i64::MAX still mean "past the end"
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let mut stmt = self.conn.prepare(
            r#"
            SELECT memory_id, content, category, source, importance, created_at
            FROM memories
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )?;

        let memories = stmt
            .query_map(params![limit as i64, offset], |row| {
                Ok(MemorySummary {
                    memory_id: row.get(0)?,
                    content: row.get(1)?,
                    category: row.get(2)?,
                    source: row.get(3)?,
                    importance: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(memories)
    }

    fn delete_memory(&self, memory_id: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM memories WHERE memory_id = ?1", [memory_id])?;
        Ok(rows > 0)
    }
}

impl SqliteBackend {
    /// Row counts grouped by a column expression (fixed strings only).
    fn count_by(&self, expr: &str) -> Result<BTreeMap<String, u64>> {
        let sql = format!("SELECT {expr}, COUNT(*) FROM memories GROUP BY 1");
        let mut stmt = self.conn.prepare(&sql)?;
        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{EMBEDDING_DIMS, to_literal};
    use tempfile::TempDir;

    fn create_test_db() -> SqliteBackend {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let db = SqliteBackend::open(&path).unwrap();
        std::mem::forget(dir);
        db
    }

    fn new_memory<'a>(content: &'a str, embedding: Option<&'a str>) -> NewMemory<'a> {
        NewMemory {
            content,
            embedding,
            source: "user",
            importance: 0.7,
            metadata: "{}",
        }
    }

    #[test]
    fn test_open_unreachable_path() {
        let result = SqliteBackend::open(Path::new("/nonexistent-dir/sub/test.db"));
        assert!(matches!(result, Err(Error::Unavailable(_))));
    }

    #[test]
    fn test_setting_roundtrip() {
        let db = create_test_db();
        db.set_setting("model", &StoredSetting::text("voyage-2"))
            .unwrap();
        assert_eq!(
            db.get_setting("model").unwrap(),
            Some(StoredSetting::text("voyage-2"))
        );
        assert_eq!(db.get_setting("missing").unwrap(), None);
    }

    #[test]
    fn test_setting_overwrite_changes_encoding() {
        let db = create_test_db();
        db.set_setting("k", &StoredSetting::text("5")).unwrap();
        db.set_setting("k", &StoredSetting::json("5")).unwrap();
        assert_eq!(db.get_setting("k").unwrap(), Some(StoredSetting::json("5")));
        assert_eq!(db.get_all_settings().unwrap().len(), 1);
    }

    #[test]
    fn test_get_all_settings_sorted() {
        let db = create_test_db();
        db.set_setting("b", &StoredSetting::json("true")).unwrap();
        db.set_setting("a", &StoredSetting::text("x")).unwrap();
        let all = db.get_all_settings().unwrap();
        let keys: Vec<&str> = all.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_unknown_encoding_is_corrupt() {
        let db = create_test_db();
        // CHECK constraint blocks bad tags, so bypass it the way an old schema would.
        db.conn()
            .execute_batch(
                "DROP TABLE settings;
                 CREATE TABLE settings (key TEXT PRIMARY KEY, encoding TEXT, value TEXT, updated_at TEXT);
                 INSERT INTO settings VALUES ('k', 'yaml', 'x', '2024-01-01T00:00:00Z');",
            )
            .unwrap();
        assert!(matches!(db.get_setting("k"), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_store_with_embedding() {
        let db = create_test_db();
        let literal = to_literal(&vec![0.1f32; EMBEDDING_DIMS]).unwrap();
        let id = db
            .store_memory(&new_memory("I prefer dark mode", Some(&literal)))
            .unwrap()
            .unwrap();
        assert!(Uuid::parse_str(&id).is_ok());

        let stats = db.stats().unwrap();
        assert_eq!(stats.total_memories, 1);
        assert_eq!(stats.with_embedding, 1);
        assert_eq!(stats.by_category.get("preference"), Some(&1));
    }

    #[test]
    fn test_store_without_embedding() {
        let db = create_test_db();
        db.store_memory(&new_memory("plain text memory", None))
            .unwrap()
            .unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats.lexical_only, 1);
        assert_eq!(stats.with_embedding, 0);
    }

    #[test]
    fn test_store_rejects_short_vector() {
        let db = create_test_db();
        let result = db.store_memory(&new_memory("x", Some("[0.1,0.2]")));
        assert!(matches!(result, Err(Error::InvalidVector(_))));
        assert_eq!(db.stats().unwrap().total_memories, 0);
    }

    #[test]
    fn test_list_ordering() {
        let db = create_test_db();
        let id1 = db
            .insert_with_time("first", None, "2024-01-01T00:00:00.000000Z")
            .unwrap();
        let id2 = db
            .insert_with_time("second", None, "2024-01-02T00:00:00.000000Z")
            .unwrap();

        let memories = db.list_memories(10, 0).unwrap();
        assert_eq!(memories.len(), 2);
        assert_eq!(memories[0].memory_id, id2); // Newest first
        assert_eq!(memories[1].memory_id, id1);
    }

    #[test]
    fn test_list_offset() {
        let db = create_test_db();
        for i in 0..5 {
            db.insert_with_time(
                &format!("content {i}"),
                None,
                &format!("2024-01-0{}T00:00:00.000000Z", i + 1),
            )
            .unwrap();
        }

        let page = db.list_memories(2, 2).unwrap();
        let contents: Vec<&str> = page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["content 2", "content 1"]);

        assert!(db.list_memories(10, 10).unwrap().is_empty());
    }

    #[test]
    fn test_list_huge_offset_is_past_end() {
        let db = create_test_db();
        db.insert_with_time("only", None, "2024-01-01T00:00:00.000000Z")
            .unwrap();

        assert!(db.list_memories(5, usize::MAX).unwrap().is_empty());
        assert!(db.list_memories(5, i64::MAX as usize + 1).unwrap().is_empty());
    }

    #[test]
    fn test_list_same_timestamp_uses_insert_order() {
        let db = create_test_db();
        let ts = "2024-01-01T00:00:00.000000Z";
        db.insert_with_time("a", None, ts).unwrap();
        db.insert_with_time("b", None, ts).unwrap();
        let memories = db.list_memories(10, 0).unwrap();
        assert_eq!(memories[0].content, "b");
    }

    #[test]
    fn test_list_invalid_limit() {
        let db = create_test_db();
        assert!(matches!(
            db.list_memories(0, 0),
            Err(Error::InvalidLimit(_))
        ));
    }

    #[test]
    fn test_delete() {
        let db = create_test_db();
        let id = db
            .store_memory(&new_memory("content", None))
            .unwrap()
            .unwrap();

        assert!(db.delete_memory(&id).unwrap());
        assert!(!db.delete_memory(&id).unwrap());
        assert_eq!(db.stats().unwrap().total_memories, 0);
    }

    #[test]
    fn test_stats_empty() {
        let db = create_test_db();
        let stats = db.stats().unwrap();
        assert_eq!(stats.total_memories, 0);
        assert_eq!(stats.average_importance, None);
        assert!(stats.by_source.is_empty());
    }

    #[test]
    fn test_stats_distribution() {
        let db = create_test_db();
        db.store_memory(&new_memory("one", None)).unwrap();
        db.store_memory(&NewMemory {
            source: "agent",
            importance: 0.1,
            ..new_memory("two", None)
        })
        .unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.by_source.get("user"), Some(&1));
        assert_eq!(stats.by_source.get("agent"), Some(&1));
        let avg = stats.average_importance.unwrap();
        assert!((avg - 0.4).abs() < 1e-9);
        assert!(stats.oldest.unwrap() <= stats.newest.unwrap());
    }
}
