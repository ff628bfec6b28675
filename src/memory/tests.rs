//! Tests for the memory store.

use super::*;
use crate::backend::{self, Backend, HybridQuery, NewMemory, SqliteBackend, StoredSetting};
use crate::errors::Error;
use crate::memory_types::{Memory, MemorySummary, Stats};
use crate::vector::EMBEDDING_DIMS;
use serde_json::json;
use tempfile::TempDir;

fn create_test_db() -> SqliteBackend {
    SqliteBackend::open_in_memory().unwrap()
}

fn axis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIMS];
    v[i] = 1.0;
    v
}

#[test]
fn test_store_and_list() {
    let dir = TempDir::new().unwrap();
    let db = SqliteBackend::open(&dir.path().join("test.db")).unwrap();
    let store = MemoryStore::new(&db);

    let id = store
        .store(
            &MemoryDraft::new("I prefer dark mode in every editor")
                .with_embedding(axis(0))
                .with_source("chat")
                .with_importance(0.9)
                .with_metadata(json!({"session": 7})),
        )
        .unwrap()
        .unwrap();

    let memories = store.get_memories(DEFAULT_PAGE_SIZE, 0).unwrap();
    assert_eq!(memories.len(), 1);
    assert_eq!(memories[0].memory_id, id);
    assert_eq!(memories[0].source, "chat");
    assert_eq!(memories[0].importance, 0.9);
    assert_eq!(memories[0].category.as_deref(), Some("preference"));
}

#[test]
fn test_draft_defaults() {
    let draft = MemoryDraft::new("content");
    assert_eq!(draft.source(), "user");
    assert_eq!(draft.importance(), 0.7);
    assert_eq!(draft.metadata(), &json!({}));
    assert!(draft.embedding().is_none());
}

#[test]
fn test_store_rejects_invalid_drafts() {
    let db = create_test_db();
    let store = MemoryStore::new(&db);

    assert!(matches!(
        store.store(&MemoryDraft::new("   ")),
        Err(Error::EmptyInput)
    ));
    assert!(matches!(
        store.store(&MemoryDraft::new("x".repeat(MAX_INPUT_LENGTH + 1))),
        Err(Error::InputTooLong { .. })
    ));
    assert!(matches!(
        store.store(&MemoryDraft::new("ok").with_source(" ")),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        store.store(&MemoryDraft::new("ok").with_importance(f64::NAN)),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        store.store(&MemoryDraft::new("ok").with_metadata(json!([1, 2]))),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        store.store(&MemoryDraft::new("ok").with_embedding(vec![1.0; 384])),
        Err(Error::InvalidEmbedding(_))
    ));

    // Nothing reached the backend
    assert_eq!(store.get_stats().unwrap().total_memories, 0);
}

#[test]
fn test_search_returns_similar_memory() {
    let db = create_test_db();
    let store = MemoryStore::new(&db);
    let id = store
        .store(&MemoryDraft::new("staging database runs on port 5433").with_embedding(axis(3)))
        .unwrap()
        .unwrap();

    let results = store
        .search("which port", &axis(3), DEFAULT_SEARCH_LIMIT, DEFAULT_MIN_SIMILARITY)
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].memory_id, id);
    assert!(results[0].similarity.unwrap() > 0.99);
}

#[test]
fn test_search_floor_excludes_dissimilar() {
    let db = create_test_db();
    let store = MemoryStore::new(&db);
    store
        .store(&MemoryDraft::new("orthogonal memory").with_embedding(axis(1)))
        .unwrap();

    let results = store.search("query", &axis(0), 5, 0.3).unwrap();
    assert!(results.is_empty());

    // Lowering the floor below the similarity (0.0) admits it
    let results = store.search("query", &axis(0), 5, -0.5).unwrap();
    assert_eq!(results.len(), 1);
}

#[test]
fn test_search_validation() {
    let db = create_test_db();
    let store = MemoryStore::new(&db);

    assert!(matches!(store.search("q", &axis(0), 0, 0.3), Err(Error::InvalidInput(_))));
    assert!(matches!(
        store.search("q", &axis(0), MAX_SEARCH_LIMIT + 1, 0.3),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(store.search("", &axis(0), 5, 0.3), Err(Error::EmptyInput)));
    assert!(matches!(store.search("q", &axis(0), 5, 1.5), Err(Error::InvalidInput(_))));
    assert!(matches!(
        store.search("q", &axis(0), 5, f64::NAN),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        store.search("q", &[0.5; 10], 5, 0.3),
        Err(Error::InvalidEmbedding(_))
    ));
}

#[test]
fn test_search_fts() {
    let db = create_test_db();
    let store = MemoryStore::new(&db);
    let id = store
        .store(&MemoryDraft::new("deploys happen on Thursdays"))
        .unwrap()
        .unwrap();
    store.store(&MemoryDraft::new("lunch is at noon")).unwrap();

    let results = store.search_fts("deploys", 5).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].memory_id, id);
    assert!(matches!(store.search_fts("  ", 5), Err(Error::EmptyInput)));
}

#[test]
fn test_get_memories_newest_first() {
    let db = create_test_db();
    let old = db
        .insert_with_time("first", None, "2024-01-01T00:00:00.000000Z")
        .unwrap();
    let mid = db
        .insert_with_time("second", None, "2024-01-02T00:00:00.000000Z")
        .unwrap();
    let new = db
        .insert_with_time("third", None, "2024-01-03T00:00:00.000000Z")
        .unwrap();
    let store = MemoryStore::new(&db);

    let page = store.get_memories(2, 0).unwrap();
    let ids: Vec<&str> = page.iter().map(|m| m.memory_id.as_str()).collect();
    assert_eq!(ids, vec![new.as_str(), mid.as_str()]);

    let rest = store.get_memories(2, 2).unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].memory_id, old);

    assert!(store.get_memories(2, 10).unwrap().is_empty());
    assert!(matches!(store.get_memories(0, 0), Err(Error::InvalidInput(_))));
}

#[test]
fn test_delete_memory_once() {
    let db = create_test_db();
    let store = MemoryStore::new(&db);
    let id = store
        .store(&MemoryDraft::new("temporary note"))
        .unwrap()
        .unwrap();

    assert!(store.delete_memory(&id).unwrap());
    assert!(!store.delete_memory(&id).unwrap());
    assert!(!store
        .delete_memory("00000000-0000-4000-8000-000000000000")
        .unwrap());
    assert!(matches!(
        store.delete_memory("not-a-uuid"),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn test_get_stats() {
    let db = create_test_db();
    let store = MemoryStore::new(&db);
    store
        .store(&MemoryDraft::new("I like green tea").with_embedding(axis(0)))
        .unwrap();
    store
        .store(&MemoryDraft::new("We decided to use Postgres").with_source("meeting"))
        .unwrap();

    let stats = store.get_stats().unwrap();
    assert_eq!(stats.total_memories, 2);
    assert_eq!(stats.with_embedding, 1);
    assert_eq!(stats.lexical_only, 1);
    assert_eq!(stats.by_source.get("meeting"), Some(&1));

    let record = stats.to_record();
    assert_eq!(record["total_memories"], json!(2));
    assert_eq!(record["source.user"], json!(1));
}

#[test]
fn test_should_capture_delegates() {
    let db = create_test_db();
    let store = MemoryStore::new(&db);
    assert!(store.should_capture("Remember that I work from Lisbon").unwrap());
    assert!(!store.should_capture("what time is it?").unwrap());
}

#[test]
fn test_blend_weights() {
    let default = BlendWeights::default();
    assert_eq!(default.semantic(), 0.7);
    assert_eq!(default.lexical(), 0.3);
    assert_eq!(BlendWeights::new(0.7, 0.3).unwrap(), default);

    let semantic_only = BlendWeights::new(1.0, 0.0).unwrap();
    assert_eq!(semantic_only.semantic(), 1.0);
    assert_eq!(semantic_only.lexical(), 0.0);
    assert!(matches!(BlendWeights::new(0.0, 0.0), Err(Error::Configuration(_))));
    assert!(BlendWeights::new(-0.1, 0.5).is_err());
    assert!(BlendWeights::new(f64::INFINITY, 0.5).is_err());
}

/// Backend that records the blend weights it receives and never stores rows.
#[derive(Default)]
struct RecordingBackend {
    weights: std::cell::Cell<Option<(f64, f64)>>,
}

impl Backend for RecordingBackend {
    fn get_setting(&self, _key: &str) -> backend::Result<Option<StoredSetting>> {
        Ok(None)
    }

    fn set_setting(&self, _key: &str, _setting: &StoredSetting) -> backend::Result<()> {
        Ok(())
    }

    fn get_all_settings(&self) -> backend::Result<Vec<(String, StoredSetting)>> {
        Ok(Vec::new())
    }

    fn store_memory(&self, _memory: &NewMemory<'_>) -> backend::Result<Option<String>> {
        Ok(None)
    }

    fn hybrid_search(&self, query: &HybridQuery<'_>) -> backend::Result<Vec<Memory>> {
        self.weights
            .set(Some((query.semantic_weight, query.lexical_weight)));
        Ok(Vec::new())
    }

    fn fts_search(&self, _query: &str, _limit: usize) -> backend::Result<Vec<Memory>> {
        Ok(Vec::new())
    }

    fn should_capture(&self, _text: &str) -> backend::Result<bool> {
        Ok(false)
    }

    fn stats(&self) -> backend::Result<Stats> {
        Ok(Stats::default())
    }

    fn list_memories(&self, _limit: usize, _offset: usize) -> backend::Result<Vec<MemorySummary>> {
        Ok(Vec::new())
    }

    fn delete_memory(&self, _memory_id: &str) -> backend::Result<bool> {
        Ok(false)
    }
}

#[test]
fn test_store_without_row_is_none() {
    let backend = RecordingBackend::default();
    let store = MemoryStore::new(&backend);
    assert_eq!(store.store(&MemoryDraft::new("anything")).unwrap(), None);
}

#[test]
fn test_blend_passed_to_backend() {
    let backend = RecordingBackend::default();

    MemoryStore::new(&backend)
        .search("q", &axis(0), 5, 0.3)
        .unwrap();
    assert_eq!(backend.weights.get(), Some((0.7, 0.3)));

    MemoryStore::new(&backend)
        .with_blend(BlendWeights::new(0.5, 0.5).unwrap())
        .search("q", &axis(0), 5, 0.3)
        .unwrap();
    assert_eq!(backend.weights.get(), Some((0.5, 0.5)));
}

#[test]
fn test_unavailable_backend_maps_error() {
    struct DownBackend;
    impl Backend for DownBackend {
        fn get_setting(&self, _key: &str) -> backend::Result<Option<StoredSetting>> {
            Err(backend::Error::Unavailable("down".to_string()))
        }
        fn set_setting(&self, _key: &str, _setting: &StoredSetting) -> backend::Result<()> {
            Err(backend::Error::Unavailable("down".to_string()))
        }
        fn get_all_settings(&self) -> backend::Result<Vec<(String, StoredSetting)>> {
            Err(backend::Error::Unavailable("down".to_string()))
        }
        fn store_memory(&self, _memory: &NewMemory<'_>) -> backend::Result<Option<String>> {
            Err(backend::Error::Unavailable("down".to_string()))
        }
        fn hybrid_search(&self, _query: &HybridQuery<'_>) -> backend::Result<Vec<Memory>> {
            Err(backend::Error::Unavailable("down".to_string()))
        }
        fn fts_search(&self, _query: &str, _limit: usize) -> backend::Result<Vec<Memory>> {
            Err(backend::Error::Unavailable("down".to_string()))
        }
        fn should_capture(&self, _text: &str) -> backend::Result<bool> {
            Err(backend::Error::Unavailable("down".to_string()))
        }
        fn stats(&self) -> backend::Result<Stats> {
            Err(backend::Error::Unavailable("down".to_string()))
        }
        fn list_memories(&self, _limit: usize, _offset: usize) -> backend::Result<Vec<MemorySummary>> {
            Err(backend::Error::Unavailable("down".to_string()))
        }
        fn delete_memory(&self, _memory_id: &str) -> backend::Result<bool> {
            Err(backend::Error::Unavailable("down".to_string()))
        }
    }

    let store = MemoryStore::new(&DownBackend);
    assert!(matches!(
        store.store(&MemoryDraft::new("x")),
        Err(Error::StoreUnavailable(_))
    ));
    assert!(matches!(store.get_stats(), Err(Error::StoreUnavailable(_))));
}
