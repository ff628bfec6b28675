//! Memory store: storage, hybrid search, paging and deletion.
//!
//! Vectors are normalized into the backend's literal form here; ranking,
//! persistence and ID assignment are delegated to the [`Backend`].
//!
//! [`Backend`]: crate::backend::Backend

mod crud;
mod search;

// pub(crate): module internals hidden; public items re-exported explicitly
pub(crate) mod store;

pub use crud::MemoryDraft;
pub use store::{
    BlendWeights, DEFAULT_MIN_SIMILARITY, DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_LIMIT,
    MAX_INPUT_LENGTH, MAX_SEARCH_LIMIT, MemoryStore,
};

#[cfg(test)]
mod tests;
