//! Vector Search Module
//!
//! Nearest-neighbor search over corpus question embeddings, backed by a
//! USearch index with cosine similarity. One vector per corpus-subset entry,
//! keyed by subset position; the index is rebuilt in full whenever the
//! filtered subset changes.

mod vector;

pub use vector::{
    VectorIndex, VectorIndexConfig, VectorSearchError, DEFAULT_CONNECTIVITY,
    DEFAULT_EXPANSION_ADD, DEFAULT_EXPANSION_SEARCH,
};
