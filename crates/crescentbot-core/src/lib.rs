//! # Crescentbot Core
//!
//! Retrieval-and-fallback pipeline for a university question/answer
//! assistant. Given a natural-language query, the engine retrieves the
//! closest entry from a curated Q/A corpus and falls back to a generative
//! model when no sufficiently close match exists.
//!
//! Pipeline stages:
//!
//! - **Normalization**: repeat-collapsing, abbreviation/synonym/plural
//!   rewriting with whole-word rules
//! - **Spelling correction**: SymSpell-style delete-neighborhood dictionary
//!   (edit distance ≤ 2), word-by-word or compound
//! - **Embedding**: pluggable provider; bundled local ONNX model
//!   (all-MiniLM-L6-v2, 384 dimensions)
//! - **Vector search**: USearch cosine index over corpus questions, rebuilt
//!   whenever the filter selection changes
//! - **Decision core**: greeting and exact-match short-circuits, confidence
//!   threshold routing, related-question surfacing, department category
//!   extraction, and the generative fallback boundary
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use crescentbot_core::prelude::*;
//!
//! let corpus = Corpus::load_json("data/qa_dataset.json".as_ref())?;
//! let engine = RetrievalEngine::new(
//!     corpus,
//!     Arc::new(LocalEmbedder::new()),
//!     Arc::new(OpenAiChat::from_env()),
//!     EngineConfig::default(),
//! )
//! .await?;
//!
//! let answer = engine.answer("how much is the school fees for csc101").await;
//! println!("{}", answer.text);
//! ```
//!
//! ## Feature Flags
//!
//! - `local-embeddings` (default): bundled fastembed provider
//! - `vector-search` (default): USearch index and the retrieval engine

// ============================================================================
// MODULES
// ============================================================================

pub mod corpus;
pub mod embeddings;
pub mod fallback;
pub mod normalize;
pub mod spell;

#[cfg(feature = "vector-search")]
pub mod engine;

#[cfg(feature = "vector-search")]
pub mod search;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Corpus and filters
pub use corpus::{
    extract_category, CategoryMap, Corpus, CorpusEntry, CorpusError, FilterCriteria,
    FilterField, UNKNOWN_CATEGORY,
};

// Normalization
pub use normalize::{default_rules, merge_tables, Normalizer, RewriteRule};

// Spelling correction
pub use spell::{CorrectionMode, SpellCorrector, MAX_EDIT_DISTANCE, PREFIX_LENGTH};

// Embedding boundary
pub use embeddings::{cosine_similarity, Embedding, EmbeddingError, EmbeddingProvider};

#[cfg(feature = "local-embeddings")]
pub use embeddings::{LocalEmbedder, EMBEDDING_DIMENSIONS};

// Generative fallback boundary
pub use fallback::{
    ChatRole, ChatTurn, FallbackError, FallbackRequest, GenerativeProvider, OpenAiChat,
    APOLOGY_REPLY, SYSTEM_PROMPT,
};

// Vector search (when feature enabled)
#[cfg(feature = "vector-search")]
pub use search::{VectorIndex, VectorIndexConfig, VectorSearchError};

// Retrieval engine (when feature enabled)
#[cfg(feature = "vector-search")]
pub use engine::{
    is_confident, Answer, EngineConfig, EngineError, Outcome, RandomSource, RetrievalEngine,
    ThreadRandom, DEFAULT_THRESHOLD, DEFAULT_TOP_K, EMPTY_QUERY_REPLY, NO_FILTER_DATA_REPLY,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::{
        Corpus, CorpusEntry, FilterCriteria, FilterField, Normalizer, SpellCorrector,
    };

    pub use crate::{ChatTurn, GenerativeProvider, OpenAiChat};

    pub use crate::{Embedding, EmbeddingProvider};

    #[cfg(feature = "local-embeddings")]
    pub use crate::LocalEmbedder;

    #[cfg(feature = "vector-search")]
    pub use crate::{Answer, EngineConfig, Outcome, RetrievalEngine};
}
