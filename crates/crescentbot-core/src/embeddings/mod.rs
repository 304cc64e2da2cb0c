//! Embedding Boundary
//!
//! Maps text to fixed-dimension vectors for similarity comparison. The
//! provider is a pluggable external capability: the bundled [`LocalEmbedder`]
//! runs a local ONNX model, but any implementation that is deterministic
//! within a session and declares a fixed dimension will do (a remote API
//! client, a test fake).
//!
//! A failed or unreachable provider surfaces as
//! [`EmbeddingError::ProviderUnavailable`]; the retrieval engine treats that
//! as "no local match" and routes to the generative fallback instead of
//! propagating the error to the user.

#[cfg(feature = "local-embeddings")]
mod local;

#[cfg(feature = "local-embeddings")]
pub use local::{LocalEmbedder, BATCH_SIZE, EMBEDDING_DIMENSIONS, MAX_TEXT_LENGTH};

use async_trait::async_trait;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Embedding error types.
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum EmbeddingError {
    /// The provider could not be reached or returned malformed output.
    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// The local model failed to initialize.
    #[error("embedding model initialization failed: {0}")]
    ModelInit(String),
    /// The input cannot be embedded (empty text).
    #[error("invalid embedding input: {0}")]
    InvalidInput(String),
}

// ============================================================================
// EMBEDDING TYPE
// ============================================================================

/// A fixed-length vector representation of a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// The embedding vector.
    pub vector: Vec<f32>,
    /// Dimensions of the vector.
    pub dimensions: usize,
}

impl Embedding {
    /// Create a new embedding from a vector.
    pub fn new(vector: Vec<f32>) -> Self {
        let dimensions = vector.len();
        Self { vector, dimensions }
    }

    /// Cosine similarity with another embedding; 0.0 on dimension mismatch.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        cosine_similarity(&self.vector, &other.vector)
    }

    /// Normalize the vector to unit length in place.
    pub fn normalize(&mut self) {
        let norm = self.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut self.vector {
                *x /= norm;
            }
        }
    }
}

// ============================================================================
// PROVIDER TRAIT
// ============================================================================

/// A pluggable source of embeddings.
///
/// Implementations must be deterministic within a session (same text, same
/// vector; the engine caches query embeddings on that assumption) and must
/// return vectors of exactly [`EmbeddingProvider::dimensions`] length from
/// every call.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Fixed output dimensionality of this provider instance.
    fn dimensions(&self) -> usize;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Embed a batch of texts, one vector per input, in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError>;
}

// ============================================================================
// SIMILARITY
// ============================================================================

/// Cosine similarity between two vectors; 0.0 on length mismatch.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = (norm_a * norm_b).sqrt();
    if denominator > 0.0 {
        dot / denominator
    } else {
        0.0
    }
}

// ============================================================================
// TESTS
// ============================================================================
