//! Nearest-Neighbor Vector Index
//!
//! USearch-backed index over the corpus subset's question embeddings.
//! Vectors are keyed by subset position (0..len). Search reports cosine
//! similarity as `1 - distance`, best-first, so "higher is better"
//! everywhere downstream.
//!
//! Persistence is an optimization, not a requirement: `save` writes the
//! native index plus a small metadata sidecar, and `load` verifies the
//! sidecar against the expected corpus shape. Any unreadable or mismatched
//! artifact is reported as an error for the caller to recover from with a
//! full rebuild.

use std::path::Path;

use serde::{Deserialize, Serialize};
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::embeddings::Embedding;

// ============================================================================
// CONSTANTS
// ============================================================================

/// HNSW connectivity parameter (higher = better recall, more memory).
pub const DEFAULT_CONNECTIVITY: usize = 16;

/// HNSW expansion factor for index building.
pub const DEFAULT_EXPANSION_ADD: usize = 128;

/// HNSW expansion factor for search.
pub const DEFAULT_EXPANSION_SEARCH: usize = 64;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Vector index error types.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum VectorSearchError {
    /// Failed to create the index.
    IndexCreation(String),
    /// Failed to add a vector.
    IndexAdd(String),
    /// Failed to search.
    IndexSearch(String),
    /// Failed to persist or load the index.
    IndexPersistence(String),
    /// Dimension mismatch (expected, got).
    InvalidDimensions(usize, usize),
}

impl std::fmt::Display for VectorSearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorSearchError::IndexCreation(e) => write!(f, "index creation failed: {}", e),
            VectorSearchError::IndexAdd(e) => write!(f, "failed to add vector: {}", e),
            VectorSearchError::IndexSearch(e) => write!(f, "search failed: {}", e),
            VectorSearchError::IndexPersistence(e) => write!(f, "index persistence failed: {}", e),
            VectorSearchError::InvalidDimensions(expected, got) => {
                write!(f, "invalid dimensions: expected {}, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for VectorSearchError {}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the vector index.
#[derive(Debug, Clone)]
pub struct VectorIndexConfig {
    /// Vector dimensionality; must match the embedding provider.
    pub dimensions: usize,
    /// HNSW connectivity parameter.
    pub connectivity: usize,
    /// Expansion factor when adding vectors.
    pub expansion_add: usize,
    /// Expansion factor when searching.
    pub expansion_search: usize,
}

impl VectorIndexConfig {
    /// Default parameters for the given dimensionality.
    pub fn for_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            connectivity: DEFAULT_CONNECTIVITY,
            expansion_add: DEFAULT_EXPANSION_ADD,
            expansion_search: DEFAULT_EXPANSION_SEARCH,
        }
    }

    fn index_options(&self) -> IndexOptions {
        IndexOptions {
            dimensions: self.dimensions,
            metric: MetricKind::Cos,
            quantization: ScalarKind::F32,
            connectivity: self.connectivity,
            expansion_add: self.expansion_add,
            expansion_search: self.expansion_search,
            multi: false,
        }
    }
}

/// Metadata sidecar written next to a persisted index.
#[derive(Debug, Serialize, Deserialize)]
struct IndexMeta {
    dimensions: usize,
    len: usize,
}

// ============================================================================
// VECTOR INDEX
// ============================================================================

/// Cosine-similarity nearest-neighbor index keyed by subset position.
pub struct VectorIndex {
    index: Index,
    config: VectorIndexConfig,
}

impl VectorIndex {
    /// Create an empty index for the given dimensionality.
    pub fn new(dimensions: usize) -> Result<Self, VectorSearchError> {
        Self::with_config(VectorIndexConfig::for_dimensions(dimensions))
    }

    /// Create an empty index with explicit parameters.
    pub fn with_config(config: VectorIndexConfig) -> Result<Self, VectorSearchError> {
        let index = Index::new(&config.index_options())
            .map_err(|e| VectorSearchError::IndexCreation(e.to_string()))?;
        Ok(Self { index, config })
    }

    /// Build an index from one embedding per subset entry, keyed by the
    /// embedding's position in `vectors`.
    pub fn build(
        dimensions: usize,
        vectors: &[Embedding],
    ) -> Result<Self, VectorSearchError> {
        let mut built = Self::new(dimensions)?;
        built.reserve(vectors.len())?;
        for (position, embedding) in vectors.iter().enumerate() {
            built.add(position, &embedding.vector)?;
        }
        Ok(built)
    }

    /// Number of vectors in the index.
    pub fn len(&self) -> usize {
        self.index.size()
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimensionality.
    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    /// Reserve capacity. Must be called before `add`; USearch requires the
    /// reservation to avoid reallocation faults.
    pub fn reserve(&self, capacity: usize) -> Result<(), VectorSearchError> {
        self.index
            .reserve(capacity)
            .map_err(|e| VectorSearchError::IndexCreation(format!("failed to reserve: {}", e)))
    }

    /// Add a vector at a subset position.
    pub fn add(&mut self, position: usize, vector: &[f32]) -> Result<(), VectorSearchError> {
        if vector.len() != self.config.dimensions {
            return Err(VectorSearchError::InvalidDimensions(
                self.config.dimensions,
                vector.len(),
            ));
        }

        if self.index.size() >= self.index.capacity() {
            let new_capacity = std::cmp::max(self.index.capacity() * 2, 16);
            self.reserve(new_capacity)?;
        }

        self.index
            .add(position as u64, vector)
            .map_err(|e| VectorSearchError::IndexAdd(e.to_string()))
    }

    /// Top-k nearest neighbors as `(position, similarity)` pairs,
    /// best-first. Similarity is `1 - cosine distance`. Neighbors whose key
    /// falls outside the indexed range are skipped rather than surfaced.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<(usize, f32)>, VectorSearchError> {
        if query.len() != self.config.dimensions {
            return Err(VectorSearchError::InvalidDimensions(
                self.config.dimensions,
                query.len(),
            ));
        }

        if self.is_empty() || k == 0 {
            return Ok(vec![]);
        }

        let matches = self
            .index
            .search(query, k)
            .map_err(|e| VectorSearchError::IndexSearch(e.to_string()))?;

        let len = self.len() as u64;
        let mut results = Vec::with_capacity(matches.keys.len());
        for (key, distance) in matches.keys.iter().zip(matches.distances.iter()) {
            if *key >= len {
                continue;
            }
            results.push((*key as usize, 1.0 - distance));
        }
        Ok(results)
    }

    /// Persist the index and its metadata sidecar.
    pub fn save(&self, path: &Path) -> Result<(), VectorSearchError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| VectorSearchError::IndexPersistence("invalid path".to_string()))?;

        self.index
            .save(path_str)
            .map_err(|e| VectorSearchError::IndexPersistence(e.to_string()))?;

        let meta = IndexMeta {
            dimensions: self.config.dimensions,
            len: self.len(),
        };
        let meta_str = serde_json::to_string(&meta)
            .map_err(|e| VectorSearchError::IndexPersistence(e.to_string()))?;
        std::fs::write(meta_path(path), meta_str)
            .map_err(|e| VectorSearchError::IndexPersistence(e.to_string()))?;

        Ok(())
    }

    /// Load a persisted index, verifying it matches the expected corpus
    /// shape. Any mismatch or unreadable artifact is an error; the caller
    /// recovers by rebuilding.
    pub fn load(
        path: &Path,
        expected_dimensions: usize,
        expected_len: usize,
    ) -> Result<Self, VectorSearchError> {
        let meta_str = std::fs::read_to_string(meta_path(path))
            .map_err(|e| VectorSearchError::IndexPersistence(e.to_string()))?;
        let meta: IndexMeta = serde_json::from_str(&meta_str)
            .map_err(|e| VectorSearchError::IndexPersistence(e.to_string()))?;

        if meta.dimensions != expected_dimensions {
            return Err(VectorSearchError::InvalidDimensions(
                expected_dimensions,
                meta.dimensions,
            ));
        }
        if meta.len != expected_len {
            return Err(VectorSearchError::IndexPersistence(format!(
                "persisted index holds {} vectors, corpus has {}",
                meta.len, expected_len
            )));
        }

        let path_str = path
            .to_str()
            .ok_or_else(|| VectorSearchError::IndexPersistence("invalid path".to_string()))?;

        let config = VectorIndexConfig::for_dimensions(expected_dimensions);
        let index = Index::new(&config.index_options())
            .map_err(|e| VectorSearchError::IndexCreation(e.to_string()))?;
        index
            .load(path_str)
            .map_err(|e| VectorSearchError::IndexPersistence(e.to_string()))?;

        let loaded = Self { index, config };
        if loaded.len() != expected_len {
            return Err(VectorSearchError::IndexPersistence(format!(
                "loaded index holds {} vectors, expected {}",
                loaded.len(),
                expected_len
            )));
        }
        Ok(loaded)
    }
}

fn meta_path(path: &Path) -> std::path::PathBuf {
    path.with_extension("meta.json")
}

// ============================================================================
// TESTS
// ============================================================================
