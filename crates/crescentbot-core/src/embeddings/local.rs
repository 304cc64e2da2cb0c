//! Local Embedding Provider
//!
//! On-device sentence embeddings via fastembed (ONNX inference, no network
//! calls after the one-time model download). Uses all-MiniLM-L6-v2, the
//! 384-dimension model family the reference corpus was encoded with.
//!
//! The model is a process-wide resource: loaded lazily on first use, shared
//! behind a mutex, released at process shutdown. Read-only after
//! initialization, so concurrent sessions share it freely.

use std::sync::{Mutex, OnceLock};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::{Embedding, EmbeddingError, EmbeddingProvider};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Output dimensionality of all-MiniLM-L6-v2.
pub const EMBEDDING_DIMENSIONS: usize = 384;

/// Maximum text length in bytes before truncation.
pub const MAX_TEXT_LENGTH: usize = 1024;

/// Batch size for efficient embedding generation.
pub const BATCH_SIZE: usize = 32;

// ============================================================================
// GLOBAL MODEL
// ============================================================================

static EMBEDDING_MODEL: OnceLock<Result<Mutex<TextEmbedding>, String>> = OnceLock::new();

/// Cache directory for downloaded model files.
/// `FASTEMBED_CACHE_PATH` wins; otherwise the platform cache directory.
fn model_cache_dir() -> std::path::PathBuf {
    if let Ok(path) = std::env::var("FASTEMBED_CACHE_PATH") {
        return std::path::PathBuf::from(path);
    }

    if let Some(proj_dirs) = directories::ProjectDirs::from("com", "crescentbot", "core") {
        return proj_dirs.cache_dir().join("fastembed");
    }

    std::path::PathBuf::from(".fastembed_cache")
}

fn model() -> Result<std::sync::MutexGuard<'static, TextEmbedding>, EmbeddingError> {
    let result = EMBEDDING_MODEL.get_or_init(|| {
        let cache_dir = model_cache_dir();
        if let Err(e) = std::fs::create_dir_all(&cache_dir) {
            tracing::warn!("failed to create model cache directory {:?}: {}", cache_dir, e);
        }

        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(false)
            .with_cache_dir(cache_dir);

        TextEmbedding::try_new(options)
            .map(Mutex::new)
            .map_err(|e| format!("failed to initialize all-MiniLM-L6-v2: {e}"))
    });

    match result {
        Ok(model) => model
            .lock()
            .map_err(|e| EmbeddingError::ModelInit(format!("lock poisoned: {e}"))),
        Err(err) => Err(EmbeddingError::ModelInit(err.clone())),
    }
}

/// Truncate to `MAX_TEXT_LENGTH` bytes without splitting a UTF-8 character.
fn truncate(text: &str) -> &str {
    if text.len() <= MAX_TEXT_LENGTH {
        return text;
    }
    let mut end = MAX_TEXT_LENGTH;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

// ============================================================================
// PROVIDER
// ============================================================================

/// Embedding provider backed by the shared local model.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalEmbedder;

impl LocalEmbedder {
    pub fn new() -> Self {
        Self
    }

    /// Force model initialization (downloads files if necessary). Lets the
    /// serving layer pay the cost at startup rather than on the first query.
    pub fn init(&self) -> Result<(), EmbeddingError> {
        model().map(|_| ())
    }

    fn embed_sync(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("text cannot be empty".to_string()));
        }

        let mut model = model()?;
        let vectors = model
            .embed(vec![truncate(text)], None)
            .map_err(|e| EmbeddingError::ProviderUnavailable(e.to_string()))?;

        vectors
            .into_iter()
            .next()
            .map(Embedding::new)
            .ok_or_else(|| EmbeddingError::ProviderUnavailable("no embedding generated".to_string()))
    }

    fn embed_batch_sync(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut model = model()?;
        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            let truncated: Vec<&str> = chunk.iter().map(|t| truncate(t)).collect();
            let vectors = model
                .embed(truncated, None)
                .map_err(|e| EmbeddingError::ProviderUnavailable(e.to_string()))?;
            all.extend(vectors.into_iter().map(Embedding::new));
        }
        Ok(all)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedder {
    fn dimensions(&self) -> usize {
        EMBEDDING_DIMENSIONS
    }

    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.embed_sync(text)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        self.embed_batch_sync(texts)
    }
}
