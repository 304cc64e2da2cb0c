//! Retrieval Engine
//!
//! Orchestrates normalization -> correction -> embedding -> index search ->
//! threshold decision -> corpus answer or generative fallback, and derives
//! the auxiliary outputs (department category, related questions, canned
//! small-talk replies).
//!
//! The engine's public surface never returns a raw provider error: every
//! failure resolves to a defined [`Answer`] with a typed [`Outcome`], so the
//! session layer branches on a tag instead of catching exceptions. A single
//! request's failure never terminates the session.
//!
//! All methods take `&self`. The corpus, rule tables, dictionary and
//! category map are read-only after construction; the only interior
//! mutability is around the query-embedding cache, the randomness source,
//! and the active subset during a filter-driven rebuild.

mod smalltalk;

pub use smalltalk::{
    is_greeting, pick, RandomSource, ThreadRandom, GREETINGS, GREETING_REPLIES, HEDGE_PREFIXES,
};

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use lru::LruCache;
use serde::Serialize;

use crate::corpus::{extract_category, CategoryMap, Corpus, FilterCriteria};
use crate::embeddings::{EmbeddingError, EmbeddingProvider};
use crate::fallback::{
    ChatTurn, FallbackRequest, GenerativeProvider, APOLOGY_REPLY, SYSTEM_PROMPT,
};
use crate::normalize::Normalizer;
use crate::search::{VectorIndex, VectorSearchError};
use crate::spell::{CorrectionMode, SpellCorrector};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default confidence threshold. Scores are cosine similarities, so "below
/// threshold" means "not confident".
pub const DEFAULT_THRESHOLD: f32 = 0.4;

/// Default top-k; k > 1 feeds the related-questions list.
pub const DEFAULT_TOP_K: usize = 5;

/// Default probability of prefixing a confident answer with a hedge.
pub const DEFAULT_HEDGE_PROBABILITY: f32 = 0.2;

/// Shown when the corrected query is empty.
pub const EMPTY_QUERY_REPLY: &str =
    "I didn't catch a question there. Could you rephrase it?";

/// Shown when the active filters leave no corpus entries. This is a defined
/// result state, distinct from "no match above threshold".
pub const NO_FILTER_DATA_REPLY: &str = "No matching data found for your filters.";

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Errors raised while constructing the engine or rebuilding its index.
/// Per-query failures never surface as errors; they resolve to [`Answer`]s.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Embedding the corpus subset failed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    /// Building the vector index failed.
    #[error(transparent)]
    Index(#[from] VectorSearchError),
}

// ============================================================================
// RESULT TYPES
// ============================================================================

/// How an answer was produced. The typed tag replacing
/// exception-as-control-flow: callers branch on this instead of catching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Greeting short-circuit; no embedding performed.
    SmallTalk,
    /// Query equalled a corpus question verbatim; no scoring performed.
    ExactMatch,
    /// Confident local match above the threshold.
    Corpus,
    /// Below threshold; text came from the generative fallback.
    Fallback,
    /// The generative fallback failed; text is the static apology.
    FallbackUnavailable,
    /// The corrected query was empty; nothing to retrieve.
    EmptyQuery,
    /// The active filters leave no corpus entries.
    NoFilteredData,
}

/// The engine's reply to one query.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Text for the presentation layer to render.
    pub text: String,
    /// Department derived from the matched question's course code, if any.
    pub category: Option<String>,
    /// Next-best matched questions, rank order preserved.
    pub related: Vec<String>,
    /// Whether the text came from the local corpus (or small talk) rather
    /// than the fallback path.
    pub matched: bool,
    /// How the answer was produced.
    pub outcome: Outcome,
}

impl Answer {
    fn unmatched(text: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            text: text.into(),
            category: None,
            related: Vec::new(),
            matched: false,
            outcome,
        }
    }

    fn direct(text: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            text: text.into(),
            category: None,
            related: Vec::new(),
            matched: true,
            outcome,
        }
    }
}

/// The pinned threshold convention: a score exactly at the threshold is
/// confident. Scores are similarities, so higher is better.
#[inline]
pub fn is_confident(score: f32, threshold: f32) -> bool {
    score >= threshold
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Similarity score at or above which a local match is trusted.
    pub threshold: f32,
    /// Number of neighbors fetched per query.
    pub top_k: usize,
    /// Probability of prefixing a confident answer with a hedge phrase.
    pub hedge_probability: f32,
    /// Spelling-correction granularity.
    pub correction: CorrectionMode,
    /// Upper bound on each embedding or generative call.
    pub provider_timeout: Duration,
    /// Model identifier passed to the generative fallback.
    pub fallback_model: String,
    /// Optional cap on fallback output length.
    pub fallback_max_tokens: Option<u32>,
    /// Fallback sampling temperature.
    pub fallback_temperature: f32,
    /// How many trailing conversation turns accompany a fallback prompt.
    pub history_window: usize,
    /// Capacity of the query-embedding LRU cache.
    pub query_cache_size: usize,
    /// Where to persist the full-corpus index, if anywhere. Load-if-present,
    /// else build-and-save; unreadable artifacts trigger a rebuild.
    pub index_cache: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            hedge_probability: DEFAULT_HEDGE_PROBABILITY,
            correction: CorrectionMode::Word,
            provider_timeout: Duration::from_secs(30),
            fallback_model: "gpt-3.5-turbo".to_string(),
            fallback_max_tokens: Some(300),
            fallback_temperature: 0.3,
            history_window: 6,
            query_cache_size: 128,
            index_cache: None,
        }
    }
}

// ============================================================================
// ACTIVE SUBSET
// ============================================================================

/// The filtered corpus view the engine currently answers from. Replaced
/// wholesale whenever the filter selection changes.
struct ActiveSubset {
    /// Corpus positions in the subset, in corpus order.
    positions: Vec<usize>,
    /// Normalized question text per subset entry, for the exact-match
    /// short-circuit (raw questions carry punctuation the cleaned query
    /// never has).
    cleaned_questions: Vec<String>,
    /// Index over the subset's question embeddings; `None` when empty.
    index: Option<VectorIndex>,
}

// ============================================================================
// ENGINE
// ============================================================================

/// The retrieval-and-fallback decision core.
pub struct RetrievalEngine {
    corpus: Arc<Corpus>,
    embedder: Arc<dyn EmbeddingProvider>,
    generative: Arc<dyn GenerativeProvider>,
    normalizer: Normalizer,
    corrector: SpellCorrector,
    categories: CategoryMap,
    config: EngineConfig,
    rng: Mutex<Box<dyn RandomSource>>,
    query_cache: Mutex<LruCache<String, Vec<f32>>>,
    active: RwLock<ActiveSubset>,
}

impl RetrievalEngine {
    /// Build an engine over the full corpus. Embeds every question (or loads
    /// the persisted index when configured and valid).
    pub async fn new(
        corpus: Corpus,
        embedder: Arc<dyn EmbeddingProvider>,
        generative: Arc<dyn GenerativeProvider>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let corpus = Arc::new(corpus);
        let normalizer = Normalizer::new();

        // Seed corpus vocabulary into the dictionary so domain terms are
        // never "corrected" away and exact-match queries survive cleaning.
        let mut corrector = SpellCorrector::new();
        for entry in corpus.iter() {
            for token in normalizer.normalize(&entry.question).split_whitespace() {
                corrector.add_term(token, 100);
            }
        }

        let positions: Vec<usize> = (0..corpus.len()).collect();
        let active = build_active_subset(
            &corpus,
            &normalizer,
            embedder.as_ref(),
            &config,
            positions,
            true,
        )
        .await?;

        let cache_size =
            NonZeroUsize::new(config.query_cache_size).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            corpus,
            embedder,
            generative,
            normalizer,
            corrector,
            categories: CategoryMap::new(),
            config,
            rng: Mutex::new(Box::new(ThreadRandom)),
            query_cache: Mutex::new(LruCache::new(cache_size)),
            active: RwLock::new(active),
        })
    }

    /// Replace the randomness source (tests inject a scripted one).
    pub fn set_random_source(&self, source: Box<dyn RandomSource>) {
        *self.rng.lock().expect("rng lock poisoned") = source;
    }

    /// The corpus this engine answers from.
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Number of entries in the active filtered subset.
    pub fn active_len(&self) -> usize {
        self.active.read().expect("subset lock poisoned").positions.len()
    }

    /// Apply a filter selection: recompute the subset and rebuild its index.
    /// An empty subset is a valid state; queries then resolve to the defined
    /// "no data for these filters" answer.
    pub async fn set_filters(&self, criteria: &FilterCriteria) -> Result<(), EngineError> {
        let positions = self.corpus.apply_filters(criteria);
        let subset = build_active_subset(
            &self.corpus,
            &self.normalizer,
            self.embedder.as_ref(),
            &self.config,
            positions,
            criteria.is_unconstrained(),
        )
        .await?;
        *self.active.write().expect("subset lock poisoned") = subset;
        Ok(())
    }

    /// Answer a query with no conversation context.
    pub async fn answer(&self, raw_query: &str) -> Answer {
        self.answer_with_history(raw_query, &[]).await
    }

    /// Answer a query, supplying recent conversation turns as optional
    /// context for the fallback prompt.
    pub async fn answer_with_history(&self, raw_query: &str, history: &[ChatTurn]) -> Answer {
        let normalized = self.normalizer.normalize(raw_query);
        let cleaned = self.corrector.correct(&normalized, self.config.correction);

        if cleaned.trim().is_empty() {
            return Answer::unmatched(EMPTY_QUERY_REPLY, Outcome::EmptyQuery);
        }

        {
            let active = self.active.read().expect("subset lock poisoned");

            if active.positions.is_empty() {
                return Answer::unmatched(NO_FILTER_DATA_REPLY, Outcome::NoFilteredData);
            }

            if is_greeting(&cleaned) {
                return self.greeting_reply();
            }

            if let Some(position) = self.exact_match(&active, raw_query, &cleaned) {
                if let Some(entry) = self.corpus.get(position) {
                    return Answer::direct(entry.answer.clone(), Outcome::ExactMatch);
                }
            }
        }

        let query_vector = match self.embed_query(&cleaned).await {
            Ok(vector) => vector,
            Err(e) => {
                // Unreachable provider counts as "no local match": route to
                // the fallback instead of surfacing the error.
                tracing::warn!(error = %e, "embedding provider unavailable, routing to fallback");
                return self.run_fallback(raw_query, None, history).await;
            }
        };

        // The subset lock is never held across an await: search synchronously
        // under the read guard, then act on the owned result.
        let search_result = {
            let active = self.active.read().expect("subset lock poisoned");
            let Some(index) = active.index.as_ref() else {
                return Answer::unmatched(NO_FILTER_DATA_REPLY, Outcome::NoFilteredData);
            };
            index
                .search(&query_vector, self.config.top_k)
                .map(|neighbors| resolve_positions(&neighbors, &active.positions))
        };

        let hits = match search_result {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(error = %e, "index search failed, routing to fallback");
                return self.run_fallback(raw_query, None, history).await;
            }
        };

        let Some(&(top_position, top_score)) = hits.first() else {
            return self.run_fallback(raw_query, None, history).await;
        };

        let Some(top_entry) = self.corpus.get(top_position) else {
            return self.run_fallback(raw_query, None, history).await;
        };

        if is_confident(top_score, self.config.threshold) {
            let related: Vec<String> = hits[1..]
                .iter()
                .filter_map(|&(position, _)| self.corpus.get(position))
                .map(|entry| entry.question.clone())
                .collect();
            let category = extract_category(&top_entry.question, &self.categories);
            let text = self.maybe_hedge(top_entry.answer.clone());
            Answer {
                text,
                category,
                related,
                matched: true,
                outcome: Outcome::Corpus,
            }
        } else {
            let context = Some((top_entry.question.as_str(), top_entry.answer.as_str()));
            self.run_fallback(raw_query, context, history).await
        }
    }

    // ------------------------------------------------------------------
    // internals
    // ------------------------------------------------------------------

    fn greeting_reply(&self) -> Answer {
        let mut rng = self.rng.lock().expect("rng lock poisoned");
        let text = pick(rng.as_mut(), GREETING_REPLIES);
        Answer::direct(text, Outcome::SmallTalk)
    }

    /// Exact-match short-circuit: the raw query matches a subset question
    /// verbatim, or the cleaned query matches its normalized form.
    fn exact_match(&self, active: &ActiveSubset, raw: &str, cleaned: &str) -> Option<usize> {
        let raw = raw.trim();
        for (&position, cleaned_question) in
            active.positions.iter().zip(&active.cleaned_questions)
        {
            let entry = self.corpus.get(position)?;
            if raw.eq_ignore_ascii_case(entry.question.trim()) || cleaned == cleaned_question {
                return Some(position);
            }
        }
        None
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if let Some(hit) = self
            .query_cache
            .lock()
            .expect("query cache lock poisoned")
            .get(text)
            .cloned()
        {
            return Ok(hit);
        }

        let embedded = tokio::time::timeout(self.config.provider_timeout, self.embedder.embed(text))
            .await
            .map_err(|_| {
                EmbeddingError::ProviderUnavailable("embedding call timed out".to_string())
            })??;

        self.query_cache
            .lock()
            .expect("query cache lock poisoned")
            .put(text.to_string(), embedded.vector.clone());
        Ok(embedded.vector)
    }

    fn maybe_hedge(&self, answer: String) -> String {
        let mut rng = self.rng.lock().expect("rng lock poisoned");
        apply_hedge(answer, rng.as_mut(), self.config.hedge_probability)
    }

    async fn run_fallback(
        &self,
        raw_query: &str,
        context: Option<(&str, &str)>,
        history: &[ChatTurn],
    ) -> Answer {
        let request = build_fallback_request(&self.config, raw_query, context, history);

        let outcome = tokio::time::timeout(
            self.config.provider_timeout,
            self.generative.generate(&request),
        )
        .await;

        match outcome {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                Answer::unmatched(text, Outcome::Fallback)
            }
            Ok(Ok(_)) => {
                tracing::warn!("generative fallback returned empty text");
                Answer::unmatched(APOLOGY_REPLY, Outcome::FallbackUnavailable)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "generative fallback failed");
                Answer::unmatched(APOLOGY_REPLY, Outcome::FallbackUnavailable)
            }
            Err(_) => {
                tracing::warn!("generative fallback timed out");
                Answer::unmatched(APOLOGY_REPLY, Outcome::FallbackUnavailable)
            }
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Map index hits (keyed by subset position) back to corpus positions,
/// skipping any neighbor outside the subset range.
fn resolve_positions(neighbors: &[(usize, f32)], positions: &[usize]) -> Vec<(usize, f32)> {
    neighbors
        .iter()
        .filter_map(|&(subset_position, score)| {
            positions.get(subset_position).map(|&p| (p, score))
        })
        .collect()
}

/// Prefix `answer` with a hedge phrase with the given probability. Two draws
/// from the source: one for the gate, one for the phrase.
fn apply_hedge(answer: String, rng: &mut dyn RandomSource, probability: f32) -> String {
    if rng.next_f32() < probability {
        format!("{}{}", pick(rng, HEDGE_PREFIXES), answer)
    } else {
        answer
    }
}

/// Compose the fallback request: system instruction, a trailing window of
/// conversation turns, and the user message carrying the best sub-threshold
/// match as context when one exists.
fn build_fallback_request(
    config: &EngineConfig,
    raw_query: &str,
    context: Option<(&str, &str)>,
    history: &[ChatTurn],
) -> FallbackRequest {
    let mut messages: Vec<ChatTurn> = Vec::new();
    let tail = history.len().saturating_sub(config.history_window);
    messages.extend_from_slice(&history[tail..]);

    let user_message = match context {
        Some((question, answer)) => format!(
            "Here is some relevant university information:\nQ: {question}\nA: {answer}\n\n\
             Answer this question: {raw_query}"
        ),
        None => raw_query.to_string(),
    };
    messages.push(ChatTurn::user(user_message));

    FallbackRequest {
        system: SYSTEM_PROMPT.to_string(),
        messages,
        model: config.fallback_model.clone(),
        max_tokens: config.fallback_max_tokens,
        temperature: config.fallback_temperature,
    }
}

/// Build the active subset: embed the subset's questions and index them.
/// When `allow_cache` is set and the subset is the full corpus, a persisted
/// index is loaded if present and valid; anything unreadable triggers a
/// rebuild (and a fresh save).
async fn build_active_subset(
    corpus: &Corpus,
    normalizer: &Normalizer,
    embedder: &dyn EmbeddingProvider,
    config: &EngineConfig,
    positions: Vec<usize>,
    allow_cache: bool,
) -> Result<ActiveSubset, EngineError> {
    let cleaned_questions: Vec<String> = positions
        .iter()
        .filter_map(|&p| corpus.get(p))
        .map(|entry| normalizer.normalize(&entry.question))
        .collect();

    if positions.is_empty() {
        return Ok(ActiveSubset {
            positions,
            cleaned_questions,
            index: None,
        });
    }

    let cache_path = if allow_cache {
        config.index_cache.as_deref()
    } else {
        None
    };

    if let Some(path) = cache_path {
        match VectorIndex::load(path, embedder.dimensions(), positions.len()) {
            Ok(index) => {
                tracing::debug!(path = %path.display(), "loaded persisted question index");
                return Ok(ActiveSubset {
                    positions,
                    cleaned_questions,
                    index: Some(index),
                });
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "persisted index unusable, rebuilding"
                );
            }
        }
    }

    let questions: Vec<String> = positions
        .iter()
        .filter_map(|&p| corpus.get(p))
        .map(|entry| entry.question.clone())
        .collect();
    let embeddings = embedder.embed_batch(&questions).await?;
    let index = VectorIndex::build(embedder.dimensions(), &embeddings)?;

    if let Some(path) = cache_path {
        if let Err(e) = index.save(path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to persist index");
        }
    }

    Ok(ActiveSubset {
        positions,
        cleaned_questions,
        index: Some(index),
    })
}

// ============================================================================
// TESTS
// ============================================================================
