//! Fake providers and fixtures for pipeline tests.
//!
//! The fake embedder hands out hand-built unit vectors keyed by the exact
//! text the engine embeds (raw corpus questions at build time, cleaned
//! queries at answer time), so every similarity score in a test is
//! engineered rather than learned. The fake generative provider records
//! every request it receives for later inspection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use crescentbot_core::engine::RandomSource;
use crescentbot_core::{
    Corpus, CorpusEntry, Embedding, EmbeddingError, EmbeddingProvider, FallbackError,
    FallbackRequest, GenerativeProvider,
};

/// Dimensionality used by every fake vector in the suite.
pub const DIMS: usize = 8;

// ============================================================================
// VECTOR GEOMETRY
// ============================================================================

/// Unit vector along one axis.
pub fn unit(axis: usize) -> Vec<f32> {
    let mut v = vec![0.0; DIMS];
    v[axis] = 1.0;
    v
}

/// Unit vector with cosine `cos` against axis `a`, with the remainder of its
/// weight on axis `b`.
pub fn blend(a: usize, b: usize, cos: f32) -> Vec<f32> {
    let mut v = vec![0.0; DIMS];
    v[a] = cos;
    v[b] = (1.0 - cos * cos).sqrt();
    v
}

// ============================================================================
// FAKE EMBEDDER
// ============================================================================

/// Deterministic embedding provider with engineered vectors.
pub struct FakeEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fail: AtomicBool,
    single_calls: AtomicUsize,
    batch_calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new(vectors: HashMap<String, Vec<f32>>) -> Self {
        Self {
            vectors,
            fail: AtomicBool::new(false),
            single_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
        }
    }

    /// Toggle a simulated outage: every call fails until cleared.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Number of single-text embed calls observed.
    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    /// Number of batch embed calls observed.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(v) = self.vectors.get(text) {
            return v.clone();
        }
        // Unmapped text gets a stable pseudo-vector derived from its bytes,
        // normalized so cosine scores stay well-defined.
        let mut v = vec![0.0f32; DIMS];
        for (i, b) in text.bytes().enumerate() {
            v[i % DIMS] += f32::from(b) / 255.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }

    fn check_available(&self) -> Result<(), EmbeddingError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(EmbeddingError::ProviderUnavailable(
                "simulated outage".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    fn dimensions(&self) -> usize {
        DIMS
    }

    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(Embedding::new(self.vector_for(text)))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(texts
            .iter()
            .map(|t| Embedding::new(self.vector_for(t)))
            .collect())
    }
}

// ============================================================================
// FAKE GENERATIVE PROVIDER
// ============================================================================

enum GenerativeBehavior {
    Reply(String),
    Fail,
    Hang,
}

/// Generative provider that replies, fails, or hangs, and records every
/// request it receives.
pub struct FakeGenerative {
    behavior: GenerativeBehavior,
    requests: Mutex<Vec<FallbackRequest>>,
}

impl FakeGenerative {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            behavior: GenerativeBehavior::Reply(reply.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            behavior: GenerativeBehavior::Fail,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn hanging() -> Self {
        Self {
            behavior: GenerativeBehavior::Hang,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests observed so far.
    pub fn requests(&self) -> Vec<FallbackRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<FallbackRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerativeProvider for FakeGenerative {
    async fn generate(&self, request: &FallbackRequest) -> Result<String, FallbackError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.behavior {
            GenerativeBehavior::Reply(reply) => Ok(reply.clone()),
            GenerativeBehavior::Fail => Err(FallbackError::Transport(
                "simulated outage".to_string(),
            )),
            GenerativeBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok("too late".to_string())
            }
        }
    }
}

// ============================================================================
// SCRIPTED RANDOMNESS
// ============================================================================

/// Randomness source that replays a fixed sequence.
pub struct ScriptedRandom {
    values: Vec<f32>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, cursor: 0 }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f32(&mut self) -> f32 {
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}

// ============================================================================
// CORPUS FIXTURE
// ============================================================================

/// Question used throughout the suite as the engineered top match.
pub const Q_CSC_FEE: &str = "What is the fee for CSC101?";
pub const A_CSC_FEE: &str = "CSC101 is covered by the Computer Science tuition of N297,500.";

pub const Q_HOSTEL: &str = "How do I pay the hostel fee?";
pub const A_HOSTEL: &str = "Hostel fees are paid through the student portal.";

pub const Q_SEMESTER: &str = "When does the first semester start?";
pub const A_SEMESTER: &str = "The first semester begins in the last week of September.";

pub const Q_LAW: &str = "What are the admission requirements for Law?";
pub const A_LAW: &str = "Five O'Level credits including English and Literature.";

pub const Q_SIWES: &str = "How do I register for SIWES?";
pub const A_SIWES: &str = "Register at the SIWES unit at the start of the second semester.";

fn entry(
    question: &str,
    answer: &str,
    department: Option<&str>,
    level: Option<&str>,
    faculty: Option<&str>,
) -> CorpusEntry {
    CorpusEntry {
        question: question.to_string(),
        answer: answer.to_string(),
        department: department.map(str::to_string),
        level: level.map(str::to_string),
        semester: None,
        faculty: faculty.map(str::to_string),
    }
}

/// Five-entry corpus with classification attributes for filter tests.
pub fn sample_corpus() -> Corpus {
    Corpus::from_entries(vec![
        entry(Q_CSC_FEE, A_CSC_FEE, Some("Computer Science"), Some("100"), Some("CICOT")),
        entry(Q_HOSTEL, A_HOSTEL, Some("Student Affairs"), None, None),
        entry(Q_SEMESTER, A_SEMESTER, None, None, None),
        entry(Q_LAW, A_LAW, Some("Law (BACOLAW)"), Some("100"), Some("BACOLAW")),
        entry(Q_SIWES, A_SIWES, None, Some("300"), None),
    ])
}

/// Queries with engineered cleaned forms (all tokens survive normalization
/// and correction unchanged).
pub const CONFIDENT_QUERY: &str = "science tuition";
pub const SUBTHRESHOLD_QUERY: &str = "library exam";

/// Vector table: the confident query sits at cosine 0.95 from the CSC
/// entry and strictly lower against each later entry, giving a known rank
/// order 0 > 1 > 2 > 3 > 4. The sub-threshold query peaks at 0.3 x 0.95
/// against the CSC entry, below the 0.4 default threshold.
pub fn sample_vectors() -> HashMap<String, Vec<f32>> {
    HashMap::from([
        (Q_CSC_FEE.to_string(), blend(0, 1, 0.95)),
        (Q_HOSTEL.to_string(), blend(0, 2, 0.80)),
        (Q_SEMESTER.to_string(), blend(0, 3, 0.70)),
        (Q_LAW.to_string(), blend(0, 4, 0.60)),
        (Q_SIWES.to_string(), blend(0, 5, 0.50)),
        (CONFIDENT_QUERY.to_string(), unit(0)),
        (SUBTHRESHOLD_QUERY.to_string(), blend(0, 6, 0.30)),
    ])
}
