//! Pipeline smoke test: the whole flow wired together with fakes.

use std::sync::Arc;

use crescentbot_e2e_tests::mocks::{
    sample_corpus, sample_vectors, FakeEmbedder, FakeGenerative, ScriptedRandom,
    A_CSC_FEE, CONFIDENT_QUERY,
};
use crescentbot_core::{EngineConfig, Outcome, RetrievalEngine};

#[tokio::test]
async fn full_pipeline_answers_from_the_corpus() {
    let embedder = Arc::new(FakeEmbedder::new(sample_vectors()));
    let generative = Arc::new(FakeGenerative::replying("generated"));

    let engine = RetrievalEngine::new(
        sample_corpus(),
        embedder.clone(),
        generative.clone(),
        EngineConfig::default(),
    )
    .await
    .expect("engine builds");

    // Pin randomness so the hedge gate stays closed.
    engine.set_random_source(Box::new(ScriptedRandom::new(vec![0.9])));

    let answer = engine.answer(CONFIDENT_QUERY).await;
    assert_eq!(answer.outcome, Outcome::Corpus);
    assert!(answer.matched);
    assert_eq!(answer.text, A_CSC_FEE);

    // The corpus was embedded once at build time; the query embedded once.
    assert_eq!(embedder.batch_calls(), 1);
    assert_eq!(embedder.single_calls(), 1);

    // No fallback request was ever made.
    assert!(generative.requests().is_empty());
}
