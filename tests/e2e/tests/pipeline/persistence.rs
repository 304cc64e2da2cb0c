//! Index persistence: load-if-present, else build, and rebuild on
//! anything unreadable.

use std::sync::Arc;

use crescentbot_e2e_tests::mocks::{
    sample_corpus, sample_vectors, FakeEmbedder, FakeGenerative, ScriptedRandom,
    A_CSC_FEE, CONFIDENT_QUERY,
};
use crescentbot_core::{EngineConfig, Outcome, RetrievalEngine};

async fn build_engine(
    cache: std::path::PathBuf,
) -> (RetrievalEngine, Arc<FakeEmbedder>) {
    let embedder = Arc::new(FakeEmbedder::new(sample_vectors()));
    let config = EngineConfig {
        index_cache: Some(cache),
        ..EngineConfig::default()
    };
    let engine = RetrievalEngine::new(
        sample_corpus(),
        embedder.clone(),
        Arc::new(FakeGenerative::failing()),
        config,
    )
    .await
    .expect("engine builds");
    (engine, embedder)
}

#[tokio::test]
async fn index_is_persisted_then_loaded_without_reembedding() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("questions.usearch");

    // First engine builds and saves.
    let (_, embedder) = build_engine(cache.clone()).await;
    assert_eq!(embedder.batch_calls(), 1);
    assert!(cache.exists());

    // Second engine loads; the corpus is never re-embedded.
    let (engine, embedder) = build_engine(cache).await;
    assert_eq!(embedder.batch_calls(), 0);

    engine.set_random_source(Box::new(ScriptedRandom::new(vec![0.9])));
    let answer = engine.answer(CONFIDENT_QUERY).await;
    assert_eq!(answer.outcome, Outcome::Corpus);
    assert_eq!(answer.text, A_CSC_FEE);
}

#[tokio::test]
async fn corrupt_persisted_index_triggers_a_full_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("questions.usearch");

    let (_, _) = build_engine(cache.clone()).await;
    std::fs::write(cache.with_extension("meta.json"), "definitely not json").unwrap();

    // The unreadable artifact is not fatal: the engine rebuilds and works.
    let (engine, embedder) = build_engine(cache).await;
    assert_eq!(embedder.batch_calls(), 1);

    engine.set_random_source(Box::new(ScriptedRandom::new(vec![0.9])));
    let answer = engine.answer(CONFIDENT_QUERY).await;
    assert_eq!(answer.outcome, Outcome::Corpus);
}

#[tokio::test]
async fn filtered_subsets_are_never_served_from_the_persisted_index() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("questions.usearch");

    let (engine, embedder) = build_engine(cache).await;
    assert_eq!(embedder.batch_calls(), 1);

    // A constrained subset must be embedded fresh, not loaded from disk.
    let mut criteria = crescentbot_core::FilterCriteria::default();
    criteria.level.insert("100".to_string());
    engine.set_filters(&criteria).await.unwrap();
    assert_eq!(embedder.batch_calls(), 2);
}
