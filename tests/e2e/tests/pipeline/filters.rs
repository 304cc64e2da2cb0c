//! Filter-subset behavior: empty subsets, rebuilds, and scoping.

use std::sync::Arc;

use crescentbot_e2e_tests::mocks::{
    sample_corpus, sample_vectors, FakeEmbedder, FakeGenerative, ScriptedRandom,
    A_CSC_FEE, A_LAW, CONFIDENT_QUERY,
};
use crescentbot_core::{
    EngineConfig, FilterCriteria, Outcome, RetrievalEngine, NO_FILTER_DATA_REPLY,
};

async fn build_engine() -> (RetrievalEngine, Arc<FakeEmbedder>, Arc<FakeGenerative>) {
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
    (engine, embedder, generative)
}

fn criteria_matching_nothing() -> FilterCriteria {
    let mut criteria = FilterCriteria::default();
    criteria.faculty.insert("No Such Faculty".to_string());
    criteria
}

#[tokio::test]
async fn empty_subset_yields_the_defined_no_data_answer() {
    let (engine, embedder, generative) = build_engine().await;

    engine.set_filters(&criteria_matching_nothing()).await.unwrap();
    assert_eq!(engine.active_len(), 0);

    let calls_before = embedder.single_calls();
    let answer = engine.answer(CONFIDENT_QUERY).await;
    assert_eq!(answer.outcome, Outcome::NoFilteredData);
    assert!(!answer.matched);
    assert_eq!(answer.text, NO_FILTER_DATA_REPLY);

    // Neither embedding nor the fallback was attempted.
    assert_eq!(embedder.single_calls(), calls_before);
    assert!(generative.requests().is_empty());
}

#[tokio::test]
async fn empty_subset_takes_precedence_over_small_talk() {
    let (engine, _, _) = build_engine().await;
    engine.set_filters(&criteria_matching_nothing()).await.unwrap();

    let answer = engine.answer("hello").await;
    assert_eq!(answer.outcome, Outcome::NoFilteredData);
}

#[tokio::test]
async fn filters_scope_retrieval_to_the_subset() {
    let (engine, _, _) = build_engine().await;
    engine.set_random_source(Box::new(ScriptedRandom::new(vec![0.9])));

    // Level 100 keeps the CSC and Law entries only.
    let mut criteria = FilterCriteria::default();
    criteria.level.insert("100".to_string());
    engine.set_filters(&criteria).await.unwrap();
    assert_eq!(engine.active_len(), 2);

    // The confident query still tops out at the CSC entry.
    let answer = engine.answer(CONFIDENT_QUERY).await;
    assert_eq!(answer.outcome, Outcome::Corpus);
    assert_eq!(answer.text, A_CSC_FEE);

    // Related questions can only come from the subset.
    assert_eq!(answer.related, vec![crescentbot_e2e_tests::mocks::Q_LAW.to_string()]);
}

#[tokio::test]
async fn filtered_out_entries_are_never_answers() {
    let (engine, _, _) = build_engine().await;
    engine.set_random_source(Box::new(ScriptedRandom::new(vec![0.9])));

    // Keep only the Law entry; the CSC-leaning query must not reach CSC.
    let mut criteria = FilterCriteria::default();
    criteria.faculty.insert("BACOLAW".to_string());
    engine.set_filters(&criteria).await.unwrap();
    assert_eq!(engine.active_len(), 1);

    let answer = engine.answer(CONFIDENT_QUERY).await;
    // cos(query, law entry) = 0.60 >= 0.4: confident, but the answer is the
    // Law entry's, the best the subset can offer.
    assert_eq!(answer.outcome, Outcome::Corpus);
    assert_eq!(answer.text, A_LAW);
}

#[tokio::test]
async fn clearing_filters_restores_the_full_corpus() {
    let (engine, _, _) = build_engine().await;

    engine.set_filters(&criteria_matching_nothing()).await.unwrap();
    assert_eq!(engine.active_len(), 0);

    engine.set_filters(&FilterCriteria::default()).await.unwrap();
    assert_eq!(engine.active_len(), engine.corpus().len());

    engine.set_random_source(Box::new(ScriptedRandom::new(vec![0.9])));
    let answer = engine.answer(CONFIDENT_QUERY).await;
    assert_eq!(answer.outcome, Outcome::Corpus);
}

#[tokio::test]
async fn subset_change_rebuilds_the_index() {
    let (engine, embedder, _) = build_engine().await;
    assert_eq!(embedder.batch_calls(), 1);

    let mut criteria = FilterCriteria::default();
    criteria.level.insert("100".to_string());
    engine.set_filters(&criteria).await.unwrap();
    assert_eq!(embedder.batch_calls(), 2);

    // An empty subset needs no embedding at all.
    engine.set_filters(&criteria_matching_nothing()).await.unwrap();
    assert_eq!(embedder.batch_calls(), 2);
}
