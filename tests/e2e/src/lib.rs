//! End-to-end test harness for the crescentbot pipeline.
//!
//! Provides fake embedding and generative providers with engineered
//! geometry, plus a scripted randomness source, so the full decision flow
//! can be exercised deterministically without models or network access.

pub mod mocks;
