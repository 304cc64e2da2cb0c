//! Small-talk tables and the injectable randomness seam.
//!
//! Greetings bypass embedding entirely: they are the highest-frequency
//! trivial inputs, and a table lookup is cheaper than a model call. The
//! surface forms listed here are the *post-normalization* shapes ("hows it
//! going", "im fine") since the check runs on cleaned text.

use rand::Rng;

/// Cleaned query forms that count as small talk.
pub const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "hi there",
    "greetings",
    "how are you",
    "how are you doing",
    "hows it going",
    "can we talk",
    "can we have a conversation",
    "okay",
    "im fine",
    "i am fine",
];

/// Replies drawn pseudo-randomly for small talk.
pub const GREETING_REPLIES: &[&str] = &[
    "Hello!",
    "Hi there!",
    "Hey!",
    "Greetings!",
    "I'm doing well, thank you!",
    "Sure pal",
    "I'm fine, thank you",
    "Hi! How can I help you?",
    "Hello! Ask me anything about Crescent University.",
];

/// Occasional prefixes prepended to confident answers.
pub const HEDGE_PREFIXES: &[&str] = &[
    "I think ",
    "Maybe: ",
    "Possibly: ",
    "Here's what I found: ",
];

/// Whether a cleaned query is a small-talk phrase.
pub fn is_greeting(cleaned: &str) -> bool {
    GREETINGS.iter().any(|g| g.eq_ignore_ascii_case(cleaned))
}

// ============================================================================
// RANDOMNESS SEAM
// ============================================================================

/// Injectable source of pseudo-randomness. Stylistic variation (greeting
/// choice, hedge prefixes) goes through this seam so tests can pin
/// deterministic output.
pub trait RandomSource: Send {
    /// A value in `[0, 1)`.
    fn next_f32(&mut self) -> f32;
}

/// Production source backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f32(&mut self) -> f32 {
        rand::thread_rng().r#gen()
    }
}

/// Pick an item using one draw from the source.
pub fn pick<'a>(rng: &mut dyn RandomSource, items: &'a [&'a str]) -> &'a str {
    let index = (rng.next_f32() * items.len() as f32) as usize;
    items[index.min(items.len() - 1)]
}
