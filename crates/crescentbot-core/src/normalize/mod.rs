//! Query Text Normalization
//!
//! Deterministic rewriting applied to raw user input before spelling
//! correction and embedding. The pipeline is a total function (invalid or
//! empty input yields empty text, never an error) and its stages run in a
//! fixed order:
//!
//! 1. strip every character that is not alphanumeric or whitespace;
//! 2. collapse runs of three or more identical characters to one
//!    (`soooo` -> `so`), so exaggerated typing cannot defeat table lookup;
//! 3. lower-case;
//! 4. apply the ordered whole-word rewrite rules (abbreviations, synonyms,
//!    plural folds; see [`rules`]).
//!
//! The shipped rule tables are curated so that one pass reaches a fixed
//! point: `normalize(normalize(t)) == normalize(t)`.

mod rules;

pub use rules::{
    default_rules, merge_tables, RewriteRule, ABBREVIATIONS, PLURAL_FOLDS, SYNONYMS,
};

// ============================================================================
// NORMALIZER
// ============================================================================

/// Deterministic text normalizer with an ordered rewrite rule list.
pub struct Normalizer {
    rules: Vec<RewriteRule>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Create a normalizer with the default rule tables.
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Create a normalizer with a custom ordered rule list.
    pub fn with_rules(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    /// Normalize raw input. Total function: never fails.
    pub fn normalize(&self, raw: &str) -> String {
        let stripped = strip_non_alphanumeric(raw);
        let collapsed = collapse_repeats(&stripped);
        let mut text = collapsed.to_lowercase();
        for rule in &self.rules {
            text = rule.apply(&text);
        }
        text
    }
}

// ============================================================================
// PIPELINE STAGES
// ============================================================================

/// Remove every character that is not a letter, digit, or whitespace, and
/// fold whitespace runs to single spaces so phrase rules match reliably.
fn strip_non_alphanumeric(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else if c.is_whitespace() {
            pending_space = true;
        }
        // Everything else is dropped without leaving a gap.
    }
    out
}

/// Collapse any run of 3+ identical consecutive characters to one occurrence.
/// Double letters survive (`coffee` stays `coffee`).
fn collapse_repeats(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run_char: Option<char> = None;
    let mut run_len = 0usize;

    let mut flush = |out: &mut String, c: char, len: usize| {
        let emit = if len >= 3 { 1 } else { len };
        for _ in 0..emit {
            out.push(c);
        }
    };

    for c in text.chars() {
        match run_char {
            Some(prev) if prev == c => run_len += 1,
            Some(prev) => {
                flush(&mut out, prev, run_len);
                run_char = Some(c);
                run_len = 1;
            }
            None => {
                run_char = Some(c);
                run_len = 1;
            }
        }
    }
    if let Some(prev) = run_char {
        flush(&mut out, prev, run_len);
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================
