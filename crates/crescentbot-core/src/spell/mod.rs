//! Fuzzy Spelling Correction
//!
//! Delete-neighborhood (SymSpell-style) dictionary correction. The frequency
//! dictionary is loaded once at construction and is read-only afterwards, so
//! a single corrector can be shared across sessions without locking.
//!
//! Budget: edit distance ≤ [`MAX_EDIT_DISTANCE`], and only the first
//! [`PREFIX_LENGTH`] characters of a term generate delete variants, a
//! pruning bound on candidate lookup, not a correctness requirement.
//!
//! Two granularities are supported, selected by the caller through
//! [`CorrectionMode`]:
//!
//! - **Word**: each token independently replaced by its closest dictionary
//!   term, ties broken by frequency; no candidate within budget leaves the
//!   token unchanged.
//! - **Compound**: whole-phrase repair that additionally splits run-together
//!   words (`hostelfee` -> `hostel fee`) and merges fragments whose join is a
//!   dictionary term (`hos tel` -> `hostel`).
//!
//! Correction never fails and never drops input.

use std::collections::{HashMap, HashSet};
use std::io::{BufRead, BufReader};
use std::path::Path;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Maximum edit distance for a suggestion to be accepted.
pub const MAX_EDIT_DISTANCE: usize = 2;

/// Number of leading characters that generate delete variants.
/// Longer prefixes raise memory use; shorter ones raise false candidates.
pub const PREFIX_LENGTH: usize = 7;

/// Bundled frequency dictionary (word, frequency per line).
const BUILTIN_DICTIONARY: &str = include_str!("../../assets/frequency_dictionary.txt");

// ============================================================================
// CORRECTION MODE
// ============================================================================

/// Granularity of spelling correction, chosen per call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrectionMode {
    /// Independent per-token correction.
    #[default]
    Word,
    /// Whole-phrase correction with split/merge repair across word
    /// boundaries.
    Compound,
}

// ============================================================================
// CORRECTOR
// ============================================================================

/// Frequency-dictionary spelling corrector.
pub struct SpellCorrector {
    /// Dictionary terms with their frequencies.
    words: HashMap<String, u64>,
    /// Delete variant -> dictionary terms that produce it.
    deletes: HashMap<String, Vec<String>>,
    max_edit_distance: usize,
    prefix_length: usize,
}

impl Default for SpellCorrector {
    fn default() -> Self {
        Self::new()
    }
}

impl SpellCorrector {
    /// Build a corrector from the bundled frequency dictionary.
    pub fn new() -> Self {
        let mut corrector = Self::empty();
        for (term, freq) in parse_dictionary_lines(BUILTIN_DICTIONARY.lines()) {
            corrector.add_term(&term, freq);
        }
        corrector
    }

    /// Build an empty corrector (terms added via [`SpellCorrector::add_term`]).
    pub fn empty() -> Self {
        Self {
            words: HashMap::new(),
            deletes: HashMap::new(),
            max_edit_distance: MAX_EDIT_DISTANCE,
            prefix_length: PREFIX_LENGTH,
        }
    }

    /// Load a corrector from a `word frequency` file on disk.
    pub fn from_frequency_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        let mut corrector = Self::empty();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if let Some((term, freq)) = parse_dictionary_line(&line) {
                corrector.add_term(&term, freq);
            }
        }
        Ok(corrector)
    }

    /// Register a term with its frequency. Re-registering keeps the higher
    /// frequency. Used to seed corpus vocabulary on top of the base
    /// dictionary so domain terms are never "corrected" away.
    pub fn add_term(&mut self, term: &str, frequency: u64) {
        let term = term.to_lowercase();
        if term.is_empty() {
            return;
        }
        let entry = self.words.entry(term.clone()).or_insert(0);
        *entry = (*entry).max(frequency);

        for variant in delete_variants(&term, self.max_edit_distance, self.prefix_length) {
            let bucket = self.deletes.entry(variant).or_default();
            if !bucket.contains(&term) {
                bucket.push(term.clone());
            }
        }
    }

    /// Number of dictionary terms.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whether `term` is a known dictionary word.
    pub fn contains(&self, term: &str) -> bool {
        self.words.contains_key(term)
    }

    /// Correct `text` at the requested granularity.
    pub fn correct(&self, text: &str, mode: CorrectionMode) -> String {
        match mode {
            CorrectionMode::Word => self.correct_words(text),
            CorrectionMode::Compound => self.correct_compound(text),
        }
    }

    /// Correct a single token. Returns the token unchanged when it is very
    /// short, contains digits (course codes), is already a dictionary term,
    /// or has no candidate within the edit-distance budget.
    pub fn correct_word(&self, token: &str) -> String {
        let lower = token.to_lowercase();
        let token = lower.as_str();
        if passes_through(token) || self.words.contains_key(token) {
            return token.to_string();
        }

        let mut lookup_keys = delete_variants(token, self.max_edit_distance, self.prefix_length);
        lookup_keys.insert(token.to_string());

        // Best candidate: smallest true edit distance, then highest frequency.
        let mut best: Option<(&str, u64, usize)> = None;
        for key in &lookup_keys {
            let Some(candidates) = self.deletes.get(key) else {
                continue;
            };
            for candidate in candidates {
                let dist = edit_distance(token, candidate);
                if dist > self.max_edit_distance {
                    continue;
                }
                let freq = self.words[candidate];
                let better = match best {
                    Some((_, best_freq, best_dist)) => {
                        dist < best_dist || (dist == best_dist && freq > best_freq)
                    }
                    None => true,
                };
                if better {
                    best = Some((candidate.as_str(), freq, dist));
                }
            }
        }

        match best {
            Some((candidate, _, _)) => candidate.to_string(),
            None => token.to_string(),
        }
    }

    fn correct_words(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|t| self.correct_word(t))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn correct_compound(&self, text: &str) -> String {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mut out: Vec<String> = Vec::with_capacity(tokens.len());
        let mut i = 0;

        while i < tokens.len() {
            let token = tokens[i];

            if passes_through(token) || self.words.contains_key(token) {
                out.push(token.to_string());
                i += 1;
                continue;
            }

            // Merge repair: two fragments whose join is a dictionary term.
            if i + 1 < tokens.len() && !passes_through(tokens[i + 1]) {
                let merged = format!("{}{}", token, tokens[i + 1]);
                if self.words.contains_key(&merged) {
                    out.push(merged);
                    i += 2;
                    continue;
                }
            }

            // Split repair: a run-together token whose halves are both known.
            if let Some((left, right)) = self.best_split(token) {
                out.push(left);
                out.push(right);
                i += 1;
                continue;
            }

            out.push(self.correct_word(token));
            i += 1;
        }

        out.join(" ")
    }

    /// Best in-dictionary split of a run-together token, by combined
    /// frequency. Both halves must be at least two characters.
    fn best_split(&self, token: &str) -> Option<(String, String)> {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() < 4 {
            return None;
        }
        let mut best: Option<(String, String, u64)> = None;
        for split in 2..=chars.len() - 2 {
            let left: String = chars[..split].iter().collect();
            let right: String = chars[split..].iter().collect();
            let (Some(lf), Some(rf)) = (self.words.get(&left), self.words.get(&right)) else {
                continue;
            };
            let score = lf.saturating_add(*rf);
            if best.as_ref().is_none_or(|(_, _, s)| score > *s) {
                best = Some((left, right, score));
            }
        }
        best.map(|(l, r, _)| (l, r))
    }
}

/// Tokens that are never corrected: very short words and anything carrying
/// digits (course codes such as `csc101` must survive untouched).
fn passes_through(token: &str) -> bool {
    token.chars().count() <= 2 || token.chars().any(|c| c.is_ascii_digit())
}

// ============================================================================
// DELETE NEIGHBORHOOD
// ============================================================================

/// All delete variants of the first `prefix_length` characters of `term`,
/// up to `max_distance` deletions (the prefix itself included).
fn delete_variants(term: &str, max_distance: usize, prefix_length: usize) -> HashSet<String> {
    let prefix: String = term.chars().take(prefix_length).collect();
    let mut variants = HashSet::new();
    variants.insert(prefix.clone());

    let mut frontier = vec![prefix];
    for _ in 0..max_distance {
        let mut next = Vec::new();
        for word in &frontier {
            let chars: Vec<char> = word.chars().collect();
            if chars.len() <= 1 {
                continue;
            }
            for skip in 0..chars.len() {
                let variant: String = chars
                    .iter()
                    .enumerate()
                    .filter_map(|(i, c)| (i != skip).then_some(*c))
                    .collect();
                if variants.insert(variant.clone()) {
                    next.push(variant);
                }
            }
        }
        frontier = next;
    }
    variants
}

/// Plain Levenshtein distance.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn parse_dictionary_lines<'a>(
    lines: impl Iterator<Item = &'a str> + 'a,
) -> impl Iterator<Item = (String, u64)> + 'a {
    lines.filter_map(parse_dictionary_line)
}

fn parse_dictionary_line(line: &str) -> Option<(String, u64)> {
    let mut parts = line.split_whitespace();
    let term = parts.next()?;
    let freq = parts.next().and_then(|f| f.parse().ok()).unwrap_or(1);
    Some((term.to_string(), freq))
}

// ============================================================================
// TESTS
// ============================================================================
