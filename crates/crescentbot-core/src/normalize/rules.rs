//! Rewrite rule tables for query normalization.
//!
//! Three ordered tables (abbreviations, synonyms, plural folds) are merged
//! into a single ordered rule list at construction time. Within the merged
//! list, the first-registered rule wins for a given surface form, so a later
//! table cannot shadow an earlier one (the plural table's `fees` entry is
//! deduplicated away because the synonym table already claims it).
//!
//! Every pattern is compiled with word boundaries, so a surface form only
//! matches whole words or whole phrases: `fees` never fires inside `coffees`.
//!
//! Table ordering is load-bearing for idempotence: a rule's replacement text
//! is only ever rewritten further by rules that come *after* it in the merged
//! list, so a single pass reaches a fixed point (`teachers` -> `lecturers`
//! -> `academic staff` all inside one `normalize` call).

use regex::Regex;

/// Abbreviation and shorthand expansions, applied first.
pub const ABBREVIATIONS: &[(&str, &str)] = &[
    ("u", "you"),
    ("r", "are"),
    ("ur", "your"),
    ("ow", "how"),
    ("pls", "please"),
    ("plz", "please"),
    ("tmrw", "tomorrow"),
    ("cn", "can"),
    ("wat", "what"),
    ("cud", "could"),
    ("shud", "should"),
    ("wud", "would"),
    ("abt", "about"),
    ("bcz", "because"),
    ("btw", "between"),
    ("asap", "as soon as possible"),
    ("idk", "i do not know"),
    ("msg", "message"),
    ("doc", "document"),
    ("d", "the"),
    ("yr", "year"),
    ("sem", "semester"),
    ("dept", "department"),
    ("admsn", "admission"),
    ("cresnt", "crescent"),
    ("uni", "university"),
    ("clg", "college"),
    ("sch", "school"),
    ("info", "information"),
    ("l", "level"),
    ("1st", "first"),
    ("2nd", "second"),
    ("siwes", "student industrial work experience scheme"),
    ("cuab", "crescent university"),
    ("ict", "information and communication technology"),
    ("cohes", "college of health sciences"),
    ("coes", "college of environmental sciences"),
    ("conas", "college of natural and applied sciences"),
    ("casmas", "college of arts social and management sciences"),
    ("cicot", "college of information and communication technology"),
    ("bacolaw", "bola ajibola college of law"),
    ("csc", "computer science"),
    ("eco", "economics with operations research"),
    ("phy", "physics"),
    ("stat", "statistics"),
];

/// Synonym folds toward the vocabulary the corpus actually uses.
pub const SYNONYMS: &[(&str, &str)] = &[
    ("fees", "tuition"),
    ("accommodation", "hostel"),
    ("freshers", "new students"),
    ("returning students", "old students"),
    ("teachers", "lecturers"),
    ("lecturers", "academic staff"),
    ("professors", "academic staff"),
    ("registration", "enrollment"),
    ("course list", "courses"),
    ("head of department", "hod"),
    ("contact", "phone number"),
    ("cost", "price"),
    ("amount", "fee"),
    ("procedure", "process"),
];

/// Plural-to-singular folds, applied last.
///
/// `fees` is shadowed by the synonym table; `contacts` is deliberately absent
/// because folding it to `contact` would re-trigger the synonym rule on a
/// second pass.
pub const PLURAL_FOLDS: &[(&str, &str)] = &[
    ("students", "student"),
    ("lectures", "lecture"),
    ("departments", "department"),
    ("fees", "fee"),
    ("courses", "course"),
    ("requirements", "requirement"),
    ("projects", "project"),
    ("exams", "exam"),
    ("subjects", "subject"),
];

/// A compiled whole-word rewrite rule.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    surface: String,
    pattern: Regex,
    replacement: String,
}

impl RewriteRule {
    /// Compile a rule for a surface form (single word or space-separated
    /// phrase). Surface forms are matched case-sensitively against already
    /// lower-cased text, so callers register them in lower case.
    pub fn new(surface: &str, replacement: &str) -> Self {
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(surface)))
            .expect("escaped surface form is always a valid pattern");
        Self {
            surface: surface.to_string(),
            pattern,
            replacement: replacement.to_string(),
        }
    }

    /// The surface form this rule rewrites.
    pub fn surface(&self) -> &str {
        &self.surface
    }

    /// Apply the rule to `text`, rewriting every whole-word occurrence.
    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }
}

/// Merge rule tables into one ordered list, deduplicating by surface form.
/// The first-registered rule wins.
pub fn merge_tables(tables: &[&[(&str, &str)]]) -> Vec<RewriteRule> {
    let mut seen = std::collections::HashSet::new();
    let mut rules = Vec::new();
    for table in tables {
        for &(surface, replacement) in *table {
            if seen.insert(surface) {
                rules.push(RewriteRule::new(surface, replacement));
            }
        }
    }
    rules
}

/// The default merged rule list: abbreviations, then synonyms, then plurals.
pub fn default_rules() -> Vec<RewriteRule> {
    merge_tables(&[ABBREVIATIONS, SYNONYMS, PLURAL_FOLDS])
}
