//! Department Category Extraction
//!
//! Maps the course-code prefix found in a matched question to a
//! human-readable department name. Pure functions over static data; unknown
//! prefixes resolve to [`UNKNOWN_CATEGORY`], never an error.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

/// Sentinel returned for course-code prefixes with no known department.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Course-code shape: two or more uppercase letters, optional hyphen, three
/// or more digits (`CSC101`, `MTH-201`).
fn course_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b([A-Z]{2,}-?[0-9]{3,})\b").expect("course code pattern is valid")
    })
}

/// Static mapping from course-code prefixes to department names.
#[derive(Debug, Clone)]
pub struct CategoryMap {
    table: HashMap<&'static str, &'static str>,
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryMap {
    /// The standard university prefix table.
    pub fn new() -> Self {
        let table = HashMap::from([
            ("GST", "General Studies"),
            ("GNS", "General Studies"),
            ("MTH", "Mathematics"),
            ("PHY", "Physics"),
            ("STA", "Statistics"),
            ("COS", "Computer Science"),
            ("CSC", "Computer Science"),
            ("CPS", "Computer Science"),
            ("IFT", "Computer Science"),
            ("SEN", "Software Engineering"),
            ("ENT", "Entrepreneurship"),
            ("CYB", "Cybersecurity"),
            ("ICT", "Information and Communication Technology"),
            ("DTS", "Data Science"),
            ("ECO", "Economics with Operations Research"),
            ("BCO", "Economics with Operations Research"),
            ("SSC", "Social Sciences"),
            ("LIB", "Library Studies"),
            ("LAW", "Law (BACOLAW)"),
            ("LPI", "Law (BACOLAW)"),
            ("LPB", "Law (BACOLAW)"),
            ("ICL", "Law (BACOLAW)"),
            ("TPT", "Law (BACOLAW)"),
            ("ENG", "English"),
            ("SOS", "Sociology"),
            ("PIS", "Political Science"),
            ("FAC", "Agricultural Sciences"),
            ("ANA", "Anatomy"),
            ("BIO", "Biological Sciences"),
            ("CHM", "Chemical Sciences"),
            ("BCH", "Biochemistry"),
            ("CUAB", "Crescent University - General"),
        ]);
        Self { table }
    }

    /// Department name for a prefix; unknown prefixes map to the sentinel.
    pub fn lookup(&self, prefix: &str) -> &'static str {
        self.table.get(prefix).copied().unwrap_or(UNKNOWN_CATEGORY)
    }
}

/// Scan `text` for the first course code and map its alphabetic prefix to a
/// department name. `None` when no code is present; `Some(UNKNOWN_CATEGORY)`
/// for a code with an unrecognized prefix.
pub fn extract_category(text: &str, map: &CategoryMap) -> Option<String> {
    let code = course_code_pattern().find(text)?.as_str();
    let prefix: String = code.chars().take_while(|c| c.is_ascii_uppercase()).collect();
    Some(map.lookup(&prefix).to_string())
}
