//! Entity/field extraction — derives candidate-profile fields from resume text.
//!
//! Two strategies implement the same capability behind [`FieldExtractor`]:
//! the deterministic heuristic below (default) and the LLM-backed one in
//! `extraction::llm`. `AppState` holds an `Arc<dyn FieldExtractor>`, chosen
//! at startup via `ENABLE_LLM_EXTRACTION`.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::job::JobRow;

/// Fixed skill vocabulary for the heuristic strategy, matched whole-word and
/// case-insensitively.
pub const SKILL_VOCABULARY: [&str; 15] = [
    "Python",
    "Java",
    "JavaScript",
    "React",
    "Node.js",
    "SQL",
    "Machine Learning",
    "Docker",
    "Django",
    "Flask",
    "AWS",
    "C++",
    "TensorFlow",
    "Keras",
    "Pandas",
];

fn unknown() -> String {
    "Unknown".to_string()
}

/// Identity fields of the candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedEducation {
    #[serde(default = "unknown")]
    pub institution: String,
    #[serde(default = "unknown")]
    pub branch: String,
    #[serde(default)]
    pub degree: String,
    /// Raw date strings as found in the resume; normalized at persistence time.
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub explanation: String,
}

impl Default for ParsedEducation {
    fn default() -> Self {
        Self {
            institution: unknown(),
            branch: unknown(),
            degree: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            explanation: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedProject {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    /// 0–5; clamped again at persistence time.
    #[serde(default)]
    pub relevance: i32,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedExperience {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    /// 0–10; clamped again at persistence time.
    #[serde(default)]
    pub relevance: i32,
    #[serde(default)]
    pub explanation: String,
}

/// The full structured field set for one candidate.
///
/// Typed deserialization doubles as the allow-list for LLM output: keys the
/// schema does not declare are dropped before anything reaches persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedResume {
    #[serde(default)]
    pub profile: ParsedProfile,
    /// Overall relevance hint (0–100). The embedding scorer overwrites this
    /// once a similarity score is available.
    #[serde(default)]
    pub relevance: Option<i32>,
    #[serde(default)]
    pub education: Vec<ParsedEducation>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub projects: Vec<ParsedProject>,
    #[serde(default)]
    pub experiences: Vec<ParsedExperience>,
}

impl ParsedResume {
    pub fn is_empty(&self) -> bool {
        self.profile == ParsedProfile::default()
            && self.education.is_empty()
            && self.skills.is_empty()
            && self.projects.is_empty()
            && self.experiences.is_empty()
    }
}

/// The field-extraction capability. Implementations must not fail: weak or
/// absent extraction yields a (partially) empty `ParsedResume`, never an error.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract(&self, text: &str, job: &JobRow) -> ParsedResume;

    /// Label surfaced in logs, for transparency about which strategy ran.
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// HeuristicFieldExtractor — default strategy
// ────────────────────────────────────────────────────────────────────────────

/// Pure-Rust pattern-matching extractor. Fully local and deterministic; its
/// failure mode is weak extraction, never an exception.
pub struct HeuristicFieldExtractor;

#[async_trait]
impl FieldExtractor for HeuristicFieldExtractor {
    async fn extract(&self, text: &str, _job: &JobRow) -> ParsedResume {
        extract_heuristic_fields(text)
    }

    fn backend(&self) -> &'static str {
        "heuristic"
    }
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap())
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A digit run of 9–16 digits allowing space/dash separators.
    RE.get_or_init(|| Regex::new(r"\+?\d[\d \-]{7,14}\d").unwrap())
}

fn institution_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Z][a-zA-Z &]{2,}(?:University|College|Institute|Academy)").unwrap()
    })
}

pub fn extract_heuristic_fields(text: &str) -> ParsedResume {
    if text.trim().is_empty() {
        return ParsedResume::default();
    }

    let email = email_re()
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let phone = phone_re()
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let name = extract_name(text, &email);

    let education = institution_re()
        .find_iter(text)
        .map(|m| ParsedEducation {
            institution: m.as_str().trim().to_string(),
            ..ParsedEducation::default()
        })
        .collect();

    let skills = SKILL_VOCABULARY
        .iter()
        .filter(|skill| contains_word(text, skill))
        .map(|s| s.to_string())
        .collect();

    let projects = section_entries(text, project_start_re(), project_stop_re())
        .into_iter()
        .map(|entry| ParsedProject {
            description: entry,
            ..ParsedProject::default()
        })
        .collect();

    let experiences = section_entries(text, experience_start_re(), experience_stop_re())
        .into_iter()
        .map(|entry| ParsedExperience {
            description: entry,
            ..ParsedExperience::default()
        })
        .collect();

    ParsedResume {
        profile: ParsedProfile { name, email, phone },
        relevance: None,
        education,
        skills,
        projects,
        experiences,
    }
}

/// The candidate's name: first 4 tokens preceding the detected email, or the
/// first 4 tokens of the text when no email was found.
fn extract_name(text: &str, email: &str) -> String {
    let head = if email.is_empty() {
        text
    } else {
        text.split(email).next().unwrap_or(text)
    };
    let name: Vec<&str> = head.split_whitespace().take(4).collect();
    if name.is_empty() {
        unknown()
    } else {
        name.join(" ")
    }
}

/// Case-insensitive whole-word containment that tolerates needles ending in
/// non-word characters ("C++", "Node.js") where a regex `\b` would not match.
fn contains_word(haystack: &str, needle: &str) -> bool {
    let haystack = haystack.to_lowercase();
    let needle = needle.to_lowercase();
    let mut search_from = 0;
    while let Some(pos) = haystack[search_from..].find(&needle) {
        let start = search_from + pos;
        let end = start + needle.len();
        let ok_before = haystack[..start]
            .chars()
            .next_back()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        let ok_after = haystack[end..]
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        if ok_before && ok_after {
            return true;
        }
        search_from = end;
    }
    false
}

fn project_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:projects?|portfolio|work done)\b:?").unwrap())
}

fn project_stop_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:experience|skills|education)\b").unwrap())
}

fn experience_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:professional experience|work history|experience)\b:?").unwrap()
    })
}

fn experience_stop_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:projects|skills|education)\b").unwrap())
}

/// Extracts the block between a section heading and the next known heading,
/// split on bullet separators into discrete entries.
fn section_entries(text: &str, start_re: &Regex, stop_re: &Regex) -> Vec<String> {
    static BULLET_RE: OnceLock<Regex> = OnceLock::new();
    let bullet_re = BULLET_RE.get_or_init(|| Regex::new(r"\s*[•·|]\s*|\s+-\s+").unwrap());

    let start = match start_re.find(text) {
        Some(m) => m.end(),
        None => return Vec::new(),
    };

    let body = &text[start..];
    let end = stop_re.find(body).map(|m| m.start()).unwrap_or(body.len());

    bullet_re
        .split(&body[..end])
        .map(|e| e.trim().trim_start_matches(':').trim())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_string())
        .collect()
}
