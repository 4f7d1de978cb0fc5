//! LLM-backed field extraction strategy.
//!
//! Sends the extracted resume text plus job title/description to the LLM
//! with a declared output schema and parses the structured reply. On any
//! transport or parsing failure the result is an empty `ParsedResume` —
//! enrichment is skipped for that document, never fatal.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::extraction::fields::{FieldExtractor, ParsedResume};
use crate::extraction::prompts::{RESUME_PARSE_PROMPT_TEMPLATE, RESUME_PARSE_SYSTEM};
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::LlmClient;

pub struct LlmFieldExtractor {
    llm: LlmClient,
}

impl LlmFieldExtractor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl FieldExtractor for LlmFieldExtractor {
    async fn extract(&self, text: &str, job: &crate::models::job::JobRow) -> ParsedResume {
        if text.trim().is_empty() {
            return ParsedResume::default();
        }

        let prompt = RESUME_PARSE_PROMPT_TEMPLATE
            .replace("{resume_text}", text)
            .replace("{job_title}", &job.title)
            .replace("{job_description}", &job.description);
        let system = format!("{RESUME_PARSE_SYSTEM} {JSON_ONLY_SYSTEM} {GROUNDING_INSTRUCTION}");

        match self.llm.call_json::<ParsedResume>(&prompt, &system).await {
            Ok(parsed) => {
                debug!(
                    "LLM parse extracted {} education, {} projects, {} experiences",
                    parsed.education.len(),
                    parsed.projects.len(),
                    parsed.experiences.len()
                );
                parsed
            }
            Err(e) => {
                warn!("LLM resume parse failed, skipping enrichment: {e}");
                ParsedResume::default()
            }
        }
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

#[cfg(test)]
mod tests {
    use crate::extraction::fields::ParsedResume;

    /// The schema types are the allow-list: keys the LLM invents (like the
    /// `duration_months` the upstream model was known to return) are dropped
    /// at deserialization and never reach persistence.
    #[test]
    fn test_unknown_keys_are_dropped() {
        let json = r#"{
            "profile": {"name": "Jane Doe", "email": "jane@example.com", "phone": ""},
            "relevance": 72,
            "education": [
                {"institution": "Stanford University", "degree": "BS",
                 "start_date": "2016", "end_date": "2020",
                 "duration_months": 48, "gpa": 3.9}
            ],
            "skills": ["Python", "Django"],
            "projects": [
                {"title": "Ranker", "description": "Resume ranker",
                 "relevance": 9, "budget": "none"}
            ],
            "experiences": []
        }"#;

        let parsed: ParsedResume = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.profile.name, "Jane Doe");
        assert_eq!(parsed.relevance, Some(72));
        assert_eq!(parsed.education.len(), 1);
        assert_eq!(parsed.education[0].institution, "Stanford University");
        // branch was absent → sentinel default, not null
        assert_eq!(parsed.education[0].branch, "Unknown");
        // out-of-range project relevance survives parsing; the store clamps it
        assert_eq!(parsed.projects[0].relevance, 9);
    }

    #[test]
    fn test_partial_payload_fills_defaults() {
        let parsed: ParsedResume = serde_json::from_str(r#"{"skills": ["SQL"]}"#).unwrap();
        assert_eq!(parsed.skills, vec!["SQL".to_string()]);
        assert!(parsed.profile.name.is_empty());
        assert!(parsed.relevance.is_none());
        assert!(parsed.projects.is_empty());
    }

    #[test]
    fn test_empty_object_is_empty_resume() {
        let parsed: ParsedResume = serde_json::from_str("{}").unwrap();
        assert!(parsed.is_empty());
    }
}
