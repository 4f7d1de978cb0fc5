//! Prompts for the LLM-backed field extractor.

/// Role fragment; the caller appends the shared JSON-only and grounding
/// fragments from `llm_client::prompts`.
pub const RESUME_PARSE_SYSTEM: &str = "You are a resume screening assistant. \
    You extract structured candidate data from resume text and judge its \
    relevance to a specific job posting.";

pub const RESUME_PARSE_PROMPT_TEMPLATE: &str = r#"Resume text:
{resume_text}

Job Title: {job_title}
Job Description: {job_description}

Extract the candidate's structured fields and rate relevance against the job.
Return a JSON object with exactly this shape:
{
  "profile": {"name": "...", "email": "...", "phone": "..."},
  "relevance": <integer 0-100, overall fit for the job>,
  "education": [
    {"institution": "...", "branch": "...", "degree": "...",
     "start_date": "...", "end_date": "...", "explanation": "..."}
  ],
  "skills": ["...", "..."],
  "projects": [
    {"title": "...", "description": "...", "tech_stack": ["..."],
     "start_date": "...", "end_date": "...",
     "relevance": <integer 0-5>, "explanation": "..."}
  ],
  "experiences": [
    {"role": "...", "organization": "...", "description": "...",
     "tech_stack": ["..."], "start_date": "...", "end_date": "...",
     "relevance": <integer 0-10>, "explanation": "..."}
  ]
}

Dates must be one of: "YYYY", "MM-YYYY", "YYYY-MM", "YYYY-MM-DD", or "" when unknown.
Use "Unknown" for an institution or branch the resume does not name."#;
