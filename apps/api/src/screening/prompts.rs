//! Prompts for the ranking explainer.

pub const EXPLAIN_SYSTEM: &str = "You are a recruiting assistant. You write \
    short, factual justifications of how well a candidate fits a job. \
    Base every statement on the resume text provided; do not invent \
    qualifications the resume does not mention.";

pub const EXPLAIN_PROMPT_TEMPLATE: &str = "Resume:\n{resume_text}\n\n\
    Job Title: {job_title}\n\
    Job Description:\n{job_description}\n\
    Explain in 2-3 sentences why this candidate is suitable for the job.";
