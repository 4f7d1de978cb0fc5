//! Ranking explainer — a best-effort natural-language justification of the
//! candidate's fit. Never blocks the pipeline: any failure yields a fixed
//! fallback string and is not retried beyond the LLM client's own backoff.

use tracing::warn;

use crate::llm_client::LlmClient;
use crate::models::job::JobRow;
use crate::screening::prompts::{EXPLAIN_PROMPT_TEMPLATE, EXPLAIN_SYSTEM};

pub const NO_EXPLANATION: &str = "No explanation available.";

pub async fn explain_ranking(llm: &LlmClient, resume_text: &str, job: &JobRow) -> String {
    if resume_text.trim().is_empty() || job.description.trim().is_empty() {
        return NO_EXPLANATION.to_string();
    }

    let prompt = EXPLAIN_PROMPT_TEMPLATE
        .replace("{resume_text}", resume_text)
        .replace("{job_title}", &job.title)
        .replace("{job_description}", &job.description);

    match llm.call_text(&prompt, EXPLAIN_SYSTEM).await {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => NO_EXPLANATION.to_string(),
        Err(e) => {
            warn!("Explanation generation failed: {e}");
            NO_EXPLANATION.to_string()
        }
    }
}
