//! Batch Orchestrator — runs the per-document pipeline for one upload batch.
//!
//! Each document flows through extract → parse → score → explain inside an
//! isolated failure boundary: an error rolls back that document's applicant
//! row and records a failure outcome while every sibling proceeds. Documents
//! fan out with bounded parallelism (`BATCH_WORKERS`, default 2) to respect
//! external API rate limits.
//!
//! The result list is completion-ordered, not input-ordered; callers
//! correlate by filename or applicant id.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::extraction;
use crate::extraction::fields::ParsedResume;
use crate::models::applicant::ApplicantRow;
use crate::models::job::JobRow;
use crate::scoring::{cosine_similarity, relevance_from_cosine};
use crate::screening::explain::explain_ranking;
use crate::screening::Screener;

/// One uploaded file, already written under the upload directory.
#[derive(Debug, Clone)]
pub struct SavedUpload {
    pub original_name: String,
    pub path: PathBuf,
}

/// Per-document result reported back to the caller. Exactly one outcome per
/// submitted document, success or failure.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    pub filename: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentOutcome {
    fn failure(filename: String, error: String) -> Self {
        Self {
            filename,
            success: false,
            applicant_id: None,
            relevance: None,
            error: Some(error),
        }
    }
}

impl Screener {
    /// Processes every document of a batch against one job.
    pub async fn process_batch(&self, job: &JobRow, files: Vec<SavedUpload>) -> Vec<DocumentOutcome> {
        // The job embedding is computed once and shared read-only by all workers.
        let job_vector = match self.embedder.embed(&job.description).await {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Job embedding failed for job {}: {e}; scores will be deferred", job.id);
                None
            }
        };

        info!(
            "Processing batch of {} documents for job {} with {} workers",
            files.len(),
            job.id,
            self.workers
        );

        stream::iter(files.into_iter().map(|file| {
            let job_vector = job_vector.clone();
            async move { self.process_document(job, job_vector.as_deref(), file).await }
        }))
        .buffer_unordered(self.workers)
        .collect()
        .await
    }

    async fn process_document(
        &self,
        job: &JobRow,
        job_vector: Option<&[f32]>,
        file: SavedUpload,
    ) -> DocumentOutcome {
        let fallback_name = file
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string();

        let applicant = match self
            .store
            .insert_applicant(job.id, &file.path.to_string_lossy(), &fallback_name)
            .await
        {
            Ok(a) => a,
            Err(e) => {
                warn!("Failed to create applicant for {}: {e:#}", file.original_name);
                return DocumentOutcome::failure(file.original_name, format!("{e:#}"));
            }
        };

        match self.run_pipeline(job, job_vector, &file, applicant.id).await {
            Ok(relevance) => DocumentOutcome {
                filename: file.original_name,
                success: true,
                applicant_id: Some(applicant.id),
                relevance: Some(relevance),
                error: None,
            },
            Err(e) => {
                warn!(
                    "Pipeline failed for {} (applicant {}): {e:#}",
                    file.original_name, applicant.id
                );
                // Roll back the partially created profile; cascade removes children.
                if let Err(del) = self.store.delete_applicant(applicant.id).await {
                    warn!("Rollback of applicant {} failed: {del:#}", applicant.id);
                }
                DocumentOutcome::failure(file.original_name, format!("{e:#}"))
            }
        }
    }

    /// The per-document pipeline: strictly sequential stages. Stage-level
    /// recoveries (parse failure, scoring failure, explanation failure)
    /// degrade gracefully; empty extracted text and persistence errors
    /// propagate and trigger rollback.
    async fn run_pipeline(
        &self,
        job: &JobRow,
        job_vector: Option<&[f32]>,
        file: &SavedUpload,
        applicant_id: Uuid,
    ) -> Result<i32> {
        let text = extraction::extract_text(&file.path).await;
        // No signal means no profile: fail the document so the shell row
        // is rolled back instead of persisting an empty record.
        if text.is_empty() {
            bail!("no text could be extracted from the document");
        }
        self.store
            .update_resume_text(applicant_id, &text)
            .await
            .context("persisting resume text")?;

        let parsed = self.extractor.extract(&text, job).await;
        let applicant = self
            .store
            .get_applicant(applicant_id)
            .await
            .context("reloading applicant")?
            .context("applicant vanished mid-pipeline")?;
        self.store
            .apply_parsed_fields(&applicant, &parsed)
            .await
            .context("persisting parsed fields")?;

        let mut relevance = parsed.relevance.map(|r| r.clamp(0, 100)).unwrap_or(0);

        // Scoring failures leave the prior score and cache flag untouched.
        if let Some(job_vector) = job_vector {
            match self.embedder.embed(&text).await {
                Ok(resume_vector) => match cosine_similarity(job_vector, &resume_vector) {
                    Ok(cosine) => {
                        relevance = relevance_from_cosine(cosine);
                        self.store
                            .set_relevance(applicant_id, relevance)
                            .await
                            .context("persisting relevance score")?;
                    }
                    Err(e) => warn!("Similarity failed for applicant {applicant_id}: {e}"),
                },
                Err(e) => warn!("Embedding failed for applicant {applicant_id}: {e}"),
            }
        }

        let explanation = explain_ranking(&self.llm, &text, job).await;
        self.store
            .set_explanation(applicant_id, &explanation)
            .await
            .context("persisting explanation")?;

        Ok(relevance)
    }

    /// Re-runs extraction and field parsing over an applicant's stored file.
    /// Child entries are always replaced and the score cache always cleared —
    /// including when re-extraction yields no text — so the next listing
    /// rescores against the current text.
    pub async fn reparse(&self, applicant: &ApplicantRow, job: &JobRow) -> Result<(), sqlx::Error> {
        let text = extraction::extract_text(Path::new(&applicant.resume_path)).await;
        self.store.update_resume_text(applicant.id, &text).await?;

        let parsed = if text.is_empty() {
            ParsedResume::default()
        } else {
            self.extractor.extract(&text, job).await
        };
        self.store.apply_parsed_fields(applicant, &parsed).await?;

        let explanation = explain_ranking(&self.llm, &text, job).await;
        self.store.set_explanation(applicant.id, &explanation).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::extraction::fields::HeuristicFieldExtractor;
    use crate::llm_client::LlmClient;
    use crate::scoring::HashedEmbedder;
    use crate::screening::explain::NO_EXPLANATION;
    use crate::screening::store::ScreeningStore;
    use crate::screening::testing::MemoryStore;

    fn job(description: &str) -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            title: "Backend Engineer".to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
        }
    }

    fn screener(store: Arc<MemoryStore>) -> Screener {
        Screener::new(
            store,
            Arc::new(HeuristicFieldExtractor),
            Arc::new(HashedEmbedder::new()),
            LlmClient::new("test-key".to_string()),
            2,
        )
    }

    fn upload(dir: &std::path::Path, name: &str, bytes: &[u8]) -> SavedUpload {
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        SavedUpload {
            original_name: name.to_string(),
            path,
        }
    }

    #[tokio::test]
    async fn test_corrupt_document_fails_alone_and_is_rolled_back() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            upload(dir.path(), "a.txt", b"Python developer jane@example.com"),
            upload(dir.path(), "broken.pdf", b"not a real pdf"),
            upload(dir.path(), "b.txt", b"Django engineer bob@example.com"),
        ];

        let store = Arc::new(MemoryStore::default());
        let outcomes = screener(store.clone()).process_batch(&job(""), files).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes.iter().filter(|o| o.success).count(), 2);
        let failed: Vec<_> = outcomes.iter().filter(|o| !o.success).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].filename, "broken.pdf");
        assert!(failed[0].error.is_some());

        // The corrupt document's record must not survive.
        let rows = store.applicants.lock().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|a| !a.resume_path.contains("broken.pdf")));
    }

    #[tokio::test]
    async fn test_persistence_failure_rolls_back_only_that_applicant() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            upload(dir.path(), "good.txt", b"Python developer jane@example.com"),
            upload(dir.path(), "doomed.txt", b"Django engineer bob@example.com"),
        ];

        let store = Arc::new(MemoryStore {
            fail_text_update_for: Some("doomed.txt".to_string()),
            ..MemoryStore::default()
        });
        let outcomes = screener(store.clone()).process_batch(&job(""), files).await;

        assert_eq!(outcomes.len(), 2);
        let failed = outcomes.iter().find(|o| !o.success).unwrap();
        assert_eq!(failed.filename, "doomed.txt");

        let rows = store.applicants.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].resume_path.contains("good.txt"));
        assert!(rows[0].score_cached);
    }

    #[tokio::test]
    async fn test_reparse_of_unreadable_file_clears_cache_and_children() {
        let store = Arc::new(MemoryStore::default());
        let the_job = job("Python backend role");

        let applicant = store
            .insert_applicant(the_job.id, "/nonexistent/resume.pdf", "resume")
            .await
            .unwrap();
        store.set_relevance(applicant.id, 80).await.unwrap();
        let cached = store.applicant(applicant.id).unwrap();
        assert!(cached.score_cached);

        screener(store.clone()).reparse(&cached, &the_job).await.unwrap();

        let after = store.applicant(applicant.id).unwrap();
        assert!(!after.score_cached, "reparse must clear the score cache");
        assert_eq!(after.resume_text, "");
        assert_eq!(after.explanation, NO_EXPLANATION);
        assert!(store
            .replaced_children
            .lock()
            .unwrap()
            .contains(&applicant.id));
    }

    #[test]
    fn test_failure_outcome_carries_filename_and_error() {
        let outcome = DocumentOutcome::failure("resume.pdf".to_string(), "boom".to_string());
        assert!(!outcome.success);
        assert_eq!(outcome.filename, "resume.pdf");
        assert_eq!(outcome.error.as_deref(), Some("boom"));
        assert!(outcome.applicant_id.is_none());
    }

    #[test]
    fn test_outcome_serialization_omits_empty_fields() {
        let outcome = DocumentOutcome::failure("resume.pdf".to_string(), "boom".to_string());
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("applicant_id").is_none());
        assert!(json.get("relevance").is_none());
        assert_eq!(json["error"], "boom");
    }
}
