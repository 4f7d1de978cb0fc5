//! Relevance Refresh Pass — lazily (re)scores applicants on read.
//!
//! Invoked before every "list applicants" response. The job embedding is
//! computed once; only applicants without a cached score and with usable
//! text are scored. Already-cached applicants are left byte-identical, so
//! repeated passes are idempotent.

use tracing::{debug, warn};

use crate::models::job::JobRow;
use crate::scoring::{cosine_similarity, relevance_from_cosine};
use crate::screening::Screener;

impl Screener {
    pub async fn refresh_relevance(&self, job: &JobRow) -> Result<(), sqlx::Error> {
        if job.description.trim().is_empty() {
            warn!("Job {} has an empty description; refresh skipped", job.id);
            return Ok(());
        }

        let job_vector = match self.embedder.embed(&job.description).await {
            Ok(v) => v,
            Err(e) => {
                // Scoring is best-effort on read; serve stale scores rather than fail.
                warn!("Failed to embed job {} description: {e}", job.id);
                return Ok(());
            }
        };

        let pending = self.store.applicants_pending_score(job.id).await?;
        if pending.is_empty() {
            return Ok(());
        }
        debug!("Refreshing relevance for {} applicants of job {}", pending.len(), job.id);

        for applicant in pending {
            let text = applicant.resume_text.trim();
            if text.is_empty() {
                continue;
            }

            let resume_vector = match self.embedder.embed(text).await {
                Ok(v) => v,
                Err(e) => {
                    warn!("Embedding failed for applicant {}: {e}", applicant.id);
                    continue;
                }
            };
            let cosine = match cosine_similarity(&job_vector, &resume_vector) {
                Ok(c) => c,
                Err(e) => {
                    warn!("Similarity failed for applicant {}: {e}", applicant.id);
                    continue;
                }
            };

            self.store
                .set_relevance(applicant.id, relevance_from_cosine(cosine))
                .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use uuid::Uuid;

    use crate::extraction::fields::HeuristicFieldExtractor;
    use crate::llm_client::LlmClient;
    use crate::models::job::JobRow;
    use crate::scoring::HashedEmbedder;
    use crate::screening::store::ScreeningStore;
    use crate::screening::testing::MemoryStore;
    use crate::screening::Screener;

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

    #[tokio::test]
    async fn test_refresh_scores_pending_applicants_and_marks_cached() {
        let store = Arc::new(MemoryStore::default());
        let the_job = job("Python Django backend engineer");

        let applicant = store
            .insert_applicant(the_job.id, "cv.txt", "cv")
            .await
            .unwrap();
        store
            .update_resume_text(applicant.id, "Python Django backend engineer")
            .await
            .unwrap();

        screener(store.clone()).refresh_relevance(&the_job).await.unwrap();

        let after = store.applicant(applicant.id).unwrap();
        assert!(after.score_cached);
        // Identical text embeds to an identical vector: cosine 1 → score 100.
        assert_eq!(after.relevance_score, 100);
    }

    #[tokio::test]
    async fn test_refresh_leaves_cached_applicants_untouched() {
        let store = Arc::new(MemoryStore::default());
        let the_job = job("Python Django backend engineer");

        let applicant = store
            .insert_applicant(the_job.id, "cv.txt", "cv")
            .await
            .unwrap();
        store
            .update_resume_text(applicant.id, "Photoshop and Illustrator expert")
            .await
            .unwrap();
        store.set_relevance(applicant.id, 7).await.unwrap();
        assert_eq!(store.relevance_writes.lock().unwrap().len(), 1);

        let s = screener(store.clone());
        s.refresh_relevance(&the_job).await.unwrap();
        s.refresh_relevance(&the_job).await.unwrap();

        let after = store.applicant(applicant.id).unwrap();
        assert_eq!(after.relevance_score, 7);
        // No rescoring happened on either pass.
        assert_eq!(store.relevance_writes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_skips_textless_applicants() {
        let store = Arc::new(MemoryStore::default());
        let the_job = job("Python Django backend engineer");

        let applicant = store
            .insert_applicant(the_job.id, "cv.txt", "cv")
            .await
            .unwrap();

        screener(store.clone()).refresh_relevance(&the_job).await.unwrap();

        let after = store.applicant(applicant.id).unwrap();
        assert!(!after.score_cached);
        assert!(store.relevance_writes.lock().unwrap().is_empty());
    }
}
