pub mod batch;
pub mod explain;
pub mod handlers;
pub mod prompts;
pub mod refresh;
pub mod store;

use std::sync::Arc;

use crate::extraction::fields::FieldExtractor;
use crate::llm_client::LlmClient;
use crate::scoring::Embedder;
use crate::screening::store::ScreeningStore;

/// The screening pipeline with its collaborators bound at startup: store,
/// field extractor, embedder, LLM client, and the worker bound for batch
/// fan-out. Cloned into every handler via `AppState`.
#[derive(Clone)]
pub struct Screener {
    store: Arc<dyn ScreeningStore>,
    extractor: Arc<dyn FieldExtractor>,
    embedder: Arc<dyn Embedder>,
    llm: LlmClient,
    workers: usize,
}

impl Screener {
    pub fn new(
        store: Arc<dyn ScreeningStore>,
        extractor: Arc<dyn FieldExtractor>,
        embedder: Arc<dyn Embedder>,
        llm: LlmClient,
        workers: usize,
    ) -> Self {
        Self {
            store,
            extractor,
            embedder,
            llm,
            workers: workers.max(1),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::extraction::fields::ParsedResume;
    use crate::models::applicant::ApplicantRow;
    use crate::screening::store::ScreeningStore;

    /// In-memory stand-in for the Postgres store. Mirrors the write
    /// semantics the pipeline relies on: `apply_parsed_fields` replaces
    /// child entries and clears the score cache, `set_relevance` sets it.
    #[derive(Default)]
    pub struct MemoryStore {
        pub applicants: Mutex<Vec<ApplicantRow>>,
        /// Applicant ids whose child entries were replaced.
        pub replaced_children: Mutex<Vec<Uuid>>,
        /// One entry per `set_relevance` write, in call order.
        pub relevance_writes: Mutex<Vec<Uuid>>,
        /// Makes `update_resume_text` fail for applicants whose resume path
        /// contains this substring.
        pub fail_text_update_for: Option<String>,
    }

    impl MemoryStore {
        pub fn applicant(&self, id: Uuid) -> Option<ApplicantRow> {
            self.applicants
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == id)
                .cloned()
        }

        fn with_applicant(
            &self,
            id: Uuid,
            f: impl FnOnce(&mut ApplicantRow),
        ) -> Result<(), sqlx::Error> {
            let mut rows = self.applicants.lock().unwrap();
            match rows.iter_mut().find(|a| a.id == id) {
                Some(row) => {
                    f(row);
                    Ok(())
                }
                None => Err(sqlx::Error::RowNotFound),
            }
        }
    }

    #[async_trait]
    impl ScreeningStore for MemoryStore {
        async fn insert_applicant(
            &self,
            job_id: Uuid,
            resume_path: &str,
            fallback_name: &str,
        ) -> Result<ApplicantRow, sqlx::Error> {
            let row = ApplicantRow {
                id: Uuid::new_v4(),
                job_id,
                name: fallback_name.to_string(),
                email: String::new(),
                resume_path: resume_path.to_string(),
                resume_text: String::new(),
                relevance_score: 0,
                score_cached: false,
                explanation: String::new(),
                created_at: Utc::now(),
            };
            self.applicants.lock().unwrap().push(row.clone());
            Ok(row)
        }

        async fn delete_applicant(&self, id: Uuid) -> Result<(), sqlx::Error> {
            self.applicants.lock().unwrap().retain(|a| a.id != id);
            Ok(())
        }

        async fn update_resume_text(&self, id: Uuid, text: &str) -> Result<(), sqlx::Error> {
            if let Some(marker) = &self.fail_text_update_for {
                let path = self.applicant(id).map(|a| a.resume_path).unwrap_or_default();
                if path.contains(marker.as_str()) {
                    return Err(sqlx::Error::Protocol("injected write failure".into()));
                }
            }
            self.with_applicant(id, |a| a.resume_text = text.to_string())
        }

        async fn apply_parsed_fields(
            &self,
            applicant: &ApplicantRow,
            parsed: &ParsedResume,
        ) -> Result<(), sqlx::Error> {
            self.replaced_children.lock().unwrap().push(applicant.id);
            self.with_applicant(applicant.id, |a| {
                if !parsed.profile.name.trim().is_empty() {
                    a.name = parsed.profile.name.trim().to_string();
                }
                a.email = parsed.profile.email.trim().to_string();
                a.relevance_score = parsed.relevance.map(|r| r.clamp(0, 100)).unwrap_or(0);
                a.score_cached = false;
            })
        }

        async fn set_relevance(&self, id: Uuid, score: i32) -> Result<(), sqlx::Error> {
            self.relevance_writes.lock().unwrap().push(id);
            self.with_applicant(id, |a| {
                a.relevance_score = score.clamp(0, 100);
                a.score_cached = true;
            })
        }

        async fn set_explanation(&self, id: Uuid, explanation: &str) -> Result<(), sqlx::Error> {
            self.with_applicant(id, |a| a.explanation = explanation.to_string())
        }

        async fn get_applicant(&self, id: Uuid) -> Result<Option<ApplicantRow>, sqlx::Error> {
            Ok(self.applicant(id))
        }

        async fn applicants_pending_score(
            &self,
            job_id: Uuid,
        ) -> Result<Vec<ApplicantRow>, sqlx::Error> {
            Ok(self
                .applicants
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.job_id == job_id && !a.score_cached)
                .cloned()
                .collect())
        }
    }
}
