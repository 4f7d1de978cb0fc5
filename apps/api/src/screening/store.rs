//! Persistence for jobs, applicants, and their child entries.
//!
//! Each applicant is written by exactly one pipeline worker; the only
//! transactional unit is "apply one parse result fully or not at all".

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::extraction::dates::normalize_date;
use crate::extraction::fields::ParsedResume;
use crate::models::applicant::{ApplicantRow, EducationRow, ExperienceRow, ProjectRow};
use crate::models::job::JobRow;

/// Listing filter relative to the relevance threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RelevanceFilter {
    /// `relevance_score >= threshold`
    Recommended,
    /// `relevance_score < threshold`
    NotRecommended,
}

pub const DEFAULT_THRESHOLD: i32 = 50;

pub async fn insert_job(pool: &PgPool, title: &str, description: &str) -> Result<JobRow, sqlx::Error> {
    Ok(sqlx::query_as::<_, JobRow>(
        "INSERT INTO jobs (id, title, description) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(description)
    .fetch_one(pool)
    .await?)
}

pub async fn list_jobs(pool: &PgPool) -> Result<Vec<JobRow>, sqlx::Error> {
    Ok(
        sqlx::query_as::<_, JobRow>("SELECT * FROM jobs ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?,
    )
}

pub async fn get_job(pool: &PgPool, id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
    Ok(sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

/// Creates the applicant shell before the pipeline runs. Identity defaults to
/// the uploaded filename until the field extractor finds something better.
pub async fn insert_applicant(
    pool: &PgPool,
    job_id: Uuid,
    resume_path: &str,
    fallback_name: &str,
) -> Result<ApplicantRow, sqlx::Error> {
    Ok(sqlx::query_as::<_, ApplicantRow>(
        "INSERT INTO applicants (id, job_id, name, resume_path) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(job_id)
    .bind(fallback_name)
    .bind(resume_path)
    .fetch_one(pool)
    .await?)
}

/// Rollback for one failed document. Cascades to child entries.
pub async fn delete_applicant(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM applicants WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_resume_text(pool: &PgPool, id: Uuid, text: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE applicants SET resume_text = $2 WHERE id = $1")
        .bind(id)
        .bind(text)
        .execute(pool)
        .await?;
    Ok(())
}

/// Applies one parse result to the applicant, replacing any previously
/// stored child entries (replace-on-reparse) and clearing the score cache.
/// Runs in a single transaction: fully applied or not at all.
pub async fn apply_parsed_fields(
    pool: &PgPool,
    applicant: &ApplicantRow,
    parsed: &ParsedResume,
) -> Result<(), sqlx::Error> {
    let name = if parsed.profile.name.trim().is_empty() {
        applicant.name.as_str()
    } else {
        parsed.profile.name.trim()
    };
    let relevance_hint = parsed.relevance.map(|r| r.clamp(0, 100)).unwrap_or(0);

    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE applicants SET name = $2, email = $3, relevance_score = $4, score_cached = FALSE \
         WHERE id = $1",
    )
    .bind(applicant.id)
    .bind(name)
    .bind(parsed.profile.email.trim())
    .bind(relevance_hint)
    .execute(&mut *tx)
    .await?;

    for table in ["education_entries", "project_entries", "experience_entries"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE applicant_id = $1"))
            .bind(applicant.id)
            .execute(&mut *tx)
            .await?;
    }

    for education in &parsed.education {
        let institution = if education.institution.trim().is_empty() {
            "Unknown"
        } else {
            education.institution.trim()
        };
        sqlx::query(
            "INSERT INTO education_entries \
                 (id, applicant_id, institution, branch, degree, start_date, end_date, explanation) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::new_v4())
        .bind(applicant.id)
        .bind(institution)
        .bind(&education.branch)
        .bind(&education.degree)
        .bind(normalize_date(&education.start_date))
        .bind(normalize_date(&education.end_date))
        .bind(&education.explanation)
        .execute(&mut *tx)
        .await?;
    }

    for project in &parsed.projects {
        sqlx::query(
            "INSERT INTO project_entries \
                 (id, applicant_id, title, description, tech_stack, start_date, end_date, \
                  relevance, explanation) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(Uuid::new_v4())
        .bind(applicant.id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(serde_json::json!(project.tech_stack))
        .bind(normalize_date(&project.start_date))
        .bind(normalize_date(&project.end_date))
        .bind(project.relevance.clamp(0, 5))
        .bind(&project.explanation)
        .execute(&mut *tx)
        .await?;
    }

    for experience in &parsed.experiences {
        sqlx::query(
            "INSERT INTO experience_entries \
                 (id, applicant_id, role, organization, description, tech_stack, start_date, \
                  end_date, relevance, explanation) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(Uuid::new_v4())
        .bind(applicant.id)
        .bind(&experience.role)
        .bind(&experience.organization)
        .bind(&experience.description)
        .bind(serde_json::json!(experience.tech_stack))
        .bind(normalize_date(&experience.start_date))
        .bind(normalize_date(&experience.end_date))
        .bind(experience.relevance.clamp(0, 10))
        .bind(&experience.explanation)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Persists an embedding-derived score and marks it cached.
pub async fn set_relevance(pool: &PgPool, id: Uuid, score: i32) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE applicants SET relevance_score = $2, score_cached = TRUE WHERE id = $1",
    )
    .bind(id)
    .bind(score.clamp(0, 100))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_explanation(pool: &PgPool, id: Uuid, explanation: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE applicants SET explanation = $2 WHERE id = $1")
        .bind(id)
        .bind(explanation)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get_applicant(pool: &PgPool, id: Uuid) -> Result<Option<ApplicantRow>, sqlx::Error> {
    Ok(
        sqlx::query_as::<_, ApplicantRow>("SELECT * FROM applicants WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?,
    )
}

/// Applicants whose relevance has not been computed since their text last
/// changed — the work list for the refresh pass.
pub async fn applicants_pending_score(pool: &PgPool, job_id: Uuid) -> Result<Vec<ApplicantRow>, sqlx::Error> {
    Ok(sqlx::query_as::<_, ApplicantRow>(
        "SELECT * FROM applicants WHERE job_id = $1 AND score_cached = FALSE",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?)
}

/// Applicants for a job, optionally filtered against the relevance
/// threshold, ordered by descending relevance.
pub async fn list_applicants(
    pool: &PgPool,
    job_id: Uuid,
    filter: Option<RelevanceFilter>,
    threshold: i32,
) -> Result<Vec<ApplicantRow>, sqlx::Error> {
    let rows = match filter {
        Some(RelevanceFilter::Recommended) => {
            sqlx::query_as::<_, ApplicantRow>(
                "SELECT * FROM applicants WHERE job_id = $1 AND relevance_score >= $2 \
                 ORDER BY relevance_score DESC",
            )
            .bind(job_id)
            .bind(threshold)
            .fetch_all(pool)
            .await?
        }
        Some(RelevanceFilter::NotRecommended) => {
            sqlx::query_as::<_, ApplicantRow>(
                "SELECT * FROM applicants WHERE job_id = $1 AND relevance_score < $2 \
                 ORDER BY relevance_score DESC",
            )
            .bind(job_id)
            .bind(threshold)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, ApplicantRow>(
                "SELECT * FROM applicants WHERE job_id = $1 ORDER BY relevance_score DESC",
            )
            .bind(job_id)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}

pub async fn education_for(pool: &PgPool, applicant_id: Uuid) -> Result<Vec<EducationRow>, sqlx::Error> {
    Ok(sqlx::query_as::<_, EducationRow>(
        "SELECT * FROM education_entries WHERE applicant_id = $1",
    )
    .bind(applicant_id)
    .fetch_all(pool)
    .await?)
}

pub async fn projects_for(pool: &PgPool, applicant_id: Uuid) -> Result<Vec<ProjectRow>, sqlx::Error> {
    Ok(sqlx::query_as::<_, ProjectRow>(
        "SELECT * FROM project_entries WHERE applicant_id = $1 ORDER BY relevance DESC",
    )
    .bind(applicant_id)
    .fetch_all(pool)
    .await?)
}

pub async fn experiences_for(pool: &PgPool, applicant_id: Uuid) -> Result<Vec<ExperienceRow>, sqlx::Error> {
    Ok(sqlx::query_as::<_, ExperienceRow>(
        "SELECT * FROM experience_entries WHERE applicant_id = $1 ORDER BY relevance DESC",
    )
    .bind(applicant_id)
    .fetch_all(pool)
    .await?)
}

/// The persistence surface the screening pipeline writes through.
/// `PgPool` is the production implementation; tests substitute an
/// in-memory store to exercise the pipeline's control flow.
#[async_trait]
pub trait ScreeningStore: Send + Sync {
    async fn insert_applicant(
        &self,
        job_id: Uuid,
        resume_path: &str,
        fallback_name: &str,
    ) -> Result<ApplicantRow, sqlx::Error>;

    async fn delete_applicant(&self, id: Uuid) -> Result<(), sqlx::Error>;

    async fn update_resume_text(&self, id: Uuid, text: &str) -> Result<(), sqlx::Error>;

    async fn apply_parsed_fields(
        &self,
        applicant: &ApplicantRow,
        parsed: &ParsedResume,
    ) -> Result<(), sqlx::Error>;

    async fn set_relevance(&self, id: Uuid, score: i32) -> Result<(), sqlx::Error>;

    async fn set_explanation(&self, id: Uuid, explanation: &str) -> Result<(), sqlx::Error>;

    async fn get_applicant(&self, id: Uuid) -> Result<Option<ApplicantRow>, sqlx::Error>;

    async fn applicants_pending_score(&self, job_id: Uuid)
        -> Result<Vec<ApplicantRow>, sqlx::Error>;
}

#[async_trait]
impl ScreeningStore for PgPool {
    async fn insert_applicant(
        &self,
        job_id: Uuid,
        resume_path: &str,
        fallback_name: &str,
    ) -> Result<ApplicantRow, sqlx::Error> {
        insert_applicant(self, job_id, resume_path, fallback_name).await
    }

    async fn delete_applicant(&self, id: Uuid) -> Result<(), sqlx::Error> {
        delete_applicant(self, id).await
    }

    async fn update_resume_text(&self, id: Uuid, text: &str) -> Result<(), sqlx::Error> {
        update_resume_text(self, id, text).await
    }

    async fn apply_parsed_fields(
        &self,
        applicant: &ApplicantRow,
        parsed: &ParsedResume,
    ) -> Result<(), sqlx::Error> {
        apply_parsed_fields(self, applicant, parsed).await
    }

    async fn set_relevance(&self, id: Uuid, score: i32) -> Result<(), sqlx::Error> {
        set_relevance(self, id, score).await
    }

    async fn set_explanation(&self, id: Uuid, explanation: &str) -> Result<(), sqlx::Error> {
        set_explanation(self, id, explanation).await
    }

    async fn get_applicant(&self, id: Uuid) -> Result<Option<ApplicantRow>, sqlx::Error> {
        get_applicant(self, id).await
    }

    async fn applicants_pending_score(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<ApplicantRow>, sqlx::Error> {
        applicants_pending_score(self, job_id).await
    }
}
