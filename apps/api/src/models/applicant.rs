use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A candidate profile produced by the screening pipeline.
///
/// `score_cached` is true iff an embedding-based relevance score has been
/// persisted since the profile's text last changed. Reparsing clears it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicantRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub name: String,
    pub email: String,
    pub resume_path: String,
    pub resume_text: String,
    pub relevance_score: i32,
    pub score_cached: bool,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EducationRow {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub institution: String,
    pub branch: String,
    pub degree: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub explanation: String,
}

/// Project relevance is bounded 0–5 (enforced on insert and by a CHECK).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub title: String,
    pub description: String,
    pub tech_stack: Value,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub relevance: i32,
    pub explanation: String,
}

/// Experience relevance is bounded 0–10 (enforced on insert and by a CHECK).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExperienceRow {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub role: String,
    pub organization: String,
    pub description: String,
    pub tech_stack: Value,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub relevance: i32,
    pub explanation: String,
}
