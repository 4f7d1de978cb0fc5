use std::path::{Path as FsPath, PathBuf};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::applicant::{ApplicantRow, EducationRow, ExperienceRow, ProjectRow};
use crate::models::job::JobRow;
use crate::screening::batch::{DocumentOutcome, SavedUpload};
use crate::screening::store::{self, RelevanceFilter, DEFAULT_THRESHOLD};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    if req.title.trim().is_empty() || req.description.trim().is_empty() {
        return Err(AppError::Validation(
            "Job title and description are required".to_string(),
        ));
    }
    let job = store::insert_job(&state.db, req.title.trim(), req.description.trim()).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    Ok(Json(store::list_jobs(&state.db).await?))
}

#[derive(Debug, Serialize)]
pub struct BatchUploadResponse {
    pub message: String,
    pub job_id: Uuid,
    pub data: Vec<DocumentOutcome>,
}

/// POST /api/v1/jobs/:job_id/resumes — batch upload for an existing job.
pub async fn handle_upload_resumes(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BatchUploadResponse>), AppError> {
    let job = store::get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let form = read_upload_form(multipart, &state.config.upload_dir).await?;
    if form.files.is_empty() {
        return Err(AppError::Validation("No files uploaded".to_string()));
    }

    let outcomes = state.screener.process_batch(&job, form.files).await;
    Ok((
        StatusCode::CREATED,
        Json(BatchUploadResponse {
            message: "Resumes uploaded successfully".to_string(),
            job_id: job.id,
            data: outcomes,
        }),
    ))
}

/// POST /api/v1/resumes — creates the job from form fields, then processes
/// the batch against it.
pub async fn handle_upload_with_job(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BatchUploadResponse>), AppError> {
    let form = read_upload_form(multipart, &state.config.upload_dir).await?;

    let title = form.job_title.unwrap_or_default();
    let description = form.job_description.unwrap_or_default();
    if title.trim().is_empty() || description.trim().is_empty() {
        return Err(AppError::Validation(
            "Job title and description are required".to_string(),
        ));
    }
    if form.files.is_empty() {
        return Err(AppError::Validation("No resumes uploaded".to_string()));
    }

    let job = store::insert_job(&state.db, title.trim(), description.trim()).await?;
    let outcomes = state.screener.process_batch(&job, form.files).await;
    Ok((
        StatusCode::CREATED,
        Json(BatchUploadResponse {
            message: "Resumes uploaded successfully".to_string(),
            job_id: job.id,
            data: outcomes,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListApplicantsParams {
    /// "rec" → relevance >= threshold, "norec" → relevance < threshold.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub threshold: Option<i32>,
}

/// GET /api/v1/jobs/:job_id/applicants?type=rec&threshold=70
///
/// Runs the refresh pass first, so relevance is lazily eventual: scores are
/// computed on read for any applicant missing a cached embedding score.
pub async fn handle_list_applicants(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(params): Query<ListApplicantsParams>,
) -> Result<Json<Vec<ApplicantRow>>, AppError> {
    let job = store::get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    state.screener.refresh_relevance(&job).await?;

    let filter = parse_filter(params.kind.as_deref());
    let threshold = params.threshold.unwrap_or(DEFAULT_THRESHOLD);

    let applicants = store::list_applicants(&state.db, job.id, filter, threshold).await?;
    Ok(Json(applicants))
}

#[derive(Debug, Serialize)]
pub struct ApplicantSummary {
    #[serde(flatten)]
    pub applicant: ApplicantRow,
    pub education: Vec<EducationRow>,
    pub projects: Vec<ProjectRow>,
    pub experiences: Vec<ExperienceRow>,
}

/// GET /api/v1/applicants/:id
pub async fn handle_applicant_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicantSummary>, AppError> {
    let applicant = store::get_applicant(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Applicant {id} not found")))?;

    let education = store::education_for(&state.db, id).await?;
    let projects = store::projects_for(&state.db, id).await?;
    let experiences = store::experiences_for(&state.db, id).await?;

    Ok(Json(ApplicantSummary {
        applicant,
        education,
        projects,
        experiences,
    }))
}

/// POST /api/v1/applicants/:id/reparse
///
/// Re-runs extraction and field parsing over the stored file. Child entries
/// are replaced, not appended, and the score cache is cleared — even when
/// re-extraction yields no text — so the next listing rescores against the
/// current text.
pub async fn handle_reparse(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicantRow>, AppError> {
    let applicant = store::get_applicant(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Applicant {id} not found")))?;
    let job = store::get_job(&state.db, applicant.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", applicant.job_id)))?;

    state.screener.reparse(&applicant, &job).await?;

    let updated = store::get_applicant(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Applicant {id} not found")))?;
    Ok(Json(updated))
}

// ────────────────────────────────────────────────────────────────────────────
// Multipart plumbing
// ────────────────────────────────────────────────────────────────────────────

/// Maps the `type` query parameter to a listing filter. Anything other
/// than "rec"/"norec" means no filter.
fn parse_filter(kind: Option<&str>) -> Option<RelevanceFilter> {
    match kind {
        Some("rec") => Some(RelevanceFilter::Recommended),
        Some("norec") => Some(RelevanceFilter::NotRecommended),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct UploadForm {
    job_title: Option<String>,
    job_description: Option<String>,
    files: Vec<SavedUpload>,
}

/// Reads the multipart form, writing each file under the upload directory
/// with a uuid-prefixed basename before any processing starts.
async fn read_upload_form(mut multipart: Multipart, upload_dir: &str) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart request: {e}")))?
    {
        match field.name() {
            Some("files") => {
                let original_name = field
                    .file_name()
                    .map(sanitize_filename)
                    .unwrap_or_else(|| "resume".to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                let saved = save_upload(upload_dir, &original_name, &bytes)
                    .await
                    .map_err(AppError::Internal)?;
                form.files.push(saved);
            }
            Some("job_title") => {
                form.job_title = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read job_title: {e}"))
                })?);
            }
            Some("job_description") => {
                form.job_description = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read job_description: {e}"))
                })?);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Keeps only the basename of a client-supplied filename.
fn sanitize_filename(name: &str) -> String {
    FsPath::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("resume")
        .to_string()
}

async fn save_upload(
    upload_dir: &str,
    original_name: &str,
    bytes: &[u8],
) -> anyhow::Result<SavedUpload> {
    tokio::fs::create_dir_all(upload_dir).await?;
    let stored_name = format!("{}_{}", Uuid::new_v4(), original_name);
    let path: PathBuf = FsPath::new(upload_dir).join(stored_name);
    tokio::fs::write(&path, bytes).await?;
    Ok(SavedUpload {
        original_name: original_name.to_string(),
        path,
    })
}
