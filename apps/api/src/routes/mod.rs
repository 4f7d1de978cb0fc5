pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Job CRUD
        .route(
            "/api/v1/jobs",
            post(handlers::handle_create_job).get(handlers::handle_list_jobs),
        )
        // Batch resume processing
        .route(
            "/api/v1/jobs/:job_id/resumes",
            post(handlers::handle_upload_resumes),
        )
        .route("/api/v1/resumes", post(handlers::handle_upload_with_job))
        // Applicant read surface (listing triggers the refresh pass)
        .route(
            "/api/v1/jobs/:job_id/applicants",
            get(handlers::handle_list_applicants),
        )
        .route(
            "/api/v1/applicants/:id",
            get(handlers::handle_applicant_summary),
        )
        .route(
            "/api/v1/applicants/:id/reparse",
            post(handlers::handle_reparse),
        )
        .with_state(state)
}
