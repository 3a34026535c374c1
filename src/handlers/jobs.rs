use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::error::PortalError;
use crate::router::PortalState;
use crate::types::filters::{JobFilters, JobPage, PageParams};
use crate::db::models::JobListing;

pub async fn list_jobs_handler(
    State(state): State<PortalState>,
    Query(filters): Query<JobFilters>,
    Query(params): Query<PageParams>,
) -> Result<Json<JobPage>, PortalError> {
    let params = params.normalized();
    let (jobs, total) = state.storage.list_jobs(&filters, params).await?;
    Ok(Json(JobPage::new(jobs, total, params)))
}

pub async fn get_job_handler(
    State(state): State<PortalState>,
    Path(id): Path<i64>,
) -> Result<Json<JobListing>, PortalError> {
    state
        .storage
        .get_job(id)
        .await?
        .map(Json)
        .ok_or_else(|| PortalError::NotFound(format!("Job {id}")))
}
