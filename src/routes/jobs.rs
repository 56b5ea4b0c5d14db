use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    authz::{self, Actor},
    dto::job_dto::{
        CreateJobPayload, JobListQuery, JobListResponse, JobResponse, UpdateJobPayload,
    },
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/public/jobs",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page"),
        ("title" = Option<String>, Query, description = "Title filter"),
        ("location" = Option<String>, Query, description = "Location filter"),
        ("min_salary" = Option<Decimal>, Query, description = "Minimum salary"),
        ("max_salary" = Option<Decimal>, Query, description = "Maximum salary")
    ),
    responses(
        (status = 200, description = "Active job postings", body = JobListResponse)
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse> {
    let list = state.job_service.list(&query).await?;
    Ok(Json(JobListResponse {
        items: list.items.into_iter().map(JobResponse::from).collect(),
        total: list.total,
        page: list.page,
        per_page: list.per_page,
        total_pages: list.total_pages,
    }))
}

#[utoipa::path(
    get,
    path = "/api/public/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job found", body = JobResponse),
        (status = 404, description = "Job not found or inactive")
    )
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.get_active(id).await?;
    Ok(Json(JobResponse::from(job)))
}

#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = CreateJobPayload,
    responses(
        (status = 201, description = "Job posted", body = JobResponse),
        (status = 403, description = "Not an employer")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let actor = Actor::from_claims(&claims)?;
    let job = state.job_service.create(&actor, &payload).await?;
    Ok((StatusCode::CREATED, Json(JobResponse::from(job))))
}

#[utoipa::path(
    patch,
    path = "/api/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    request_body = UpdateJobPayload,
    responses(
        (status = 200, description = "Job updated", body = JobResponse),
        (status = 403, description = "Not the owning recruiter")
    )
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let actor = Actor::from_claims(&claims)?;
    let job = state.job_service.update(&actor, id, &payload).await?;
    Ok(Json(JobResponse::from(job)))
}

/// Announce a posting to every job seeker with an active device token.
#[utoipa::path(
    post,
    path = "/api/jobs/{id}/broadcast",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Per-token delivery counts"),
        (status = 403, description = "Only staff or the job's own recruiter")
    )
)]
#[axum::debug_handler]
pub async fn broadcast_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let actor = Actor::from_claims(&claims)?;
    let (job, owner_id) = state.job_service.get_with_owner(id).await?;
    authz::check_broadcast_job(&actor, owner_id)?;
    let report = state
        .notification_service
        .broadcast_new_job(job.id, &job.title, &job.location)
        .await?;
    Ok(Json(report))
}
