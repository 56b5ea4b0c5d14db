use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    authz::Actor,
    dto::stats_dto::{JobSeekerStatsResponse, RecruiterStatsResponse},
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/stats/recruiter",
    responses(
        (status = 200, description = "Aggregated recruiter statistics", body = RecruiterStatsResponse),
        (status = 403, description = "No recruiter profile")
    )
)]
#[axum::debug_handler]
pub async fn recruiter_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let actor = Actor::from_claims(&claims)?;
    let stats = state.stats_service.recruiter_stats(&actor).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/stats/job-seeker",
    responses(
        (status = 200, description = "Aggregated job-seeker statistics", body = JobSeekerStatsResponse)
    )
)]
#[axum::debug_handler]
pub async fn job_seeker_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let actor = Actor::from_claims(&claims)?;
    let stats = state.stats_service.job_seeker_stats(&actor).await?;
    Ok(Json(stats))
}
