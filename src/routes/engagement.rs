use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    authz::Actor,
    dto::engagement_dto::{SaveCvPayload, TrackedSaveResponse, TrackedViewResponse},
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/cvs/{id}/view",
    params(("id" = Uuid, Path, description = "CV ID")),
    responses(
        (status = 200, description = "View tracked (idempotent)", body = TrackedViewResponse),
        (status = 403, description = "No recruiter profile"),
        (status = 404, description = "CV not found")
    )
)]
#[axum::debug_handler]
pub async fn track_view(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(cv_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let actor = Actor::from_claims(&claims)?;
    let (view, created) = state.engagement_service.track_view(&actor, cv_id).await?;
    Ok(Json(TrackedViewResponse::from_record(view, created)))
}

#[utoipa::path(
    post,
    path = "/api/cvs/{id}/save",
    params(("id" = Uuid, Path, description = "CV ID")),
    request_body = SaveCvPayload,
    responses(
        (status = 200, description = "Save tracked (idempotent); notes replaced on repeat", body = TrackedSaveResponse),
        (status = 403, description = "No recruiter profile"),
        (status = 404, description = "CV not found")
    )
)]
#[axum::debug_handler]
pub async fn track_save(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(cv_id): Path<Uuid>,
    Json(payload): Json<SaveCvPayload>,
) -> Result<impl IntoResponse> {
    let actor = Actor::from_claims(&claims)?;
    let (save, created) = state
        .engagement_service
        .track_save(&actor, cv_id, payload.notes.as_deref())
        .await?;
    Ok(Json(TrackedSaveResponse::from_record(save, created)))
}
