use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    authz::{Actor, Role},
    dto::cv_dto::{CreateCvPayload, CvResponse},
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/cvs",
    request_body = CreateCvPayload,
    responses(
        (status = 201, description = "CV created", body = CvResponse),
        (status = 403, description = "Not a job seeker")
    )
)]
#[axum::debug_handler]
pub async fn create_cv(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCvPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let actor = Actor::from_claims(&claims)?;
    let cv = state.cv_service.create(&actor, &payload).await?;
    Ok((StatusCode::CREATED, Json(CvResponse::from(cv))))
}

#[utoipa::path(
    get,
    path = "/api/cvs",
    responses((status = 200, description = "The caller's CVs", body = [CvResponse]))
)]
#[axum::debug_handler]
pub async fn list_my_cvs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let actor = Actor::from_claims(&claims)?;
    let cvs = state.cv_service.list_own(&actor).await?;
    let body: Vec<CvResponse> = cvs.into_iter().map(CvResponse::from).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/cvs/{id}",
    params(("id" = Uuid, Path, description = "CV ID")),
    responses(
        (status = 200, description = "CV found", body = CvResponse),
        (status = 404, description = "CV not found")
    )
)]
#[axum::debug_handler]
pub async fn get_cv(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let actor = Actor::from_claims(&claims)?;
    let cv = state.cv_service.get_active(id).await?;

    // A recruiter opening a CV counts as a view; tracking failure must not
    // break the read.
    if actor.role == Role::Employer {
        if let Err(err) = state.engagement_service.track_view(&actor, id).await {
            tracing::warn!(cv_id = %id, error = ?err, "failed to track CV view");
        }
    }

    Ok(Json(CvResponse::from(cv)))
}

#[utoipa::path(
    delete,
    path = "/api/cvs/{id}",
    params(("id" = Uuid, Path, description = "CV ID")),
    responses(
        (status = 204, description = "CV removed"),
        (status = 403, description = "Not the owner")
    )
)]
#[axum::debug_handler]
pub async fn delete_cv(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let actor = Actor::from_claims(&claims)?;
    state.cv_service.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
