use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    authz::Actor,
    dto::notification_dto::{
        DeregisterTokenPayload, DeviceTokenResponse, NotificationResponse, RegisterTokenPayload,
        SendPushPayload,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    transport::push::PushMessage,
    AppState,
};

const DEVICE_TYPES: [&str; 3] = ["android", "ios", "web"];

#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "The caller's notifications, newest first", body = [NotificationResponse])
    )
)]
#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let actor = Actor::from_claims(&claims)?;
    let notifications = state
        .notification_service
        .list_notifications(actor.user_id)
        .await?;
    let body: Vec<NotificationResponse> = notifications
        .into_iter()
        .map(NotificationResponse::from)
        .collect();
    Ok(Json(body))
}

#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked read", body = NotificationResponse),
        (status = 403, description = "Belongs to another user")
    )
)]
#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let actor = Actor::from_claims(&claims)?;
    let notification = state.notification_service.mark_read(id, &actor).await?;
    Ok(Json(NotificationResponse::from(notification)))
}

#[utoipa::path(
    post,
    path = "/api/device-tokens",
    request_body = RegisterTokenPayload,
    responses(
        (status = 200, description = "Token registered or reactivated", body = DeviceTokenResponse),
        (status = 400, description = "Unknown device type")
    )
)]
#[axum::debug_handler]
pub async fn register_device_token(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RegisterTokenPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let actor = Actor::from_claims(&claims)?;
    let device_type = payload.device_type.as_deref().unwrap_or("web");
    if !DEVICE_TYPES.contains(&device_type) {
        return Err(Error::BadRequest(format!(
            "unknown device type: {}",
            device_type
        )));
    }
    let token = state
        .notification_service
        .register_device_token(
            actor.user_id,
            &payload.token,
            payload.device_id.as_deref(),
            device_type,
        )
        .await?;
    Ok(Json(DeviceTokenResponse::from(token)))
}

#[utoipa::path(
    delete,
    path = "/api/device-tokens",
    request_body = DeregisterTokenPayload,
    responses(
        (status = 204, description = "Token deactivated"),
        (status = 404, description = "Token not registered for this user")
    )
)]
#[axum::debug_handler]
pub async fn deregister_device_token(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<DeregisterTokenPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let actor = Actor::from_claims(&claims)?;
    state
        .notification_service
        .deregister_device_token(actor.user_id, &payload.token)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Direct push sends are a staff tool.
#[utoipa::path(
    post,
    path = "/api/notifications/push",
    request_body = SendPushPayload,
    responses(
        (status = 200, description = "Single send: message id; multicast: per-token counts"),
        (status = 403, description = "Admin only")
    )
)]
#[axum::debug_handler]
pub async fn send_push(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SendPushPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let actor = Actor::from_claims(&claims)?;
    if !actor.is_admin() {
        return Err(Error::Forbidden(
            "only administrators may send pushes directly".to_string(),
        ));
    }

    let mut message = PushMessage::new(payload.title.clone(), payload.body.clone());
    if let Some(data) = &payload.data {
        for (key, value) in data {
            message = message.with_data(key.clone(), value.clone());
        }
    }

    if let Some(token) = &payload.token {
        let message_id = state
            .notification_service
            .push_to_token(token, &message)
            .await?;
        return Ok(Json(json!({ "message_id": message_id })).into_response());
    }

    let user_ids = payload
        .user_ids
        .ok_or_else(|| Error::BadRequest("either token or user_ids is required".to_string()))?;
    let report = state
        .notification_service
        .notify_users(&user_ids, &message)
        .await?;
    Ok(Json(json!(report)).into_response())
}
