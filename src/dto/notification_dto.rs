use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::notification::{DeviceToken, Notification};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterTokenPayload {
    #[validate(length(min = 1))]
    pub token: String,
    pub device_id: Option<String>,
    /// One of android, ios, web. Defaults to web.
    pub device_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct DeregisterTokenPayload {
    #[validate(length(min = 1))]
    pub token: String,
}

/// Single send when `token` is set, otherwise multicast to the active tokens
/// of `user_ids`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SendPushPayload {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub body: String,
    pub data: Option<HashMap<String, String>>,
    pub token: Option<String>,
    pub user_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            recipient_id: n.recipient_id,
            message: n.message,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceTokenResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub device_type: String,
    pub active: bool,
}

impl From<DeviceToken> for DeviceTokenResponse {
    fn from(t: DeviceToken) -> Self {
        Self {
            id: t.id,
            user_id: t.user_id,
            token: t.token,
            device_type: t.device_type,
            active: t.active,
        }
    }
}
