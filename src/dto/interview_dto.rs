use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::interview::Interview;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateInterviewPayload {
    pub application_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub location: Option<String>,
    pub link: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InterviewResponse {
    pub id: Uuid,
    pub application_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub location: Option<String>,
    pub link: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Interview> for InterviewResponse {
    fn from(i: Interview) -> Self {
        Self {
            id: i.id,
            application_id: i.application_id,
            scheduled_at: i.scheduled_at,
            location: i.location,
            link: i.link,
            notes: i.notes,
            created_at: i.created_at,
        }
    }
}
