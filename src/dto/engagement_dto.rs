use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::engagement::{CvSaveAction, CvView};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SaveCvPayload {
    pub notes: Option<String>,
}

/// Track responses carry `created` so callers can tell a first-time event from
/// an idempotent repeat.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrackedViewResponse {
    pub created: bool,
    pub id: Uuid,
    pub cv_id: Uuid,
    pub viewer_id: Uuid,
    pub viewed_at: Option<DateTime<Utc>>,
}

impl TrackedViewResponse {
    pub fn from_record(view: CvView, created: bool) -> Self {
        Self {
            created,
            id: view.id,
            cv_id: view.cv_id,
            viewer_id: view.viewer_id,
            viewed_at: view.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrackedSaveResponse {
    pub created: bool,
    pub id: Uuid,
    pub cv_id: Uuid,
    pub recruiter_id: Uuid,
    pub notes: Option<String>,
    pub saved_at: Option<DateTime<Utc>>,
}

impl TrackedSaveResponse {
    pub fn from_record(save: CvSaveAction, created: bool) -> Self {
        Self {
            created,
            id: save.id,
            cv_id: save.cv_id,
            recruiter_id: save.recruiter_id,
            notes: save.notes,
            saved_at: save.created_at,
        }
    }
}
