use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::cv::Cv;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCvPayload {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub file_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CvResponse {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub title: String,
    pub file_url: String,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Cv> for CvResponse {
    fn from(cv: Cv) -> Self {
        Self {
            id: cv.id,
            applicant_id: cv.applicant_id,
            title: cv.title,
            file_url: cv.file_url,
            active: cv.active,
            created_at: cv.created_at,
        }
    }
}
