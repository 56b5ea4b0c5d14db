use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Fact record: this recruiter has viewed this CV. Unique per (cv, viewer);
/// repeat views reactivate the row instead of duplicating it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CvView {
    pub id: Uuid,
    pub cv_id: Uuid,
    pub viewer_id: Uuid,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fact record: this recruiter has bookmarked this CV. Unique per
/// (cv, recruiter); notes are replaced wholesale on repeat saves.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CvSaveAction {
    pub id: Uuid,
    pub cv_id: Uuid,
    pub recruiter_id: Uuid,
    pub notes: Option<String>,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
