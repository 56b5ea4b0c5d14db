use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named CV document owned by one applicant. The file itself lives in object
/// storage; `file_url` is an opaque reference.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Cv {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub title: String,
    pub file_url: String,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
