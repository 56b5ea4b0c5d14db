use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// The closed set of application lifecycle states. The intended progression is
/// `pending -> reviewed -> interview -> accepted | rejected`, but the graph is
/// deliberately not enforced: an authorized recruiter may set any state from
/// any state (e.g. reject straight from pending). Only set membership is
/// checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Interview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Interview,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Counted as "qualified" in recruiter analytics: the application reached
    /// at least the interview stage.
    pub fn is_qualified(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Interview | ApplicationStatus::Accepted
        )
    }

    /// Counted as a "response" in job-seeker analytics: the recruiter did
    /// something with the application.
    pub fn is_response(&self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "reviewed" => Ok(ApplicationStatus::Reviewed),
            "interview" => Ok(ApplicationStatus::Interview),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("unknown application status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub cv_id: Option<Uuid>,
    pub status: String,
    pub recruiter_notes: Option<String>,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Application {
    pub fn status(&self) -> ApplicationStatus {
        // Column has a CHECK constraint on the same set; fall back to pending
        // rather than panicking if the database and the enum ever drift.
        ApplicationStatus::from_str(&self.status).unwrap_or(ApplicationStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in ApplicationStatus::ALL {
            assert_eq!(
                ApplicationStatus::from_str(status.as_str()),
                Ok(status),
                "{status} should parse back"
            );
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(ApplicationStatus::from_str("shortlisted").is_err());
        assert!(ApplicationStatus::from_str("Pending").is_err());
    }

    #[test]
    fn qualification_and_response_buckets() {
        assert!(ApplicationStatus::Interview.is_qualified());
        assert!(ApplicationStatus::Accepted.is_qualified());
        assert!(!ApplicationStatus::Rejected.is_qualified());
        assert!(!ApplicationStatus::Pending.is_response());
        assert!(ApplicationStatus::Rejected.is_response());
    }
}
