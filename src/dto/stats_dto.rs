use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::application::ApplicationStatus;

/// Five-bucket count of applications by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusHistogram {
    pub pending: i64,
    pub reviewed: i64,
    pub interview: i64,
    pub accepted: i64,
    pub rejected: i64,
}

impl StatusHistogram {
    pub fn bump(&mut self, status: ApplicationStatus) {
        match status {
            ApplicationStatus::Pending => self.pending += 1,
            ApplicationStatus::Reviewed => self.reviewed += 1,
            ApplicationStatus::Interview => self.interview += 1,
            ApplicationStatus::Accepted => self.accepted += 1,
            ApplicationStatus::Rejected => self.rejected += 1,
        }
    }

    pub fn total(&self) -> i64 {
        self.pending + self.reviewed + self.interview + self.accepted + self.rejected
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobBreakdown {
    pub job_id: Uuid,
    pub title: String,
    pub total_applications: i64,
    pub qualified: i64,
    pub qualification_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecruiterStatsResponse {
    pub total_applications: i64,
    pub qualified: i64,
    pub qualification_ratio: f64,
    pub status_counts: StatusHistogram,
    pub jobs: Vec<JobBreakdown>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CvBreakdown {
    pub cv_id: Uuid,
    pub title: String,
    pub views: i64,
    pub saves: i64,
    pub total_applications: i64,
    pub responses: i64,
    pub response_rate: f64,
    pub status_counts: StatusHistogram,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobSeekerStatsResponse {
    pub total_views: i64,
    pub total_saves: i64,
    pub total_applications: i64,
    pub responses: i64,
    pub response_rate: f64,
    pub application_success_rate: f64,
    pub cvs: Vec<CvBreakdown>,
}
