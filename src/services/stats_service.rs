//! Read-side analytics. Nothing here is stored or cached: every query
//! recomputes from the current rows, so the numbers always agree with the
//! persisted state at the moment of the request. The aggregation itself is
//! pure over fetched rows.

use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use crate::authz::Actor;
use crate::dto::stats_dto::{
    CvBreakdown, JobBreakdown, JobSeekerStatsResponse, RecruiterStatsResponse, StatusHistogram,
};
use crate::error::{Error, Result};
use crate::models::application::ApplicationStatus;

#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub job_id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct RecruiterAppRow {
    pub job_id: Uuid,
    pub status: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct SeekerCvRow {
    pub cv_id: Uuid,
    pub title: String,
    pub views: i64,
    pub saves: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct SeekerAppRow {
    pub cv_id: Option<Uuid>,
    pub status: String,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// part/whole as a percentage, two decimals, 0 when the denominator is 0.
fn ratio(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 * 100.0 / whole as f64)
    }
}

fn parse_status(raw: &str) -> ApplicationStatus {
    ApplicationStatus::from_str(raw).unwrap_or(ApplicationStatus::Pending)
}

/// Recruiter-side aggregation over all applications to the recruiter's jobs.
/// Jobs without applications still appear in the breakdown, with zeros.
pub fn compute_recruiter_stats(
    jobs: &[JobRow],
    applications: &[RecruiterAppRow],
) -> RecruiterStatsResponse {
    let mut histogram = StatusHistogram::default();
    let mut qualified = 0i64;
    for app in applications {
        let status = parse_status(&app.status);
        histogram.bump(status);
        if status.is_qualified() {
            qualified += 1;
        }
    }
    let total = applications.len() as i64;

    let breakdown = jobs
        .iter()
        .map(|job| {
            let mut job_total = 0i64;
            let mut job_qualified = 0i64;
            for app in applications.iter().filter(|a| a.job_id == job.job_id) {
                job_total += 1;
                if parse_status(&app.status).is_qualified() {
                    job_qualified += 1;
                }
            }
            JobBreakdown {
                job_id: job.job_id,
                title: job.title.clone(),
                total_applications: job_total,
                qualified: job_qualified,
                qualification_ratio: ratio(job_qualified, job_total),
            }
        })
        .collect();

    RecruiterStatsResponse {
        total_applications: total,
        qualified,
        qualification_ratio: ratio(qualified, total),
        status_counts: histogram,
        jobs: breakdown,
    }
}

/// Job-seeker aggregation, restricted to CVs that have at least one
/// application (the `cvs` input is already filtered that way by the query).
pub fn compute_job_seeker_stats(
    cvs: &[SeekerCvRow],
    applications: &[SeekerAppRow],
) -> JobSeekerStatsResponse {
    let total_views: i64 = cvs.iter().map(|c| c.views).sum();
    let total_saves: i64 = cvs.iter().map(|c| c.saves).sum();
    let total_applications = applications.len() as i64;

    let mut responses = 0i64;
    let mut successful = 0i64;
    for app in applications {
        let status = parse_status(&app.status);
        if status.is_response() {
            responses += 1;
        }
        if status.is_qualified() {
            successful += 1;
        }
    }

    let breakdown = cvs
        .iter()
        .map(|cv| {
            let mut histogram = StatusHistogram::default();
            let mut cv_responses = 0i64;
            for app in applications
                .iter()
                .filter(|a| a.cv_id == Some(cv.cv_id))
            {
                let status = parse_status(&app.status);
                histogram.bump(status);
                if status.is_response() {
                    cv_responses += 1;
                }
            }
            CvBreakdown {
                cv_id: cv.cv_id,
                title: cv.title.clone(),
                views: cv.views,
                saves: cv.saves,
                total_applications: histogram.total(),
                responses: cv_responses,
                response_rate: ratio(cv_responses, cv.views),
                status_counts: histogram,
            }
        })
        .collect();

    JobSeekerStatsResponse {
        total_views,
        total_saves,
        total_applications,
        responses,
        response_rate: ratio(responses, total_views),
        application_success_rate: ratio(successful, total_applications),
        cvs: breakdown,
    }
}

#[derive(Clone)]
pub struct StatsService {
    pool: PgPool,
}

impl StatsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn recruiter_stats(&self, actor: &Actor) -> Result<RecruiterStatsResponse> {
        let recruiter_id = sqlx::query_scalar::<_, Uuid>(
            r#"SELECT id FROM recruiter_profiles WHERE user_id = $1 AND active"#,
        )
        .bind(actor.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::Forbidden("no recruiter profile for this user".to_string()))?;

        let jobs = sqlx::query_as::<_, JobRow>(
            r#"SELECT id AS job_id, title FROM jobs WHERE recruiter_id = $1"#,
        )
        .bind(recruiter_id)
        .fetch_all(&self.pool)
        .await?;

        let applications = sqlx::query_as::<_, RecruiterAppRow>(
            r#"
            SELECT a.job_id, a.status
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE j.recruiter_id = $1
            "#,
        )
        .bind(recruiter_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(compute_recruiter_stats(&jobs, &applications))
    }

    pub async fn job_seeker_stats(&self, actor: &Actor) -> Result<JobSeekerStatsResponse> {
        let cvs = sqlx::query_as::<_, SeekerCvRow>(
            r#"
            SELECT c.id AS cv_id, c.title,
                   (SELECT COUNT(*) FROM cv_views v WHERE v.cv_id = c.id AND v.active) AS views,
                   (SELECT COUNT(*) FROM cv_saves s WHERE s.cv_id = c.id AND s.active) AS saves
            FROM cvs c
            WHERE c.applicant_id = $1
              AND EXISTS (SELECT 1 FROM applications a WHERE a.cv_id = c.id)
            "#,
        )
        .bind(actor.user_id)
        .fetch_all(&self.pool)
        .await?;

        let applications = sqlx::query_as::<_, SeekerAppRow>(
            r#"SELECT cv_id, status FROM applications WHERE applicant_id = $1"#,
        )
        .bind(actor.user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(compute_job_seeker_stats(&cvs, &applications))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(job_id: Uuid, status: &str) -> RecruiterAppRow {
        RecruiterAppRow {
            job_id,
            status: status.to_string(),
        }
    }

    #[test]
    fn qualification_ratio_over_ten_applications() {
        let job = Uuid::new_v4();
        let jobs = vec![JobRow {
            job_id: job,
            title: "Backend Engineer".to_string(),
        }];
        let mut apps = vec![
            app(job, "interview"),
            app(job, "interview"),
            app(job, "accepted"),
            app(job, "accepted"),
        ];
        apps.extend((0..4).map(|_| app(job, "pending")));
        apps.push(app(job, "reviewed"));
        apps.push(app(job, "rejected"));

        let stats = compute_recruiter_stats(&jobs, &apps);
        assert_eq!(stats.total_applications, 10);
        assert_eq!(stats.qualified, 4);
        assert_eq!(stats.qualification_ratio, 40.00);
        assert_eq!(stats.status_counts.pending, 4);
        assert_eq!(stats.status_counts.interview, 2);
        assert_eq!(stats.status_counts.accepted, 2);
        assert_eq!(stats.jobs[0].qualification_ratio, 40.00);
    }

    #[test]
    fn recruiter_stats_on_empty_data() {
        let stats = compute_recruiter_stats(&[], &[]);
        assert_eq!(stats.total_applications, 0);
        assert_eq!(stats.qualification_ratio, 0.0);
        assert!(stats.jobs.is_empty());
    }

    #[test]
    fn job_without_applications_reports_zeros() {
        let busy = Uuid::new_v4();
        let quiet = Uuid::new_v4();
        let jobs = vec![
            JobRow {
                job_id: busy,
                title: "Busy".to_string(),
            },
            JobRow {
                job_id: quiet,
                title: "Quiet".to_string(),
            },
        ];
        let apps = vec![app(busy, "interview"), app(busy, "pending")];

        let stats = compute_recruiter_stats(&jobs, &apps);
        assert_eq!(stats.jobs.len(), 2);
        let quiet_row = stats.jobs.iter().find(|j| j.job_id == quiet).unwrap();
        assert_eq!(quiet_row.total_applications, 0);
        assert_eq!(quiet_row.qualification_ratio, 0.0);
        let busy_row = stats.jobs.iter().find(|j| j.job_id == busy).unwrap();
        assert_eq!(busy_row.qualification_ratio, 50.00);
    }

    #[test]
    fn ratios_round_to_two_decimals() {
        let job = Uuid::new_v4();
        let jobs = vec![JobRow {
            job_id: job,
            title: "Role".to_string(),
        }];
        let apps = vec![
            app(job, "interview"),
            app(job, "pending"),
            app(job, "pending"),
        ];
        let stats = compute_recruiter_stats(&jobs, &apps);
        assert_eq!(stats.qualification_ratio, 33.33);
    }

    fn seeker_cv(cv_id: Uuid, views: i64, saves: i64) -> SeekerCvRow {
        SeekerCvRow {
            cv_id,
            title: "My CV".to_string(),
            views,
            saves,
        }
    }

    fn seeker_app(cv_id: Uuid, status: &str) -> SeekerAppRow {
        SeekerAppRow {
            cv_id: Some(cv_id),
            status: status.to_string(),
        }
    }

    #[test]
    fn zero_views_never_divides() {
        let cv = Uuid::new_v4();
        let stats = compute_job_seeker_stats(
            &[seeker_cv(cv, 0, 0)],
            &[seeker_app(cv, "pending"), seeker_app(cv, "reviewed")],
        );
        assert_eq!(stats.total_views, 0);
        assert_eq!(stats.response_rate, 0.0);
        assert_eq!(stats.cvs[0].response_rate, 0.0);
    }

    #[test]
    fn seeker_rates_and_histogram() {
        let cv = Uuid::new_v4();
        let stats = compute_job_seeker_stats(
            &[seeker_cv(cv, 8, 3)],
            &[
                seeker_app(cv, "pending"),
                seeker_app(cv, "reviewed"),
                seeker_app(cv, "interview"),
                seeker_app(cv, "accepted"),
            ],
        );
        assert_eq!(stats.total_saves, 3);
        assert_eq!(stats.total_applications, 4);
        assert_eq!(stats.responses, 3);
        // 3 responses over 8 views.
        assert_eq!(stats.response_rate, 37.5);
        // interview + accepted over 4 applications.
        assert_eq!(stats.application_success_rate, 50.00);
        let cv_row = &stats.cvs[0];
        assert_eq!(cv_row.status_counts.pending, 1);
        assert_eq!(cv_row.status_counts.interview, 1);
        assert_eq!(cv_row.total_applications, 4);
    }

    #[test]
    fn application_with_deleted_cv_still_counts_in_totals() {
        let cv = Uuid::new_v4();
        let stats = compute_job_seeker_stats(
            &[seeker_cv(cv, 2, 0)],
            &[
                seeker_app(cv, "accepted"),
                SeekerAppRow {
                    cv_id: None,
                    status: "rejected".to_string(),
                },
            ],
        );
        assert_eq!(stats.total_applications, 2);
        assert_eq!(stats.responses, 2);
        // The orphaned application belongs to no CV row.
        assert_eq!(stats.cvs[0].total_applications, 1);
    }
}
