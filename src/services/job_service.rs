use sqlx::PgPool;
use uuid::Uuid;

use crate::authz::{Actor, Role};
use crate::dto::job_dto::{CreateJobPayload, JobListQuery, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::models::company::RecruiterProfile;
use crate::models::job::Job;

pub struct JobList {
    pub items: Vec<Job>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// LIMIT/OFFSET window from caller-supplied paging. The endpoint is public,
/// so the input is hostile: a page whose offset does not fit in i64 is
/// rejected instead of wrapping into a negative OFFSET.
fn page_window(page: Option<i64>, per_page: Option<i64>) -> Result<(i64, i64, i64)> {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1)
        .checked_mul(per_page)
        .ok_or_else(|| Error::BadRequest("page is out of range".to_string()))?;
    Ok((page, per_page, offset))
}

#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
}

impl JobService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Postings are owned by the recruiter profile; the company comes from the
    /// profile, never from the payload.
    pub async fn create(&self, actor: &Actor, payload: &CreateJobPayload) -> Result<Job> {
        if actor.role != Role::Employer {
            return Err(Error::Forbidden(
                "only employers may post jobs".to_string(),
            ));
        }
        let profile = sqlx::query_as::<_, RecruiterProfile>(
            r#"SELECT * FROM recruiter_profiles WHERE user_id = $1 AND active"#,
        )
        .bind(actor.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::Forbidden("no recruiter profile for this user".to_string()))?;

        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (recruiter_id, company_id, job_type_id, title, description, location, salary)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(profile.id)
        .bind(profile.company_id)
        .bind(payload.job_type_id)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.location)
        .bind(payload.salary)
        .fetch_one(&self.pool)
        .await?;
        Ok(job)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, payload: &UpdateJobPayload) -> Result<Job> {
        let (_, owner_id) = self.get_with_owner(id).await?;
        if !actor.is_admin() && actor.user_id != owner_id {
            return Err(Error::Forbidden(
                "only the owning recruiter may edit this job".to_string(),
            ));
        }

        let job = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                salary = COALESCE($5, salary),
                job_type_id = COALESCE($6, job_type_id),
                active = COALESCE($7, active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.title.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.location.as_deref())
        .bind(payload.salary)
        .bind(payload.job_type_id)
        .bind(payload.active)
        .fetch_one(&self.pool)
        .await?;
        Ok(job)
    }

    pub async fn get_active(&self, id: Uuid) -> Result<Job> {
        sqlx::query_as::<_, Job>(r#"SELECT * FROM jobs WHERE id = $1 AND active"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found or inactive".to_string()))
    }

    /// The job plus the user id of the recruiter owning it, for authorization.
    pub async fn get_with_owner(&self, id: Uuid) -> Result<(Job, Uuid)> {
        let job = sqlx::query_as::<_, Job>(r#"SELECT * FROM jobs WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;
        let owner_id = sqlx::query_scalar::<_, Uuid>(
            r#"SELECT user_id FROM recruiter_profiles WHERE id = $1"#,
        )
        .bind(job.recruiter_id)
        .fetch_one(&self.pool)
        .await?;
        Ok((job, owner_id))
    }

    pub async fn list(&self, query: &JobListQuery) -> Result<JobList> {
        let (page, per_page, offset) = page_window(query.page, query.per_page)?;

        let filter = r#"
            active
            AND ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
            AND ($2::text IS NULL OR location ILIKE '%' || $2 || '%')
            AND ($3::numeric IS NULL OR salary >= $3)
            AND ($4::numeric IS NULL OR salary <= $4)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM jobs WHERE {}",
            filter
        ))
        .bind(query.title.as_deref())
        .bind(query.location.as_deref())
        .bind(query.min_salary)
        .bind(query.max_salary)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, Job>(&format!(
            "SELECT * FROM jobs WHERE {} ORDER BY created_at DESC LIMIT $5 OFFSET $6",
            filter
        ))
        .bind(query.title.as_deref())
        .bind(query.location.as_deref())
        .bind(query.min_salary)
        .bind(query.max_salary)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total_pages = (total + per_page - 1) / per_page;
        Ok(JobList {
            items,
            total,
            page,
            per_page,
            total_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults_and_clamps() {
        assert_eq!(page_window(None, None).unwrap(), (1, 20, 0));
        assert_eq!(page_window(Some(0), Some(0)).unwrap(), (1, 1, 0));
        assert_eq!(page_window(Some(-5), Some(500)).unwrap(), (1, 100, 0));
        assert_eq!(page_window(Some(3), Some(25)).unwrap(), (3, 25, 50));
    }

    #[test]
    fn overflowing_page_is_rejected() {
        let err = page_window(Some(i64::MAX), None).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        let err = page_window(Some(i64::MAX), Some(100)).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }
}
