use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use crate::authz::{self, Actor};
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus};
use crate::services::notification_service::{NotificationService, StatusChanged};

/// An application joined with the context the workflow needs: who applied,
/// which job, who owns it. Loaded once per operation so authorization and
/// event payloads come from the same snapshot.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ApplicationContext {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub cv_id: Option<Uuid>,
    pub status: String,
    pub recruiter_notes: Option<String>,
    pub active: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub applicant_username: String,
    pub applicant_email: String,
    pub job_title: String,
    pub company_name: String,
    pub job_owner_id: Uuid,
}

impl ApplicationContext {
    pub fn status(&self) -> ApplicationStatus {
        ApplicationStatus::from_str(&self.status).unwrap_or(ApplicationStatus::Pending)
    }

    pub fn into_application(self) -> Application {
        Application {
            id: self.id,
            job_id: self.job_id,
            applicant_id: self.applicant_id,
            cv_id: self.cv_id,
            status: self.status,
            recruiter_notes: self.recruiter_notes,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

pub(crate) async fn load_context(pool: &PgPool, id: Uuid) -> Result<ApplicationContext> {
    let context = sqlx::query_as::<_, ApplicationContext>(
        r#"
        SELECT a.id, a.job_id, a.applicant_id, a.cv_id, a.status, a.recruiter_notes,
               a.active, a.created_at, a.updated_at,
               u.username AS applicant_username,
               u.email AS applicant_email,
               j.title AS job_title,
               c.name AS company_name,
               rp.user_id AS job_owner_id
        FROM applications a
        JOIN users u ON u.id = a.applicant_id
        JOIN jobs j ON j.id = a.job_id
        JOIN recruiter_profiles rp ON rp.id = j.recruiter_id
        JOIN companies c ON c.id = j.company_id
        WHERE a.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
    Ok(context)
}

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
    notifications: NotificationService,
}

impl ApplicationService {
    pub fn new(pool: PgPool, notifications: NotificationService) -> Self {
        Self {
            pool,
            notifications,
        }
    }

    /// Submit an application. Validation order: role, job, CV, then the insert
    /// whose unique (job, applicant) constraint serializes concurrent racers.
    pub async fn apply(&self, actor: &Actor, job_id: Uuid, cv_id: Uuid) -> Result<Application> {
        authz::check_apply(actor)?;

        let job_exists = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM jobs WHERE id = $1 AND active"#,
        )
        .bind(job_id)
        .fetch_one(&self.pool)
        .await?;
        if job_exists == 0 {
            return Err(Error::NotFound("Job not found or inactive".to_string()));
        }

        let cv_owner = sqlx::query_scalar::<_, Uuid>(
            r#"SELECT applicant_id FROM cvs WHERE id = $1 AND active"#,
        )
        .bind(cv_id)
        .fetch_optional(&self.pool)
        .await?;
        match cv_owner {
            Some(owner) if owner == actor.user_id => {}
            Some(_) => {
                return Err(Error::BadRequest(
                    "CV does not belong to the applicant".to_string(),
                ))
            }
            None => return Err(Error::BadRequest("CV not found or inactive".to_string())),
        }

        let inserted = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (job_id, applicant_id, cv_id, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(actor.user_id)
        .bind(cv_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::from);

        match inserted {
            Ok(application) => Ok(application),
            Err(err) if err.is_unique_violation() => Err(Error::DuplicateApplication),
            Err(err) => Err(err),
        }
    }

    /// Set a new status. The closed set is validated, but the transition graph
    /// is deliberately permissive: any status can follow any other (the linear
    /// pending -> reviewed -> interview -> accepted/rejected path is intended,
    /// not enforced). After the update commits, the dispatcher is invoked
    /// synchronously and best-effort.
    pub async fn update_status(
        &self,
        actor: &Actor,
        application_id: Uuid,
        new_status: &str,
        recruiter_notes: Option<&str>,
    ) -> Result<Application> {
        let context = load_context(&self.pool, application_id).await?;
        authz::check_review_application(actor, context.job_owner_id)?;

        let new_status = ApplicationStatus::from_str(new_status)
            .map_err(|e| Error::BadRequest(format!("Invalid status: {}", e)))?;
        let old_status = context.status();

        let updated = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET status = $2,
                recruiter_notes = COALESCE($3, recruiter_notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(application_id)
        .bind(new_status.as_str())
        .bind(recruiter_notes)
        .fetch_one(&self.pool)
        .await?;

        self.notifications
            .dispatch_status_changed(&StatusChanged {
                application_id,
                applicant_id: context.applicant_id,
                applicant_username: context.applicant_username,
                applicant_email: context.applicant_email,
                job_title: context.job_title,
                old_status,
                new_status,
            })
            .await;

        Ok(updated)
    }

    /// The applicant may withdraw while the application is still early stage
    /// (pending or reviewed); admins may remove any.
    pub async fn withdraw(&self, actor: &Actor, application_id: Uuid) -> Result<()> {
        let context = load_context(&self.pool, application_id).await?;
        let early_stage = matches!(
            context.status(),
            ApplicationStatus::Pending | ApplicationStatus::Reviewed
        );
        authz::check_withdraw(actor, context.applicant_id, early_stage)?;

        sqlx::query(r#"DELETE FROM applications WHERE id = $1"#)
            .bind(application_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get(&self, actor: &Actor, application_id: Uuid) -> Result<Application> {
        let context = load_context(&self.pool, application_id).await?;
        let visible = actor.is_admin()
            || actor.user_id == context.applicant_id
            || actor.user_id == context.job_owner_id;
        if !visible {
            return Err(Error::Forbidden(
                "application is not visible to this user".to_string(),
            ));
        }
        Ok(context.into_application())
    }

    pub async fn list_own(&self, actor: &Actor) -> Result<Vec<Application>> {
        let applications = sqlx::query_as::<_, Application>(
            r#"
            SELECT * FROM applications
            WHERE applicant_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(actor.user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(applications)
    }

    /// Applications to one of the recruiter's own jobs.
    pub async fn list_for_job(&self, actor: &Actor, job_id: Uuid) -> Result<Vec<Application>> {
        let owner = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT rp.user_id
            FROM jobs j
            JOIN recruiter_profiles rp ON rp.id = j.recruiter_id
            WHERE j.id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;
        authz::check_review_application(actor, owner)?;

        let applications = sqlx::query_as::<_, Application>(
            r#"
            SELECT * FROM applications
            WHERE job_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(applications)
    }
}
