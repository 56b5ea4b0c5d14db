use sqlx::PgPool;
use uuid::Uuid;

use crate::authz::{self, Actor};
use crate::dto::interview_dto::CreateInterviewPayload;
use crate::error::{Error, Result};
use crate::models::interview::Interview;
use crate::services::application_service::{load_context, ApplicationContext};
use crate::services::notification_service::{InterviewDetails, NotificationService};

#[derive(Clone)]
pub struct InterviewService {
    pool: PgPool,
    notifications: NotificationService,
}

impl InterviewService {
    pub fn new(pool: PgPool, notifications: NotificationService) -> Self {
        Self {
            pool,
            notifications,
        }
    }

    /// Schedule the interview for an application. At most one interview per
    /// application; the unique constraint turns a second attempt (or a race)
    /// into `DuplicateInterview` and leaves the original untouched. The insert
    /// and the application's move to `interview` commit together, then the
    /// applicant is emailed the details, best-effort.
    pub async fn create(&self, actor: &Actor, payload: &CreateInterviewPayload) -> Result<Interview> {
        let context = load_context(&self.pool, payload.application_id).await?;
        authz::check_review_application(actor, context.job_owner_id)?;

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, Interview>(
            r#"
            INSERT INTO interviews (application_id, scheduled_at, location, link, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(payload.application_id)
        .bind(payload.scheduled_at)
        .bind(payload.location.as_deref())
        .bind(payload.link.as_deref())
        .bind(payload.notes.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::from);

        let interview = match inserted {
            Ok(interview) => interview,
            Err(err) if err.is_unique_violation() => return Err(Error::DuplicateInterview),
            Err(err) => return Err(err),
        };

        sqlx::query(
            r#"UPDATE applications SET status = 'interview', updated_at = NOW() WHERE id = $1"#,
        )
        .bind(payload.application_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if let Err(err) = self
            .notifications
            .send_interview_email(&details(&context, &interview))
            .await
        {
            tracing::warn!(
                interview_id = %interview.id,
                error = %err,
                "interview email delivery failed"
            );
        }

        Ok(interview)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Interview> {
        let interview = self.load(id).await?;
        let context = load_context(&self.pool, interview.application_id).await?;
        let visible = actor.is_admin()
            || actor.user_id == context.applicant_id
            || actor.user_id == context.job_owner_id;
        if !visible {
            return Err(Error::Forbidden(
                "interview is not visible to this user".to_string(),
            ));
        }
        Ok(interview)
    }

    /// Explicit resend of the interview-details email. Unlike the creation
    /// path, the caller asked for exactly this, so a transport failure
    /// surfaces as an error.
    pub async fn send_email(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let interview = self.load(id).await?;
        let context = load_context(&self.pool, interview.application_id).await?;
        authz::check_review_application(actor, context.job_owner_id)?;

        self.notifications
            .send_interview_email(&details(&context, &interview))
            .await
    }

    async fn load(&self, id: Uuid) -> Result<Interview> {
        sqlx::query_as::<_, Interview>(r#"SELECT * FROM interviews WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Interview not found".to_string()))
    }
}

fn details(context: &ApplicationContext, interview: &Interview) -> InterviewDetails {
    InterviewDetails {
        applicant_username: context.applicant_username.clone(),
        applicant_email: context.applicant_email.clone(),
        job_title: context.job_title.clone(),
        company_name: context.company_name.clone(),
        scheduled_at: interview.scheduled_at,
        location: interview.location.clone(),
        link: interview.link.clone(),
    }
}
