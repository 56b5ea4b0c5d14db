use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::Actor;
use crate::error::{Error, Result};
use crate::models::application::ApplicationStatus;
use crate::models::notification::{DeviceToken, Notification};
use crate::transport::email::{EmailMessage, EmailTransport};
use crate::transport::push::{PushMessage, PushTransport};

/// Emitted by the state machine after a status change is durably persisted.
/// Carries everything the dispatcher needs so it never reads back through the
/// write path.
#[derive(Debug, Clone)]
pub struct StatusChanged {
    pub application_id: Uuid,
    pub applicant_id: Uuid,
    pub applicant_username: String,
    pub applicant_email: String,
    pub job_title: String,
    pub old_status: ApplicationStatus,
    pub new_status: ApplicationStatus,
}

#[derive(Debug, Clone)]
pub struct InterviewDetails {
    pub applicant_username: String,
    pub applicant_email: String,
    pub job_title: String,
    pub company_name: String,
    pub scheduled_at: chrono::DateTime<chrono::Utc>,
    pub location: Option<String>,
    pub link: Option<String>,
}

/// Per-token accounting for a fan-out send. A multicast never fails as a whole
/// because some tokens are invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct MulticastReport {
    pub success_count: usize,
    pub failure_count: usize,
}

pub fn status_change_message(event: &StatusChanged) -> String {
    format!(
        "Your application for \"{}\" is now {}.",
        event.job_title, event.new_status
    )
}

pub fn status_change_email(event: &StatusChanged, from: &str) -> EmailMessage {
    EmailMessage {
        subject: format!("Application status update - {}", event.job_title),
        body: format!(
            "Hello {},\n\n\
             The status of your application for the position {} has changed from {} to {}.\n\
             Please check the details in the system.\n\n\
             Thank you for using the job board!",
            event.applicant_username, event.job_title, event.old_status, event.new_status
        ),
        from: from.to_string(),
        to: vec![event.applicant_email.clone()],
    }
}

pub fn interview_email(details: &InterviewDetails, from: &str) -> EmailMessage {
    let mut body = format!(
        "Hello {},\n\n\
         You are invited to interview for the position {} at {}.\n\
         Time: {}\n\
         Location: {}\n",
        details.applicant_username,
        details.job_title,
        details.company_name,
        details.scheduled_at.format("%H:%M %d/%m/%Y"),
        details.location.as_deref().unwrap_or("Online"),
    );
    if let Some(link) = &details.link {
        body.push_str(&format!("Interview link: {}\n", link));
    }
    body.push_str("\nGood luck!\n-- Job Board --");

    EmailMessage {
        subject: format!("Interview invitation - {}", details.job_title),
        body,
        from: from.to_string(),
        to: vec![details.applicant_email.clone()],
    }
}

pub fn new_job_push(title: &str, location: &str, job_id: Uuid) -> PushMessage {
    PushMessage::new("New job posted", format!("{} - {}", title, location))
        .with_data("job_id", job_id)
}

#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
    email: Arc<dyn EmailTransport>,
    push: Arc<dyn PushTransport>,
    email_from: String,
}

impl NotificationService {
    pub fn new(
        pool: PgPool,
        email: Arc<dyn EmailTransport>,
        push: Arc<dyn PushTransport>,
        email_from: String,
    ) -> Self {
        Self {
            pool,
            email,
            push,
            email_from,
        }
    }

    /// Fan a status-change event out to the in-app and email channels.
    /// Best-effort on both: the status change is already committed, so channel
    /// failures are logged per recipient and never bubble up.
    pub async fn dispatch_status_changed(&self, event: &StatusChanged) {
        if let Err(err) = self
            .record_notification(event.applicant_id, &status_change_message(event))
            .await
        {
            tracing::warn!(
                application_id = %event.application_id,
                error = ?err,
                "failed to record status-change notification"
            );
        }

        let message = status_change_email(event, &self.email_from);
        if let Err(err) = self.email.send(&message).await {
            tracing::warn!(
                application_id = %event.application_id,
                error = %err,
                "status-change email delivery failed"
            );
        }
    }

    /// Interview-details email. Returns the transport error to the caller;
    /// the interview-creation path downgrades it to a warning, the explicit
    /// resend endpoint propagates it.
    pub async fn send_interview_email(&self, details: &InterviewDetails) -> Result<()> {
        let message = interview_email(details, &self.email_from);
        self.email.send(&message).await.map_err(Error::from)
    }

    pub async fn record_notification(
        &self,
        recipient_id: Uuid,
        message: &str,
    ) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (recipient_id, message)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(recipient_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;
        Ok(notification)
    }

    pub async fn list_notifications(&self, recipient_id: Uuid) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE recipient_id = $1 AND active
            ORDER BY created_at DESC
            "#,
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    pub async fn mark_read(&self, id: Uuid, actor: &Actor) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"SELECT * FROM notifications WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Notification not found".to_string()))?;

        crate::authz::check_read_notification(actor, notification.recipient_id)?;

        let updated = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    /// Single-token send. Transport errors surface to the caller.
    pub async fn push_to_token(&self, token: &str, message: &PushMessage) -> Result<String> {
        let message_id = self.push.send(token, message).await?;
        Ok(message_id)
    }

    /// Fan a message out to a set of tokens, partitioning successes and
    /// failures per token. An empty set reports 0/0.
    pub async fn multicast(&self, tokens: &[String], message: &PushMessage) -> MulticastReport {
        let mut report = MulticastReport::default();
        for token in tokens {
            match self.push.send(token, message).await {
                Ok(_) => report.success_count += 1,
                Err(err) => {
                    report.failure_count += 1;
                    tracing::warn!(error = %err, "push delivery failed for one token");
                }
            }
        }
        report
    }

    /// Multicast to the active device tokens of the given users.
    pub async fn notify_users(
        &self,
        user_ids: &[Uuid],
        message: &PushMessage,
    ) -> Result<MulticastReport> {
        let tokens = sqlx::query_scalar::<_, String>(
            r#"
            SELECT token FROM device_tokens
            WHERE active AND user_id = ANY($1)
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(self.multicast(&tokens, message).await)
    }

    /// New-job announcement to every active device token belonging to an
    /// active job-seeker user. Authorization is the caller's business.
    pub async fn broadcast_new_job(
        &self,
        job_id: Uuid,
        title: &str,
        location: &str,
    ) -> Result<MulticastReport> {
        let tokens = sqlx::query_scalar::<_, String>(
            r#"
            SELECT dt.token
            FROM device_tokens dt
            JOIN users u ON u.id = dt.user_id
            WHERE dt.active AND u.is_active AND u.role = 'job_seeker'
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        let message = new_job_push(title, location, job_id);
        Ok(self.multicast(&tokens, &message).await)
    }

    /// Get-or-create on (user, token); a previously revoked token is
    /// reactivated rather than duplicated.
    pub async fn register_device_token(
        &self,
        user_id: Uuid,
        token: &str,
        device_id: Option<&str>,
        device_type: &str,
    ) -> Result<DeviceToken> {
        let record = sqlx::query_as::<_, DeviceToken>(
            r#"
            INSERT INTO device_tokens (user_id, token, device_id, device_type)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, token) DO UPDATE
            SET active = TRUE, device_id = EXCLUDED.device_id,
                device_type = EXCLUDED.device_type, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(device_id)
        .bind(device_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    /// Soft-deactivate; the row survives for audit.
    pub async fn deregister_device_token(&self, user_id: Uuid, token: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE device_tokens
            SET active = FALSE, updated_at = NOW()
            WHERE user_id = $1 AND token = $2
            "#,
        )
        .bind(user_id)
        .bind(token)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Device token not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::email::MockEmailTransport;
    use crate::transport::push::MockPushTransport;
    use crate::transport::TransportError;

    fn lazy_pool() -> PgPool {
        // Never actually connected in these tests.
        PgPool::connect_lazy("postgres://localhost/unused").expect("lazy pool")
    }

    fn service(email: MockEmailTransport, push: MockPushTransport) -> NotificationService {
        NotificationService::new(
            lazy_pool(),
            Arc::new(email),
            Arc::new(push),
            "noreply@jobboard.example".to_string(),
        )
    }

    fn event() -> StatusChanged {
        StatusChanged {
            application_id: Uuid::new_v4(),
            applicant_id: Uuid::new_v4(),
            applicant_username: "alice".to_string(),
            applicant_email: "alice@example.com".to_string(),
            job_title: "Backend Engineer".to_string(),
            old_status: ApplicationStatus::Pending,
            new_status: ApplicationStatus::Reviewed,
        }
    }

    #[test]
    fn status_change_message_names_job_and_status() {
        let msg = status_change_message(&event());
        assert_eq!(
            msg,
            "Your application for \"Backend Engineer\" is now reviewed."
        );
    }

    #[test]
    fn status_change_email_addresses_the_applicant() {
        let mail = status_change_email(&event(), "noreply@jobboard.example");
        assert_eq!(mail.to, vec!["alice@example.com".to_string()]);
        assert!(mail.subject.contains("Backend Engineer"));
        assert!(mail.body.contains("from pending to reviewed"));
    }

    #[test]
    fn interview_email_includes_link_only_when_remote() {
        let mut details = InterviewDetails {
            applicant_username: "alice".to_string(),
            applicant_email: "alice@example.com".to_string(),
            job_title: "Backend Engineer".to_string(),
            company_name: "Acme".to_string(),
            scheduled_at: chrono::Utc::now(),
            location: None,
            link: Some("https://meet.example/abc".to_string()),
        };
        let mail = interview_email(&details, "noreply@jobboard.example");
        assert!(mail.body.contains("Location: Online"));
        assert!(mail.body.contains("https://meet.example/abc"));

        details.link = None;
        details.location = Some("HQ, room 4".to_string());
        let mail = interview_email(&details, "noreply@jobboard.example");
        assert!(mail.body.contains("HQ, room 4"));
        assert!(!mail.body.contains("Interview link"));
    }

    #[tokio::test]
    async fn multicast_partitions_successes_and_failures() {
        let mut push = MockPushTransport::new();
        push.expect_send()
            .withf(|token, _| token == "tok-1")
            .returning(|_, _| Ok("id-1".to_string()));
        push.expect_send()
            .withf(|token, _| token == "tok-bad")
            .returning(|_, _| Err(TransportError("invalid token".to_string())));
        push.expect_send()
            .withf(|token, _| token == "tok-2")
            .returning(|_, _| Ok("id-2".to_string()));

        let svc = service(MockEmailTransport::new(), push);
        let tokens = vec![
            "tok-1".to_string(),
            "tok-bad".to_string(),
            "tok-2".to_string(),
        ];
        let report = svc
            .multicast(&tokens, &PushMessage::new("t", "b"))
            .await;
        assert_eq!(
            report,
            MulticastReport {
                success_count: 2,
                failure_count: 1
            }
        );
    }

    #[tokio::test]
    async fn multicast_of_nothing_reports_zero() {
        let svc = service(MockEmailTransport::new(), MockPushTransport::new());
        let report = svc.multicast(&[], &PushMessage::new("t", "b")).await;
        assert_eq!(report, MulticastReport::default());
    }

    #[tokio::test]
    async fn single_push_surfaces_transport_failure() {
        let mut push = MockPushTransport::new();
        push.expect_send()
            .returning(|_, _| Err(TransportError("gone".to_string())));
        let svc = service(MockEmailTransport::new(), push);
        let err = svc
            .push_to_token("tok", &PushMessage::new("t", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn interview_email_error_propagates() {
        let mut email = MockEmailTransport::new();
        email
            .expect_send()
            .returning(|_| Err(TransportError("smtp down".to_string())));
        let svc = service(email, MockPushTransport::new());
        let details = InterviewDetails {
            applicant_username: "alice".to_string(),
            applicant_email: "alice@example.com".to_string(),
            job_title: "Backend Engineer".to_string(),
            company_name: "Acme".to_string(),
            scheduled_at: chrono::Utc::now(),
            location: None,
            link: None,
        };
        assert!(matches!(
            svc.send_interview_email(&details).await,
            Err(Error::Transport(_))
        ));
    }
}
