use sqlx::PgPool;
use uuid::Uuid;

use crate::authz::{self, Actor};
use crate::error::{Error, Result};
use crate::models::engagement::{CvSaveAction, CvView};

#[derive(Clone)]
pub struct EngagementService {
    pool: PgPool,
}

impl EngagementService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record that a recruiter viewed a CV. Get-or-create on (cv, viewer):
    /// the first call creates the row and reports `created = true`; repeats
    /// (including race losers, who fall through the ON CONFLICT arm) converge
    /// on the same row with `created = false`. A soft-deactivated row is
    /// reactivated, never duplicated.
    pub async fn track_view(&self, actor: &Actor, cv_id: Uuid) -> Result<(CvView, bool)> {
        authz::check_track_engagement(actor)?;
        let viewer_id = self.recruiter_profile_id(actor).await?;
        self.ensure_cv_exists(cv_id).await?;
        self.get_or_create_view(cv_id, viewer_id).await
    }

    /// Record that a recruiter bookmarked a CV. Same idempotency contract as
    /// `track_view`; notes are replaced wholesale on repeat saves. A save
    /// implies a view, so the view record is ensured as a side effect and
    /// callers never need to invoke both.
    pub async fn track_save(
        &self,
        actor: &Actor,
        cv_id: Uuid,
        notes: Option<&str>,
    ) -> Result<(CvSaveAction, bool)> {
        authz::check_track_engagement(actor)?;
        let recruiter_id = self.recruiter_profile_id(actor).await?;
        self.ensure_cv_exists(cv_id).await?;

        let inserted = sqlx::query_as::<_, CvSaveAction>(
            r#"
            INSERT INTO cv_saves (cv_id, recruiter_id, notes)
            VALUES ($1, $2, $3)
            ON CONFLICT (cv_id, recruiter_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(cv_id)
        .bind(recruiter_id)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?;

        let (save, created) = match inserted {
            Some(save) => (save, true),
            None => {
                let save = sqlx::query_as::<_, CvSaveAction>(
                    r#"
                    UPDATE cv_saves
                    SET notes = $3, active = TRUE, updated_at = NOW()
                    WHERE cv_id = $1 AND recruiter_id = $2
                    RETURNING *
                    "#,
                )
                .bind(cv_id)
                .bind(recruiter_id)
                .bind(notes)
                .fetch_one(&self.pool)
                .await?;
                (save, false)
            }
        };

        self.get_or_create_view(cv_id, recruiter_id).await?;

        Ok((save, created))
    }

    async fn get_or_create_view(&self, cv_id: Uuid, viewer_id: Uuid) -> Result<(CvView, bool)> {
        let inserted = sqlx::query_as::<_, CvView>(
            r#"
            INSERT INTO cv_views (cv_id, viewer_id)
            VALUES ($1, $2)
            ON CONFLICT (cv_id, viewer_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(cv_id)
        .bind(viewer_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(view) = inserted {
            return Ok((view, true));
        }

        let view = sqlx::query_as::<_, CvView>(
            r#"
            UPDATE cv_views
            SET active = TRUE, updated_at = NOW()
            WHERE cv_id = $1 AND viewer_id = $2
            RETURNING *
            "#,
        )
        .bind(cv_id)
        .bind(viewer_id)
        .fetch_one(&self.pool)
        .await?;
        Ok((view, false))
    }

    async fn recruiter_profile_id(&self, actor: &Actor) -> Result<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            r#"SELECT id FROM recruiter_profiles WHERE user_id = $1 AND active"#,
        )
        .bind(actor.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::Forbidden("no recruiter profile for this user".to_string()))
    }

    async fn ensure_cv_exists(&self, cv_id: Uuid) -> Result<()> {
        let count =
            sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM cvs WHERE id = $1 AND active"#)
                .bind(cv_id)
                .fetch_one(&self.pool)
                .await?;
        if count == 0 {
            return Err(Error::NotFound("CV not found or inactive".to_string()));
        }
        Ok(())
    }
}
