use sqlx::PgPool;
use uuid::Uuid;

use crate::authz::{Actor, Role};
use crate::dto::cv_dto::CreateCvPayload;
use crate::error::{Error, Result};
use crate::models::cv::Cv;

#[derive(Clone)]
pub struct CvService {
    pool: PgPool,
}

impl CvService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, actor: &Actor, payload: &CreateCvPayload) -> Result<Cv> {
        if actor.role != Role::JobSeeker {
            return Err(Error::Forbidden(
                "only job seekers may upload CVs".to_string(),
            ));
        }
        let cv = sqlx::query_as::<_, Cv>(
            r#"
            INSERT INTO cvs (applicant_id, title, file_url)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(actor.user_id)
        .bind(&payload.title)
        .bind(&payload.file_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(cv)
    }

    pub async fn list_own(&self, actor: &Actor) -> Result<Vec<Cv>> {
        let cvs = sqlx::query_as::<_, Cv>(
            r#"
            SELECT * FROM cvs
            WHERE applicant_id = $1 AND active
            ORDER BY created_at DESC
            "#,
        )
        .bind(actor.user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(cvs)
    }

    pub async fn get_active(&self, id: Uuid) -> Result<Cv> {
        sqlx::query_as::<_, Cv>(r#"SELECT * FROM cvs WHERE id = $1 AND active"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("CV not found or inactive".to_string()))
    }

    /// Soft delete. Applications referencing the CV survive; their `cv_id`
    /// only goes null if the row is ever hard-deleted (ON DELETE SET NULL).
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let cv = sqlx::query_as::<_, Cv>(r#"SELECT * FROM cvs WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("CV not found".to_string()))?;
        if !actor.is_admin() && actor.user_id != cv.applicant_id {
            return Err(Error::Forbidden(
                "only the owner may delete this CV".to_string(),
            ));
        }
        sqlx::query(r#"UPDATE cvs SET active = FALSE, updated_at = NOW() WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
