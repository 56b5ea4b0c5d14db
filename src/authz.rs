//! Role model and per-operation permission checks.
//!
//! Every mutating operation calls its check before touching state; a failed
//! check surfaces as `Error::Forbidden` with nothing written. Roles come from
//! the identity provider's token and are trusted as-is.

use crate::error::Error;
use crate::middleware::auth::Claims;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    JobSeeker,
    Employer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::JobSeeker => "job_seeker",
            Role::Employer => "employer",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job_seeker" => Ok(Role::JobSeeker),
            "employer" => Ok(Role::Employer),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// The authenticated principal, as derived from verified token claims.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn from_claims(claims: &Claims) -> Result<Self, Error> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| Error::Unauthorized("token subject is not a user id".to_string()))?;
        let role = claims
            .role
            .as_deref()
            .ok_or_else(|| Error::Unauthorized("token carries no role".to_string()))?
            .parse::<Role>()
            .map_err(Error::Unauthorized)?;
        Ok(Actor { user_id, role })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Only job seekers submit applications.
pub fn check_apply(actor: &Actor) -> Result<(), Error> {
    if actor.role == Role::JobSeeker {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "only job seekers may apply to jobs".to_string(),
        ))
    }
}

/// Status changes (and interview scheduling) belong to the recruiter owning the
/// job, or an admin.
pub fn check_review_application(actor: &Actor, job_owner_user_id: Uuid) -> Result<(), Error> {
    if actor.is_admin() || (actor.role == Role::Employer && actor.user_id == job_owner_user_id) {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "only the recruiter owning this job may review the application".to_string(),
        ))
    }
}

/// The owning applicant may withdraw an early-stage application; admins may
/// withdraw any.
pub fn check_withdraw(
    actor: &Actor,
    applicant_id: Uuid,
    early_stage: bool,
) -> Result<(), Error> {
    if actor.is_admin() {
        return Ok(());
    }
    if actor.user_id != applicant_id {
        return Err(Error::Forbidden(
            "only the applicant may withdraw this application".to_string(),
        ));
    }
    if !early_stage {
        return Err(Error::Forbidden(
            "application can no longer be withdrawn".to_string(),
        ));
    }
    Ok(())
}

/// Engagement tracking is a recruiter-side action.
pub fn check_track_engagement(actor: &Actor) -> Result<(), Error> {
    if actor.role == Role::Employer || actor.is_admin() {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "only recruiters may track CV engagement".to_string(),
        ))
    }
}

/// New-job broadcasts go out from staff or from the recruiter owning the job.
pub fn check_broadcast_job(actor: &Actor, job_owner_user_id: Uuid) -> Result<(), Error> {
    if actor.is_admin() || actor.user_id == job_owner_user_id {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "only staff or the job's own recruiter may broadcast it".to_string(),
        ))
    }
}

/// Notifications are private to their recipient.
pub fn check_read_notification(actor: &Actor, recipient_id: Uuid) -> Result<(), Error> {
    if actor.is_admin() || actor.user_id == recipient_id {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "notification belongs to another user".to_string(),
        ))
    }
}
