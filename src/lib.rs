pub mod authz;
pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod transport;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};
use reqwest::Client;
use sqlx::PgPool;

use crate::services::{
    application_service::ApplicationService, cv_service::CvService,
    engagement_service::EngagementService, interview_service::InterviewService,
    job_service::JobService, notification_service::NotificationService,
    stats_service::StatsService,
};
use crate::transport::email::{EmailTransport, HttpEmailTransport};
use crate::transport::push::{FcmPushTransport, PushTransport};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub application_service: ApplicationService,
    pub interview_service: InterviewService,
    pub engagement_service: EngagementService,
    pub stats_service: StatsService,
    pub notification_service: NotificationService,
    pub job_service: JobService,
    pub cv_service: CvService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("reqwest client");

        let email: Arc<dyn EmailTransport> = Arc::new(HttpEmailTransport::new(
            http_client.clone(),
            config.email_relay_url.clone(),
        ));
        let push: Arc<dyn PushTransport> = Arc::new(FcmPushTransport::new(
            http_client,
            config.fcm_send_url.clone(),
            config.fcm_server_key.clone(),
        ));

        Self::with_transports(pool, email, push, config.email_from.clone())
    }

    /// Wire the state with explicit transport handles. Tests inject mocks
    /// here; `new` is the production path.
    pub fn with_transports(
        pool: PgPool,
        email: Arc<dyn EmailTransport>,
        push: Arc<dyn PushTransport>,
        email_from: String,
    ) -> Self {
        let notification_service =
            NotificationService::new(pool.clone(), email, push, email_from);
        let application_service =
            ApplicationService::new(pool.clone(), notification_service.clone());
        let interview_service = InterviewService::new(pool.clone(), notification_service.clone());
        let engagement_service = EngagementService::new(pool.clone());
        let stats_service = StatsService::new(pool.clone());
        let job_service = JobService::new(pool.clone());
        let cv_service = CvService::new(pool.clone());

        Self {
            pool,
            application_service,
            interview_service,
            engagement_service,
            stats_service,
            notification_service,
            job_service,
            cv_service,
        }
    }
}

/// Full application router. Everything under `/api` requires a bearer token
/// except the public job listing.
pub fn app(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/public/jobs", get(routes::jobs::list_jobs))
        .route("/api/public/jobs/:id", get(routes::jobs::get_job));

    let protected_api = Router::new()
        .route("/api/jobs", post(routes::jobs::create_job))
        .route("/api/jobs/:id", patch(routes::jobs::update_job))
        .route("/api/jobs/:id/apply", post(routes::applications::apply))
        .route(
            "/api/jobs/:id/applications",
            get(routes::applications::job_applications),
        )
        .route("/api/jobs/:id/broadcast", post(routes::jobs::broadcast_job))
        .route(
            "/api/my-applications",
            get(routes::applications::my_applications),
        )
        .route(
            "/api/applications/:id",
            get(routes::applications::get_application)
                .delete(routes::applications::withdraw),
        )
        .route(
            "/api/applications/:id/status",
            patch(routes::applications::update_status),
        )
        .route("/api/interviews", post(routes::interviews::create_interview))
        .route("/api/interviews/:id", get(routes::interviews::get_interview))
        .route(
            "/api/interviews/:id/send-email",
            post(routes::interviews::send_interview_email),
        )
        .route(
            "/api/cvs",
            get(routes::cvs::list_my_cvs).post(routes::cvs::create_cv),
        )
        .route(
            "/api/cvs/:id",
            get(routes::cvs::get_cv).delete(routes::cvs::delete_cv),
        )
        .route("/api/cvs/:id/view", post(routes::engagement::track_view))
        .route("/api/cvs/:id/save", post(routes::engagement::track_save))
        .route("/api/stats/recruiter", get(routes::stats::recruiter_stats))
        .route(
            "/api/stats/job-seeker",
            get(routes::stats::job_seeker_stats),
        )
        .route(
            "/api/notifications",
            get(routes::notifications::list_notifications),
        )
        .route(
            "/api/notifications/:id/read",
            patch(routes::notifications::mark_read),
        )
        .route(
            "/api/notifications/push",
            post(routes::notifications::send_push),
        )
        .route(
            "/api/device-tokens",
            post(routes::notifications::register_device_token)
                .delete(routes::notifications::deregister_device_token),
        )
        .route_layer(axum::middleware::from_fn(
            middleware::auth::require_bearer_auth,
        ));

    public_api.merge(protected_api).with_state(state)
}
