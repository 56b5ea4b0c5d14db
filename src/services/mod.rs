pub mod application_service;
pub mod cv_service;
pub mod engagement_service;
pub mod interview_service;
pub mod job_service;
pub mod notification_service;
pub mod stats_service;
