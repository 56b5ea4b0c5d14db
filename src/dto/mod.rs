pub mod application_dto;
pub mod cv_dto;
pub mod engagement_dto;
pub mod interview_dto;
pub mod job_dto;
pub mod notification_dto;
pub mod stats_dto;
