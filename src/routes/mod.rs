pub mod applications;
pub mod cvs;
pub mod engagement;
pub mod health;
pub mod interviews;
pub mod jobs;
pub mod notifications;
pub mod stats;
