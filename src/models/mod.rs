pub mod application;
pub mod company;
pub mod cv;
pub mod engagement;
pub mod interview;
pub mod job;
pub mod notification;
