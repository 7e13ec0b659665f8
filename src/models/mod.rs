pub mod admin;
pub mod application;
pub mod dashboard;
